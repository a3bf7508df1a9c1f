// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::Path;

// Use library instead of local modules
use follow_reconciler::{
    export_csv, filter_users, Config, FollowData, FollowSession, ListKind, SqliteStore,
};

fn main() -> Result<()> {
    let config = Config::load()?;
    init_logging(&config);

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("ui");

    match command {
        "analyze" => run_analyze(&config, &args[2..])?,
        "list" => run_list(&config, &args[2..])?,
        "export" => run_export(&config, &args[2..])?,
        "reset" => run_reset(&config)?,
        "ui" => run_ui_mode(&config)?,
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("❌ Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!("Usage: follow-reconciler <command>");
    println!();
    println!("  analyze <followers.json> <following.json>   Analyze two exports and save the result");
    println!("  list <list> [query]                         Print a list (notMutual, following, followers, notFollowing, mutuals)");
    println!("  export <list> <out.csv>                     Write a list to CSV");
    println!("  reset                                       Clear the saved analysis");
    println!("  ui                                          Browse the saved analysis (default)");
}

fn open_session(config: &Config) -> Result<FollowSession<SqliteStore>> {
    let store = SqliteStore::open(&config.db_path)?;
    Ok(FollowSession::open(store))
}

/// Absent arguments become `None` so the session reports them as missing input
fn read_export(path: Option<&String>) -> Result<Option<String>> {
    match path {
        None => Ok(None),
        Some(p) if !Path::new(p).exists() => bail!("Export file not found: {}", p),
        Some(p) => fs::read_to_string(p)
            .map(Some)
            .with_context(|| format!("Failed to read {}", p)),
    }
}

fn run_analyze(config: &Config, args: &[String]) -> Result<()> {
    println!("🔍 Follow Analysis");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let followers = read_export(args.first())?;
    let following = read_export(args.get(1))?;

    let mut session = open_session(config)?;

    if let (Some(f), Some(g)) = (&followers, &following) {
        if session.is_unchanged(f, g) {
            println!("ℹ️  Same exports as the saved analysis, refreshing anyway");
        }
    }

    let data = match session.process_files(followers.as_deref(), following.as_deref()) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("❌ {} [{}]", e, e.code());
            std::process::exit(1);
        }
    };

    print_summary(data);
    println!("\n✓ Saved to {:?}", config.db_path);

    Ok(())
}

fn print_summary(data: &FollowData) {
    let summary = data.summary();

    if let Some(username) = &data.username {
        println!("\n👤 {}", username);
    }
    println!();
    for kind in ListKind::ALL {
        println!("  {:<16} {:>6}", kind.title(), summary.count(kind));
    }
}

fn parse_list(name: Option<&String>) -> Result<ListKind> {
    let name = name.context("Missing list name")?;
    match ListKind::parse(name) {
        Some(kind) => Ok(kind),
        None => bail!("Unknown list '{}'", name),
    }
}

fn run_list(config: &Config, args: &[String]) -> Result<()> {
    let kind = parse_list(args.first())?;
    let query = args.get(1).map(String::as_str).unwrap_or("");

    let session = open_session(config)?;
    let Some(data) = session.data() else {
        eprintln!("❌ No saved analysis. Run: follow-reconciler analyze <followers.json> <following.json>");
        std::process::exit(1);
    };

    let users = filter_users(data.list(kind), query);
    println!("📋 {} ({})", kind.title(), users.len());
    for user in users {
        match &user.profile_url {
            Some(url) => println!("  {:<30} {}", user.username, url),
            None => println!("  {}", user.username),
        }
    }

    Ok(())
}

fn run_export(config: &Config, args: &[String]) -> Result<()> {
    let kind = parse_list(args.first())?;
    let out = args.get(1).context("Missing output path")?;

    let session = open_session(config)?;
    let Some(data) = session.data() else {
        eprintln!("❌ No saved analysis to export.");
        std::process::exit(1);
    };

    let written = export_csv(Path::new(out), data.list(kind))?;
    println!("✓ Exported {} users from {} to {}", written, kind.title(), out);

    Ok(())
}

fn run_reset(config: &Config) -> Result<()> {
    let mut session = open_session(config)?;
    session.reset()?;
    println!("✓ Saved analysis cleared");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let session = open_session(config)?;

    let Some(data) = session.data() else {
        eprintln!("❌ No saved analysis!");
        eprintln!("   Run: follow-reconciler analyze <followers.json> <following.json>");
        std::process::exit(1);
    };

    let mut app = ui::App::new(data.clone());
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web API: cargo run --bin follow-server --features server");
    std::process::exit(1);
}
