// 📤 CSV Export - Write any result list as username,href,timestamp

use crate::model::User;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

pub fn write_csv<W: Write>(writer: W, users: &[User]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["username", "href", "timestamp"])?;
    for user in users {
        let timestamp = user.captured_at.map(|t| t.to_string()).unwrap_or_default();
        wtr.write_record([
            user.username.as_str(),
            user.profile_url.as_deref().unwrap_or(""),
            timestamp.as_str(),
        ])?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(users.len())
}

pub fn export_csv(path: &Path, users: &[User]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {:?}", path))?;
    write_csv(file, users)
}
