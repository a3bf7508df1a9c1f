use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use follow_reconciler::{filter_users, FollowData, FollowSummary, ListKind, User};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Browse,
    Search,
}

pub struct App {
    pub data: FollowData,
    pub summary: FollowSummary,
    pub current_list: ListKind,
    pub filtered_users: Vec<User>,
    pub state: TableState,
    pub query: String,
    pub input_mode: InputMode,
}

impl App {
    pub fn new(data: FollowData) -> Self {
        let summary = data.summary();
        let mut app = Self {
            data,
            summary,
            current_list: ListKind::NotMutual,
            filtered_users: Vec::new(),
            state: TableState::default(),
            query: String::new(),
            input_mode: InputMode::Browse,
        };
        app.refresh();
        app
    }

    /// Re-apply the search query to the current list
    pub fn refresh(&mut self) {
        self.filtered_users = filter_users(self.data.list(self.current_list), &self.query)
            .into_iter()
            .cloned()
            .collect();

        if self.filtered_users.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn next_list(&mut self) {
        self.current_list = self.current_list.next();
        self.refresh();
    }

    pub fn previous_list(&mut self) {
        self.current_list = self.current_list.previous();
        self.refresh();
    }

    pub fn push_query(&mut self, c: char) {
        self.query.push(c);
        self.refresh();
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.refresh();
    }

    pub fn clear_query(&mut self) {
        self.query.clear();
        self.refresh();
    }

    pub fn next(&mut self) {
        let len = self.filtered_users.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered_users.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.filtered_users.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.filtered_users.is_empty() {
            return;
        }
        let i = self.state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };

        match app.input_mode {
            InputMode::Search => match key.code {
                KeyCode::Enter | KeyCode::Esc => app.input_mode = InputMode::Browse,
                KeyCode::Backspace => app.pop_query(),
                KeyCode::Char(c) => app.push_query(c),
                _ => {}
            },
            InputMode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('/') => app.input_mode = InputMode::Search,
                KeyCode::Char('c') => app.clear_query(),
                KeyCode::Tab => app.next_list(),
                KeyCode::BackTab => app.previous_list(),
                KeyCode::Right if key.modifiers.contains(KeyModifiers::SHIFT) => app.next_list(),
                KeyCode::Left if key.modifiers.contains(KeyModifiers::SHIFT) => app.previous_list(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => {
                    if !app.filtered_users.is_empty() {
                        app.state.select(Some(0));
                    }
                }
                KeyCode::End => {
                    if !app.filtered_users.is_empty() {
                        app.state.select(Some(app.filtered_users.len() - 1));
                    }
                }
                _ => {}
            },
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // User list
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_search(f, chunks[1], app);
    render_table(f, chunks[2], app);
    render_status_bar(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, kind) in ListKind::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *kind == app.current_list {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(
            format!("{} ({})", kind.title(), app.summary.count(*kind)),
            style,
        ));
    }

    let title = match &app.data.username {
        Some(name) => format!(" @{} ", name),
        None => " Follow Analysis ".to_string(),
    };

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );

    f.render_widget(header, area);
}

fn render_search(f: &mut Frame, area: Rect, app: &App) {
    let (text, border) = match app.input_mode {
        InputMode::Search => (format!("{}▏", app.query), Color::Yellow),
        InputMode::Browse if app.query.is_empty() => ("Press / to search users...".to_string(), Color::DarkGray),
        InputMode::Browse => (app.query.clone(), Color::White),
    };

    let search = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Search "),
    );

    f.render_widget(search, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["#", "Username", "Profile", "Captured"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.filtered_users.iter().enumerate().map(|(i, user)| {
        let captured = user
            .captured_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        Row::new(vec![
            Cell::from((i + 1).to_string()),
            Cell::from(truncate(&user.username, 30)),
            Cell::from(truncate(user.profile_url.as_deref().unwrap_or(""), 50))
                .style(Style::default().fg(Color::Cyan)),
            Cell::from(captured),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(32),
            Constraint::Length(52),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", app.current_list.title())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    if app.filtered_users.is_empty() {
        let empty = Paragraph::new("List is empty").block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", app.current_list.title())),
        );
        f.render_widget(empty, area);
    } else {
        f.render_stateful_widget(table, area, &mut app.state);
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.filtered_users.len();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if !app.query.is_empty() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Search: {}", app.query),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("/", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Search | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" List | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
