use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ledger_reconcile::{MatchKind, MatchResult, Pass, ReconciliationOutcome};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_STEP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Matches,
    UnmatchedBank,
    UnmatchedLedger,
    Summary,
}

impl Page {
    const ALL: [Page; 4] = [Page::Matches, Page::UnmatchedBank, Page::UnmatchedLedger, Page::Summary];

    pub fn next(&self) -> Self {
        match self {
            Page::Matches => Page::UnmatchedBank,
            Page::UnmatchedBank => Page::UnmatchedLedger,
            Page::UnmatchedLedger => Page::Summary,
            Page::Summary => Page::Matches,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Matches => Page::Summary,
            Page::UnmatchedBank => Page::Matches,
            Page::UnmatchedLedger => Page::UnmatchedBank,
            Page::Summary => Page::UnmatchedLedger,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Matches => "Matches",
            Page::UnmatchedBank => "Unmatched Bank",
            Page::UnmatchedLedger => "Unmatched Ledger",
            Page::Summary => "Summary",
        }
    }
}

pub struct App {
    pub outcome: ReconciliationOutcome,

    /// Indices into `outcome.matches` shown on the Matches page
    pub visible_matches: Vec<usize>,
    pub pass_filter: Option<Pass>,
    pub current_page: Page,
    pub matches_state: TableState,
    pub bank_state: TableState,
    pub ledger_state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(outcome: ReconciliationOutcome) -> Self {
        let mut app = Self {
            visible_matches: (0..outcome.matches.len()).collect(),
            outcome,
            pass_filter: None,
            current_page: Page::Matches,
            matches_state: TableState::default(),
            bank_state: TableState::default(),
            ledger_state: TableState::default(),
            show_detail: false,
        };

        app.matches_state.select(first_row(app.visible_matches.len()));
        app.bank_state.select(first_row(app.outcome.unmatched_bank.len()));
        app.ledger_state.select(first_row(app.outcome.unmatched_ledger.len()));
        app
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_match(&self) -> Option<&MatchResult> {
        self.matches_state
            .selected()
            .and_then(|i| self.visible_matches.get(i))
            .and_then(|&i| self.outcome.matches.get(i))
    }

    /// Show only matches produced by one pass (None shows all)
    pub fn apply_filter(&mut self, pass: Option<Pass>) {
        self.pass_filter = pass;
        self.visible_matches = self
            .outcome
            .matches
            .iter()
            .enumerate()
            .filter(|(_, m)| pass.map_or(true, |p| Pass::for_kind(&m.kind) == p))
            .map(|(i, _)| i)
            .collect();

        self.matches_state.select(first_row(self.visible_matches.len()));
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn current_len(&self) -> usize {
        match self.current_page {
            Page::Matches => self.visible_matches.len(),
            Page::UnmatchedBank => self.outcome.unmatched_bank.len(),
            Page::UnmatchedLedger => self.outcome.unmatched_ledger.len(),
            Page::Summary => 0,
        }
    }

    fn current_state(&mut self) -> Option<&mut TableState> {
        match self.current_page {
            Page::Matches => Some(&mut self.matches_state),
            Page::UnmatchedBank => Some(&mut self.bank_state),
            Page::UnmatchedLedger => Some(&mut self.ledger_state),
            Page::Summary => None,
        }
    }

    fn move_selection(&mut self, step: impl Fn(usize, usize) -> usize) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        if let Some(state) = self.current_state() {
            let i = state.selected().map(|i| step(i, len)).unwrap_or(0);
            state.select(Some(i.min(len - 1)));
        }
    }

    pub fn next(&mut self) {
        self.move_selection(|i, len| if i + 1 >= len { 0 } else { i + 1 });
    }

    pub fn previous(&mut self) {
        self.move_selection(|i, len| if i == 0 { len - 1 } else { i - 1 });
    }

    pub fn page_down(&mut self) {
        self.move_selection(|i, _| i + PAGE_STEP);
    }

    pub fn page_up(&mut self) {
        self.move_selection(|i, _| i.saturating_sub(PAGE_STEP));
    }

    pub fn first(&mut self) {
        self.move_selection(|_, _| 0);
    }

    pub fn last(&mut self) {
        self.move_selection(|_, len| len - 1);
    }
}

fn first_row(len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(0)
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

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::Matches;
                }
                KeyCode::Char(digit @ '1'..='6') if app.current_page == Page::Summary => {
                    let index = digit as usize - '1' as usize;
                    app.apply_filter(Pass::ORDER.get(index).copied());
                    app.current_page = Page::Matches;
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.first(),
                KeyCode::End => app.last(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Matches {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_matches(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Matches => render_matches(f, chunks[1], app),
            Page::UnmatchedBank => render_unmatched_bank(f, chunks[1], app),
            Page::UnmatchedLedger => render_unmatched_ledger(f, chunks[1], app),
            Page::Summary => render_summary(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let o = &app.outcome;
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("✓ {}", o.matches.len()),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Bank ✗ {}", o.unmatched_bank.len()),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Ledger ✗ {}", o.unmatched_ledger.len()),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Rate: {}", o.match_rate),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn kind_color(kind: &MatchKind) -> Color {
    match kind {
        MatchKind::Exact => Color::Green,
        MatchKind::NearDate { .. } | MatchKind::WideDate { .. } => Color::Cyan,
        MatchKind::Split { .. } => Color::Magenta,
        MatchKind::FuzzyAmount => Color::Yellow,
        MatchKind::VendorType { .. } => Color::Blue,
    }
}

fn highlighted(table: Table<'_>, title: String) -> Table<'_> {
    table
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ")
}

fn render_matches(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Bank Date", "Ledger Date", "Amount", "Match", "Vendor", "Ledger Names"]);

    let rows = app
        .visible_matches
        .iter()
        .filter_map(|&i| app.outcome.matches.get(i))
        .map(|m| {
            let color = kind_color(&m.kind);
            Row::new(vec![
                Cell::from(m.bank_date.format("%m/%d/%Y").to_string()),
                Cell::from(m.ledger_date.format("%m/%d/%Y").to_string()),
                Cell::from(format!("{:.2}", m.amount)),
                Cell::from(m.kind.label()).style(Style::default().fg(color)),
                Cell::from(truncate(&m.bank_vendor, 24)),
                Cell::from(truncate(&m.ledger_names, 30)),
            ])
            .height(1)
        });

    let title = match app.pass_filter {
        Some(pass) => format!(" Matches · {} ", pass),
        None => " Matches ".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Length(26),
            Constraint::Min(20),
        ],
    )
    .header(header);

    f.render_stateful_widget(highlighted(table, title), area, &mut app.matches_state);
}

fn render_unmatched_bank(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Date", "Category", "Amount", "Vendor", "Description"]);

    let rows = app.outcome.unmatched_bank.iter().map(|r| {
        Row::new(vec![
            Cell::from(r.date.format("%m/%d/%Y").to_string()),
            Cell::from(r.category.as_str()),
            Cell::from(format!("{:.2}", r.amount)),
            Cell::from(truncate(&r.vendor, 24)),
            Cell::from(truncate(&r.description, 40)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(26),
            Constraint::Min(20),
        ],
    )
    .header(header);

    let title = format!(" Unmatched Bank ({}) ", app.outcome.unmatched_bank.len());
    f.render_stateful_widget(highlighted(table, title), area, &mut app.bank_state);
}

fn render_unmatched_ledger(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Date", "Type", "Debit", "Credit", "Name", "Memo"]);

    let rows = app.outcome.unmatched_ledger.iter().map(|r| {
        Row::new(vec![
            Cell::from(r.date.format("%m/%d/%Y").to_string()),
            Cell::from(truncate(&r.ledger_type, 16)),
            Cell::from(format!("{:.2}", r.debit)),
            Cell::from(format!("{:.2}", r.credit)),
            Cell::from(truncate(&r.name, 24)),
            Cell::from(truncate(&r.memo, 30)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(18),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(26),
            Constraint::Min(20),
        ],
    )
    .header(header);

    let title = format!(" Unmatched Ledger ({}) ", app.outcome.unmatched_ledger.len());
    f.render_stateful_widget(highlighted(table, title), area, &mut app.ledger_state);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let o = &app.outcome;
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let value = Style::default().fg(Color::Green);

    let stat = |name: &'static str, v: String| {
        Line::from(vec![Span::styled(format!("  {:<20}", name), label), Span::styled(v, value)])
    };

    let mut content = vec![
        Line::from(""),
        stat("Run", o.run_id.to_string()),
        stat("Reconciled at", o.reconciled_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        Line::from(""),
        stat("Bank records", o.total_bank.to_string()),
        stat("Ledger records", o.total_ledger.to_string()),
        stat("Matches", o.matches.len().to_string()),
        stat("Matched bank", o.matched_bank_count.to_string()),
        stat("Matched ledger", o.matched_ledger_count.to_string()),
        stat("Match rate", o.match_rate.to_string()),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  MATCHES BY PASS (press number to filter)",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
    ];

    for pass in Pass::ORDER {
        content.push(Line::from(vec![
            Span::styled(format!("  [{}] ", pass.number()), Style::default().fg(Color::Yellow)),
            Span::styled(format!("{:<16}", pass.name()), label),
            Span::styled(o.matches_for(pass).to_string(), value),
        ]));
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Summary "),
    );

    f.render_widget(paragraph, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let m = match app.selected_match() {
        Some(m) => m,
        None => {
            let no_selection = Paragraph::new("No match selected")
                .block(Block::default().borders(Borders::ALL).title(" Match Details "));
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let value = Style::default().fg(Color::Green);
    let section = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let field = |name: &'static str, v: String| {
        Line::from(vec![Span::styled(format!("  {}: ", name), label), Span::styled(v, value)])
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![Span::styled(
            format!("  {}", m.kind.label()),
            Style::default().fg(kind_color(&m.kind)).add_modifier(Modifier::BOLD),
        )]),
        field("Amount", format!("{:.2}", m.amount)),
        Line::from(""),
        Line::from(vec![Span::styled("  BANK", section)]),
        Line::from(""),
        field("Date", m.bank_date.format("%m/%d/%Y").to_string()),
        field("Category", m.bank_category.to_string()),
        field("Vendor", m.bank_vendor.clone()),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                wrap_text(&m.bank_description, 35),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled("  LEDGER", section)]),
        Line::from(""),
        field("Date", m.ledger_date.format("%m/%d/%Y").to_string()),
        field("Type", m.ledger_type.clone()),
        field("Transaction IDs", m.ledger_transaction_ids.clone()),
        field("Names", m.ledger_names.clone()),
        field("Memos", m.ledger_memos.clone()),
        field("Split", m.ledger_split_labels.clone()),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )]),
    ];

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Match Details "),
    );

    f.render_widget(detail_panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (selected, total) = match app.current_page {
        Page::Matches => (app.matches_state.selected(), app.visible_matches.len()),
        Page::UnmatchedBank => (app.bank_state.selected(), app.outcome.unmatched_bank.len()),
        Page::UnmatchedLedger => (app.ledger_state.selected(), app.outcome.unmatched_ledger.len()),
        Page::Summary => (None, 0),
    };
    let selected = selected.map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(pass) = app.pass_filter {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", pass.name()),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Fast | "));
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
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.chars().count() + word.chars().count() + 1 > width {
            lines.push(std::mem::take(&mut current_line));
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines.join("\n  ")
}
