use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use player_compare::{
    spawn_fetch, AppConfig, ChartGeometry, ChartMode, ChartSeries, CommitOutcome, CsvStatSource,
    Entity, FetchCompletion, FieldRegistry, NewsItem, Period, SelectionSnapshot, SelectionState,
    Slot, SourceResult, StatFetchCoordinator, StatSource, Winner,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, List, ListItem, ListState,
        Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::{debug, warn};

const LEFT_COLOR: Color = Color::LightRed;
const RIGHT_COLOR: Color = Color::LightBlue;
const SIZE_STEP: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(Debug)]
struct SearchDone {
    token: u64,
    result: SourceResult<Vec<Entity>>,
}

#[derive(Debug)]
struct NewsDone {
    slot: Slot,
    token: u64,
    result: SourceResult<Vec<NewsItem>>,
}

/// Search box for the focused slot. Results from an older query are dropped.
#[derive(Default)]
pub struct SearchBox {
    pub query: String,
    pub results: Vec<Entity>,
    pub list_state: ListState,
    token: u64,
    loading: bool,
}

impl SearchBox {
    fn reset(&mut self) {
        self.query.clear();
        self.results.clear();
        self.list_state.select(None);
        self.token += 1;
        self.loading = false;
    }

    fn selected(&self) -> Option<&Entity> {
        self.list_state.selected().and_then(|i| self.results.get(i))
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.results.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if down => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.list_state.select(Some(i));
    }
}

pub struct App {
    source: Arc<CsvStatSource>,
    selection: SelectionState,
    selection_rx: watch::Receiver<Arc<SelectionSnapshot>>,
    last_snapshot: Arc<SelectionSnapshot>,
    coordinator: StatFetchCoordinator,
    pub geometry: ChartGeometry,

    pub focus: Slot,
    pub input_mode: InputMode,
    pub search: SearchBox,
    pub field_state: TableState,
    pub news: [Vec<NewsItem>; 2],
    news_tokens: [u64; 2],
    pub status: String,

    stats_tx: UnboundedSender<FetchCompletion>,
    stats_rx: UnboundedReceiver<FetchCompletion>,
    search_tx: UnboundedSender<SearchDone>,
    search_rx: UnboundedReceiver<SearchDone>,
    news_tx: UnboundedSender<NewsDone>,
    news_rx: UnboundedReceiver<NewsDone>,
}

impl App {
    pub fn new(source: Arc<CsvStatSource>, config: &AppConfig) -> Self {
        let selection = SelectionState::new();
        let selection_rx = selection.subscribe();
        let last_snapshot = selection.snapshot();
        let (stats_tx, stats_rx) = mpsc::unbounded_channel();
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        let (news_tx, news_rx) = mpsc::unbounded_channel();

        let mut field_state = TableState::default();
        field_state.select(Some(0));

        Self {
            source,
            selection,
            selection_rx,
            last_snapshot,
            coordinator: StatFetchCoordinator::new(),
            geometry: config.geometry(),
            focus: Slot::Left,
            input_mode: InputMode::Normal,
            search: SearchBox::default(),
            field_state,
            news: [Vec::new(), Vec::new()],
            news_tokens: [0, 0],
            status: "Press / to search for a player".to_string(),
            stats_tx,
            stats_rx,
            search_tx,
            search_rx,
            news_tx,
            news_rx,
        }
    }

    fn entity(&self, slot: Slot) -> Option<&Entity> {
        self.last_snapshot.slot(slot).entity.as_ref()
    }

    fn slot_label(&self, slot: Slot) -> String {
        self.entity(slot)
            .map(|e| e.display_name.clone())
            .unwrap_or_else(|| slot.name().to_string())
    }

    /// Push a newly published selection snapshot through the coordinator
    pub fn sync_selection(&mut self) {
        if !self.selection_rx.has_changed().unwrap_or(false) {
            return;
        }
        let next = self.selection_rx.borrow_and_update().clone();
        for request in self.coordinator.sync(&self.last_snapshot, &next) {
            spawn_fetch(self.source.clone(), request, self.stats_tx.clone());
        }

        for slot in next.changed_slots(&self.last_snapshot) {
            let before = self.last_snapshot.slot(slot).entity.as_ref().map(|e| e.id);
            let after = next.slot(slot).entity.clone();
            if before != after.as_ref().map(|e| e.id) {
                self.request_news(slot, after);
            }
        }

        self.last_snapshot = next;
    }

    fn request_news(&mut self, slot: Slot, entity: Option<Entity>) {
        let ix = slot.index();
        self.news_tokens[ix] += 1;
        self.news[ix].clear();

        let Some(entity) = entity else { return };
        let token = self.news_tokens[ix];
        let source = self.source.clone();
        let tx = self.news_tx.clone();
        tokio::spawn(async move {
            let result = source.get_news(&entity.display_name).await;
            let _ = tx.send(NewsDone { slot, token, result });
        });
    }

    fn on_query_changed(&mut self) {
        self.search.token += 1;
        self.search.list_state.select(None);

        if !player_compare::source::is_searchable(&self.search.query) {
            self.search.results.clear();
            self.search.loading = false;
            return;
        }

        self.search.loading = true;
        let token = self.search.token;
        let query = self.search.query.clone();
        let source = self.source.clone();
        let tx = self.search_tx.clone();
        tokio::spawn(async move {
            let result = source.search(&query).await;
            let _ = tx.send(SearchDone { token, result });
        });
    }

    /// Apply everything that finished since the last frame
    pub fn drain_events(&mut self) {
        while let Ok(done) = self.stats_rx.try_recv() {
            let slot = done.slot;
            match self.coordinator.commit(done) {
                CommitOutcome::Committed => {
                    self.status = format!("Loaded stats for {}", self.slot_label(slot));
                }
                CommitOutcome::Stale => {}
                CommitOutcome::Failed(err) => {
                    self.status = format!("{}: {}", self.slot_label(slot), err);
                }
            }
        }

        while let Ok(done) = self.search_rx.try_recv() {
            if done.token != self.search.token {
                debug!(token = done.token, "stale search results dropped");
                continue;
            }
            self.search.loading = false;
            match done.result {
                Ok(results) => {
                    self.search.results = results;
                    if !self.search.results.is_empty() {
                        self.search.list_state.select(Some(0));
                    }
                }
                Err(err) => {
                    warn!(error = %err, "search failed");
                    self.status = format!("Search failed: {}", err);
                }
            }
        }

        while let Ok(done) = self.news_rx.try_recv() {
            let ix = done.slot.index();
            if done.token != self.news_tokens[ix] {
                continue;
            }
            match done.result {
                Ok(items) => self.news[ix] = items,
                Err(err) => warn!(slot = ?done.slot, error = %err, "news fetch failed"),
            }
        }
    }

    fn choose_search_result(&mut self) {
        if let Some(entity) = self.search.selected().cloned() {
            self.status = format!("{} → {}", self.focus.name(), entity.display_name);
            self.selection.select(self.focus, entity);
        }
        self.search.reset();
        self.input_mode = InputMode::Normal;
    }

    /// Step through the focused slot's available seasons.
    ///
    /// Waits until the selected player's own record has landed; the slot
    /// may still hold the previous player's seasons.
    fn cycle_season(&mut self, forward: bool) {
        let snapshot = self.selection.snapshot();
        let Some(player) = snapshot.slot(self.focus).entity.as_ref().map(|e| e.id) else {
            return;
        };
        let Some(record) = self.coordinator.record_for(self.focus, player) else {
            return;
        };
        let seasons = &record.available_periods;
        if seasons.is_empty() {
            return;
        }
        let current = record
            .period
            .as_ref()
            .and_then(|p| seasons.iter().position(|s| s == p))
            .unwrap_or(seasons.len() - 1);
        let next = if forward {
            (current + 1) % seasons.len()
        } else {
            (current + seasons.len() - 1) % seasons.len()
        };

        let period = Period::season(seasons[next].clone());
        self.selection.set_period(self.focus, period);
    }

    fn clear_focused(&mut self) {
        self.selection.clear(self.focus);
    }

    fn next_field(&mut self, down: bool) {
        let len = player_compare::TRACKED_FIELDS.len();
        let i = match self.field_state.selected() {
            Some(i) if down => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.field_state.select(Some(i));
    }

    /// Returns false when the app should exit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.input_mode {
            InputMode::Search => match key.code {
                KeyCode::Esc => {
                    self.search.reset();
                    self.input_mode = InputMode::Normal;
                }
                KeyCode::Enter => self.choose_search_result(),
                KeyCode::Down => self.search.move_selection(true),
                KeyCode::Up => self.search.move_selection(false),
                KeyCode::Backspace => {
                    self.search.query.pop();
                    self.on_query_changed();
                }
                KeyCode::Char(c) => {
                    self.search.query.push(c);
                    self.on_query_changed();
                }
                _ => {}
            },
            InputMode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return false,
                KeyCode::Char('/') | KeyCode::Char('s') => {
                    self.search.reset();
                    self.input_mode = InputMode::Search;
                }
                KeyCode::Tab | KeyCode::BackTab => self.focus = self.focus.other(),
                KeyCode::Char(']') => self.cycle_season(true),
                KeyCode::Char('[') => self.cycle_season(false),
                KeyCode::Char('u') => {
                    self.selection.set_period(self.focus, Period::Unspecified);
                }
                KeyCode::Char('x') => self.clear_focused(),
                KeyCode::Char('m') => self.geometry.mode = self.geometry.mode.toggle(),
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    self.geometry.size_factor += SIZE_STEP;
                }
                KeyCode::Char('-') => {
                    if self.geometry.size_factor > SIZE_STEP {
                        self.geometry.size_factor -= SIZE_STEP;
                    }
                }
                KeyCode::Down | KeyCode::Char('j') => self.next_field(true),
                KeyCode::Up | KeyCode::Char('k') => self.next_field(false),
                _ => {}
            },
        }
        true
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.sync_selection();
        app.drain_events();
        terminal.draw(|f| ui(f, app))?;

        // Poll so fetch completions get drawn without waiting for a key
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with slots
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    render_sidebar(f, body[0], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11), // Comparison table
            Constraint::Min(0),     // Chart
            Constraint::Length(3),  // Tooltip
        ])
        .split(body[1]);

    let (left_series, right_series) = app
        .coordinator
        .series(&app.slot_label(Slot::Left), &app.slot_label(Slot::Right));

    render_comparison(f, right[0], app);
    match app.geometry.mode {
        ChartMode::Radial => render_radar(f, right[1], app, &left_series, &right_series),
        ChartMode::Cartesian => render_line_chart(f, right[1], app, &left_series, &right_series),
    }
    render_tooltip(f, right[2], app, &left_series, &right_series);

    render_status_bar(f, chunks[2], app);
}

fn slot_color(slot: Slot) -> Color {
    match slot {
        Slot::Left => LEFT_COLOR,
        Slot::Right => RIGHT_COLOR,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        "Player Compare",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )];

    for slot in Slot::ALL {
        spans.push(Span::raw("  │  "));
        let mut style = Style::default().fg(slot_color(slot));
        if slot == app.focus {
            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }
        let season = app
            .coordinator
            .record(slot)
            .and_then(|r| r.period.clone())
            .unwrap_or_else(|| "-".to_string());
        let marker = if app.coordinator.is_pending(slot) { " …" } else { "" };
        spans.push(Span::styled(
            format!("{} ({}){}", app.slot_label(slot), season, marker),
            style,
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

fn render_sidebar(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let (title, border) = match app.input_mode {
        InputMode::Search => (format!("Search: {}", app.focus.name()), Color::Yellow),
        InputMode::Normal => ("Search (/)".to_string(), Color::DarkGray),
    };
    let query = Paragraph::new(app.search.query.as_str()).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(query, chunks[0]);

    if app.input_mode == InputMode::Search {
        let items: Vec<ListItem> = app
            .search
            .results
            .iter()
            .map(|e| ListItem::new(e.display_name.clone()))
            .collect();
        let title = if app.search.loading {
            "Searching..."
        } else if player_compare::source::is_searchable(&app.search.query) {
            "Results"
        } else {
            "Type at least 3 characters"
        };
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("▶ ");
        f.render_stateful_widget(list, chunks[1], &mut app.search.list_state);
        return;
    }

    let focus = app.focus;
    let items: Vec<ListItem> = app.news[focus.index()]
        .iter()
        .map(|n| {
            ListItem::new(vec![
                Line::from(Span::styled(n.title.clone(), Style::default().fg(Color::White))),
                Line::from(Span::styled(
                    n.published_at.format("%Y-%m-%d").to_string(),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();
    let title = if app.entity(focus).is_none() {
        "Latest News".to_string()
    } else if items.is_empty() {
        format!("No recent news for {}", app.slot_label(focus))
    } else {
        format!("Latest News: {}", app.slot_label(focus))
    };
    let news = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(slot_color(focus))),
    );
    f.render_widget(news, chunks[1]);
}

fn render_comparison(f: &mut Frame, area: Rect, app: &mut App) {
    let winner_style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);

    let rows: Vec<Row> = app
        .coordinator
        .comparison()
        .into_iter()
        .map(|row| {
            let left_style = if row.winner == Winner::Left { winner_style } else { Style::default() };
            let right_style = if row.winner == Winner::Right { winner_style } else { Style::default() };
            Row::new(vec![
                Cell::from(row.display_left()).style(left_style),
                Cell::from(row.label()).style(Style::default().fg(Color::Yellow)),
                Cell::from(row.display_right()).style(right_style),
            ])
        })
        .collect();

    let header = Row::new(vec![
        Cell::from(app.slot_label(Slot::Left)).style(Style::default().fg(LEFT_COLOR)),
        Cell::from("Stat"),
        Cell::from(app.slot_label(Slot::Right)).style(Style::default().fg(RIGHT_COLOR)),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD))
    .bottom_margin(1);

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(40),
        ],
    )
    .header(header)
    .block(Block::default().title("Comparison").borders(Borders::ALL))
    .highlight_style(Style::default().bg(Color::DarkGray));

    f.render_stateful_widget(table, area, &mut app.field_state);
}

fn render_radar(f: &mut Frame, area: Rect, app: &App, left: &ChartSeries, right: &ChartSeries) {
    let geometry = app.geometry;
    let extent = geometry.extent();
    let count = left.len();
    let labels = FieldRegistry::standard().labels();
    let left_points = geometry.project(left);
    let right_points = geometry.project(right);

    let canvas = Canvas::default()
        .block(Block::default().title("Radar (m: switch)").borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([-extent * 1.3, extent * 1.3])
        .y_bounds([-extent * 1.15, extent * 1.15])
        .paint(move |ctx| {
            // Spokes and labels
            for (i, label) in labels.iter().enumerate() {
                let angle = ChartGeometry::spoke_angle(i, count);
                let (x, y) = (extent * angle.cos(), extent * angle.sin());
                ctx.draw(&CanvasLine {
                    x1: 0.0,
                    y1: 0.0,
                    x2: x,
                    y2: y,
                    color: Color::DarkGray,
                });
                ctx.print(x * 1.1, y * 1.05, Span::styled(*label, Style::default().fg(Color::White)));
            }
            ctx.layer();

            for (points, color) in [(&left_points, LEFT_COLOR), (&right_points, RIGHT_COLOR)] {
                for (i, a) in points.iter().enumerate() {
                    let b = &points[(i + 1) % points.len()];
                    ctx.draw(&CanvasLine {
                        x1: a.x,
                        y1: a.y,
                        x2: b.x,
                        y2: b.y,
                        color,
                    });
                }
            }
        });

    f.render_widget(canvas, area);
}

fn render_line_chart(f: &mut Frame, area: Rect, app: &App, left: &ChartSeries, right: &ChartSeries) {
    let geometry = app.geometry;
    let to_xy = |series: &ChartSeries| -> Vec<(f64, f64)> {
        geometry.project(series).into_iter().map(|p| (p.x, p.y)).collect()
    };
    let left_data = to_xy(left);
    let right_data = to_xy(right);

    let datasets = vec![
        Dataset::default()
            .name(left.label.clone())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(LEFT_COLOR))
            .data(&left_data),
        Dataset::default()
            .name(right.label.clone())
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(RIGHT_COLOR))
            .data(&right_data),
    ];

    let x_labels: Vec<Span> = left
        .points
        .iter()
        .map(|p| Span::raw(p.field.label))
        .collect();
    let extent = geometry.extent();
    let y_labels = vec![
        Span::raw("0"),
        Span::raw(format!("{:.0}", extent / 2.0)),
        Span::raw(format!("{:.0}", extent)),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().title("Line (m: switch)").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, left.len().saturating_sub(1) as f64])
                .labels(x_labels)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, extent])
                .labels(y_labels)
                .style(Style::default().fg(Color::DarkGray)),
        );

    f.render_widget(chart, area);
}

fn render_tooltip(f: &mut Frame, area: Rect, app: &App, left: &ChartSeries, right: &ChartSeries) {
    let index = app.field_state.selected().unwrap_or(0);
    let label = left.points.get(index).map(|p| p.field.label).unwrap_or("-");

    let mut spans = vec![Span::styled(
        format!("{}  ", label),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )];
    if let Some(text) = left.tooltip(index) {
        spans.push(Span::styled(text, Style::default().fg(LEFT_COLOR)));
    }
    spans.push(Span::raw("   "));
    if let Some(text) = right.tooltip(index) {
        spans.push(Span::styled(text, Style::default().fg(RIGHT_COLOR)));
    }

    let tooltip = Paragraph::new(Line::from(spans))
        .block(Block::default().title("Point (↑/↓)").borders(Borders::ALL));
    f.render_widget(tooltip, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let help = match app.input_mode {
        InputMode::Search => "Enter: select | ↑/↓: move | Esc: cancel",
        InputMode::Normal => {
            "/: search | Tab: slot | [ ]: season | u: default season | x: clear | m: chart | +/-: size | q: quit"
        }
    };

    let mut spans = vec![Span::styled(help, Style::default().fg(Color::DarkGray))];
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(app.status.clone(), Style::default().fg(Color::White)));

    let status = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}
