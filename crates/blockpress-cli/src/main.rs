use anyhow::Result;
use blockpress_config::Config;
use blockpress_engine::controllers::embed::{EmbedController, ScriptRuntime};
use blockpress_engine::models::EmbedType;
use blockpress_engine::schema::kinds::embed::embed_type;
use blockpress_engine::{
    Document, FragmentFile, Node, NodeType, ParseReport, SchemaRegistry, ScriptSettings, io,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
    sync::Arc,
};

struct App {
    content_path: PathBuf,
    registry: SchemaRegistry,
    fragments: Vec<FragmentFile>,
    file_list_state: ListState,
    current_content: Vec<String>,
    scripts: Option<Arc<dyn ScriptRuntime>>,
    show_script_output: bool,
}

impl App {
    fn new(content_path: PathBuf, scripts: ScriptSettings) -> Result<Self> {
        let fragments = io::list_fragments(&content_path)?;
        log::info!(
            "found {} post fragments under {}",
            fragments.len(),
            content_path.display()
        );

        let mut app = Self {
            content_path,
            registry: SchemaRegistry::standard(),
            fragments,
            file_list_state: ListState::default(),
            current_content: Vec::new(),
            scripts: scripts.runtime(),
            show_script_output: false,
        };

        if !app.fragments.is_empty() {
            app.file_list_state.select(Some(0));
            app.update_content_for_selection();
        }

        Ok(app)
    }

    fn next_file(&mut self) {
        if self.fragments.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => (i + 1) % self.fragments.len(),
            None => 0,
        };
        self.file_list_state.select(Some(i));
        self.update_content_for_selection();
    }

    fn previous_file(&mut self) {
        if self.fragments.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(0) | None => self.fragments.len() - 1,
            Some(i) => i - 1,
        };
        self.file_list_state.select(Some(i));
        self.update_content_for_selection();
    }

    fn toggle_script_output(&mut self) {
        self.show_script_output = !self.show_script_output;
        self.update_content_for_selection();
    }

    fn update_content_for_selection(&mut self) {
        let Some(fragment) = self
            .file_list_state
            .selected()
            .and_then(|index| self.fragments.get(index))
        else {
            return;
        };

        self.current_content = match io::load_document(
            &self.registry,
            fragment.relative_path(),
            &self.content_path,
        ) {
            Ok((document, report)) => {
                let runtime = if self.show_script_output {
                    self.scripts.as_ref()
                } else {
                    None
                };
                outline(&document, &report, runtime)
            }
            Err(e) => vec![format!("Error loading fragment: {e}")],
        };
    }
}

/// One line per block, followed by any repairs made while loading.
///
/// With a runtime, JavaScript embeds are run and their console output is
/// listed under them.
fn outline(
    document: &Document,
    report: &ParseReport,
    scripts: Option<&Arc<dyn ScriptRuntime>>,
) -> Vec<String> {
    let mut embeds = scripts.map(|runtime| EmbedController::new(Some(Arc::clone(runtime))));
    let mut lines = Vec::new();
    for (id, node) in document.iter() {
        lines.push(summarize_block(node));
        if let Some(embeds) = embeds.as_mut()
            && node.kind == NodeType::Embed
            && embed_type(node) == EmbedType::Javascript
        {
            embeds.execute(id, node);
            if let Some(output) = embeds.output(id) {
                lines.extend(
                    output
                        .lines()
                        .iter()
                        .map(|line| format!("  > [{}] {}", line.level.as_str(), line.text)),
                );
            }
        }
    }

    if document.is_empty() {
        lines.push("(empty post)".to_string());
    }

    if !report.is_clean() {
        lines.push(String::new());
        lines.push(format!("Repaired while loading ({}):", report.len()));
        lines.extend(report.iter().map(|error| format!("  {error}")));
    }

    lines
}

fn summarize_block(node: &Node) -> String {
    let attrs = &node.attrs;
    match node.kind {
        NodeType::Paragraph => node.plain_text(),
        NodeType::Heading => {
            let level = attrs.number("level").unwrap_or(1.0) as usize;
            format!("{} {}", "#".repeat(level), node.plain_text())
        }
        NodeType::CodeBlock => {
            let first_line = node.plain_text().lines().next().unwrap_or_default().to_string();
            format!("```{} {first_line}", attrs.text("language"))
        }
        NodeType::Image => format!("[image] {}", attrs.text("src")),
        NodeType::Gallery => format!("[gallery] {} images", attrs.images("images").len()),
        NodeType::Alert => format!(
            "[{}] {}",
            attrs.text("type").to_uppercase(),
            attrs.text("title")
        ),
        NodeType::Embed => format!("[embed {}]", attrs.text("embedType")),
        NodeType::Promo => format!("[promo] {}", attrs.text("title")),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Determine content path from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let content_path;
    let from_config;
    let scripts;

    if args.len() == 2 {
        content_path = PathBuf::from(&args[1]);
        from_config = false;
        // An explicit path still picks up script settings from a readable config
        scripts = match Config::load() {
            Ok(config) => config.map(|c| c.script_settings()).unwrap_or_default(),
            Err(e) => {
                log::warn!("ignoring config file: {e}");
                ScriptSettings::default()
            }
        };
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => {
                scripts = config.script_settings();
                content_path = config.content_path;
                from_config = true;
            }
            Ok(None) => {
                eprintln!("Error: No content path provided and no config file found");
                eprintln!("Usage: {} <content-folder-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <content-folder-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [content-folder-path]", args[0]);
        process::exit(1);
    };

    if let Err(e) = io::validate_content_dir(&content_path) {
        let source = if from_config {
            format!(" from config file '{}'", config_path.display())
        } else {
            String::new()
        };
        eprintln!(
            "Error: Content path '{}'{} is invalid: {e}",
            content_path.display(),
            source
        );
        process::exit(1);
    }

    let mut app = App::new(content_path, scripts)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_file(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_file(),
                KeyCode::Char('r') => app.update_content_for_selection(),
                KeyCode::Char('x') => app.toggle_script_output(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(rows[0]);

    let file_items: Vec<ListItem> = app
        .fragments
        .iter()
        .map(|fragment| {
            let display_text = format!("📄 {}", fragment.relative_path());
            ListItem::new(vec![Line::from(vec![Span::raw(display_text)])])
        })
        .collect();

    let files_list = List::new(file_items)
        .block(Block::default().borders(Borders::ALL).title("Posts"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(files_list, chunks[0], &mut app.file_list_state);

    let content_text = if app.current_content.is_empty() {
        vec![Line::from("Select a post to view its blocks")]
    } else {
        app.current_content
            .iter()
            .map(|line| Line::from(vec![Span::raw(line.clone())]))
            .collect()
    };

    let title = app
        .file_list_state
        .selected()
        .and_then(|index| app.fragments.get(index))
        .map(|fragment| format!("Blocks: {}", fragment.display_name()))
        .unwrap_or_else(|| "Blocks".to_string());

    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(content, chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k: Previous | "),
        Span::raw("↓/j: Next | "),
        Span::raw("r: Reload | "),
        Span::raw("x: Run scripts"),
    ]);

    f.render_widget(Paragraph::new(vec![help_text]), rows[1]);
}
