use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crx_fetch::{
    crx::{CrxPackage, Integrity},
    output::{convert_file, download_and_save, format_size, SaveOptions},
    store::{ExtensionId, FetchConfig, ReqwestClient, UpdateRequest},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{
    env, fs,
    io::{self, Stdout},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    IdInput,
    Files,
}

#[derive(Debug, Clone)]
enum AppState {
    Browsing,
    Processing(String),
    Success(String),
    Error(String),
}

#[derive(Debug, Clone)]
enum Job {
    Download(String),
    Convert(PathBuf),
}

#[derive(Debug)]
struct App {
    state: AppState,
    focus: Focus,
    input: String,
    files: Vec<PathBuf>,
    selected_file: ListState,
    current_dir: PathBuf,
    download_dir: PathBuf,
    output_dir: PathBuf,
}

impl App {
    fn new() -> Result<App, Box<dyn std::error::Error>> {
        let current_dir = env::current_dir()?;

        let mut app = App {
            state: AppState::Browsing,
            focus: Focus::IdInput,
            input: String::new(),
            files: Vec::new(),
            selected_file: ListState::default(),
            download_dir: current_dir.join("downloads"),
            output_dir: current_dir.join("out"),
            current_dir,
        };

        app.refresh_files()?;
        if !app.files.is_empty() {
            app.selected_file.select(Some(0));
        }

        Ok(app)
    }

    fn refresh_files(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.files.clear();

        for entry in fs::read_dir(&self.current_dir)? {
            let path = entry?.path();

            if path.is_file() && path.extension().is_some_and(|ext| ext == "crx") {
                self.files.push(path);
            }
        }

        self.files.sort();
        Ok(())
    }

    fn next_file(&mut self) {
        if self.files.is_empty() {
            return;
        }

        let i = match self.selected_file.selected() {
            Some(i) if i + 1 < self.files.len() => i + 1,
            _ => 0,
        };
        self.selected_file.select(Some(i));
    }

    fn previous_file(&mut self) {
        if self.files.is_empty() {
            return;
        }

        let i = match self.selected_file.selected() {
            Some(0) | None => self.files.len() - 1,
            Some(i) => i - 1,
        };
        self.selected_file.select(Some(i));
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::IdInput => Focus::Files,
            Focus::Files => Focus::IdInput,
        };
    }

    /// Picks the job for the focused pane, or `None` when there is nothing to do.
    fn pending_job(&self) -> Option<Job> {
        match self.focus {
            Focus::IdInput if !self.input.trim().is_empty() => {
                Some(Job::Download(self.input.trim().to_string()))
            }
            Focus::IdInput => None,
            Focus::Files => self
                .selected_file
                .selected()
                .and_then(|i| self.files.get(i))
                .map(|path| Job::Convert(path.clone())),
        }
    }

    fn run_job(&mut self, job: Job) {
        let result = match &job {
            Job::Download(target) => self.download(target),
            Job::Convert(path) => self.convert(path),
        };

        self.state = match result {
            Ok(message) => AppState::Success(message),
            Err(e) => AppState::Error(format!("{:#}", e)),
        };
    }

    fn download(&self, target: &str) -> anyhow::Result<String> {
        let id = ExtensionId::resolve(target)?;

        let fetch = FetchConfig {
            show_progress: false,
            ..FetchConfig::default()
        };
        let client = ReqwestClient::new(&fetch)?;
        let options = SaveOptions {
            output_dir: self.download_dir.clone(),
            ..SaveOptions::default()
        };

        let saved = download_and_save(&client, &id, &UpdateRequest::default(), &fetch, &options)?;
        Ok(describe(&saved.package, &saved.zip_path))
    }

    fn convert(&self, crx_path: &Path) -> anyhow::Result<String> {
        let file_name = crx_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("extension");

        let output_file = self.output_dir.join(format!("{}.zip", file_name));
        let (zip_path, package) = convert_file(crx_path, Some(output_file.as_path()))?;

        Ok(describe(&package, &zip_path))
    }

    fn reset_to_browser(&mut self) {
        self.state = AppState::Browsing;
    }
}

fn describe(package: &CrxPackage, zip_path: &Path) -> String {
    let contents = match &package.integrity {
        Integrity::Valid { entries } => format!("{} files", entries.len()),
        Integrity::Suspect(reason) => format!("warning: not a valid zip ({})", reason),
    };

    format!(
        "Output file: {}\n{}, {}",
        zip_path.display(),
        format_size(package.zip.len() as u64),
        contents
    )
}

pub fn run_tui() -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run it
    let mut app = App::new()?;
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

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match &app.state {
            AppState::Browsing => match (app.focus, key.code) {
                (_, KeyCode::Esc) => return Ok(()),
                (_, KeyCode::Tab) => app.toggle_focus(),
                (_, KeyCode::Enter) => {
                    if let Some(job) = app.pending_job() {
                        let label = match &job {
                            Job::Download(target) => format!("Downloading {}...", target),
                            Job::Convert(path) => format!("Converting {}...", path.display()),
                        };
                        app.state = AppState::Processing(label);
                        terminal.draw(|f| ui(f, app))?;
                        app.run_job(job);
                        app.refresh_files()?;
                    }
                }
                (Focus::IdInput, KeyCode::Backspace) => {
                    app.input.pop();
                }
                (Focus::IdInput, KeyCode::Char(c)) => app.input.push(c),
                (Focus::Files, KeyCode::Char('q')) => return Ok(()),
                (Focus::Files, KeyCode::Down | KeyCode::Char('j')) => app.next_file(),
                (Focus::Files, KeyCode::Up | KeyCode::Char('k')) => app.previous_file(),
                (Focus::Files, KeyCode::Char('r')) => app.refresh_files()?,
                _ => {}
            },
            AppState::Processing(_) => {}
            AppState::Success(_) | AppState::Error(_) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter | KeyCode::Char(' ') => app.reset_to_browser(),
                _ => {}
            },
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    let header = Paragraph::new("crx-fetch")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let instructions = match (&app.state, app.focus) {
        (AppState::Browsing, Focus::IdInput) => {
            "Type an extension ID or Web Store URL | Enter: Download | Tab: CRX files | Esc: Quit"
        }
        (AppState::Browsing, Focus::Files) => {
            "↑/↓: Navigate | Enter: Convert | R: Refresh | Tab: Download | Q/Esc: Quit"
        }
        (AppState::Processing(_), _) => "Working...",
        (AppState::Success(_) | AppState::Error(_), _) => "Enter/Space: Back | Q/Esc: Quit",
    };

    let footer = Paragraph::new(instructions)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);

    match &app.state {
        AppState::Browsing => render_browser(f, chunks[1], app),
        AppState::Processing(label) => {
            render_message(f, chunks[1], "Processing", label, Color::Yellow);
        }
        AppState::Success(message) => {
            let text = format!(
                "✓ Conversion successful!\n\n{}\n\nPress Enter or Space to continue",
                message
            );
            render_message(f, chunks[1], "Success", &text, Color::Green);
        }
        AppState::Error(message) => {
            let text = format!(
                "✗ Error occurred:\n\n{}\n\nPress Enter or Space to continue",
                message
            );
            render_message(f, chunks[1], "Error", &text, Color::Red);
        }
    }
}

fn focused_block(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

fn render_browser(f: &mut Frame, area: Rect, app: &App) {
    let panes = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let input = Paragraph::new(app.input.as_str()).block(focused_block(
        "Extension ID or Web Store URL",
        app.focus == Focus::IdInput,
    ));
    f.render_widget(input, panes[0]);

    let block = focused_block("CRX Files", app.focus == Focus::Files);

    if app.files.is_empty() {
        let no_files = Paragraph::new("No CRX files found in current directory")
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(no_files, panes[1]);
        return;
    }

    let items: Vec<ListItem> = app
        .files
        .iter()
        .map(|path| {
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown");
            ListItem::new(Line::from(Span::raw(filename)))
        })
        .collect();

    let files_list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White));

    f.render_stateful_widget(files_list, panes[1], &mut app.selected_file.clone());
}

fn render_message(f: &mut Frame, area: Rect, title: &str, text: &str, color: Color) {
    let message = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));

    f.render_widget(message, area);
}
