mod api;
mod app;
mod config;
mod engine;
mod event;
mod session;
mod store;
mod sync;
mod telemetry;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use tracing::{info, warn};

use api::{ApiClient, AuthContext, ContentSource, HttpProgressStore};
use app::{App, AppScreen, SourceRequest};
use config::Config;
use event::{AppEvent, EventHandler, KeyAction, key_action};
use session::typing::format_elapsed;
use store::ProgressStore;
use store::json_store::JsonStore;
use ui::components::code_view::CodeView;
use ui::components::progress_bar::ProgressBar;
use ui::components::status_panel::StatusPanel;
use ui::components::virtual_keyboard::{VirtualKeyboardView, hit_test};
use ui::layout::{AppLayout, centered_rect};
use ui::theme::Theme;

#[derive(Parser)]
#[command(name = "codetype", version, about = "Type real code, keep your place")]
struct Cli {
    #[arg(long, help = "Practice API base URL")]
    api_url: Option<String>,

    #[arg(long, env = "CODETYPE_TOKEN", hide_env_values = true, help = "Bearer token")]
    token: Option<String>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Keep progress locally and never contact the API")]
    offline: bool,

    #[arg(short, long, help = "Practise a local file")]
    file: Option<PathBuf>,

    #[arg(short, long, help = "Practise a code by id")]
    code: Option<String>,

    #[arg(short, long, help = "Practise a project, or the project a --code belongs to")]
    project: Option<String>,

    #[arg(long, requires = "project", help = "Forget project progress before starting")]
    reset_project: bool,

    #[arg(long, help = "Write the effective config file and exit")]
    init_config: bool,
}

impl Cli {
    fn source_request(&self) -> Option<SourceRequest> {
        if let Some(path) = &self.file {
            return Some(SourceRequest::File(path.clone()));
        }
        match (&self.code, &self.project) {
            (Some(id), project) => Some(SourceRequest::Code {
                id: id.clone(),
                project: project.clone(),
            }),
            (None, Some(id)) => Some(SourceRequest::Project {
                id: id.clone(),
                reset: self.reset_project,
            }),
            (None, None) => None,
        }
    }

    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.apply(&mut config);

    if cli.init_config {
        config.save()?;
        println!("Wrote {}", Config::config_path().display());
        return Ok(());
    }

    let Some(request) = cli.source_request() else {
        bail!("nothing to practise: pass --file, --code or --project");
    };

    let _log_guard = telemetry::init(&config.data_path(), &config.log_filter)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let theme = Theme::load(&config.theme).unwrap_or_else(|| {
        warn!(theme = %config.theme, "unknown theme, using default");
        Theme::default()
    });

    let local = cli.offline || matches!(request, SourceRequest::File(_));
    let (store, content) = if local {
        let store: Arc<dyn ProgressStore> = Arc::new(JsonStore::with_base_dir(config.data_path())?);
        (store, None)
    } else {
        let auth = config
            .token
            .as_deref()
            .map(AuthContext::bearer)
            .unwrap_or_default();
        let client = ApiClient::new(&config.api_url, auth, config.request_timeout())?;
        match client.check_session() {
            Ok(status) if status.valid => info!(
                user = status.user.as_ref().and_then(|u| u.email.as_deref()).unwrap_or("?"),
                "session valid"
            ),
            Ok(_) => info!("no valid session, continuing anonymously"),
            Err(err) => warn!(%err, "session check failed"),
        }
        let store: Arc<dyn ProgressStore> = Arc::new(HttpProgressStore::new(client.clone()));
        let content: Box<dyn ContentSource> = Box::new(client);
        (store, Some(content))
    };

    let mut app = App::new(config, theme, store, content);
    app.open(request);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);
    if !app.should_quit {
        app.quit();
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key_action(key)),
            AppEvent::Click(column, row) => {
                let size = terminal.size()?;
                handle_click(app, Rect::new(0, 0, size.width, size.height), column, row);
            }
            // Ticks just redraw: the timer and hint expiry are read at render time.
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, action: Option<KeyAction>) {
    let Some(action) = action else {
        return;
    };
    match (app.screen, action) {
        (_, KeyAction::Quit) => app.quit(),
        (AppScreen::Message, KeyAction::Input(_)) => app.quit(),
        (AppScreen::Message, KeyAction::Navigate(_)) => {}
        (AppScreen::Typing, KeyAction::Navigate(direction)) => app.navigate(direction),
        (AppScreen::Typing, KeyAction::Input(input)) => {
            app.handle_input(input);
        }
    }
}

fn handle_click(app: &mut App, area: Rect, column: u16, row: u16) {
    let show_keyboard = app.session.as_ref().is_some_and(|s| s.show_keyboard);
    let Some(keyboard_area) = AppLayout::new(area, show_keyboard).keyboard else {
        return;
    };
    if let Some(label) = hit_test(&app.keyboard, keyboard_area, column, row) {
        app.press_virtual(label);
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    match (app.screen, &app.session) {
        (AppScreen::Typing, Some(_)) => render_typing(frame, app),
        _ => render_message(frame, app),
    }
}

fn render_message(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let area = centered_rect(60, 7, frame.area());
    let text = app.message.as_deref().unwrap_or_default();
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(text.to_string(), Style::default().fg(colors.fg()))),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to exit.",
            Style::default().fg(colors.text_pending()),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::bordered()
            .title(" codetype ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg())),
    );
    frame.render_widget(paragraph, area);
}

fn render_typing(frame: &mut ratatui::Frame, app: &App) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let colors = &app.theme.colors;
    let now = Instant::now();
    let layout = AppLayout::new(frame.area(), session.show_keyboard);

    let project_info = match &app.project {
        Some(project) => {
            let position = match &session.source.resource {
                store::ResourceId::Code(id) => project.position_of(id),
                store::ResourceId::Project(_) => None,
            };
            match position {
                Some(idx) => format!(
                    " | {} {}/{}",
                    project.display_name(),
                    idx + 1,
                    project.code_ids.len()
                ),
                None => format!(" | {}", project.display_name()),
            }
        }
        None => String::new(),
    };
    let header_info = format!(
        " {}{} | {} | {:.0}% | Acc {:.1}%",
        session.source.file_name,
        project_info,
        format_elapsed(session.elapsed_secs(now)),
        session.progress_ratio() * 100.0,
        session.accuracy(),
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " codetype ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            header_info,
            Style::default()
                .fg(colors.text_pending())
                .bg(colors.header_bg()),
        ),
    ]))
    .block(Block::bordered().border_style(Style::default().fg(colors.border())))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    let title = if session.source.description.is_empty() {
        session.source.language.as_str()
    } else {
        session.source.description.as_str()
    };
    frame.render_widget(
        CodeView::new(session.reference(), session.state(), title, &app.theme),
        layout.code,
    );
    frame.render_widget(
        StatusPanel::new(session, now, app.project.is_some(), &app.theme),
        layout.status,
    );
    if let Some(keyboard_area) = layout.keyboard {
        frame.render_widget(
            VirtualKeyboardView::new(&app.keyboard, session.expected(), &app.theme),
            keyboard_area,
        );
    }
    frame.render_widget(
        ProgressBar::new(
            "Progress",
            session.state().cursor,
            session.reference().len(),
            &app.theme,
        ),
        layout.footer,
    );

    if session.is_complete()
        && let Some(summary) = &app.last_summary
    {
        let area = centered_rect(44, 9, layout.code);
        let label = Style::default().fg(colors.text_pending());
        let value = Style::default()
            .fg(colors.fg())
            .add_modifier(Modifier::BOLD);
        let row = |name: &str, text: String| {
            Line::from(vec![
                Span::styled(format!("  {name:<12}"), label),
                Span::styled(text, value),
            ])
        };
        let lines = vec![
            row("Time", format_elapsed(summary.elapsed_secs)),
            row("Characters", summary.total_chars.to_string()),
            row("Keystrokes", summary.keystrokes.to_string()),
            row("Mistakes", summary.mistakes.to_string()),
            row("Accuracy", format!("{:.1}%", summary.accuracy)),
            row("Speed", format!("{:.0} wpm", summary.wpm())),
        ];
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::bordered()
                    .title(" Completed ")
                    .border_style(Style::default().fg(colors.success()))
                    .style(Style::default().bg(colors.bg())),
            ),
            area,
        );
    }
}
