use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::api::types::load_local_file;
use crate::api::{CodeFile, ContentSource, Direction, Project};
use crate::config::Config;
use crate::engine::{InputEvent, ReferenceText};
use crate::session::result::CompletionSummary;
use crate::session::typing::{SessionSource, SessionStep, TypingSession};
use crate::session::virtual_keys::VirtualKeyboard;
use crate::store::{ProgressStore, ResourceId, ensure_record};
use crate::sync::Synchronizer;
use crate::ui::theme::Theme;

/// What the user asked to practise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRequest {
    Code { id: String, project: Option<String> },
    Project { id: String, reset: bool },
    File(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Typing,
    Message,
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub theme: Theme,
    pub session: Option<TypingSession>,
    pub project: Option<Project>,
    pub keyboard: VirtualKeyboard,
    pub message: Option<String>,
    pub last_summary: Option<CompletionSummary>,
    pub should_quit: bool,
    current_code: Option<String>,
    store: Arc<dyn ProgressStore>,
    content: Option<Box<dyn ContentSource>>,
    sync: Option<Synchronizer>,
}

impl App {
    pub fn new(
        config: Config,
        theme: Theme,
        store: Arc<dyn ProgressStore>,
        content: Option<Box<dyn ContentSource>>,
    ) -> Self {
        Self {
            screen: AppScreen::Message,
            config,
            theme,
            session: None,
            project: None,
            keyboard: VirtualKeyboard::new(),
            message: Some("Loading...".to_string()),
            last_summary: None,
            should_quit: false,
            current_code: None,
            store,
            content,
            sync: None,
        }
    }

    /// Load the requested source. Failures land on the message screen.
    pub fn open(&mut self, request: SourceRequest) {
        let result = match request {
            SourceRequest::Code { id, project } => self.open_code_in(&id, project.as_deref()),
            SourceRequest::Project { id, reset } => self.start_project(&id, reset),
            SourceRequest::File(path) => self.open_file(path),
        };
        if let Err(err) = result {
            warn!(%err, "failed to load practice source");
            self.show_message(format!("Could not load: {err:#}"));
        }
    }

    fn content(&self) -> anyhow::Result<&dyn ContentSource> {
        self.content
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("remote content is unavailable in offline mode"))
    }

    fn open_code_in(&mut self, id: &str, project_id: Option<&str>) -> anyhow::Result<()> {
        if let Some(project_id) = project_id
            && self.project.as_ref().is_none_or(|p| p.id != project_id)
        {
            let project = self.content()?.fetch_project(project_id)?;
            self.project = Some(project);
        }
        self.open_code(id)
    }

    fn open_code(&mut self, id: &str) -> anyhow::Result<()> {
        let code = self.content()?.fetch_code(id)?;
        info!(code = %code.id, file = %code.file_name, "loaded code");
        let reference = ReferenceText::from_encoded(&code.content);
        self.begin_session(&code, reference);
        Ok(())
    }

    /// Enter a project: its progress record is created on first visit, and
    /// practice starts at the first file (or the last once the project is done).
    fn start_project(&mut self, id: &str, reset: bool) -> anyhow::Result<()> {
        let project = self.content()?.fetch_project(id)?;
        let resource = ResourceId::Project(project.id.clone());

        if reset {
            match self.store.delete(&resource) {
                Ok(()) => info!(%resource, "project progress reset"),
                Err(err) => warn!(%resource, %err, "failed to reset project progress"),
            }
        }

        let completed = match ensure_record(&*self.store, &resource) {
            Ok(record) => record.is_completed,
            Err(err) => {
                warn!(%resource, %err, "project progress unavailable");
                false
            }
        };

        let start = if completed {
            project.code_ids.last().cloned()
        } else {
            project.code_ids.first().cloned()
        };
        let name = project.display_name().to_string();
        self.project = Some(project);

        match start {
            Some(code_id) => self.open_code(&code_id),
            None => anyhow::bail!("project {name} has no files"),
        }
    }

    fn open_file(&mut self, path: PathBuf) -> anyhow::Result<()> {
        let code = load_local_file(&path)?;
        info!(path = %path.display(), "loaded local file");
        self.project = None;
        let reference = ReferenceText::new(&code.content);
        self.begin_session(&code, reference);
        Ok(())
    }

    fn begin_session(&mut self, code: &CodeFile, reference: ReferenceText) {
        self.finish_sync();

        let resource = ResourceId::Code(code.id.clone());
        let progress = match self.store.fetch(&resource) {
            Ok(progress) => progress,
            Err(err) => {
                warn!(%resource, %err, "progress read failed, starting fresh");
                None
            }
        };

        let source = SessionSource {
            resource: resource.clone(),
            file_name: code.file_name.clone(),
            description: code.description.clone(),
            language: code.language().to_string(),
        };
        let session = TypingSession::new(
            source,
            reference,
            self.config.match_rules(),
            progress.as_ref(),
            self.config.hint_window(),
            Instant::now(),
        );
        debug!(
            %resource,
            cursor = session.state().cursor,
            completed = session.is_complete(),
            "session started"
        );

        self.sync = Some(Synchronizer::spawn(
            Arc::clone(&self.store),
            resource,
            self.config.debounce(),
        ));
        self.current_code = Some(code.id.clone());
        self.session = Some(session);
        self.last_summary = None;
        self.message = None;
        self.keyboard = VirtualKeyboard::new();
        self.screen = AppScreen::Typing;
    }

    /// Flush and stop the current synchronizer, if any.
    fn finish_sync(&mut self) {
        if let Some(sync) = self.sync.take() {
            let report = sync.shutdown();
            debug!(
                writes = report.writes,
                failures = report.failures,
                "synchronizer stopped"
            );
        }
    }

    fn show_message(&mut self, message: String) {
        self.message = Some(message);
        self.screen = AppScreen::Message;
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Option<SessionStep> {
        if self.screen != AppScreen::Typing {
            return None;
        }
        let session = self.session.as_mut()?;
        let now = Instant::now();
        let step = session.handle(event, now);

        if step.dirty
            && let Some(sync) = &self.sync
        {
            sync.mark_dirty(session.snapshot());
        }
        if step.just_completed {
            let summary = CompletionSummary::from_session(session, now);
            info!(
                file = %summary.file_name,
                secs = summary.elapsed_secs,
                accuracy = summary.accuracy,
                "code completed"
            );
            self.last_summary = Some(summary);
        }
        Some(step)
    }

    /// A button on the on-screen keyboard was pressed.
    pub fn press_virtual(&mut self, label: &str) -> Option<SessionStep> {
        let event = self.keyboard.press(label)?;
        self.handle_input(event)
    }

    pub fn can_navigate(&self, direction: Direction) -> bool {
        self.neighbor(direction).is_some()
    }

    fn neighbor(&self, direction: Direction) -> Option<String> {
        let project = self.project.as_ref()?;
        let current = self.current_code.as_deref()?;
        project.neighbor(current, direction).map(str::to_string)
    }

    /// Move to the adjacent file of the current project.
    pub fn navigate(&mut self, direction: Direction) {
        let Some(target) = self.neighbor(direction) else {
            debug!(?direction, "no neighbor to navigate to");
            return;
        };
        if let Err(err) = self.open_code(&target) {
            warn!(%err, code = %target, "navigation failed");
            self.show_message(format!("Could not load: {err:#}"));
        }
    }

    pub fn quit(&mut self) {
        self.finish_sync();
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use super::*;
    use crate::store::json_store::JsonStore;
    use crate::store::{ProgressUpdate, StoreError, StoreResult};

    #[derive(Default)]
    struct FakeContent {
        codes: HashMap<String, CodeFile>,
        projects: HashMap<String, Project>,
    }

    impl FakeContent {
        fn with_project(id: &str, files: &[(&str, &str)]) -> Self {
            let mut content = Self::default();
            for (code_id, text) in files {
                content.codes.insert(
                    code_id.to_string(),
                    CodeFile {
                        id: code_id.to_string(),
                        content: text.to_string(),
                        file_name: format!("{code_id}.js"),
                        ..CodeFile::default()
                    },
                );
            }
            content.projects.insert(
                id.to_string(),
                Project {
                    id: id.to_string(),
                    code_ids: files.iter().map(|(c, _)| c.to_string()).collect(),
                    ..Project::default()
                },
            );
            content
        }
    }

    impl ContentSource for FakeContent {
        fn fetch_code(&self, id: &str) -> StoreResult<CodeFile> {
            self.codes.get(id).cloned().ok_or(StoreError::Status {
                status: 404,
                body: String::new(),
            })
        }

        fn fetch_project(&self, id: &str) -> StoreResult<Project> {
            self.projects.get(id).cloned().ok_or(StoreError::Status {
                status: 404,
                body: String::new(),
            })
        }
    }

    fn app(store: Arc<JsonStore>, content: Option<FakeContent>) -> App {
        let config = Config {
            debounce_ms: 50,
            ..Config::default()
        };
        App::new(
            config,
            Theme::default(),
            store,
            content.map(|c| Box::new(c) as Box<dyn ContentSource>),
        )
    }

    fn type_str(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_input(InputEvent::from_char(ch));
        }
    }

    #[test]
    fn test_local_file_progress_is_flushed_on_quit() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("snippet.rs");
        fs::write(&file, "let x = 1;").unwrap();
        let store = Arc::new(JsonStore::with_base_dir(dir.path().join("data")).unwrap());

        let mut app = app(Arc::clone(&store), None);
        app.open(SourceRequest::File(file.clone()));
        assert_eq!(app.screen, AppScreen::Typing);

        type_str(&mut app, "let x ");
        app.quit();
        assert!(app.should_quit);

        let resource = ResourceId::Code(file.display().to_string());
        let record = store.fetch(&resource).unwrap().unwrap();
        assert_eq!(record.current_token_index, 6);
        assert!(!record.is_completed);
    }

    #[test]
    fn test_session_resumes_from_stored_progress() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "ab cd").unwrap();
        let store = Arc::new(JsonStore::with_base_dir(dir.path().join("data")).unwrap());
        let resource = ResourceId::Code(file.display().to_string());
        store.create(&resource).unwrap();
        store
            .update(
                &resource,
                &ProgressUpdate {
                    current_token_index: 3,
                    is_completed: false,
                },
            )
            .unwrap();

        let mut app = app(store, None);
        app.open(SourceRequest::File(file));
        assert_eq!(app.session.as_ref().unwrap().state().cursor, 3);
        app.quit();
    }

    #[test]
    fn test_missing_file_shows_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
        let mut app = app(store, None);
        app.open(SourceRequest::File(dir.path().join("nope.rs")));
        assert_eq!(app.screen, AppScreen::Message);
        assert!(app.message.as_deref().unwrap().starts_with("Could not load"));
        assert!(app.handle_input(InputEvent::Char('a')).is_none());
    }

    #[test]
    fn test_remote_code_offline_shows_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
        let mut app = app(store, None);
        app.open(SourceRequest::Code {
            id: "c1".to_string(),
            project: None,
        });
        assert_eq!(app.screen, AppScreen::Message);
        assert!(app.message.as_deref().unwrap().contains("offline"));
    }

    #[test]
    fn test_project_start_creates_progress_and_opens_first_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
        let content = FakeContent::with_project("p1", &[("c1", "a &amp; b"), ("c2", "x")]);
        let mut app = app(Arc::clone(&store), Some(content));

        app.open(SourceRequest::Project {
            id: "p1".to_string(),
            reset: false,
        });
        assert_eq!(app.screen, AppScreen::Typing);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.source.file_name, "c1.js");
        assert_eq!(session.reference().as_slice(), &['a', ' ', '&', ' ', 'b']);

        let project_record = store
            .fetch(&ResourceId::Project("p1".to_string()))
            .unwrap();
        assert!(project_record.is_some());

        assert!(!app.can_navigate(Direction::Previous));
        assert!(app.can_navigate(Direction::Next));
        app.navigate(Direction::Next);
        assert_eq!(app.session.as_ref().unwrap().source.file_name, "c2.js");
        assert!(!app.can_navigate(Direction::Next));
        app.quit();
    }

    #[test]
    fn test_completed_project_opens_last_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
        let resource = ResourceId::Project("p1".to_string());
        store.create(&resource).unwrap();
        store
            .update(
                &resource,
                &ProgressUpdate {
                    current_token_index: 0,
                    is_completed: true,
                },
            )
            .unwrap();

        let content = FakeContent::with_project("p1", &[("c1", "a"), ("c2", "b")]);
        let mut app = app(Arc::clone(&store), Some(content));
        app.open(SourceRequest::Project {
            id: "p1".to_string(),
            reset: false,
        });
        assert_eq!(app.session.as_ref().unwrap().source.file_name, "c2.js");

        app.open(SourceRequest::Project {
            id: "p1".to_string(),
            reset: true,
        });
        assert_eq!(app.session.as_ref().unwrap().source.file_name, "c1.js");
        app.quit();
    }

    #[test]
    fn test_navigation_flushes_previous_code() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
        let content = FakeContent::with_project("p1", &[("c1", "ab;cd"), ("c2", "x")]);
        let mut app = app(Arc::clone(&store), Some(content));
        app.open(SourceRequest::Code {
            id: "c1".to_string(),
            project: Some("p1".to_string()),
        });
        type_str(&mut app, "ab;");
        app.navigate(Direction::Next);

        let record = store
            .fetch(&ResourceId::Code("c1".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(record.current_token_index, 3);
        app.quit();
    }

    #[test]
    fn test_completion_records_summary() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("t.txt");
        fs::write(&file, "ok").unwrap();
        let store = Arc::new(JsonStore::with_base_dir(dir.path().join("data")).unwrap());
        let mut app = app(Arc::clone(&store), None);
        app.open(SourceRequest::File(file.clone()));

        app.press_virtual("o");
        let step = app.press_virtual("k").unwrap();
        assert!(step.just_completed);
        assert_eq!(app.last_summary.as_ref().unwrap().file_name, "t.txt");
        app.quit();

        let record = store
            .fetch(&ResourceId::Code(file.display().to_string()))
            .unwrap()
            .unwrap();
        assert!(record.is_completed);
        assert_eq!(record.current_token_index, 2);
    }
}
