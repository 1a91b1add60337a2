use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use codetype::engine::{InputEvent, MatchRules, ReferenceText};
use codetype::session::typing::{SessionSource, TypingSession};
use codetype::store::json_store::JsonStore;
use codetype::store::{ProgressStore, ResourceId};
use codetype::sync::Synchronizer;

const WINDOW: Duration = Duration::from_millis(100);

fn source(resource: &ResourceId) -> SessionSource {
    SessionSource {
        resource: resource.clone(),
        file_name: "lib.rs".to_string(),
        description: String::new(),
        language: "rs".to_string(),
    }
}

fn open(store: &JsonStore, resource: &ResourceId, text: &str) -> TypingSession {
    let progress = store.fetch(resource).unwrap();
    TypingSession::new(
        source(resource),
        ReferenceText::new(text),
        MatchRules::default(),
        progress.as_ref(),
        Duration::from_secs(3),
        Instant::now(),
    )
}

fn type_str(session: &mut TypingSession, sync: &Synchronizer, text: &str) {
    for ch in text.chars() {
        let step = session.handle(InputEvent::from_char(ch), Instant::now());
        if step.dirty {
            sync.mark_dirty(session.snapshot());
        }
    }
}

#[test]
fn test_progress_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
    let resource = ResourceId::Code("c42".to_string());
    let text = "use std::io;\nfn main() {}\n";

    let mut session = open(&store, &resource, text);
    let sync = Synchronizer::spawn(store.clone(), resource.clone(), WINDOW);
    type_str(&mut session, &sync, "use std::io;\n");
    let report = sync.shutdown();
    assert_eq!(report.writes, 1);
    assert_eq!(report.failures, 0);

    let reopened = open(&store, &resource, text);
    assert_eq!(reopened.state().cursor, 13);
    assert_eq!(reopened.expected(), Some('f'));
    assert!(!reopened.is_complete());
}

#[test]
fn test_burst_is_written_once_after_quiet_window() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
    let resource = ResourceId::Code("burst".to_string());

    let mut session = open(&store, &resource, "a b c d e f g");
    let sync = Synchronizer::spawn(store.clone(), resource.clone(), WINDOW);
    type_str(&mut session, &sync, "a b c d ");
    thread::sleep(WINDOW * 4);

    let record = store.fetch(&resource).unwrap().unwrap();
    assert_eq!(record.current_token_index, 8);

    let report = sync.shutdown();
    assert_eq!(report.writes, 1);
    assert_eq!(report.last_written.unwrap().current_token_index, 8);
}

#[test]
fn test_completion_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
    let resource = ResourceId::Code("done".to_string());

    let mut session = open(&store, &resource, "x = 1;");
    let sync = Synchronizer::spawn(store.clone(), resource.clone(), WINDOW);
    type_str(&mut session, &sync, "x = 1;");
    assert!(session.is_complete());
    drop(sync);

    let record = store.fetch(&resource).unwrap().unwrap();
    assert!(record.is_completed);
    assert!(record.completed_at.is_some());

    let reopened = open(&store, &resource, "x = 1;");
    assert!(reopened.is_complete());
    assert!(reopened.started_at.is_none());
}
