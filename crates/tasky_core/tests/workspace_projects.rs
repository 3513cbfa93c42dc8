use std::time::{Duration, Instant};
use tasky_core::model::reminder::ReminderColor;
use tasky_core::model::Position;
use tasky_core::{CoreConfig, KvStore, Lane, MemoryKvStore, NewTask, SqliteKvStore, Workspace};

#[test]
fn switching_projects_isolates_and_restores_data() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let mut workspace = Workspace::new(&store, &config).unwrap();
    let alpha = workspace.create_project("Alpha", None).unwrap();
    let beta = workspace.create_project("Beta", None).unwrap();

    workspace.set_active_project(Some(alpha.id)).unwrap();
    let task = workspace
        .kanban_mut()
        .add_task(NewTask::titled("alpha task"))
        .unwrap();
    workspace
        .reminders_mut()
        .create("alpha reminder", ReminderColor::Yellow)
        .unwrap();
    assert_eq!(
        workspace.kanban().lane_key(Lane::Todo),
        format!("kanban.todo::{}", alpha.id)
    );

    workspace.set_active_project(Some(beta.id)).unwrap();
    assert_eq!(workspace.kanban().total_tasks(), 0);
    assert!(workspace.reminders().list().is_empty());
    assert_eq!(workspace.notes().key(), format!("notes::{}", beta.id));

    workspace.set_active_project(Some(alpha.id)).unwrap();
    assert_eq!(workspace.kanban().locate(task.id), Some((Lane::Todo, 0)));
    assert_eq!(workspace.reminders().list().len(), 1);

    workspace.set_active_project(None).unwrap();
    assert_eq!(workspace.kanban().lane_key(Lane::Todo), "kanban.todo");
    assert_eq!(workspace.kanban().total_tasks(), 0);
}

#[test]
fn pending_debounced_note_is_flushed_to_old_project_on_switch() {
    let store = MemoryKvStore::new();
    let config = CoreConfig {
        notes_debounce_ms: 60_000,
        ..CoreConfig::default()
    };
    let mut workspace = Workspace::new(&store, &config).unwrap();
    let alpha = workspace.create_project("Alpha", None).unwrap();
    let beta = workspace.create_project("Beta", None).unwrap();
    workspace.set_active_project(Some(alpha.id)).unwrap();

    let note = workspace.notes_mut().create("draft", "unsaved words").unwrap();
    workspace.tick(Instant::now());
    assert!(workspace.notes().has_pending_save());
    let alpha_key = format!("notes::{}", alpha.id);
    assert_eq!(store.get(&alpha_key).unwrap(), None);

    workspace.set_active_project(Some(beta.id)).unwrap();
    assert!(store.get(&alpha_key).unwrap().unwrap().contains(&note.id.to_string()));
    assert!(workspace.notes().list().is_empty());
    assert!(!workspace.notes().has_pending_save());
}

#[test]
fn tick_and_flush_drive_timed_controllers() {
    let store = MemoryKvStore::new();
    let config = CoreConfig {
        graph_autosave_secs: 5,
        ..CoreConfig::default()
    };
    let mut workspace = Workspace::new(&store, &config).unwrap();

    workspace.graph_mut().add_node("root", Position::default());
    workspace.notes_mut().create("n", "body").unwrap();
    workspace.tick(Instant::now() + Duration::from_secs(6));
    assert!(store.get("graph").unwrap().is_some());
    assert!(store.get("notes").unwrap().is_some());

    workspace.graph_mut().add_node("child", Position::new(10.0, 10.0));
    workspace.flush_all();
    assert!(!workspace.graph().has_pending_save());
}

#[test]
fn deleting_project_purges_its_namespace_only() {
    let store = MemoryKvStore::new();
    let config = CoreConfig::default();
    let mut workspace = Workspace::new(&store, &config).unwrap();
    let keep = workspace.create_project("Keep", None).unwrap();
    let drop_me = workspace.create_project("Drop", None).unwrap();

    workspace.set_active_project(Some(drop_me.id)).unwrap();
    workspace.kanban_mut().add_task(NewTask::titled("gone")).unwrap();
    workspace.set_active_project(Some(keep.id)).unwrap();
    workspace.kanban_mut().add_task(NewTask::titled("kept")).unwrap();

    assert!(!workspace.delete_project(keep.id));
    assert!(workspace.delete_project(drop_me.id));

    let suffix = format!("::{}", drop_me.id);
    let keys = store.keys_with_prefix("").unwrap();
    assert!(keys.iter().all(|key| !key.ends_with(&suffix)));
    assert!(keys.contains(&format!("kanban.todo::{}", keep.id)));
    assert_eq!(workspace.registry().list().len(), 1);
}

#[test]
fn workspace_reopens_with_persisted_active_project() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig {
        database_path: Some(dir.path().join("tasky.db")),
        notes_debounce_ms: 0,
        ..CoreConfig::default()
    };

    let (project_id, note_id) = {
        let store: SqliteKvStore = config.open_store().unwrap();
        let mut workspace = Workspace::new(&store, &config).unwrap();
        let project = workspace.create_project("Studio", None).unwrap();
        workspace.set_active_project(Some(project.id)).unwrap();
        let note = workspace.notes_mut().create("kept", "saved at once").unwrap();
        (project.id, note.id)
    };

    let store = config.open_store().unwrap();
    let workspace = Workspace::new(&store, &config).unwrap();
    assert_eq!(workspace.active_project().map(|project| project.id), Some(project_id));
    assert!(workspace.notes().get(note_id).is_some());
}
