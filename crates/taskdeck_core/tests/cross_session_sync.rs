mod common;

use common::{open_session, MemorySession};
use taskdeck_core::config::{DEFAULT_CHANNEL_NAME, DEFAULT_STORAGE_KEY};
use taskdeck_core::persist::snapshot;
use taskdeck_core::{
    BroadcastHub, KeyValueStore, MemoryKeyValueStore, NoticeLevel, StatusFilter, SyncMessage, TaskId,
    ToggledPayload,
};

fn stored(session: &MemorySession) -> Vec<taskdeck_core::Task> {
    session
        .local()
        .kv()
        .get_item(DEFAULT_STORAGE_KEY)
        .unwrap()
        .map(|raw| snapshot::decode(&raw).unwrap())
        .unwrap_or_default()
}

fn pair(hub: &BroadcastHub) -> (MemorySession, MemorySession) {
    (
        open_session(hub, MemoryKeyValueStore::new()),
        open_session(hub, MemoryKeyValueStore::new()),
    )
}

#[test]
fn added_task_reaches_other_session_and_its_slot() {
    let hub = BroadcastHub::new();
    let (mut a, mut b) = pair(&hub);

    let task = a.add("Buy milk", "2% milk", None).unwrap();
    assert_eq!(a.pump(), 0);
    assert_eq!(b.pump(), 1);

    assert_eq!(b.store().get(&task.id), Some(&task));
    assert_eq!(stored(&b), vec![task.clone()]);
    assert_eq!(b.ui().last_render, vec![task]);
    let notices = b.ui_mut().take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);

    assert_eq!(b.pump(), 0);
    assert!(b.ui().notices.is_empty());
}

#[test]
fn toggle_update_and_delete_propagate() {
    let hub = BroadcastHub::new();
    let (mut a, mut b) = pair(&hub);
    let first = a.add("first", "one", None).unwrap();
    let second = a.add("second", "two", None).unwrap();
    b.pump();

    a.toggle(&first.id).unwrap();
    let edited = a
        .update(&second.id, "second", "two, edited", Some("2026-10-21T07:30"))
        .unwrap();
    assert_eq!(b.pump(), 2);
    assert!(b.store().get(&first.id).unwrap().completed);
    assert_eq!(b.store().get(&second.id), Some(&edited));

    a.remove(&first.id).unwrap();
    assert_eq!(b.pump(), 1);
    assert!(b.store().get(&first.id).is_none());
    assert_eq!(b.store().tasks(), a.store().tasks());
    assert_eq!(stored(&b), b.store().tasks());
}

#[test]
fn messages_for_unknown_ids_are_ignored() {
    let hub = BroadcastHub::new();
    let (mut a, mut b) = pair(&hub);
    a.add("only", "task", None).unwrap();
    b.pump();
    let renders = b.ui().render_count;
    let before = b.store().tasks().to_vec();

    let outsider = hub.channel(DEFAULT_CHANNEL_NAME).unwrap();
    let ghost = TaskId::from("ghost");
    outsider
        .post(&SyncMessage::TaskDeleted(ghost.clone()))
        .unwrap();
    outsider
        .post(&SyncMessage::TaskToggled(ToggledPayload {
            id: ghost,
            completed: true,
        }))
        .unwrap();

    assert_eq!(b.pump(), 0);
    assert_eq!(b.store().tasks(), before.as_slice());
    assert_eq!(b.ui().render_count, renders);
}

#[test]
fn full_replacement_is_applied_but_not_saved_by_receiver() {
    let hub = BroadcastHub::new();
    let (mut a, mut b) = pair(&hub);
    a.add("old", "task", None).unwrap();
    b.pump();
    let b_slot_before = stored(&b);

    a.replace_all_json(serde_json::json!([
        {"id": 7, "title": "imported", "description": "from file", "completed": false,
         "createdAt": "2026-01-01T00:00:00.000Z"}
    ]))
    .unwrap();
    assert_eq!(b.pump(), 1);

    assert_eq!(b.store().tasks(), a.store().tasks());
    assert_eq!(b.store().tasks()[0].id, TaskId::Number(7));
    assert_eq!(stored(&b), b_slot_before);
}

#[test]
fn duplicate_add_overwrites_in_place() {
    let hub = BroadcastHub::new();
    let (mut a, mut b) = pair(&hub);
    let task = a.add("same", "id", None).unwrap();
    b.pump();

    let outsider = hub.channel(DEFAULT_CHANNEL_NAME).unwrap();
    let mut replayed = task.clone();
    replayed.description = "changed elsewhere".to_string();
    outsider.post(&SyncMessage::TaskAdded(replayed.clone())).unwrap();

    assert_eq!(b.pump(), 1);
    assert_eq!(b.store().len(), 1);
    assert_eq!(b.store().get(&task.id), Some(&replayed));
}

#[test]
fn sequential_edits_converge_last_writer_wins() {
    let hub = BroadcastHub::new();
    let (mut a, mut b) = pair(&hub);
    let task = a.add("shared", "v1", None).unwrap();
    b.pump();

    a.update(&task.id, "shared", "v2 from a", None).unwrap();
    b.pump();
    b.update(&task.id, "shared", "v3 from b", None).unwrap();
    a.pump();

    let view_a = a.list(StatusFilter::All, "");
    let view_b = b.list(StatusFilter::All, "");
    assert_eq!(view_a, view_b);
    assert_eq!(view_a[0].description, "v3 from b");
}

#[test]
fn three_sessions_converge_after_pumping() {
    let hub = BroadcastHub::new();
    let mut sessions = (0..3)
        .map(|_| open_session(&hub, MemoryKeyValueStore::new()))
        .collect::<Vec<_>>();

    for (index, session) in sessions.iter_mut().enumerate() {
        session
            .add(&format!("from {index}"), "hello", None)
            .unwrap();
    }
    for session in sessions.iter_mut() {
        session.pump();
    }

    let reference = sessions[0].list(StatusFilter::All, "");
    assert_eq!(reference.len(), 3);
    for session in &sessions[1..] {
        assert_eq!(session.list(StatusFilter::All, ""), reference);
    }
}
