#![allow(dead_code)]

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};
use taskdeck_core::config::{DEFAULT_CHANNEL_NAME, DEFAULT_STORAGE_KEY};
use taskdeck_core::{
    BroadcastHub, KeyValueStore, LocalSnapshotStore, MemoryKeyValueStore, NoticeLevel,
    RecordingSink, TabSynchronizer, TaskSession, TaskStore, UuidIdGenerator,
};

/// Clock that moves forward one second on every read.
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    pub fn starting(start: DateTime<Utc>) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Default for SteppingClock {
    fn default() -> Self {
        Self::starting(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap())
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        let mut next = self.next.lock().unwrap();
        let now = *next;
        *next = now + Duration::seconds(1);
        now
    }
}

pub type MemorySession = TaskSession<MemoryKeyValueStore, RecordingSink>;

pub fn clock() -> Arc<SteppingClock> {
    Arc::new(SteppingClock::default())
}

/// Opens a session over `kv` on the default topic of `hub`.
pub fn open_session<K: KeyValueStore>(
    hub: &BroadcastHub,
    kv: K,
) -> TaskSession<K, RecordingSink> {
    let store = TaskStore::new(Box::new(UuidIdGenerator), clock());
    let local = LocalSnapshotStore::new(kv, DEFAULT_STORAGE_KEY);
    let sync = TabSynchronizer::join(hub, DEFAULT_CHANNEL_NAME).unwrap();
    TaskSession::open(store, local, sync, RecordingSink::new())
}

pub fn error_notices(session: &mut MemorySession) -> Vec<String> {
    session
        .ui_mut()
        .take_notices()
        .into_iter()
        .filter(|notice| notice.level == NoticeLevel::Error)
        .map(|notice| notice.message)
        .collect()
}
