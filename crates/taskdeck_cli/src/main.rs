//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taskdeck_core` linkage.
//! - Report what the configured local slot currently holds.

use std::process::ExitCode;
use taskdeck_core::{AppConfig, LocalSnapshotStore, SqliteKeyValueStore};

fn main() -> ExitCode {
    println!("taskdeck_core ping={}", taskdeck_core::ping());
    println!("taskdeck_core version={}", taskdeck_core::core_version());

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("taskdeck config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    let kv = match SqliteKeyValueStore::open(&config.db_path) {
        Ok(kv) => kv,
        Err(err) => {
            eprintln!("taskdeck storage error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let local = LocalSnapshotStore::new(kv, config.storage_key.clone());
    let outcome = local.load();
    let completed = outcome.tasks.iter().filter(|task| task.completed).count();
    println!("taskdeck db_path={}", config.db_path.display());
    println!(
        "taskdeck tasks total={} completed={} pending={}",
        outcome.tasks.len(),
        completed,
        outcome.tasks.len() - completed
    );
    if let Some(err) = outcome.error {
        eprintln!("taskdeck slot unreadable: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
