#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, TimeZone, Utc};
use taskkeep::model::{Tag, Task};
use taskkeep::store::{MemoryStore, Store};
use tempfile::TempDir;

/// Fixed reference instant shared by the integration tests.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
        .single()
        .expect("valid date")
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

/// Root task completed `days` before [`now`], created a week earlier.
pub fn completed_root(title: &str, days: i64) -> Task {
    Task::new(title, days_ago(days + 7)).completed(days_ago(days))
}

pub fn open_root(title: &str, created_days: i64) -> Task {
    Task::new(title, days_ago(created_days))
}

pub fn store_with(tasks: Vec<Task>) -> MemoryStore {
    let mut store = MemoryStore::new();
    for task in tasks {
        store.insert_task(task).expect("insert task");
    }
    store.save().expect("seed save");
    store
}

pub fn insert_tags(store: &mut MemoryStore, names: &[&str]) -> Vec<Tag> {
    let tags: Vec<Tag> = names.iter().map(|name| Tag::new(*name)).collect();
    for tag in &tags {
        store.insert_tag(tag.clone()).expect("insert tag");
    }
    tags
}

/// Root completed `days` ago with `subtasks` completed subtasks, seeded into
/// `store` and saved.
pub fn insert_tree(store: &mut MemoryStore, title: &str, days: i64, subtasks: usize) -> Task {
    let root = completed_root(title, days);
    store.insert_task(root.clone()).expect("insert root");
    for n in 0..subtasks {
        let child = Task::subtask_of(&root, format!("{title} step {}", n + 1), days_ago(days + 7))
            .completed(days_ago(days));
        store.insert_task(child).expect("insert subtask");
    }
    store.save().expect("seed save");
    store
        .fetch_task(&root.id)
        .expect("fetch root")
        .expect("root exists")
}

pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join(".taskkeep")
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join(".taskkeep.toml");
        std::fs::write(&path, contents).expect("write config");
        path
    }
}
