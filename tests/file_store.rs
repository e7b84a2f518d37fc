mod support;

use taskkeep::config::StoreConfig;
use taskkeep::model::{Attachment, Tag, Task};
use taskkeep::query::CompletionQueries;
use taskkeep::storage::Storage;
use taskkeep::store::{FileStore, Store, TaskFilter};
use taskkeep::{perform_housekeeping, RetentionPolicy};

use support::{completed_root, days_ago, now, TestRoot};

fn storage(root: &TestRoot) -> Storage {
    Storage::for_root(root.path().to_path_buf(), &StoreConfig::default())
}

#[test]
fn housekeeping_persists_across_reopen() {
    let root = TestRoot::new();
    let mut store = FileStore::init(storage(&root)).expect("init");

    let tag = Tag::new("Paperwork");
    store.insert_tag(tag.clone()).expect("tag");
    let parent = completed_root("File taxes", 200)
        .with_tag(&tag)
        .with_attachment(Attachment::new("w2.pdf", vec![0xde, 0xad]));
    store.insert_task(parent.clone()).expect("parent");
    let child = Task::subtask_of(&parent, "Collect forms", days_ago(210)).completed(days_ago(205));
    store.insert_task(child).expect("child");
    store.insert_task(completed_root("Recent", 2)).expect("recent");
    store.save().expect("seed");
    assert_eq!(store.revision(), 1);

    let stats = perform_housekeeping(&mut store, RetentionPolicy::default(), now()).expect("run");
    assert_eq!(stats.tasks_archived, 1);

    let reopened = FileStore::open(storage(&root)).expect("reopen");
    // The archive phase wrote; purge and prune had nothing to save.
    assert_eq!(reopened.revision(), 2);

    let live = reopened.fetch_tasks(TaskFilter::All).expect("fetch");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].title, "Recent");

    let entries = CompletionQueries::new(&reopened)
        .archived_completions(days_ago(365), now())
        .expect("archived");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title(), "File taxes");
    assert_eq!(entries[0].tag_names(), &["Paperwork".to_string()]);
    assert_eq!(entries[1].parent_title(), Some("File taxes"));
}

#[test]
fn store_document_has_no_attachment_after_archive() {
    let root = TestRoot::new();
    let mut store = FileStore::init(storage(&root)).expect("init");
    store
        .insert_task(
            completed_root("Scan receipts", 150)
                .with_attachment(Attachment::new("receipt.png", vec![7; 16])),
        )
        .expect("task");
    store.save().expect("seed");

    perform_housekeeping(&mut store, RetentionPolicy::default(), now()).expect("run");

    let raw = std::fs::read_to_string(storage(&root).store_file()).expect("read");
    assert!(!raw.contains("receipt.png"));
    assert!(raw.contains("Scan receipts"));
}

#[test]
fn custom_data_dir_is_honoured() {
    let root = TestRoot::new();
    let config = StoreConfig {
        dir: "state".to_string(),
    };
    let storage = Storage::for_root(root.path().to_path_buf(), &config);
    FileStore::init(storage).expect("init");

    assert!(root.path().join("state").join("store.json").exists());
    assert!(!root.data_dir().exists());
}
