//! Conversion of a completed task tree into log entries.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{Tag, TagId, Task, TaskId};
use crate::snapshot::{LogEntryFields, TaskLogEntry};
use crate::store::{Store, StoreResult};

/// A task with its tags and subtasks resolved from the store.
#[derive(Debug, Clone)]
pub struct TaskTree {
    pub task: Task,
    pub tags: Vec<Tag>,
    pub children: Vec<TaskTree>,
}

impl TaskTree {
    /// Resolve `root`'s subtasks depth-first through `store`.
    ///
    /// Subtask references that no longer resolve are skipped, as are
    /// references that would revisit a task already in the tree.
    pub fn load<S: Store + ?Sized>(
        store: &S,
        root: Task,
        tags: &HashMap<TagId, Tag>,
    ) -> StoreResult<Self> {
        let mut visited = HashSet::from([root.id.clone()]);
        load_node(store, root, tags, &mut visited)
    }

    /// Number of tasks in the tree, root included.
    pub fn task_count(&self) -> usize {
        1 + self.children.iter().map(TaskTree::task_count).sum::<usize>()
    }
}

fn load_node<S: Store + ?Sized>(
    store: &S,
    task: Task,
    tags: &HashMap<TagId, Tag>,
    visited: &mut HashSet<TaskId>,
) -> StoreResult<TaskTree> {
    let mut children = Vec::with_capacity(task.subtasks.len());
    for child_id in &task.subtasks {
        if !visited.insert(child_id.clone()) {
            tracing::debug!(
                task = %task.id,
                subtask = %child_id,
                "skipping repeated subtask reference"
            );
            continue;
        }
        match store.fetch_task(child_id)? {
            Some(child) => children.push(load_node(store, child, tags, visited)?),
            None => {
                tracing::debug!(
                    task = %task.id,
                    subtask = %child_id,
                    "skipping dangling subtask reference"
                );
            }
        }
    }

    let task_tags = task
        .tags
        .iter()
        .filter_map(|id| tags.get(id).cloned())
        .collect();

    Ok(TaskTree {
        task,
        tags: task_tags,
        children,
    })
}

/// Flatten `tree` into one log entry per task, root first, then subtasks in
/// order.
///
/// The root must carry a completion timestamp. A subtask without one is
/// recorded as completed together with the root. `archived_at` is stamped on
/// every entry.
pub fn archive_tree(tree: &TaskTree, archived_at: DateTime<Utc>) -> Result<Vec<TaskLogEntry>> {
    let root_completed = tree
        .task
        .completion_date()
        .ok_or_else(|| Error::IncompleteTask {
            task_id: tree.task.id.clone(),
            field: "completion timestamp",
        })?;

    let root = RootStamp {
        task_id: &tree.task.id,
        completed_at: root_completed,
        archived_at,
    };
    let mut entries = Vec::with_capacity(tree.task_count());
    collect_entries(tree, None, &root, &mut entries);
    Ok(entries)
}

/// Values shared by every entry of one archived tree.
struct RootStamp<'a> {
    task_id: &'a TaskId,
    completed_at: DateTime<Utc>,
    archived_at: DateTime<Utc>,
}

fn collect_entries(
    node: &TaskTree,
    parent_title: Option<&str>,
    root: &RootStamp<'_>,
    out: &mut Vec<TaskLogEntry>,
) {
    let task = &node.task;
    let completed_at = task.completion_date().unwrap_or(root.completed_at);
    let completed_subtasks = node
        .children
        .iter()
        .filter(|child| child.task.is_completed)
        .count();

    out.push(TaskLogEntry::from_fields(LogEntryFields {
        task_id: task.id.clone(),
        title: task.title.clone(),
        description: task.description.clone(),
        completed_at,
        created_at: task.created_at,
        due_at: task.due_at,
        priority: task.priority,
        was_overdue: task.was_overdue_at(completed_at),
        subtask_count: count_u32(node.children.len()),
        completed_subtask_count: count_u32(completed_subtasks),
        parent_title: parent_title.map(str::to_string),
        tag_names: node.tags.iter().map(|tag| tag.name.clone()).collect(),
        root_task_id: root.task_id.clone(),
        root_completed_at: root.completed_at,
        archived_at: root.archived_at,
    }));

    for child in &node.children {
        collect_entries(child, Some(&task.title), root, out);
    }
}

fn count_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    fn leaf(task: Task) -> TaskTree {
        TaskTree {
            task,
            tags: Vec::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn minimal_task_produces_single_entry() {
        let task = Task::new("Call plumber", now() - Duration::days(130))
            .completed(now() - Duration::days(120));
        let entries = archive_tree(&leaf(task.clone()), now()).expect("archive");

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.task_id(), &task.id);
        assert_eq!(entry.title(), "Call plumber");
        assert!(!entry.was_subtask());
        assert_eq!(entry.parent_title(), None);
        assert!(entry.tag_names().is_empty());
        assert_eq!(entry.subtask_count(), 0);
        assert_eq!(entry.archived_at(), now());
        assert_eq!(entry.completion_duration(), Some(Duration::days(10)));
    }

    #[test]
    fn incomplete_root_is_rejected() {
        let task = Task::new("Never finished", now() - Duration::days(200));
        let err = archive_tree(&leaf(task), now()).expect_err("incomplete");
        assert!(matches!(
            err,
            Error::IncompleteTask {
                field: "completion timestamp",
                ..
            }
        ));
    }

    #[test]
    fn subtasks_are_flattened_with_parent_titles() {
        let created = now() - Duration::days(150);
        let completed = now() - Duration::days(120);
        let root = Task::new("Launch", created).completed(completed);
        let done = Task::subtask_of(&root, "Write copy", created).completed(completed);
        let open = Task::subtask_of(&root, "Translate", created);
        let nested = Task::subtask_of(&done, "Proofread", created).completed(completed);

        let tree = TaskTree {
            task: root.clone(),
            tags: Vec::new(),
            children: vec![
                TaskTree {
                    task: done.clone(),
                    tags: Vec::new(),
                    children: vec![leaf(nested.clone())],
                },
                leaf(open.clone()),
            ],
        };

        let entries = archive_tree(&tree, now()).expect("archive");
        let titles: Vec<&str> = entries.iter().map(|entry| entry.title()).collect();
        assert_eq!(titles, vec!["Launch", "Write copy", "Proofread", "Translate"]);

        assert_eq!(entries[0].subtask_count(), 2);
        assert_eq!(entries[0].completed_subtask_count(), 1);
        assert_eq!(entries[1].parent_title(), Some("Launch"));
        assert_eq!(entries[2].parent_title(), Some("Write copy"));
        assert!(entries[1..].iter().all(TaskLogEntry::was_subtask));

        // The open subtask is stamped with the root's completion.
        assert_eq!(entries[3].completed_at(), completed);
        assert!(entries.iter().all(|entry| entry.root_task_id() == &root.id));
        assert!(entries
            .iter()
            .all(|entry| entry.root_completed_at() == completed));
    }

    #[test]
    fn subtask_keeps_its_own_completion_and_overdue_flag() {
        let root_completed = now() - Duration::days(120);
        let child_completed = now() - Duration::days(400);
        let root = Task::new("Renovate", now() - Duration::days(500)).completed(root_completed);
        let child = Task::subtask_of(&root, "Pick tiles", now() - Duration::days(500))
            .with_due(now() - Duration::days(410))
            .completed(child_completed);
        let tree = TaskTree {
            task: root.clone(),
            tags: Vec::new(),
            children: vec![leaf(child)],
        };

        let entries = archive_tree(&tree, now()).expect("archive");
        assert_eq!(entries[1].completed_at(), child_completed);
        assert_eq!(entries[1].root_completed_at(), root_completed);
        assert!(entries[1].was_overdue());
        assert!(!entries[0].was_overdue());
    }

    #[test]
    fn source_tree_is_not_mutated() {
        let tag = Tag::new("Work");
        let task = Task::new("Tagged", now() - Duration::days(100))
            .with_tag(&tag)
            .completed(now() - Duration::days(95));
        let tree = TaskTree {
            task: task.clone(),
            tags: vec![tag.clone()],
            children: Vec::new(),
        };

        let entries = archive_tree(&tree, now()).expect("archive");
        assert_eq!(entries[0].tag_names(), &["Work".to_string()]);
        assert_eq!(tree.task, task);
        assert_eq!(tree.tags, vec![tag]);
    }

    #[test]
    fn load_resolves_tags_and_skips_dangling_subtasks() {
        let mut store = MemoryStore::new();
        let tag = Tag::new("Errand");
        store.insert_tag(tag.clone()).expect("tag");

        let created = now() - Duration::days(100);
        let mut root = Task::new("Groceries", created).with_tag(&tag);
        root.subtasks.push(TaskId::from("missing-child"));
        store.insert_task(root.clone()).expect("root");
        let child = Task::subtask_of(&root, "Milk", created);
        store.insert_task(child.clone()).expect("child");

        let root = store.fetch_task(&root.id).expect("fetch").expect("root");
        let index = HashMap::from([(tag.id.clone(), tag.clone())]);
        let tree = TaskTree::load(&store, root, &index).expect("load");

        assert_eq!(tree.tags, vec![tag]);
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].task.id, child.id);
        assert_eq!(tree.task_count(), 2);
    }
}
