use std::collections::HashSet;

use callboard_protocol::{TaskListUpdate, TaskStatus, TaskStatusEntry};
use chrono::Utc;
use parking_lot::Mutex;

/// Process-wide call checklist state.
///
/// The checklist is fixed at startup; `completed` is reset at the start of
/// each call and only ever grows within one - completion is monotonic.
pub struct TaskBoard {
    checklist: Vec<String>,
    completed: Mutex<HashSet<String>>,
}

impl TaskBoard {
    pub fn new(checklist: Vec<String>) -> Self {
        Self {
            checklist,
            completed: Mutex::new(HashSet::new()),
        }
    }

    /// Resets completion state - called when a new call begins.
    pub fn reset(&self) {
        self.completed.lock().clear();
    }

    /// Not-yet-completed task descriptions, in checklist order.
    pub fn pending(&self) -> Vec<String> {
        let completed = self.completed.lock();
        self.checklist
            .iter()
            .filter(|task| !completed.contains(*task))
            .cloned()
            .collect()
    }

    /// Merges newly completed descriptions (union, never removal).
    /// Returns whether anything actually changed. Descriptions not on the
    /// checklist are ignored.
    pub fn complete(&self, tasks: &[String]) -> bool {
        let mut completed = self.completed.lock();
        let mut changed = false;
        for task in tasks {
            if self.checklist.contains(task) && completed.insert(task.clone()) {
                changed = true;
            }
        }
        changed
    }

    /// Authoritative snapshot for broadcast, in checklist order.
    pub fn snapshot(&self, call_sid: Option<&str>) -> TaskListUpdate {
        let completed = self.completed.lock();
        let tasks_with_status: Vec<TaskStatusEntry> = self
            .checklist
            .iter()
            .map(|task| TaskStatusEntry {
                task: task.clone(),
                status: if completed.contains(task) {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Pending
                },
            })
            .collect();
        let completed_count = tasks_with_status
            .iter()
            .filter(|entry| entry.status == TaskStatus::Completed)
            .count();

        TaskListUpdate {
            call_sid: call_sid.map(str::to_string),
            completed_count,
            total_count: tasks_with_status.len(),
            tasks_with_status,
            timestamp: Utc::now(),
        }
    }
}
