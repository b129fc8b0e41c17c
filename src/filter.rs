//! Task query predicates.
//!
//! `FilterSpec` is the closed shape every task listing is described with.
//! Keeping the set of predicates closed lets the router pattern-match on it
//! and lets serialization emit stable parameter names instead of whatever
//! keys an ad hoc object happens to carry.

use crate::types::{TaskPriority, TaskStatus};
use crate::window::DateRange;

/// Optional predicates for a task listing. Predicates compose
/// conjunctively. Constructed per request; not mutated afterwards.
///
/// `status: None` is the "all tasks" case — the UI's no-op status choice
/// maps here rather than traveling as a sentinel string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub status: Option<TaskStatus>,
    pub project: Option<String>,
    pub assigned_to: Option<String>,
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring match on the task name.
    pub search: Option<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_assignee(mut self, user_id: impl Into<String>) -> Self {
        self.assigned_to = Some(user_id.into());
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    /// True if any predicate is set.
    pub fn has_predicates(&self) -> bool {
        self.status.is_some()
            || self.project.is_some()
            || self.assigned_to.is_some()
            || self.priority.is_some()
            || self.search.is_some()
    }

    /// Serialize for the aggregation service. Parameter names are fixed by
    /// this function, not by field iteration order, and absent predicates
    /// are omitted entirely so the backend's defaults govern.
    pub fn to_query_params(&self, range: Option<&DateRange>) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(project) = &self.project {
            params.push(("project", project.clone()));
        }
        if let Some(assigned_to) = &self.assigned_to {
            params.push(("assigned_to", assigned_to.clone()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority", priority.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(range) = range {
            params.extend(range.to_query_params());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_spec_has_no_predicates_and_no_params() {
        let spec = FilterSpec::new();
        assert!(!spec.has_predicates());
        assert!(spec.to_query_params(None).is_empty());
    }

    #[test]
    fn absent_predicates_are_omitted() {
        let spec = FilterSpec::new()
            .with_status(TaskStatus::Open)
            .with_search("deploy");

        let params = spec.to_query_params(None);
        assert_eq!(
            params,
            vec![
                ("status", "Open".to_string()),
                ("search", "deploy".to_string()),
            ]
        );
    }

    #[test]
    fn full_spec_serializes_with_stable_names() {
        let range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap(),
        };
        let spec = FilterSpec::new()
            .with_status(TaskStatus::InProgress)
            .with_project("Web Platform")
            .with_assignee("USER-001")
            .with_priority(TaskPriority::Critical)
            .with_search("auth");

        let names: Vec<&str> = spec
            .to_query_params(Some(&range))
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(
            names,
            vec![
                "status",
                "project",
                "assigned_to",
                "priority",
                "search",
                "start_date",
                "end_date",
            ]
        );
    }
}
