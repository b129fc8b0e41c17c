//! Data model for the dashboard's read path.
//!
//! All of these are owned by the backend stores; this layer only reads them.
//! Wire field names are snake_case, matching both the relational store's
//! columns and the aggregation service's JSON.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task lifecycle state. Closed enumeration; an unexpected string in a
/// response is a decode error, not a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. Variant order is the severity order, so `Ord` sorts
/// Low < Medium < High < Critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Critical => "Critical",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task row. `task_id` uniquely addresses exactly one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub task_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default)]
    pub project: Option<String>,
    /// References `User::user_id`; unassigned tasks carry null.
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    /// Comma-separated tag list, as stored.
    #[serde(default)]
    pub tags: Option<String>,
}

/// A user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    /// Short initials used for avatar rendering.
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Per-project aggregate. Derived by the aggregation service, never
/// persisted separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStats {
    pub project: String,
    pub total: i64,
    pub open: i64,
}

/// Per-team aggregate from `/team-performance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPerformance {
    pub name: String,
    pub completed: i64,
    pub in_progress: i64,
    pub open: i64,
}

/// Dashboard headline numbers from `/overview`. The `*_change` fields are
/// percentage deltas against the preceding period of equal length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewMetrics {
    pub open_tasks: i64,
    pub open_change: f64,
    pub in_progress: i64,
    pub progress_change: f64,
    pub completed_today: i64,
    pub today_change: f64,
    pub completed_this_hour: i64,
    pub hour_change: f64,
    pub completion_rate: f64,
    pub rate_change: f64,
    pub blocked_tasks: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
}

/// One slice of the `/distribution` chart payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSlice {
    pub name: String,
    pub value: i64,
    /// Display hint chosen by the backend.
    #[serde(default)]
    pub color: Option<String>,
}

/// One bucket of the `/trends` series. `date` is a backend-formatted label
/// (a day or a week span depending on the window size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub created: i64,
    pub completed: i64,
    pub in_progress: i64,
}
