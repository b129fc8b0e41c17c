//! Direct reads against the relational store.
//!
//! The store exposes a PostgREST surface: one path per table, predicates as
//! query parameters (`status=eq.Open`, `task_name=ilike.*auth*`), ordering
//! via `order=col.desc`. Predicates compose conjunctively. This client is
//! strictly read-only — the dashboard's write path, if any, lives elsewhere.

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::DataError;
use crate::filter::FilterSpec;
use crate::types::{Task, User};
use crate::window::{iso_instant, DateRange};

const TASKS_TABLE: &str = "tasks";
const USERS_TABLE: &str = "users";

pub struct DirectStoreClient {
    http: reqwest::Client,
    base: String,
    anon_key: String,
}

impl DirectStoreClient {
    /// `base` is the store's project URL; the REST surface hangs off
    /// `/rest/v1/`. The anon key is a project key, not the user credential.
    pub fn new(base: Url, anon_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.as_str().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Start a read against one table.
    pub fn select(&self, table: &str) -> SelectQuery<'_> {
        SelectQuery {
            client: self,
            table: table.to_string(),
            params: vec![("select".to_string(), "*".to_string())],
        }
    }

    /// Task listing with the standard predicate mapping and the default
    /// newest-first order.
    pub async fn tasks(
        &self,
        filter: &FilterSpec,
        range: Option<&DateRange>,
    ) -> Result<Vec<Task>, DataError> {
        let mut query = self.select(TASKS_TABLE);
        if let Some(status) = filter.status {
            query = query.eq("status", status.as_str());
        }
        if let Some(project) = &filter.project {
            query = query.eq("project", project);
        }
        if let Some(assigned_to) = &filter.assigned_to {
            query = query.eq("assigned_to", assigned_to);
        }
        if let Some(priority) = filter.priority {
            query = query.eq("priority", priority.as_str());
        }
        if let Some(search) = &filter.search {
            query = query.ilike("task_name", search);
        }
        if let Some(range) = range {
            query = query.date_between("created_date", range);
        }
        query.order_desc("created_date").fetch().await
    }

    /// User listing, optionally narrowed by a name substring.
    pub async fn users(&self, search: Option<&str>) -> Result<Vec<User>, DataError> {
        let mut query = self.select(USERS_TABLE);
        if let Some(needle) = search {
            query = query.ilike("name", needle);
        }
        query.fetch().await
    }

    /// Single task by id, or `NotFound`.
    pub async fn task(&self, task_id: &str) -> Result<Task, DataError> {
        self.get_one(TASKS_TABLE, "task_id", task_id).await
    }

    /// Single user by id, or `NotFound`.
    pub async fn user(&self, user_id: &str) -> Result<User, DataError> {
        self.get_one(USERS_TABLE, "user_id", user_id).await
    }

    async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        id_column: &str,
        id: &str,
    ) -> Result<T, DataError> {
        let rows: Vec<T> = self.select(table).eq(id_column, id).fetch().await?;
        rows.into_iter().next().ok_or_else(|| DataError::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        })
    }
}

/// One declarative read. Every predicate call ANDs onto the previous ones.
pub struct SelectQuery<'a> {
    client: &'a DirectStoreClient,
    table: String,
    params: Vec<(String, String)>,
}

impl SelectQuery<'_> {
    /// Exact equality.
    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Case-insensitive substring match.
    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        self.params
            .push((column.to_string(), format!("ilike.*{needle}*")));
        self
    }

    /// Inclusive range on a timestamp column.
    pub fn date_between(mut self, column: &str, range: &DateRange) -> Self {
        self.params
            .push((column.to_string(), format!("gte.{}", iso_instant(range.start))));
        self.params
            .push((column.to_string(), format!("lte.{}", iso_instant(range.end))));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.params
            .push(("order".to_string(), format!("{column}.desc")));
        self
    }

    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, DataError> {
        let url = format!("{}/rest/v1/{}", self.client.base, self.table);
        let resp = self
            .client
            .http
            .get(url)
            .header("apikey", &self.client.anon_key)
            .bearer_auth(&self.client.anon_key)
            .query(&self.params)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(DataError::Store(format!(
                "{} on {}: {}",
                status, self.table, body
            )));
        }

        serde_json::from_str(&body).map_err(DataError::Decode)
    }
}
