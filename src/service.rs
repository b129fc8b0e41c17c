//! HTTP client for the backend aggregation service.
//!
//! The service owns everything the direct store cannot express with plain
//! predicates: overview metrics, distributions, trend series, multi-criteria
//! task search, the AI-derived insight family, chat, and settings. Every
//! call attaches `Authorization: Bearer <token>` when the session has one;
//! the token is read per call and never cached here. No automatic retries —
//! the UI decides what a failure means.

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::DataError;
use crate::filter::FilterSpec;
use crate::session::CredentialProvider;
use crate::types::{
    DistributionSlice, OverviewMetrics, ProjectStats, Task, TeamPerformance, TrendPoint,
};
use crate::window::DateRange;

/// Team filter value the UI sends when no team is selected; treated the
/// same as an absent filter.
const TEAM_ALL: &str = "all";

pub struct AggregationServiceClient {
    http: reqwest::Client,
    base: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl AggregationServiceClient {
    /// `base` is the service root including the `/api` prefix.
    pub fn new(base: Url, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.as_str().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    // ------------------------------------------------------------------
    // Metrics family
    // ------------------------------------------------------------------

    pub async fn overview(&self, range: Option<&DateRange>) -> Result<OverviewMetrics, DataError> {
        self.get("overview", &range_params(range)).await
    }

    pub async fn distribution(
        &self,
        range: Option<&DateRange>,
    ) -> Result<Vec<DistributionSlice>, DataError> {
        self.get("distribution", &range_params(range)).await
    }

    pub async fn trends(&self, range: Option<&DateRange>) -> Result<Vec<TrendPoint>, DataError> {
        self.get("trends", &range_params(range)).await
    }

    pub async fn teams(&self) -> Result<Vec<String>, DataError> {
        self.get("teams", &[]).await
    }

    pub async fn team_performance(
        &self,
        range: Option<&DateRange>,
        team: Option<&str>,
    ) -> Result<Vec<TeamPerformance>, DataError> {
        let mut params = range_params(range);
        if let Some(team) = team.filter(|t| *t != TEAM_ALL) {
            params.push(("team", team.to_string()));
        }
        self.get("team-performance", &params).await
    }

    // ------------------------------------------------------------------
    // Tasks and projects
    // ------------------------------------------------------------------

    /// Task listing with an arbitrary predicate combination.
    pub async fn tasks(
        &self,
        filter: &FilterSpec,
        range: Option<&DateRange>,
    ) -> Result<Vec<Task>, DataError> {
        self.get("tasks", &filter.to_query_params(range)).await
    }

    pub async fn projects(&self) -> Result<Vec<String>, DataError> {
        self.get("projects", &[]).await
    }

    pub async fn project_stats(&self) -> Result<Vec<ProjectStats>, DataError> {
        self.get("projects/stats", &[]).await
    }

    // ------------------------------------------------------------------
    // AI-derived insights. Payload shapes belong to the backend; they are
    // passed through as JSON.
    // ------------------------------------------------------------------

    pub async fn ai_summary(&self, range: Option<&DateRange>) -> Result<Value, DataError> {
        self.get("ai/summary", &range_params(range)).await
    }

    pub async fn ai_closure_performance(
        &self,
        range: Option<&DateRange>,
    ) -> Result<Value, DataError> {
        self.get("ai/closure-performance", &range_params(range)).await
    }

    pub async fn ai_due_compliance(&self, range: Option<&DateRange>) -> Result<Value, DataError> {
        self.get("ai/due-compliance", &range_params(range)).await
    }

    pub async fn ai_predictions(&self, range: Option<&DateRange>) -> Result<Value, DataError> {
        self.get("ai/predictions", &range_params(range)).await
    }

    pub async fn ai_team_benchmarking(
        &self,
        range: Option<&DateRange>,
    ) -> Result<Value, DataError> {
        self.get("ai/team-benchmarking", &range_params(range)).await
    }

    pub async fn ai_productivity_trends(
        &self,
        range: Option<&DateRange>,
    ) -> Result<Value, DataError> {
        self.get("ai/productivity-trends", &range_params(range)).await
    }

    pub async fn ai_sentiment(&self, range: Option<&DateRange>) -> Result<Value, DataError> {
        self.get("ai/sentiment", &range_params(range)).await
    }

    /// All of the above in one round trip.
    pub async fn ai_dashboard(&self, range: Option<&DateRange>) -> Result<Value, DataError> {
        self.get("ai/dashboard", &range_params(range)).await
    }

    // ------------------------------------------------------------------
    // Chat and settings
    // ------------------------------------------------------------------

    /// Free-text query against the grounded chat endpoint.
    pub async fn chat(&self, query: &str) -> Result<Value, DataError> {
        self.post("chat", &serde_json::json!({ "query": query })).await
    }

    pub async fn settings(&self) -> Result<Value, DataError> {
        self.get("settings", &[]).await
    }

    pub async fn save_settings(&self, settings: &Value) -> Result<Value, DataError> {
        self.post("settings", settings).await
    }

    // ------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, DataError> {
        let mut req = self.http.get(self.endpoint(path));
        if !params.is_empty() {
            req = req.query(params);
        }
        self.execute(req).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, DataError> {
        self.execute(self.http.post(self.endpoint(path)).json(body))
            .await
    }

    async fn execute<T: DeserializeOwned>(&self, mut req: RequestBuilder) -> Result<T, DataError> {
        if let Some(token) = self.credentials.current_token() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DataError::Auth {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        if !status.is_success() {
            log::warn!("aggregation service rejected request: {status}");
            return Err(DataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(DataError::Decode)
    }
}

fn range_params(range: Option<&DateRange>) -> Vec<(&'static str, String)> {
    range.map(DateRange::to_query_params).unwrap_or_default()
}
