//! Backend selection for task listings.
//!
//! The direct store answers plain listings cheaply and stays consistent
//! with the change bus; anything carrying a predicate — search, status,
//! multi-criteria — goes to the aggregation service, which can join and
//! rank in ways the store's predicate language cannot. The choice is a
//! pure function of the filter shape so callers can predict which backend
//! served a request. A failing backend is never papered over by the other
//! one: partial-result inconsistency is worse than a visible error.

use std::sync::Arc;

use crate::error::DataError;
use crate::filter::FilterSpec;
use crate::service::AggregationServiceClient;
use crate::store::DirectStoreClient;
use crate::types::Task;
use crate::window::DateRange;

/// Which backend serves a given task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    DirectStore,
    AggregationService,
}

impl Backend {
    /// Deterministic, side-effect-free routing policy. The date range is
    /// not part of the decision; both backends accept it as a predicate.
    pub fn for_filter(filter: &FilterSpec) -> Backend {
        if filter.has_predicates() {
            Backend::AggregationService
        } else {
            Backend::DirectStore
        }
    }
}

pub struct QueryRouter {
    store: Arc<DirectStoreClient>,
    service: Arc<AggregationServiceClient>,
}

impl QueryRouter {
    pub fn new(store: Arc<DirectStoreClient>, service: Arc<AggregationServiceClient>) -> Self {
        Self { store, service }
    }

    /// Dispatch a task listing to the backend `Backend::for_filter` picks.
    /// Errors propagate from that backend; there is no fallback.
    pub async fn list_tasks(
        &self,
        filter: &FilterSpec,
        range: Option<&DateRange>,
    ) -> Result<Vec<Task>, DataError> {
        match Backend::for_filter(filter) {
            Backend::DirectStore => {
                log::debug!("task listing routed to the direct store");
                self.store.tasks(filter, range).await
            }
            Backend::AggregationService => {
                log::debug!("task listing routed to the aggregation service");
                self.service.tasks(filter, range).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::types::{TaskPriority, TaskStatus};
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn empty_filter_selects_the_direct_store() {
        assert_eq!(Backend::for_filter(&FilterSpec::new()), Backend::DirectStore);
    }

    #[test]
    fn any_predicate_selects_the_aggregation_service() {
        let cases = [
            FilterSpec::new().with_search("x"),
            FilterSpec::new().with_status(TaskStatus::Open),
            FilterSpec::new().with_project("Mobile App"),
            FilterSpec::new().with_assignee("USER-007"),
            FilterSpec::new().with_priority(TaskPriority::Low),
        ];
        for filter in cases {
            assert_eq!(
                Backend::for_filter(&filter),
                Backend::AggregationService,
                "filter: {filter:?}"
            );
        }
    }

    #[test]
    fn decision_is_stable_for_the_same_shape() {
        let filter = FilterSpec::new().with_search("x");
        let first = Backend::for_filter(&filter);
        for _ in 0..10 {
            assert_eq!(Backend::for_filter(&filter), first);
        }
    }

    fn router_for(server: &MockServer) -> QueryRouter {
        let base = Url::parse(&server.uri()).unwrap();
        let api = Url::parse(&format!("{}/api", server.uri())).unwrap();
        let store = Arc::new(DirectStoreClient::new(base, "anon-key"));
        let service = Arc::new(AggregationServiceClient::new(
            api,
            Arc::new(SessionStore::new()),
        ));
        QueryRouter::new(store, service)
    }

    #[tokio::test]
    async fn status_filter_reaches_the_service_tasks_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .and(query_param("status", "Open"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
            .mount(&server)
            .await;

        let filter = FilterSpec::new().with_status(TaskStatus::Open);
        let tasks = router_for(&server).list_tasks(&filter, None).await.unwrap();
        assert!(tasks.is_empty());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/api/tasks");
    }

    #[tokio::test]
    async fn empty_filter_reaches_the_store_not_the_service() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
            .mount(&server)
            .await;

        router_for(&server)
            .list_tasks(&FilterSpec::new(), None)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.path(), "/rest/v1/tasks");
    }

    #[tokio::test]
    async fn backend_failure_propagates_without_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let filter = FilterSpec::new().with_search("x");
        let err = router_for(&server)
            .list_tasks(&filter, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Status { status: 500, .. }));

        // The direct store was never consulted as a fallback.
        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.url.path() == "/api/tasks"));
    }
}
