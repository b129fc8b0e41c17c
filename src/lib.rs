//! Data-access layer for the Pulsevo team-productivity dashboard.
//!
//! Mediates between UI views and two backends: the relational store,
//! queried directly for simple reads, and the aggregation service, which
//! answers analytical and AI-derived queries. A change bus keeps the UI
//! live without polling.
//!
//! Modules:
//! - window: symbolic time-window resolution
//! - filter: the closed task-query predicate shape
//! - router: per-request backend selection
//! - store / service: the two backend clients
//! - realtime: change-bus subscriptions and derived-metric refresh
//! - session: per-request credential attachment

pub mod config;
pub mod error;
pub mod filter;
pub mod realtime;
pub mod router;
pub mod service;
pub mod session;
pub mod store;
pub mod types;
pub mod window;

use std::sync::Arc;

pub use config::Config;
pub use error::DataError;
pub use filter::FilterSpec;
pub use realtime::{
    ChangeBus, ChangeChannel, ChangeEvent, EventClass, MemoryBus, RealtimeSubscriptionManager,
    SubscriptionHandle,
};
pub use router::{Backend, QueryRouter};
pub use service::AggregationServiceClient;
pub use session::{CredentialProvider, SessionStore};
pub use store::DirectStoreClient;
pub use types::{
    DistributionSlice, OverviewMetrics, ProjectStats, Task, TaskPriority, TaskStatus,
    TeamPerformance, TrendPoint, User,
};
pub use window::{DateRange, DateWindow};

/// The fully wired layer: one session, both clients, the router, and the
/// subscription manager, built from a single [`Config`]. The change-bus
/// transport is supplied by the embedding application.
pub struct DataLayer {
    pub session: SessionStore,
    pub store: Arc<DirectStoreClient>,
    pub service: Arc<AggregationServiceClient>,
    pub router: QueryRouter,
    pub realtime: RealtimeSubscriptionManager,
}

impl std::fmt::Debug for DataLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLayer").finish_non_exhaustive()
    }
}

impl DataLayer {
    pub fn new(config: &Config, bus: Arc<dyn ChangeBus>) -> Result<Self, DataError> {
        let store_url = config::parse_url(&config.store_url, "store_url")?;
        let api_url = config::parse_url(&config.api_base_url, "api_base_url")?;

        let session = SessionStore::new();
        let credentials: Arc<dyn CredentialProvider> = Arc::new(session.clone());

        let store = Arc::new(DirectStoreClient::new(store_url, &config.store_anon_key));
        let service = Arc::new(AggregationServiceClient::new(api_url, credentials));
        let router = QueryRouter::new(Arc::clone(&store), Arc::clone(&service));
        let realtime = RealtimeSubscriptionManager::new(bus, Arc::clone(&service));

        Ok(Self {
            session,
            store,
            service,
            router,
            realtime,
        })
    }
}
