//! Change-bus subscriptions and derived-metric refresh.
//!
//! The change bus announces row-level mutations per table. Each distinct
//! (table, event class) pair is backed by at most one bus channel; repeated
//! subscribe calls share that channel through a reference-counted registry
//! and each subscriber gets its own bounded delivery queue. The last
//! release closes the underlying channel.
//!
//! Derived aggregates (the overview numbers) cannot be subscribed to
//! directly — they are not table rows, and their correctness depends on
//! the full current state, not on one row's delta. For those, a
//! subscription listens on the source table and re-fetches the aggregate
//! from the service on every matching change, delivering the fresh result
//! instead of the raw payload.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::DataError;
use crate::service::AggregationServiceClient;
use crate::types::OverviewMetrics;
use crate::window::DateWindow;

/// Buffer size for each delivery queue. A UI that falls this far behind
/// has bigger problems than backpressure.
const CHANNEL_CAPACITY: usize = 64;

/// Source table for the overview aggregate.
const TASKS_TABLE: &str = "tasks";

/// Row-mutation class a subscription listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventClass {
    Insert,
    Update,
    Delete,
    /// Matches every class.
    #[serde(rename = "*")]
    All,
}

impl EventClass {
    pub fn matches(&self, event: EventClass) -> bool {
        *self == EventClass::All || *self == event
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventClass::Insert => "INSERT",
            EventClass::Update => "UPDATE",
            EventClass::Delete => "DELETE",
            EventClass::All => "*",
        }
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One announced mutation. `row` is the post-change state, or the
/// pre-change state for deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub class: EventClass,
    pub row: Value,
}

/// A live stream of change events for one (table, event class) pair.
/// Dropping the receiver closes the channel.
pub struct ChangeChannel {
    pub events: mpsc::Receiver<ChangeEvent>,
}

/// The change-notification infrastructure. Implementations adapt whatever
/// transport the deployment uses; `MemoryBus` below serves tests and local
/// development. Events on one channel arrive in the store's commit order.
#[async_trait]
pub trait ChangeBus: Send + Sync {
    async fn open(&self, table: &str, class: EventClass) -> Result<ChangeChannel, DataError>;
}

/// Caller-owned token for one active subscription. Released explicitly via
/// [`RealtimeSubscriptionManager::unsubscribe`]; dropping it does not
/// release anything.
pub struct SubscriptionHandle {
    key: ChannelKey,
    id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChannelKey {
    table: String,
    class: EventClass,
}

type EventFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type EventHandler = Box<dyn Fn(ChangeEvent) -> EventFuture + Send + Sync>;

struct Subscriber {
    tx: mpsc::Sender<ChangeEvent>,
    consumer: JoinHandle<()>,
}

struct ChannelEntry {
    pump: JoinHandle<()>,
    subscribers: Arc<Mutex<HashMap<u64, Subscriber>>>,
}

pub struct RealtimeSubscriptionManager {
    bus: Arc<dyn ChangeBus>,
    service: Arc<AggregationServiceClient>,
    registry: tokio::sync::Mutex<HashMap<ChannelKey, ChannelEntry>>,
    next_id: AtomicU64,
}

impl RealtimeSubscriptionManager {
    pub fn new(bus: Arc<dyn ChangeBus>, service: Arc<AggregationServiceClient>) -> Self {
        Self {
            bus,
            service,
            registry: tokio::sync::Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to raw change events on one table. The callback runs
    /// exactly once per matching event, in arrival order.
    pub async fn subscribe<F>(
        &self,
        table: &str,
        class: EventClass,
        callback: F,
    ) -> Result<SubscriptionHandle, DataError>
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let handler: EventHandler = Box::new(move |event| {
            callback(event);
            Box::pin(async {})
        });
        self.register(table, class, handler).await
    }

    /// Derived-metric subscription: any change to the tasks table triggers
    /// a fresh `/overview` call, and the callback receives that call's
    /// outcome — never the raw row payload. Refresh failures are delivered
    /// as errors, not dropped.
    pub async fn subscribe_overview<F>(
        &self,
        window: DateWindow,
        callback: F,
    ) -> Result<SubscriptionHandle, DataError>
    where
        F: Fn(Result<OverviewMetrics, DataError>) + Send + Sync + 'static,
    {
        let service = Arc::clone(&self.service);
        let callback = Arc::new(callback);
        let handler: EventHandler = Box::new(move |_event| {
            let service = Arc::clone(&service);
            let callback = Arc::clone(&callback);
            Box::pin(async move {
                let range = window.resolve();
                callback(service.overview(range.as_ref()).await);
            })
        });
        self.register(TASKS_TABLE, EventClass::All, handler).await
    }

    /// Release a subscription. Idempotent: releasing an already-released
    /// handle is a no-op. After this returns, the handle's callback is not
    /// invoked again; the last release on a channel closes it.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut registry = self.registry.lock().await;
        let Some(entry) = registry.get(&handle.key) else {
            return;
        };
        let Some(subscriber) = entry.subscribers.lock().remove(&handle.id) else {
            return;
        };
        subscriber.consumer.abort();

        let drained = entry.subscribers.lock().is_empty();
        if drained {
            if let Some(entry) = registry.remove(&handle.key) {
                entry.pump.abort();
                log::debug!(
                    "closed change channel for {}/{}",
                    handle.key.table,
                    handle.key.class
                );
            }
        }
    }

    /// Number of currently open bus channels. Diagnostic only.
    pub async fn open_channels(&self) -> usize {
        self.registry.lock().await.len()
    }

    async fn register(
        &self,
        table: &str,
        class: EventClass,
        handler: EventHandler,
    ) -> Result<SubscriptionHandle, DataError> {
        let key = ChannelKey {
            table: table.to_string(),
            class,
        };

        let mut registry = self.registry.lock().await;
        if !registry.contains_key(&key) {
            let channel = self.bus.open(table, class).await?;
            let subscribers: Arc<Mutex<HashMap<u64, Subscriber>>> =
                Arc::new(Mutex::new(HashMap::new()));
            let pump = spawn_pump(key.clone(), channel, Arc::clone(&subscribers));
            registry.insert(key.clone(), ChannelEntry { pump, subscribers });
            log::debug!("opened change channel for {table}/{class}");
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = mpsc::channel::<ChangeEvent>(CHANNEL_CAPACITY);
        let consumer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                handler(event).await;
            }
        });

        if let Some(entry) = registry.get(&key) {
            entry
                .subscribers
                .lock()
                .insert(id, Subscriber { tx, consumer });
        }

        Ok(SubscriptionHandle { key, id })
    }
}

/// Forward bus events to every live subscriber queue, one send per
/// subscriber per event.
fn spawn_pump(
    key: ChannelKey,
    mut channel: ChangeChannel,
    subscribers: Arc<Mutex<HashMap<u64, Subscriber>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = channel.events.recv().await {
            // Snapshot the senders so the lock is not held across sends.
            let targets: Vec<mpsc::Sender<ChangeEvent>> =
                subscribers.lock().values().map(|s| s.tx.clone()).collect();
            for tx in targets {
                // A send failure means the subscriber was released
                // between the snapshot and now.
                let _ = tx.send(event.clone()).await;
            }
        }
        if !subscribers.lock().is_empty() {
            log::warn!(
                "change channel for {}/{} closed by the backend",
                key.table,
                key.class
            );
        }
    })
}

/// In-process change bus. Used by the test suite and local development;
/// deployments plug their transport in via the [`ChangeBus`] trait.
#[derive(Default)]
pub struct MemoryBus {
    channels: Mutex<Vec<MemoryChannel>>,
}

struct MemoryChannel {
    table: String,
    class: EventClass,
    tx: mpsc::Sender<ChangeEvent>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce a mutation to every channel whose table and class match.
    pub async fn publish(&self, table: &str, event: ChangeEvent) {
        let targets: Vec<mpsc::Sender<ChangeEvent>> = self
            .channels
            .lock()
            .iter()
            .filter(|c| c.table == table && c.class.matches(event.class))
            .map(|c| c.tx.clone())
            .collect();
        for tx in targets {
            let _ = tx.send(event.clone()).await;
        }
        self.channels.lock().retain(|c| !c.tx.is_closed());
    }
}

#[async_trait]
impl ChangeBus for MemoryBus {
    async fn open(&self, table: &str, class: EventClass) -> Result<ChangeChannel, DataError> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.channels.lock().push(MemoryChannel {
            table: table.to_string(),
            class,
            tx,
        });
        Ok(ChangeChannel { events: rx })
    }
}
