//! Feed hub — one upstream store feed per query shape, fanned out to N
//! subscribers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use shelf_access::AccessEngine;
use shelf_core::config::realtime::RealtimeConfig;
use shelf_core::result::AppResult;
use shelf_entity::folder::Folder;
use shelf_store::query::FolderQuery;
use shelf_store::store::FolderStore;

use crate::scope::StreamScope;
use crate::subscription::FolderSubscription;

/// A single upstream change feed shared by every subscriber of one query
/// shape.
struct Upstream {
    /// Snapshot fanout to subscriber pumps.
    tx: broadcast::Sender<Arc<Vec<Folder>>>,
    /// Nudges the pump to re-query and broadcast, used when a subscriber
    /// joins.
    refresh: mpsc::Sender<()>,
    /// Number of live subscriptions.
    refs: AtomicUsize,
    /// The pump task holding the store feed.
    pump: JoinHandle<()>,
}

/// Registry of upstream feeds and the entry point for live folder streams.
pub struct FeedHub {
    /// Folder store, source of truth for snapshots and feeds.
    store: Arc<dyn FolderStore>,
    /// Engine used to re-filter every emission per subscriber.
    engine: Arc<AccessEngine>,
    /// Fanout settings.
    config: RealtimeConfig,
    /// Query shape → shared upstream.
    upstreams: DashMap<FolderQuery, Arc<Upstream>>,
}

impl std::fmt::Debug for FeedHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedHub")
            .field("upstreams", &self.upstreams.len())
            .finish()
    }
}

impl FeedHub {
    /// Creates a new hub.
    pub fn new(
        store: Arc<dyn FolderStore>,
        engine: Arc<AccessEngine>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            store,
            engine,
            config,
            upstreams: DashMap::new(),
        }
    }

    /// Open a live stream for a viewing scope.
    ///
    /// The first emission is a full result set reflecting the store at or
    /// after the moment of subscription; every subsequent emission is the
    /// full re-filtered set after a store change. All emissions come from
    /// the shared upstream pump, so within one subscription they are
    /// totally ordered: each reflects a store state at least as new as the
    /// previous one.
    pub async fn subscribe(self: &Arc<Self>, scope: StreamScope) -> AppResult<FolderSubscription> {
        let query = scope.query();

        let upstream = {
            let entry = self
                .upstreams
                .entry(query.clone())
                .or_insert_with(|| self.spawn_upstream(query.clone()));
            entry.value().refs.fetch_add(1, Ordering::SeqCst);
            entry.value().clone()
        };

        // Subscribe to the fanout first, then nudge the pump: the re-query
        // the nudge triggers is broadcast after this point, so the first
        // emission is current and ordered with everything that follows. A
        // full nudge channel means a re-query is already pending.
        let upstream_rx = upstream.tx.subscribe();
        let _ = upstream.refresh.try_send(());

        let (tx, rx) = mpsc::channel(self.config.delivery_buffer_size.max(1));
        let task = tokio::spawn(subscriber_pump(
            self.engine.clone(),
            scope,
            query.clone(),
            upstream_rx,
            tx,
        ));

        Ok(FolderSubscription::new(self.clone(), query, rx, task))
    }

    /// Drop one subscription of a query shape; tears the upstream down
    /// when it was the last one.
    pub(crate) fn release(&self, query: &FolderQuery) {
        let removed = self
            .upstreams
            .remove_if(query, |_, up| up.refs.fetch_sub(1, Ordering::SeqCst) == 1);
        if let Some((_, upstream)) = removed {
            debug!(?query, "Last subscriber gone, closing upstream feed");
            upstream.pump.abort();
        }
    }

    /// Number of live upstream feeds (one per distinct query shape).
    pub fn upstream_count(&self) -> usize {
        self.upstreams.len()
    }

    fn spawn_upstream(&self, query: FolderQuery) -> Arc<Upstream> {
        let (tx, _) = broadcast::channel(self.config.feed_buffer_size.max(1));
        let (refresh, refresh_rx) = mpsc::channel(1);
        let pump = tokio::spawn(upstream_pump(
            self.store.clone(),
            query,
            tx.clone(),
            refresh_rx,
            Duration::from_millis(self.config.resubscribe_delay_ms),
        ));
        Arc::new(Upstream {
            tx,
            refresh,
            refs: AtomicUsize::new(0),
            pump,
        })
    }
}

/// Holds the single store feed for a query shape and rebroadcasts the full
/// result set after every relevant change or subscriber-join nudge.
/// Re-establishes the feed after transient failures.
///
/// Successive re-queries run from this one task, so the broadcast carries
/// snapshots in non-decreasing store-state order.
async fn upstream_pump(
    store: Arc<dyn FolderStore>,
    query: FolderQuery,
    tx: broadcast::Sender<Arc<Vec<Folder>>>,
    mut refresh_rx: mpsc::Receiver<()>,
    resubscribe_delay: Duration,
) {
    loop {
        match store.watch(&query).await {
            Ok(mut feed) => {
                let _ = tx.send(Arc::new(feed.snapshot));

                loop {
                    let wake = tokio::select! {
                        event = feed.events.recv() => match event {
                            // Something changed (or we missed events); the
                            // store is the source of truth, re-query.
                            Ok(_) | Err(RecvError::Lagged(_)) => true,
                            Err(RecvError::Closed) => false,
                        },
                        nudge = refresh_rx.recv() => nudge.is_some(),
                    };
                    if !wake {
                        break;
                    }

                    match store.query(&query).await {
                        Ok(snapshot) => {
                            let _ = tx.send(Arc::new(snapshot));
                        }
                        Err(err) if err.is_transient() => {
                            warn!(?query, error = %err, "Re-query failed, re-establishing feed");
                            break;
                        }
                        Err(err) => {
                            error!(?query, error = %err, "Re-query failed");
                        }
                    }
                }
            }
            Err(err) if err.is_transient() => {
                warn!(?query, error = %err, "Store feed unavailable, retrying");
            }
            Err(err) => {
                error!(?query, error = %err, "Store feed failed permanently");
                return;
            }
        }

        tokio::time::sleep(resubscribe_delay).await;
        debug!(?query, "Re-establishing upstream feed");
    }
}

/// Per-subscriber pump: re-filters each upstream snapshot for the
/// subscriber's scope and forwards the result. Emits nothing the upstream
/// did not broadcast, which is what keeps one subscription's emissions
/// totally ordered.
async fn subscriber_pump(
    engine: Arc<AccessEngine>,
    scope: StreamScope,
    query: FolderQuery,
    mut upstream_rx: broadcast::Receiver<Arc<Vec<Folder>>>,
    tx: mpsc::Sender<Vec<Folder>>,
) {
    loop {
        match upstream_rx.recv().await {
            Ok(snapshot) => {
                let filtered = scope.filter(&engine, &snapshot).await;
                if tx.send(filtered).await.is_err() {
                    return;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                // Every broadcast is a full set, so the next one received
                // is at least as new as everything missed.
                warn!(?query, skipped, "Subscriber lagged, skipping to the newest snapshot");
            }
            Err(RecvError::Closed) => return,
        }
    }
}
