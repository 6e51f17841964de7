//! Live notification streams, one upstream feed per recipient.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use shelf_core::config::realtime::RealtimeConfig;
use shelf_core::result::AppResult;
use shelf_core::types::id::UserId;
use shelf_entity::notification::ContributorNotification;
use shelf_store::store::NotificationStore;

/// Shared upstream feed over one recipient's notification list.
struct Upstream {
    /// Snapshot fanout to subscriber pumps.
    tx: broadcast::Sender<Arc<Vec<ContributorNotification>>>,
    /// Nudges the pump to re-list and broadcast, used when a subscriber
    /// joins.
    refresh: mpsc::Sender<()>,
    /// Number of live subscriptions.
    refs: AtomicUsize,
    /// The pump task holding the store feed.
    pump: JoinHandle<()>,
}

/// Registry of per-recipient notification feeds.
pub struct NotificationFeedHub {
    /// Notification store.
    store: Arc<dyn NotificationStore>,
    /// Fanout settings.
    config: RealtimeConfig,
    /// Recipient → shared upstream.
    upstreams: DashMap<UserId, Arc<Upstream>>,
}

impl std::fmt::Debug for NotificationFeedHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFeedHub")
            .field("upstreams", &self.upstreams.len())
            .finish()
    }
}

impl NotificationFeedHub {
    /// Creates a new hub.
    pub fn new(store: Arc<dyn NotificationStore>, config: RealtimeConfig) -> Self {
        Self {
            store,
            config,
            upstreams: DashMap::new(),
        }
    }

    /// Open a live stream over a recipient's notifications, newest first.
    ///
    /// Every emission, the first included, comes from the shared upstream
    /// pump, so emissions within one subscription are totally ordered.
    pub async fn subscribe(
        self: &Arc<Self>,
        user_id: UserId,
    ) -> AppResult<NotificationSubscription> {
        let upstream = {
            let entry = self
                .upstreams
                .entry(user_id)
                .or_insert_with(|| self.spawn_upstream(user_id));
            entry.value().refs.fetch_add(1, Ordering::SeqCst);
            entry.value().clone()
        };

        // Subscribe to the fanout first, then nudge the pump; the re-list
        // the nudge triggers lands after this point. A full nudge channel
        // means a re-list is already pending.
        let upstream_rx = upstream.tx.subscribe();
        let _ = upstream.refresh.try_send(());

        let (tx, rx) = mpsc::channel(self.config.delivery_buffer_size.max(1));
        let task = tokio::spawn(subscriber_pump(upstream_rx, tx));

        Ok(NotificationSubscription {
            hub: self.clone(),
            user_id,
            rx,
            task,
            released: false,
        })
    }

    /// Number of live upstream feeds.
    pub fn upstream_count(&self) -> usize {
        self.upstreams.len()
    }

    fn release(&self, user_id: UserId) {
        let removed = self
            .upstreams
            .remove_if(&user_id, |_, up| up.refs.fetch_sub(1, Ordering::SeqCst) == 1);
        if let Some((_, upstream)) = removed {
            debug!(%user_id, "Last subscriber gone, closing notification feed");
            upstream.pump.abort();
        }
    }

    fn spawn_upstream(&self, user_id: UserId) -> Arc<Upstream> {
        let (tx, _) = broadcast::channel(self.config.feed_buffer_size.max(1));
        let (refresh, refresh_rx) = mpsc::channel(1);
        let pump = tokio::spawn(upstream_pump(
            self.store.clone(),
            user_id,
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

async fn upstream_pump(
    store: Arc<dyn NotificationStore>,
    user_id: UserId,
    tx: broadcast::Sender<Arc<Vec<ContributorNotification>>>,
    mut refresh_rx: mpsc::Receiver<()>,
    resubscribe_delay: Duration,
) {
    loop {
        match store.watch_recipient(user_id).await {
            Ok(mut feed) => {
                let _ = tx.send(Arc::new(feed.snapshot));

                loop {
                    // `Some(relevant)` to keep pumping, `None` to
                    // re-establish the feed.
                    let wake = tokio::select! {
                        event = feed.events.recv() => match event {
                            Ok(event) => Some(event.recipient_id() == user_id),
                            Err(RecvError::Lagged(_)) => Some(true),
                            Err(RecvError::Closed) => None,
                        },
                        nudge = refresh_rx.recv() => nudge.map(|_| true),
                    };
                    let relevant = match wake {
                        Some(relevant) => relevant,
                        None => break,
                    };
                    // Another recipient's record changed.
                    if !relevant {
                        continue;
                    }

                    match store.list_for_recipient(user_id).await {
                        Ok(list) => {
                            let _ = tx.send(Arc::new(list));
                        }
                        Err(err) if err.is_transient() => {
                            warn!(%user_id, error = %err, "Re-list failed, re-establishing feed");
                            break;
                        }
                        Err(err) => {
                            error!(%user_id, error = %err, "Re-list failed");
                        }
                    }
                }
            }
            Err(err) if err.is_transient() => {
                warn!(%user_id, error = %err, "Notification feed unavailable, retrying");
            }
            Err(err) => {
                error!(%user_id, error = %err, "Notification feed failed permanently");
                return;
            }
        }

        tokio::time::sleep(resubscribe_delay).await;
        debug!(%user_id, "Re-establishing notification feed");
    }
}

async fn subscriber_pump(
    mut upstream_rx: broadcast::Receiver<Arc<Vec<ContributorNotification>>>,
    tx: mpsc::Sender<Vec<ContributorNotification>>,
) {
    loop {
        match upstream_rx.recv().await {
            Ok(list) => {
                if tx.send(list.as_ref().clone()).await.is_err() {
                    return;
                }
            }
            // The next upstream emission carries the full list anyway.
            Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return,
        }
    }
}

/// A live notification stream for one recipient.
///
/// Each received item is the recipient's full notification list, newest
/// first. Dropping the handle releases the subscription.
pub struct NotificationSubscription {
    hub: Arc<NotificationFeedHub>,
    user_id: UserId,
    rx: mpsc::Receiver<Vec<ContributorNotification>>,
    task: JoinHandle<()>,
    released: bool,
}

impl NotificationSubscription {
    /// Wait for the next emission. Returns `None` once released.
    pub async fn recv(&mut self) -> Option<Vec<ContributorNotification>> {
        self.rx.recv().await
    }

    /// Explicitly release the subscription.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.task.abort();
            self.hub.release(self.user_id);
        }
    }
}

impl std::fmt::Debug for NotificationSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSubscription")
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl Drop for NotificationSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
