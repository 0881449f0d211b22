use dashmap::DashMap;
use data_adapter::{DataProvider, ItemEvent, ItemEventListener, ItemHandle};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

/// One update routed from the adapter to SSE clients
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub handle: ItemHandle,
    pub event: ItemEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemStats {
    pub item: String,
    pub clients: usize,
    pub subscribed_at: String,
}

struct ItemSubscription {
    handle: ItemHandle,
    clients: usize,
    subscribed_at: chrono::DateTime<chrono::Utc>,
}

/// Listener registered with the adapter; fans updates out to SSE clients
struct HubListener {
    updates_tx: broadcast::Sender<ItemUpdate>,
}

impl ItemEventListener for HubListener {
    fn smart_update(&self, handle: &ItemHandle, event: ItemEvent, _is_snapshot: bool) {
        // No receivers just means nobody is listening right now
        let _ = self.updates_tx.send(ItemUpdate {
            handle: handle.clone(),
            event,
        });
    }
}

/// Tracks which items the host has subscribed on the adapter and how many
/// SSE clients each one serves.
#[derive(Clone)]
pub struct FeedHub {
    adapter: Arc<dyn DataProvider>,
    /// item name -> subscription
    items: Arc<DashMap<String, ItemSubscription>>,
    updates_tx: broadcast::Sender<ItemUpdate>,
    /// Held across the count change and the adapter call in join/leave
    lifecycle: Arc<Mutex<()>>,
}

impl FeedHub {
    /// Create the hub and register its listener with the adapter
    pub async fn attach(adapter: Arc<dyn DataProvider>) -> Self {
        let (updates_tx, _) = broadcast::channel(256);
        adapter
            .set_listener(Arc::new(HubListener {
                updates_tx: updates_tx.clone(),
            }))
            .await;

        Self {
            adapter,
            items: Arc::new(DashMap::new()),
            updates_tx,
            lifecycle: Arc::new(Mutex::new(())),
        }
    }

    /// Add a client to `item`. The first client subscribes the item on the adapter.
    pub async fn join(
        &self,
        item: &str,
    ) -> anyhow::Result<(ItemHandle, broadcast::Receiver<ItemUpdate>)> {
        let receiver = self.updates_tx.subscribe();
        let _lifecycle = self.lifecycle.lock().await;

        let (handle, first) = {
            let mut entry = self
                .items
                .entry(item.to_string())
                .or_insert_with(|| ItemSubscription {
                    handle: ItemHandle::generate(),
                    clients: 0,
                    subscribed_at: chrono::Utc::now(),
                });
            entry.clients += 1;
            (entry.handle.clone(), entry.clients == 1)
        };

        if first {
            if let Err(e) = self.adapter.subscribe(item, handle.clone(), false).await {
                self.items.remove_if(item, |_, sub| sub.clients == 1);
                return Err(e.into());
            }
            info!(item, handle = %handle, adapter = self.adapter.name(), "Item subscribed on adapter");
        }

        Ok((handle, receiver))
    }

    /// Remove a client from `item`. The last client unsubscribes the item.
    pub async fn leave(&self, item: &str) {
        let _lifecycle = self.lifecycle.lock().await;
        let last = match self.items.get_mut(item) {
            Some(mut entry) => {
                entry.clients = entry.clients.saturating_sub(1);
                entry.clients == 0
            }
            None => return,
        };

        if last && self.items.remove_if(item, |_, sub| sub.clients == 0).is_some() {
            match self.adapter.unsubscribe(item).await {
                Ok(()) => info!(item, "Item unsubscribed on adapter"),
                Err(e) => warn!(item, error = %e, "Failed to unsubscribe item"),
            }
        }
    }

    pub fn client_count(&self, item: &str) -> usize {
        self.items.get(item).map(|s| s.clients).unwrap_or(0)
    }

    pub fn stats(&self) -> Vec<ItemStats> {
        self.items
            .iter()
            .map(|e| ItemStats {
                item: e.key().clone(),
                clients: e.value().clients,
                subscribed_at: e.value().subscribed_at.to_rfc3339(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_adapter::{async_trait, Error, HelloWorldAdapter, SharedListener, GREETINGS_ITEM};
    use std::time::Duration;

    /// Provider that refuses every subscription
    struct RejectingProvider;

    #[async_trait]
    impl DataProvider for RejectingProvider {
        async fn set_listener(&self, _listener: SharedListener) {}

        async fn subscribe(
            &self,
            item_name: &str,
            _handle: ItemHandle,
            _needs_iterator: bool,
        ) -> data_adapter::Result<()> {
            Err(Error::Subscription(format!("unknown item {item_name}")))
        }

        async fn unsubscribe(&self, _item_name: &str) -> data_adapter::Result<()> {
            Ok(())
        }

        fn name(&self) -> &'static str {
            "Rejecting"
        }
    }

    async fn hub() -> (FeedHub, Arc<HelloWorldAdapter>) {
        let adapter = Arc::new(HelloWorldAdapter::new());
        let hub = FeedHub::attach(adapter.clone()).await;
        (hub, adapter)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_join_subscribes() {
        let (hub, adapter) = hub().await;

        let (handle, mut rx) = hub.join(GREETINGS_ITEM).await.unwrap();
        assert!(adapter.is_active(GREETINGS_ITEM));
        assert_eq!(hub.client_count(GREETINGS_ITEM), 1);

        let update = rx.recv().await.unwrap();
        assert_eq!(update.handle, handle);
        assert_eq!(update.event.get("message"), Some("Hello"));

        adapter.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_share_subscription() {
        let (hub, adapter) = hub().await;

        let (h1, _rx1) = hub.join(GREETINGS_ITEM).await.unwrap();
        let (h2, _rx2) = hub.join(GREETINGS_ITEM).await.unwrap();
        assert_eq!(h1, h2);
        assert_eq!(hub.client_count(GREETINGS_ITEM), 2);

        hub.leave(GREETINGS_ITEM).await;
        assert!(adapter.is_active(GREETINGS_ITEM));

        hub.leave(GREETINGS_ITEM).await;
        assert!(!adapter.is_active(GREETINGS_ITEM));
        assert!(hub.stats().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_item_has_no_updates() {
        let (hub, adapter) = hub().await;

        let (_, mut rx) = hub.join("stocks").await.unwrap();
        assert!(!adapter.is_active("stocks"));
        assert_eq!(hub.stats().len(), 1);

        let result = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_leave_unknown_item_is_noop() {
        let (hub, _adapter) = hub().await;
        hub.leave("nothing").await;
        assert_eq!(hub.client_count("nothing"), 0);
    }

    #[tokio::test]
    async fn test_failed_subscribe_leaves_no_entry() {
        let hub = FeedHub::attach(Arc::new(RejectingProvider)).await;

        assert!(hub.join(GREETINGS_ITEM).await.is_err());
        assert_eq!(hub.client_count(GREETINGS_ITEM), 0);
        assert!(hub.stats().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rejoin_racing_leave_keeps_feed() {
        let (hub, adapter) = hub().await;

        for round in 0..500 {
            hub.join(GREETINGS_ITEM).await.unwrap();

            let leaving = hub.clone();
            let joining = hub.clone();
            let leave = tokio::spawn(async move { leaving.leave(GREETINGS_ITEM).await });
            let join = tokio::spawn(async move { joining.join(GREETINGS_ITEM).await.map(|_| ()) });
            leave.await.unwrap();
            join.await.unwrap().unwrap();

            assert_eq!(hub.client_count(GREETINGS_ITEM), 1, "round {round}");
            assert!(adapter.is_active(GREETINGS_ITEM), "round {round}");

            hub.leave(GREETINGS_ITEM).await;
            assert!(!adapter.is_active(GREETINGS_ITEM), "round {round}");
        }

        adapter.shutdown().await;
    }
}
