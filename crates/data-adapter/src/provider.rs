//! Data provider contract
//!
//! The host loads a `DataProvider`, hands it an `ItemEventListener` and then
//! subscribes and unsubscribes items as its clients come and go.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::event::{ItemEvent, ItemHandle};

/// Sink implemented by the host to receive item updates
pub trait ItemEventListener: Send + Sync {
    /// Deliver one update for the subscription identified by `handle`
    fn smart_update(&self, handle: &ItemHandle, event: ItemEvent, is_snapshot: bool);
}

impl<F> ItemEventListener for F
where
    F: Fn(&ItemHandle, ItemEvent, bool) + Send + Sync,
{
    fn smart_update(&self, handle: &ItemHandle, event: ItemEvent, is_snapshot: bool) {
        self(handle, event, is_snapshot)
    }
}

/// Shared listener reference
pub type SharedListener = Arc<dyn ItemEventListener>;

/// Trait for data providers
///
/// Implement this trait to feed real-time item data into a push host.
///
/// # Example
///
/// ```rust,ignore
/// use data_adapter::{async_trait, DataProvider, ItemHandle, SharedListener, Result};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl DataProvider for Ticker {
///     async fn set_listener(&self, listener: SharedListener) { /* keep it */ }
///     async fn subscribe(&self, item: &str, handle: ItemHandle, _: bool) -> Result<()> {
///         // start pushing updates for `item` through the listener
///         Ok(())
///     }
///     async fn unsubscribe(&self, item: &str) -> Result<()> { Ok(()) }
///     fn name(&self) -> &'static str { "Ticker" }
/// }
/// ```
#[async_trait]
pub trait DataProvider: Send + Sync + 'static {
    /// Called once when the host loads the provider
    async fn init(
        &self,
        _params: &HashMap<String, String>,
        _config_dir: Option<&Path>,
    ) -> Result<()> {
        Ok(())
    }

    /// Register the sink updates are delivered to.
    ///
    /// Hosts call this before any `subscribe`.
    async fn set_listener(&self, listener: SharedListener);

    /// Whether the item supports an initial snapshot
    fn is_snapshot_available(&self, _item_name: &str) -> Result<bool> {
        Ok(false)
    }

    /// Start feeding updates for `item_name`, tagged with `handle`
    async fn subscribe(
        &self,
        item_name: &str,
        handle: ItemHandle,
        needs_iterator: bool,
    ) -> Result<()>;

    /// Subscribe without a handle
    async fn subscribe_unhandled(&self, _item_name: &str, _needs_iterator: bool) -> Result<()> {
        Ok(())
    }

    /// Stop feeding updates for `item_name`
    async fn unsubscribe(&self, item_name: &str) -> Result<()>;

    /// Return the provider name (for logging)
    fn name(&self) -> &'static str;
}
