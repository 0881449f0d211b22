//! Hello World data adapter
//!
//! Serves the single item `greetings`. Any other item name is accepted and
//! ignored.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event::ItemHandle;
use crate::greetings::GreetingsGenerator;
use crate::provider::{DataProvider, SharedListener};

/// Name of the only item this adapter feeds
pub const GREETINGS_ITEM: &str = "greetings";

/// Data adapter producing the greetings feed
#[derive(Default)]
pub struct HelloWorldAdapter {
    listener: RwLock<Option<SharedListener>>,
    /// Active generators: item name -> generator
    generators: DashMap<String, GreetingsGenerator>,
}

impl HelloWorldAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of items that currently have a generator
    pub fn active_items(&self) -> Vec<String> {
        self.generators.iter().map(|e| e.key().clone()).collect()
    }

    /// Whether `item_name` currently has a generator
    pub fn is_active(&self, item_name: &str) -> bool {
        self.generators.contains_key(item_name)
    }

    /// Stop every generator and wait for the loops to exit
    pub async fn shutdown(&self) {
        let items = self.active_items();
        let mut stopped = Vec::with_capacity(items.len());
        for item in items {
            if let Some((_, generator)) = self.generators.remove(&item) {
                generator.stop();
                stopped.push(generator);
            }
        }

        let count = stopped.len();
        for generator in stopped {
            generator.join().await;
        }
        info!(stopped = count, "HelloWorldAdapter shut down");
    }
}

#[async_trait]
impl DataProvider for HelloWorldAdapter {
    async fn init(&self, params: &HashMap<String, String>, config_dir: Option<&Path>) -> Result<()> {
        debug!(
            params = ?params,
            config_dir = ?config_dir,
            "HelloWorldAdapter initialized"
        );
        Ok(())
    }

    async fn set_listener(&self, listener: SharedListener) {
        *self.listener.write().await = Some(listener);
    }

    fn is_snapshot_available(&self, _item_name: &str) -> Result<bool> {
        Ok(false)
    }

    async fn subscribe(
        &self,
        item_name: &str,
        handle: ItemHandle,
        _needs_iterator: bool,
    ) -> Result<()> {
        if item_name != GREETINGS_ITEM {
            debug!(item = item_name, "Ignoring subscription to unknown item");
            return Ok(());
        }

        let listener = self
            .listener
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Failure("no listener registered before subscribe".to_string()))?;

        info!(item = item_name, handle = %handle, "Item subscribed");

        let generator = GreetingsGenerator::start(handle, listener);
        if let Some(previous) = self.generators.insert(item_name.to_string(), generator) {
            debug!(handle = %previous.handle(), "Replacing running generator");
            previous.stop();
        }
        Ok(())
    }

    async fn unsubscribe(&self, item_name: &str) -> Result<()> {
        if item_name != GREETINGS_ITEM {
            return Ok(());
        }

        if let Some((_, generator)) = self.generators.remove(item_name) {
            generator.stop();
            info!(item = item_name, handle = %generator.handle(), "Item unsubscribed");
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "HelloWorld"
    }
}
