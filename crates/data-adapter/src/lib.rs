//! # Data Adapter
//!
//! A small data adapter contract for real-time push servers, plus a demo
//! adapter that feeds a single `greetings` item.
//!
//! ## Features
//!
//! - **Pluggable Providers**: Implement `DataProvider` to feed items from any backend
//! - **Host-side Sink**: Updates go to an `ItemEventListener`, closures included
//! - **Greetings Feed**: `HelloWorldAdapter` alternates "Hello"/"World" every 1-3 seconds
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use data_adapter::{DataProvider, HelloWorldAdapter, ItemEvent, ItemHandle};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> data_adapter::Result<()> {
//!     let adapter = HelloWorldAdapter::new();
//!     adapter
//!         .set_listener(Arc::new(|handle: &ItemHandle, event: ItemEvent, _snapshot: bool| {
//!             println!("{handle}: {}", event.to_json());
//!         }))
//!         .await;
//!
//!     adapter.subscribe("greetings", ItemHandle::generate(), false).await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
//!     adapter.unsubscribe("greetings").await
//! }
//! ```

pub mod adapter;
mod error;
mod event;
pub mod greetings;
pub mod provider;

// Re-exports
pub use adapter::{HelloWorldAdapter, GREETINGS_ITEM};
pub use error::{Error, Result};
pub use event::{GreetingEvent, ItemEvent, ItemHandle};
pub use greetings::{GeneratorState, GreetingsGenerator};
pub use provider::{DataProvider, ItemEventListener, SharedListener};

pub use async_trait::async_trait;
