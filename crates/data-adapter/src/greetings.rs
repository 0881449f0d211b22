//! Hello/World greetings generator
//!
//! A single tokio task that alternates between two messages, pausing a random
//! interval between updates. Stopping is cooperative: the task only looks at its
//! run flag between updates, so it may finish the current sleep before exiting.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::{GreetingEvent, ItemHandle};
use crate::provider::SharedListener;

/// Shortest pause between two greetings (inclusive)
pub const MIN_INTERVAL: Duration = Duration::from_millis(1000);
/// Longest pause between two greetings (exclusive)
pub const MAX_INTERVAL: Duration = Duration::from_millis(3000);

/// Lifecycle of a generator task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Idle,
    Running,
}

/// Message for the given zero-based update counter
pub fn greeting_for(counter: u64) -> &'static str {
    if counter % 2 == 0 {
        "Hello"
    } else {
        "World"
    }
}

/// Draw the pause before the next greeting, uniform in `[MIN_INTERVAL, MAX_INTERVAL)`
pub fn next_interval<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    let millis = rng.gen_range(MIN_INTERVAL.as_millis() as u64..MAX_INTERVAL.as_millis() as u64);
    Duration::from_millis(millis)
}

/// Background task feeding greetings to a listener
pub struct GreetingsGenerator {
    handle: ItemHandle,
    go: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl GreetingsGenerator {
    /// Spawn the generator loop for `handle`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(handle: ItemHandle, listener: SharedListener) -> Self {
        let go = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(run(handle.clone(), listener, go.clone()));

        debug!(handle = %handle, "Greetings generator started");

        Self {
            handle,
            go,
            task: Some(task),
        }
    }

    /// Ask the loop to stop at its next check point
    pub fn stop(&self) {
        if self.go.swap(false, Ordering::AcqRel) {
            debug!(handle = %self.handle, "Greetings generator stop requested");
        }
    }

    pub fn state(&self) -> GeneratorState {
        match &self.task {
            Some(task) if !task.is_finished() => GeneratorState::Running,
            _ => GeneratorState::Idle,
        }
    }

    pub fn handle(&self) -> &ItemHandle {
        &self.handle
    }

    /// Wait for the loop to exit. Does not request a stop by itself.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for GreetingsGenerator {
    fn drop(&mut self) {
        // A detached loop would otherwise run forever.
        self.go.store(false, Ordering::Release);
    }
}

async fn run(handle: ItemHandle, listener: SharedListener, go: Arc<AtomicBool>) {
    let mut rng = StdRng::from_entropy();
    let mut counter: u64 = 0;

    loop {
        if !go.load(Ordering::Acquire) {
            break;
        }

        let event = GreetingEvent::now(greeting_for(counter));
        listener.smart_update(&handle, event.into(), false);
        counter = counter.wrapping_add(1);

        if !go.load(Ordering::Acquire) {
            break;
        }
        tokio::time::sleep(next_interval(&mut rng)).await;
    }

    debug!(handle = %handle, delivered = counter, "Greetings generator stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ItemEvent;
    use std::sync::Mutex;

    type Updates = Arc<Mutex<Vec<(ItemHandle, ItemEvent, bool)>>>;

    fn collecting_listener() -> (SharedListener, Updates) {
        let updates: Updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let listener: SharedListener = Arc::new(move |handle: &ItemHandle, event: ItemEvent, snapshot: bool| {
            sink.lock().unwrap().push((handle.clone(), event, snapshot));
        });
        (listener, updates)
    }

    fn count(updates: &Updates) -> usize {
        updates.lock().unwrap().len()
    }

    #[test]
    fn test_greeting_alternates() {
        assert_eq!(greeting_for(0), "Hello");
        assert_eq!(greeting_for(1), "World");
        assert_eq!(greeting_for(2), "Hello");
        assert_eq!(greeting_for(41), "World");
    }

    #[test]
    fn test_interval_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let interval = next_interval(&mut rng);
            assert!(interval >= MIN_INTERVAL);
            assert!(interval < MAX_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_update_is_immediate() {
        let (listener, updates) = collecting_listener();
        let generator = GreetingsGenerator::start(ItemHandle::new("h1"), listener);

        tokio::task::yield_now().await;
        assert_eq!(count(&updates), 1);
        assert_eq!(generator.state(), GeneratorState::Running);

        // The next one waits at least MIN_INTERVAL
        tokio::time::sleep(Duration::from_millis(999)).await;
        assert_eq!(count(&updates), 1);

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert!(count(&updates) >= 2);

        generator.stop();
        generator.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_shape() {
        let (listener, updates) = collecting_listener();
        let generator = GreetingsGenerator::start(ItemHandle::new("shape"), listener);
        tokio::task::yield_now().await;
        generator.stop();
        generator.join().await;

        let updates = updates.lock().unwrap();
        let (handle, event, snapshot) = &updates[0];
        assert_eq!(handle.as_str(), "shape");
        assert!(!snapshot);
        assert_eq!(event.len(), 2);
        assert_eq!(event.get("message"), Some("Hello"));
        assert!(!event.get("timestamp").unwrap_or_default().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_loop() {
        let (listener, updates) = collecting_listener();
        let generator = GreetingsGenerator::start(ItemHandle::new("h2"), listener);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        generator.stop();
        let delivered = count(&updates);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count(&updates), delivered);
        assert_eq!(generator.state(), GeneratorState::Idle);
        generator.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_loop() {
        let (listener, updates) = collecting_listener();
        let generator = GreetingsGenerator::start(ItemHandle::new("h3"), listener);
        tokio::task::yield_now().await;
        drop(generator);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count(&updates), 1);
    }
}
