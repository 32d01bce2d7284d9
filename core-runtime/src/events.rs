//! # Event Topics
//!
//! Typed, closable broadcast topics built on `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The playback core pushes several independent kinds of state to the host
//! (engine snapshots, playlist navigation flags, playlist contents, the
//! current track). Each kind gets its own [`EventBus<T>`] so a consumer only
//! subscribes to what it renders.
//!
//! ```text
//!                 emit     ┌──────────────┐   subscribe   ┌────────────┐
//! ┌─────────┐ ────────────>│ EventBus<A>  ├──────────────>│ Subscriber │
//! │         │              └──────────────┘               └────────────┘
//! │ Engine  │     emit     ┌──────────────┐   subscribe   ┌────────────┐
//! │         │ ────────────>│ EventBus<B>  ├──────────────>│ Subscriber │
//! └─────────┘              └──────────────┘               └────────────┘
//! ```
//!
//! ## Semantics
//!
//! - **Multi-subscriber, push-only**: every receiver sees every value emitted
//!   after it subscribed.
//! - **Latest-value cache**: the bus remembers the last emitted value so late
//!   subscribers can opt into a replay via [`EventBus::stream_with_latest`].
//! - **Closable**: [`EventBus::close`] drops the sender. Receivers drain and
//!   then observe `RecvError::Closed`; later [`EventBus::emit`] calls return
//!   [`EmitError::Closed`] instead of panicking.
//! - **No subscribers is not an error**: emitting into a topic nobody listens
//!   to returns `Ok(0)`.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::EventBus;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus: EventBus<u32> = EventBus::new("position", 16);
//! let mut stream = bus.stream();
//!
//! bus.emit(7).unwrap();
//! assert_eq!(stream.recv().await.unwrap(), 7);
//!
//! bus.close();
//! assert!(bus.emit(8).is_err());
//! # }
//! ```
//!
//! ## Slow Subscribers
//!
//! A subscriber that falls more than `capacity` values behind receives
//! `RecvError::Lagged(n)` and then resumes with the oldest retained value.
//! Snapshots are complete values, so skipping intermediate ones is harmless.

use parking_lot::Mutex;
use std::fmt;
use thiserror::Error;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default per-subscriber buffer for a topic.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Error returned when emitting into a topic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// The topic was closed; the value was dropped.
    #[error("event topic `{0}` is closed")]
    Closed(&'static str),
}

struct Channel<T> {
    sender: Option<broadcast::Sender<T>>,
    latest: Option<T>,
}

/// A single broadcast topic carrying values of type `T`.
///
/// Emission and subscription take the same lock, so a subscriber obtained
/// through [`EventBus::stream_with_latest`] never misses a value emitted
/// between reading the cache and attaching the receiver.
pub struct EventBus<T> {
    name: &'static str,
    capacity: usize,
    channel: Mutex<Channel<T>>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a topic with the given diagnostic name and buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (a `tokio::sync::broadcast` requirement).
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            name,
            capacity,
            channel: Mutex::new(Channel {
                sender: Some(sender),
                latest: None,
            }),
        }
    }

    /// Topic name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Publishes `event` to all current subscribers and caches it as the
    /// latest value.
    ///
    /// Returns the number of subscribers the value was delivered to.
    pub fn emit(&self, event: T) -> Result<usize, EmitError> {
        let mut channel = self.channel.lock();
        let Some(sender) = channel.sender.as_ref() else {
            return Err(EmitError::Closed(self.name));
        };

        // `send` only fails when there are no receivers.
        let delivered = sender.send(event.clone()).unwrap_or(0);
        channel.latest = Some(event);
        Ok(delivered)
    }

    /// Creates a receiver for all future values.
    ///
    /// Subscribing to a closed topic yields a receiver that immediately
    /// reports `RecvError::Closed`.
    pub fn subscribe(&self) -> Receiver<T> {
        let channel = self.channel.lock();
        match channel.sender.as_ref() {
            Some(sender) => sender.subscribe(),
            None => closed_receiver(),
        }
    }

    /// Creates an [`EventStream`] over future values.
    pub fn stream(&self) -> EventStream<T> {
        EventStream::new(self.subscribe())
    }

    /// Creates an [`EventStream`] whose first item is the cached latest value
    /// (if any), followed by all future values.
    pub fn stream_with_latest(&self) -> EventStream<T> {
        let channel = self.channel.lock();
        let receiver = match channel.sender.as_ref() {
            Some(sender) => sender.subscribe(),
            None => closed_receiver(),
        };
        EventStream::with_replay(channel.latest.clone(), receiver)
    }

    /// Last value emitted on this topic.
    pub fn latest(&self) -> Option<T> {
        self.channel.lock().latest.clone()
    }

    /// Closes the topic. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.channel.lock().sender.take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.channel.lock().sender.is_none()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.channel
            .lock()
            .sender
            .as_ref()
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn closed_receiver<T: Clone>() -> Receiver<T> {
    let (sender, receiver) = broadcast::channel(1);
    drop(sender);
    receiver
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channel = self.channel.lock();
        f.debug_struct("EventBus")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("closed", &channel.sender.is_none())
            .field(
                "subscriber_count",
                &channel
                    .sender
                    .as_ref()
                    .map(|sender| sender.receiver_count())
                    .unwrap_or(0),
            )
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional replay and filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::EventBus;
///
/// # #[tokio::main]
/// # async fn main() {
/// let bus: EventBus<u32> = EventBus::new("numbers", 8);
/// let mut evens = bus.stream().filter(|n| n % 2 == 0);
///
/// bus.emit(1).unwrap();
/// bus.emit(2).unwrap();
/// assert_eq!(evens.recv().await.unwrap(), 2);
/// # }
/// ```
pub struct EventStream<T> {
    replay: Option<T>,
    receiver: Receiver<T>,
    filter: Option<EventFilter<T>>,
}

impl<T: Clone> EventStream<T> {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<T>) -> Self {
        Self {
            replay: None,
            receiver,
            filter: None,
        }
    }

    /// Creates a stream that yields `replay` before anything from `receiver`.
    pub fn with_replay(replay: Option<T>, receiver: Receiver<T>) -> Self {
        Self {
            replay,
            receiver,
            filter: None,
        }
    }

    /// Only values matching `predicate` are returned by `recv()`/`try_recv()`.
    /// The filter also applies to a pending replay value.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &T) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    fn take_replay(&mut self) -> Option<T> {
        let event = self.replay.take()?;
        self.accepts(&event).then_some(event)
    }

    /// Receives the next value that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` values.
    /// Returns `RecvError::Closed` once the topic is closed and drained.
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        if let Some(event) = self.take_replay() {
            return Ok(event);
        }

        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a value without waiting.
    ///
    /// Returns `None` if nothing is currently available.
    pub fn try_recv(&mut self) -> Option<Result<T, RecvError>> {
        if let Some(event) = self.take_replay() {
            return Some(Ok(event));
        }

        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every value currently available, stopping at the first error.
    pub fn drain(&mut self) -> Vec<T> {
        let mut events = Vec::new();
        while let Some(Ok(event)) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_replay", &self.replay.is_some())
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_creation() {
        let bus: EventBus<u8> = EventBus::new("test", 10);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.name(), "test");
        assert!(!bus.is_closed());
        assert!(bus.latest().is_none());
    }

    #[test]
    fn test_emission_without_subscribers_is_ok() {
        let bus = EventBus::new("test", 10);
        assert_eq!(bus.emit("hello".to_string()), Ok(0));
        assert_eq!(bus.latest(), Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new("test", 10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.emit(42u32), Ok(2));

        assert_eq!(sub1.recv().await.unwrap(), 42);
        assert_eq!(sub2.recv().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_only_future_values() {
        let bus = EventBus::new("test", 10);
        bus.emit(1u32).unwrap();

        let mut stream = bus.stream();
        assert!(stream.try_recv().is_none());

        bus.emit(2).unwrap();
        assert_eq!(stream.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stream_with_latest_replays_cached_value() {
        let bus = EventBus::new("test", 10);
        bus.emit(1u32).unwrap();
        bus.emit(2).unwrap();

        let mut stream = bus.stream_with_latest();
        bus.emit(3).unwrap();

        assert_eq!(stream.recv().await.unwrap(), 2);
        assert_eq!(stream.recv().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_filter_applies_to_replay_and_live_values() {
        let bus = EventBus::new("test", 10);
        bus.emit(1u32).unwrap();

        let mut stream = bus.stream_with_latest().filter(|n| n % 2 == 0);
        bus.emit(3).unwrap();
        bus.emit(4).unwrap();

        assert_eq!(stream.recv().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_close_stops_emission_without_panicking() {
        let bus = EventBus::new("snapshots", 10);
        let mut sub = bus.subscribe();

        bus.emit(1u32).unwrap();
        assert!(bus.close());
        assert!(!bus.close());
        assert!(bus.is_closed());

        assert_eq!(bus.emit(2), Err(EmitError::Closed("snapshots")));

        // Values sent before closing are still delivered, then the stream ends.
        assert_eq!(sub.recv().await.unwrap(), 1);
        assert!(matches!(sub.recv().await, Err(RecvError::Closed)));
    }

    #[tokio::test]
    async fn test_subscribe_after_close_is_closed() {
        let bus: EventBus<u32> = EventBus::new("test", 10);
        bus.close();

        let mut sub = bus.subscribe();
        assert!(matches!(sub.recv().await, Err(RecvError::Closed)));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new("test", 2);
        let mut sub = bus.subscribe();

        for i in 0..5u32 {
            bus.emit(i).unwrap();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = std::sync::Arc::new(EventBus::new("test", 100));
        let mut stream = bus.stream();

        let bus1 = std::sync::Arc::clone(&bus);
        let bus2 = std::sync::Arc::clone(&bus);

        let handle1 = tokio::spawn(async move {
            for i in 0..10u32 {
                bus1.emit(i).ok();
            }
        });
        let handle2 = tokio::spawn(async move {
            for i in 100..110u32 {
                bus2.emit(i).ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        assert_eq!(stream.drain().len(), 20);
    }

    #[test]
    fn test_debug_output() {
        let bus: EventBus<u32> = EventBus::new("current_track", 4);
        let rendered = format!("{:?}", bus);
        assert!(rendered.contains("current_track"));
        assert!(rendered.contains("closed: false"));
    }
}
