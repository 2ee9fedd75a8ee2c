use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::{BusError, Payload};

// -----------------------------------------------------------------------------
// MessageQueue

/// A sink payloads are offered to, and polled from.
pub trait MessageQueue: Send + Sync {
    /// Queues `payload`.
    ///
    /// Returns `Ok(false)` if the queue is full and the payload was dropped.
    fn offer(&self, payload: Payload) -> Result<bool, BusError>;

    /// Removes and returns the oldest payload.
    fn poll(&self) -> Option<Payload>;

    /// The number of queued payloads.
    fn len(&self) -> usize;

    /// Returns `true` if nothing is queued.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets the callback fired by the next successful [`offer`](Self::offer).
    ///
    /// `None` clears a pending callback.
    fn set_activation_callback(&self, callback: Option<Box<dyn QueueActivationCallback>>);
}

// -----------------------------------------------------------------------------
// QueueActivationCallback

/// Starts transmission of a queue that just received data.
///
/// Fired once, with the queue as argument, then cleared. Closures taking
/// `&dyn MessageQueue` implement this trait.
pub trait QueueActivationCallback: Send + Sync {
    /// Activates `queue`.
    fn activate(&self, queue: &dyn MessageQueue);
}

impl<F> QueueActivationCallback for F
where
    F: Fn(&dyn MessageQueue) + Send + Sync,
{
    #[inline]
    fn activate(&self, queue: &dyn MessageQueue) {
        self(queue);
    }
}

// -----------------------------------------------------------------------------
// LocalMessageQueue

/// Capacity of [`LocalMessageQueue::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

struct QueueState {
    messages: VecDeque<Payload>,
    closed: bool,
}

/// A bounded in-process [`MessageQueue`].
///
/// # Examples
///
/// ```
/// use gw_bus::{LocalMessageQueue, MessageQueue, Payload};
///
/// let queue = LocalMessageQueue::with_capacity(1);
/// assert!(queue.offer(Payload::new("a", "1")).unwrap());
/// assert!(!queue.offer(Payload::new("b", "2")).unwrap());
///
/// assert_eq!(queue.poll().unwrap().subject, "a");
/// assert!(queue.is_empty());
/// ```
pub struct LocalMessageQueue {
    state: Mutex<QueueState>,
    callback: Mutex<Option<Box<dyn QueueActivationCallback>>>,
    capacity: usize,
}

impl Default for LocalMessageQueue {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl LocalMessageQueue {
    /// Creates a queue holding up to [`DEFAULT_CAPACITY`] payloads.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a queue holding up to `capacity` payloads.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                messages: VecDeque::new(),
                closed: false,
            }),
            callback: Mutex::new(None),
            capacity,
        }
    }

    /// The maximum number of queued payloads.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rejects every later offer. Queued payloads can still be polled.
    pub fn close(&self) {
        self.state().closed = true;
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!("message queue closed");
    }

    /// Returns `true` once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageQueue for LocalMessageQueue {
    fn offer(&self, payload: Payload) -> Result<bool, BusError> {
        {
            let mut state = self.state();
            if state.closed {
                return Err(BusError::Closed);
            }
            if state.messages.len() >= self.capacity {
                warn!(
                    subject = %payload.subject,
                    capacity = self.capacity,
                    "message queue is full, dropping payload"
                );
                return Ok(false);
            }
            debug!(subject = %payload.subject, "queued payload");
            state.messages.push_back(payload);
        }

        // Taken out first, the callback may offer or poll again.
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(callback) = callback {
            callback.activate(self);
        }
        Ok(true)
    }

    fn poll(&self) -> Option<Payload> {
        self.state().messages.pop_front()
    }

    fn len(&self) -> usize {
        self.state().messages.len()
    }

    fn set_activation_callback(&self, callback: Option<Box<dyn QueueActivationCallback>>) {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = callback;
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{LocalMessageQueue, MessageQueue};
    use crate::{BusError, Payload};

    #[test]
    fn fifo_order() {
        let queue = LocalMessageQueue::new();
        for i in 0..3 {
            queue.offer(Payload::new("n", i.to_string())).unwrap();
        }
        assert_eq!(queue.len(), 3);
        let bodies: Vec<_> = core::iter::from_fn(|| queue.poll()).map(|p| p.body).collect();
        assert_eq!(bodies, ["0", "1", "2"]);
        assert!(queue.poll().is_none());
    }

    #[test]
    fn activation_fires_once() {
        let queue = LocalMessageQueue::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        queue.set_activation_callback(Some(Box::new(move |q: &dyn MessageQueue| {
            assert_eq!(q.len(), 1);
            seen.fetch_add(1, Ordering::SeqCst);
        })));

        queue.offer(Payload::new("a", "1")).unwrap();
        queue.offer(Payload::new("b", "2")).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn full_queue_keeps_callback() {
        let queue = LocalMessageQueue::with_capacity(0);
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = fired.clone();
        queue.set_activation_callback(Some(Box::new(move |_: &dyn MessageQueue| {
            seen.fetch_add(1, Ordering::SeqCst);
        })));

        assert!(!queue.offer(Payload::new("a", "1")).unwrap());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn closed_queue_rejects_offers() {
        let queue = LocalMessageQueue::new();
        queue.offer(Payload::new("a", "1")).unwrap();
        queue.close();
        assert!(queue.is_closed());
        assert!(matches!(queue.offer(Payload::new("b", "2")), Err(BusError::Closed)));
        assert_eq!(queue.poll().unwrap().subject, "a");
    }
}
