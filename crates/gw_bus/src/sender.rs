use std::sync::Arc;

use gw_marshal::{MarshallError, Marshalling};
use gw_marshal::value::{IntoValue, Value};
use tracing::trace;

use crate::{BusError, MessageQueue, Payload};

// -----------------------------------------------------------------------------
// MarshallingSender

/// Marshals values and offers them to a queue.
#[derive(Clone)]
pub struct MarshallingSender {
    marshalling: Marshalling,
    queue: Arc<dyn MessageQueue>,
}

impl MarshallingSender {
    /// Creates a sender writing to `queue`.
    pub fn new(marshalling: Marshalling, queue: Arc<dyn MessageQueue>) -> Self {
        Self { marshalling, queue }
    }

    /// Encodes `value` by its runtime type and queues it under `subject`.
    ///
    /// Returns `Ok(false)` if the queue dropped the payload.
    pub fn send(&self, subject: &str, value: impl IntoValue) -> Result<bool, BusError> {
        let body = self
            .marshalling
            .to_json(value)
            .map_err(|source| marshall_error(subject, source))?;
        self.offer(subject, body)
    }

    /// Encodes `value` as `type_name` and queues it under `subject`.
    pub fn send_as(&self, subject: &str, value: impl IntoValue, type_name: &str) -> Result<bool, BusError> {
        let body = self
            .marshalling
            .to_json_as(value, type_name)
            .map_err(|source| marshall_error(subject, source))?;
        self.offer(subject, body)
    }

    fn offer(&self, subject: &str, body: String) -> Result<bool, BusError> {
        trace!(subject, bytes = body.len(), "sending payload");
        self.queue.offer(Payload::new(subject, body))
    }
}

// -----------------------------------------------------------------------------
// MarshallingReceiver

/// A decoded message.
#[derive(Clone, Debug)]
pub struct Received {
    /// Subject of the payload.
    pub subject: String,
    /// The decoded body.
    pub value: Value,
}

/// Polls a queue and demarshalls what it finds.
#[derive(Clone)]
pub struct MarshallingReceiver {
    marshalling: Marshalling,
    queue: Arc<dyn MessageQueue>,
}

impl MarshallingReceiver {
    /// Creates a receiver reading from `queue`.
    pub fn new(marshalling: Marshalling, queue: Arc<dyn MessageQueue>) -> Self {
        Self { marshalling, queue }
    }

    /// Decodes the oldest queued payload, if any.
    ///
    /// A payload that fails to decode is consumed all the same.
    pub fn receive(&self) -> Result<Option<Received>, BusError> {
        let Some(payload) = self.queue.poll() else {
            return Ok(None);
        };
        match self.marshalling.from_json(&payload.body) {
            Ok(value) => Ok(Some(Received {
                subject: payload.subject,
                value,
            })),
            Err(source) => Err(marshall_error(&payload.subject, source)),
        }
    }
}

fn marshall_error(subject: &str, source: MarshallError) -> BusError {
    BusError::Marshall {
        subject: subject.to_owned(),
        source,
    }
}

// -----------------------------------------------------------------------------
// Tests
