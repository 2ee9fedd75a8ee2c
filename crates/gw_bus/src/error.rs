use gw_marshal::MarshallError;
use thiserror::Error;

/// Errors raised while moving payloads through a queue.
#[derive(Debug, Error)]
pub enum BusError {
    /// The queue was closed and accepts no more payloads.
    #[error("message queue is closed")]
    Closed,

    /// The value could not be encoded or the body could not be decoded.
    #[error("failed to marshall the payload of `{subject}`")]
    Marshall {
        /// Subject of the payload.
        subject: String,
        /// The underlying failure.
        #[source]
        source: MarshallError,
    },
}
