#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod error;
mod payload;
mod queue;
mod sender;

// -----------------------------------------------------------------------------
// Exports

pub use error::BusError;
pub use payload::Payload;
pub use queue::{DEFAULT_CAPACITY, LocalMessageQueue};
pub use queue::{MessageQueue, QueueActivationCallback};
pub use sender::{MarshallingReceiver, MarshallingSender, Received};
