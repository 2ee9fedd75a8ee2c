#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod error;
mod marshalling;
mod session;

pub mod codec;
pub mod definition;
pub mod marshallers;
pub mod registry;
pub mod value;

// -----------------------------------------------------------------------------
// Top-level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use error::MarshallError;
pub use marshalling::Marshalling;
pub use registry::{MappingRegistry, RegistryArc};
pub use session::EncodingSession;
