#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use gw_bus as bus;
pub use gw_marshal as marshal;
pub use gw_security as security;
pub use gw_utils as utils;
