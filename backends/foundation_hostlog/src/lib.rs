#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod config;
mod error;
mod forwarder;
mod host;
mod message;
mod params;
mod recorder;
mod statement;
mod target;

#[cfg(any(target_arch = "wasm32", target_arch = "wasm64"))]
mod jsapi;

pub use config::*;
pub use error::*;
pub use forwarder::*;
pub use host::*;
pub use message::*;
pub use params::*;
pub use recorder::*;
pub use statement::*;
pub use target::*;

#[cfg(any(target_arch = "wasm32", target_arch = "wasm64"))]
pub use jsapi::*;
