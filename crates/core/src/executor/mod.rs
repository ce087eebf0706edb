//! Page executor abstraction.
//!
//! The executor lives inside the vendor page and performs UI actions. The
//! [`PageExecutor`] trait is the only way the engines reach it; the host
//! server implements it over the extension bridge.

mod client;
mod types;

pub use client::ExecutorClient;
pub use types::*;
