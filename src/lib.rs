//! shellcache - offline cache manager
//!
//! Service-worker style install/activate/fetch lifecycle over versioned
//! static and dynamic cache partitions, with an offline fallback page for
//! navigations.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod journal;
pub mod network;
#[cfg(test)]
pub(crate) mod testing;
pub mod ui;
pub mod worker;

pub use error::{ShellCacheError, ShellCacheResult};
