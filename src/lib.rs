//! bucketsync - one-way object storage bucket synchronization
//!
//! Lists a source and a destination bucket under a shared prefix, works out
//! which source objects are missing or changed at the destination, and copies
//! them with a bounded pool of concurrent workers.

pub mod cli;
pub mod config;
pub mod error;
pub mod progress;
pub mod storage;
pub mod sync;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
