#![doc = include_str!("../README.md")]
#![warn(missing_docs, missing_debug_implementations)]
mod config;
mod context;
mod error;
mod guard;
mod manager;
mod pool;
mod pool_allocator;
mod poolable;
mod registry;

pub use config::*;
pub use context::*;
pub use error::*;
pub use guard::*;
pub use manager::*;
pub use pool::*;
pub use pool_allocator::*;
pub use poolable::*;
pub use registry::*;
