//! Transport layer between the bridge and the host proxy.
//!
//! Provides:
//! - Wire protocol (response parsing and correlation checks)
//! - HTTP transport (feature: http)
//! - In-memory scripted host (feature: memory)

pub mod protocol;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "memory")]
pub mod memory;

pub use protocol::ResponseBody;

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "memory")]
pub use memory::{MemoryTransport, Reply};
