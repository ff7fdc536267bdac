//! Shared runtime plumbing for the `spindle-agent` and `spindle-worker`
//! binaries: subprocess supervision, the coordinator HTTP client, hardware
//! encoder detection, and the single-instance lockfile.

pub mod client;
pub mod error;
pub mod hwaccel;
pub mod lockfile;
pub mod subprocess;

pub use client::CoordinatorClient;
pub use error::{Result, RuntimeError};
pub use lockfile::InstanceLock;
