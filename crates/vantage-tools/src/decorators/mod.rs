//! Decorator stack. Outer-to-inner order applied by
//! [`crate::manager::ToolManager`] is:
//! Metrics → WireMin → Normalize → IOPersist (optional) → Cache (optional) →
//! RateLimit (optional) → raw tool. See spec §4.B.

pub mod cache;
pub mod io_persist;
pub mod metrics;
pub mod normalize;
pub mod rate_limit;
pub mod wiremin;
