//! Tool trait, decorator stack, and the manager that wires them together.
//! See spec §3 and §4.B.

pub mod bag_ext;
pub mod base;
pub mod config;
pub mod decorators;
pub mod manager;
pub mod registry;
pub mod serialize;

mod test_support;

pub use bag_ext::ToolBagExt;
pub use base::{Tool, ToolContext, ToolResult};
pub use config::{ManagerSettings, RateLimitConfig, ToolConfig, ToolFactory};
pub use manager::ToolManager;
pub use registry::ToolFactoryRegistry;
