//! `nodes` crate — the `ExecutableNode` trait and the HL Automate node.
//!
//! Every node must implement [`ExecutableNode`]; the engine crate dispatches
//! execution through this trait object. [`hlautomate`] holds the
//! version-aware request mapping for the HL Automate CRM API.

pub mod credentials;
pub mod error;
pub mod hlautomate;
pub mod http;
pub mod mock;
pub mod traits;

pub use credentials::{ApiEndpoints, ApiVersion, Credentials};
pub use error::NodeError;
pub use hlautomate::HlAutomateNode;
pub use traits::{ExecutableNode, ExecutionContext};
