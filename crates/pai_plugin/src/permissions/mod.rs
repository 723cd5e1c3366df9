//! Permission management for the `permission.ask` hook.
//!
//! # Architecture
//!
//! The host asks before running a tool whose permission is not already settled.
//! The built-in [`PolicyPermissionHandler`] answers in layers:
//!
//! 1. **Shell commands** - checked by the policy engine; deny and ask win
//! 2. **File access** - reads and writes checked against sensitive and protected paths
//! 3. **Default policy** - `allow` in dangerous mode (`PAI_I_AM_DANGEROUS`), else `ask`
//!
//! # Examples
//!
//! ```rust
//! use pai_plugin::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test_block(async {
//! let handler = PolicyPermissionHandler::default();
//! let request = PermissionRequest::new("bash", json!({ "command": "rm -rf /" }));
//! let reply = handler.check(&request).await.unwrap();
//! assert_eq!(reply.status, DecisionStatus::Deny);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

mod handler;

pub use handler::{PermissionHandler, PolicyPermissionHandler, PolicyPermissionHandlerBuilder};
