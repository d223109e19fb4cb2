//! Reprise - desktop macro recording, replay, and sharing.
//!
//! Reprise replays recorded UI automation: flat step sequences (components)
//! and orchestrations of them (assemblies) with nested loops over
//! spreadsheet rows, pasted lists, or fixed counts. Items are packaged as
//! zip archives together with their reference images and can be traded on a
//! marketplace service.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`context`] - Name/value bindings and `{name}` template substitution
//! - [`engine`] - Step interpreter, loop stack, smart wait, cancellation
//! - [`error`] - Error types and result aliases
//! - [`input`] - The input capability seam and the bundled backends
//! - [`market`] - Marketplace HTTP client
//! - [`package`] - Zip packaging of items and their images
//! - [`step`] - The step vocabulary shared by components and assemblies
//! - [`store`] - Persistent name-to-steps stores
//!
//! # Example
//!
//! ```
//! use reprise::context::ExecutionContext;
//!
//! // Resolve bound loop variables in a step payload
//! let mut ctx = ExecutionContext::new();
//! ctx.set("i", "42");
//! assert_eq!(ctx.render("row {i} of {total}"), "row 42 of {total}");
//! ```
//!
//! For full replay flows, see the integration tests.

pub mod cli;
pub mod context;
pub mod engine;
pub mod error;
pub mod input;
pub mod market;
pub mod package;
pub mod step;
pub mod store;

pub use error::{RepriseError, Result};
