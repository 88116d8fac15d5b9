//! Router Config Adapter
//!
//! Renders one logical set of router settings into the configuration
//! document a specific router major expects, and reads such documents back.
//!
//! # Core Concepts
//!
//! - [`ConfigAdapter`]: Pure render / extract / migrate over the settings table
//! - [`RenderRequest`]: Target version, profile and logical settings
//! - [`ConfigDocument`]: Ordered configuration tree, serialized as YAML or JSON
//! - [`table::SettingsTable`]: One row per logical setting, one shape per version
//! - [`validation::ValidationPass`]: Static checks that turn into [`Warning`]s
//!
//! # Example
//!
//! ```rust,ignore
//! use rca_core::{ConfigAdapter, Node, RenderRequest, TargetVersion};
//!
//! let request = RenderRequest::builder(TargetVersion::V2)
//!     .setting("cors.origins", Node::strings(["https://a.com"]))
//!     .build();
//! let result = ConfigAdapter::new().render(&request)?;
//! println!("{}", result.to_yaml()?);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod adapter;
mod digest;
mod document;
mod error;
mod node;
mod path;
mod request;
mod version;
mod warning;

/// Settings table
pub mod table;

/// Validation passes
pub mod validation;

pub use adapter::{ConfigAdapter, Extraction, RenderResult};
pub use digest::DocumentDigest;
pub use document::ConfigDocument;
pub use error::{AdapterError, AdapterResult, DocumentError};
pub use node::{Node, NodeMap};
pub use path::{DocPath, PathError, Segment};
pub use request::{RenderRequest, RenderRequestBuilder, RequestManifest, SettingsMap};
pub use version::{Profile, TargetVersion};
pub use warning::{Warning, WarningCode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
