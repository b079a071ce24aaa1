//! Shared primitives for the Spark inference adapter
//!
//! Holds the ambient per-request context and the model family descriptors
//! consumed by provider adapters.

pub mod context;
pub mod model;

pub use context::{ContextError, PROVIDER_DATA_HEADER, RequestContext};
pub use model::{ModelFamily, ToolPromptStyle};
