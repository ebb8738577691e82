//! Tool system: declarations, argument handling, validation, and the registry.

pub mod arguments;
pub mod builtin;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use tool::{FnHandler, ToolHandler};
pub use types::{ParameterBuilder, ToolDeclaration, ToolParameters};
pub use validation::{validate_arguments, ValidationError};
