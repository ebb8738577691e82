//! Two-call tool orchestration: ask, dispatch, finalize.

pub mod events;
pub mod runner;
pub mod types;

pub use events::*;
pub use runner::*;
pub use types::*;
