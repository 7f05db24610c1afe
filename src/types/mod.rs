//! Type definitions

pub mod loader;
pub mod records;
pub mod target;
pub mod workflow;

pub use loader::*;
pub use records::*;
pub use target::*;
pub use workflow::*;
