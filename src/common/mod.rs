//! Common types, traits, and error definitions for highway_planner
//!
//! This module provides the foundational building blocks shared by the
//! map, behavior and trajectory modules.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
