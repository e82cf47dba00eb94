//! Dense container implementation and operations
//!
//! This module provides the dense storage strategy organized into functional
//! sub-modules: the core type, trait implementations, scalar arithmetic and
//! shape operations.

// Core type definition
pub mod types;

// Operation modules (organized by functionality)
mod elementwise;
mod shape_ops;

// Supporting modules
pub mod densend_traits;

// Re-export the main type
pub use types::DenseND;
