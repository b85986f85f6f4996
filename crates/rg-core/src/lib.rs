//! rusty-gallery/crates/rg-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Gallery.

pub mod access;
pub mod error;
pub mod models;
pub mod rating;
pub mod tags;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
