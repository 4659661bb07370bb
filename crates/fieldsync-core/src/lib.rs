//! # fieldsync-core
//!
//! Core crate for FieldSync. Contains configuration schemas, domain types
//! for the media-upload pipeline, the capability traits implemented by the
//! persistence layer, and the unified error system.
//!
//! This crate has **no** internal dependencies on other FieldSync crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
