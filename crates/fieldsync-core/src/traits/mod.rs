//! Capability traits implemented by the persistence layer.

pub mod part_store;
pub mod token_store;

pub use part_store::PartStore;
pub use token_store::TokenStore;
