//! # fieldsync-store
//!
//! Sqlite persistence for FieldSync: the connection pool, embedded
//! migrations, and the concrete implementations of the core capability
//! traits ([`PartStore`], [`TokenStore`]) plus the durable job table.
//!
//! [`PartStore`]: fieldsync_core::traits::PartStore
//! [`TokenStore`]: fieldsync_core::traits::TokenStore

pub mod connection;
pub mod job_store;
pub mod migration;
pub mod part_store;
pub mod token_store;

pub use connection::DatabasePool;
pub use job_store::JobStore;
pub use part_store::SqlitePartStore;
pub use token_store::SqliteTokenStore;
