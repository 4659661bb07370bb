//! Job handler implementations.

pub mod media_upload;

pub use media_upload::MediaUploadJobHandler;
