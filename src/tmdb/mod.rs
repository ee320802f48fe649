pub mod client;
pub mod types;

pub use client::{poster_url, MetadataService, TmdbClient};
pub use types::TmdbErrorBody;
