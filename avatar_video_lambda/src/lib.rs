pub mod artifacts;
pub mod config;
pub mod context;
pub mod download;
pub mod error;
pub mod handler;
pub mod lip_sync;
pub mod metadata;
pub mod pipeline;
pub mod replicate;
pub mod request;
pub mod speech;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use context::AppContext;
pub use error::GenerateVideoError;
pub use handler::router;
pub use pipeline::Stages;
