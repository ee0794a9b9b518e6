//! HTTP adapters for the pipeline ports.

mod embed_client;
mod materialize_client;
mod probe_client;

pub use embed_client::HttpEmbedChecker;
pub use materialize_client::HttpByteFetcher;
pub use probe_client::{HttpProbeClient, MAX_DECODE_HEIGHT, MAX_DECODE_WIDTH};
