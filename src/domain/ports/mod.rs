//! Port definitions.

mod resolve_ports;

pub use resolve_ports::{ByteFetchPort, EmbedProbePort, FetchMode, ImageProbePort};

#[cfg(test)]
pub use resolve_ports::{MockByteFetchPort, MockEmbedProbePort, MockImageProbePort};
