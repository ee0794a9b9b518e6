//! Domain error types.

mod resolve_error;

pub use resolve_error::{EmbedError, FetchError, ProbeError, ResolveError};
