//! Presentation layer: the shell widget and run orchestration.

/// Pipeline run orchestration.
pub mod runner;
/// Shell widgets.
pub mod widgets;

pub use runner::PipelineRunner;
pub use widgets::{RemoteImage, ShellUpdate};
