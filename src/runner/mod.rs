//! Client-side code runner.
//!
//! The sandboxed interpreter lives behind [`Interpreter`]; an
//! [`InterpreterRuntime`] loads it once and is handed to each [`CodeRunner`].
//! A run captures stdout/stderr, optionally exports the current figure, and
//! produces an [`OutputView`] for the page to render.

pub mod interpreter;
pub mod plot;
pub mod view;
pub mod widget;

pub use interpreter::{CapturedStreams, Interpreter, InterpreterLoader, InterpreterRuntime};
pub use plot::{PlotImage, uses_plot_library};
pub use view::{OutputView, ZoomOverlay};
pub use widget::{CodeRunner, RunOutcome, RunPhase};

use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RunnerError {
    #[error("a run is already in progress")]
    Busy,

    #[error("interpreter unavailable: {0}")]
    Unavailable(String),

    #[error("failed to load package {package}: {reason}")]
    PackageLoad { package: String, reason: String },

    /// Raised by the user's code; the text is shown verbatim.
    #[error("{0}")]
    Execution(String),
}
