use super::RunnerError;
use super::interpreter::{Interpreter, InterpreterLoader, InterpreterRuntime};
use super::plot::{PlotImage, uses_plot_library};
use super::view::OutputView;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
}

/// How the most recent finished run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed,
}

const NO_OUTCOME: u8 = 0;
const SUCCEEDED: u8 = 1;
const FAILED: u8 = 2;

/// Where views are rendered; the page's output element.
pub trait OutputSink {
    fn show(&mut self, view: &OutputView);
}

impl<F: FnMut(&OutputView)> OutputSink for F {
    fn show(&mut self, view: &OutputView) {
        self(view)
    }
}

/// One code-runner widget. At most one run is in flight; overlapping calls
/// are rejected with [`RunnerError::Busy`].
pub struct CodeRunner<L: InterpreterLoader> {
    runtime: Arc<InterpreterRuntime<L>>,
    busy: AtomicBool,
    last_outcome: AtomicU8,
}

/// Returns the widget to `Idle` however the run ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<L: InterpreterLoader> CodeRunner<L> {
    pub fn new(runtime: Arc<InterpreterRuntime<L>>) -> Self {
        Self {
            runtime,
            busy: AtomicBool::new(false),
            last_outcome: AtomicU8::new(NO_OUTCOME),
        }
    }

    pub fn phase(&self) -> RunPhase {
        if self.busy.load(Ordering::Acquire) {
            RunPhase::Running
        } else {
            RunPhase::Idle
        }
    }

    /// `None` until the first run completes.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        match self.last_outcome.load(Ordering::Acquire) {
            SUCCEEDED => Some(RunOutcome::Succeeded),
            FAILED => Some(RunOutcome::Failed),
            _ => None,
        }
    }

    fn try_begin(&self) -> Result<RunGuard<'_>, RunnerError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RunnerError::Busy)?;
        Ok(RunGuard(&self.busy))
    }

    /// Run `source`, showing `Running` and then the final view on `sink`.
    /// Interpreter failures are rendered as [`OutputView::Error`]; the only
    /// `Err` is [`RunnerError::Busy`], in which case `sink` is untouched.
    pub async fn run(
        &self,
        source: &str,
        sink: &mut impl OutputSink,
    ) -> Result<OutputView, RunnerError> {
        let _guard = self.try_begin()?;
        sink.show(&OutputView::Running);

        let code = source.trim();
        let view = if code.is_empty() {
            OutputView::EmptySource
        } else {
            match self.execute(code).await {
                Ok(view) => {
                    debug!("run succeeded");
                    view
                }
                Err(e) => {
                    debug!(error = %e, "run failed");
                    OutputView::error(e)
                }
            }
        };

        let outcome = if view.is_error() { FAILED } else { SUCCEEDED };
        self.last_outcome.store(outcome, Ordering::Release);
        sink.show(&view);
        Ok(view)
    }

    async fn execute(&self, code: &str) -> Result<OutputView, RunnerError> {
        let interpreter = self.runtime.get().await?;
        interpreter.begin_capture()?;
        interpreter.run(code).await?;
        let streams = interpreter.captured()?;

        let plot = if uses_plot_library(code) {
            match interpreter.export_figure_png().await {
                Ok(png) => png.map(|bytes| PlotImage::from_png(&bytes)),
                Err(e) => {
                    debug!(error = %e, "figure export failed; showing text only");
                    None
                }
            }
        } else {
            None
        };

        Ok(OutputView::from_output(&streams.combined(), plot))
    }
}
