use super::RunnerError;
use crate::config::RunnerConfig;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Text captured from the interpreter's standard streams during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedStreams {
    pub stdout: String,
    pub stderr: String,
}

impl CapturedStreams {
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// The sandboxed, in-browser interpreter.
pub trait Interpreter: Send + Sync + 'static {
    /// Load packages bundled with the runtime.
    fn load_packages(
        &self,
        packages: &[String],
    ) -> impl Future<Output = Result<(), RunnerError>> + Send;

    /// Fetch and install a package through the runtime's own installer.
    fn install_package(&self, package: &str)
    -> impl Future<Output = Result<(), RunnerError>> + Send;

    /// Swap in fresh stdout/stderr buffers and close any open figures.
    fn begin_capture(&self) -> Result<(), RunnerError>;

    fn run(&self, code: &str) -> impl Future<Output = Result<(), RunnerError>> + Send;

    fn captured(&self) -> Result<CapturedStreams, RunnerError>;

    /// The active figure as PNG bytes, `None` if there is nothing to save.
    fn export_figure_png(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RunnerError>> + Send;
}

/// Produces the interpreter; invoked at most once per successful initialisation.
pub trait InterpreterLoader: Send + Sync + 'static {
    type Interpreter: Interpreter;

    fn load(&self) -> impl Future<Output = Result<Self::Interpreter, RunnerError>> + Send;
}

/// Lifecycle owner of the interpreter. The first [`get`](Self::get) loads it
/// and prepares the configured packages; later calls share that instance.
/// A failed initialisation leaves the runtime empty so the next call retries.
pub struct InterpreterRuntime<L: InterpreterLoader> {
    loader: L,
    packages: Vec<String>,
    extra_packages: Vec<String>,
    ready: OnceCell<Arc<L::Interpreter>>,
}

impl<L: InterpreterLoader> InterpreterRuntime<L> {
    pub fn new(loader: L, cfg: &RunnerConfig) -> Self {
        Self {
            loader,
            packages: cfg.packages.clone(),
            extra_packages: cfg.extra_packages.clone(),
            ready: OnceCell::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    pub async fn get(&self) -> Result<Arc<L::Interpreter>, RunnerError> {
        self.ready
            .get_or_try_init(|| self.initialize())
            .await
            .cloned()
    }

    async fn initialize(&self) -> Result<Arc<L::Interpreter>, RunnerError> {
        let interpreter = self.loader.load().await.inspect_err(|e| {
            warn!(error = %e, "interpreter failed to load");
        })?;
        interpreter.load_packages(&self.packages).await?;
        for package in &self.extra_packages {
            interpreter.install_package(package).await?;
        }
        info!(
            packages = self.packages.len(),
            extra = self.extra_packages.len(),
            "interpreter ready"
        );
        Ok(Arc::new(interpreter))
    }
}
