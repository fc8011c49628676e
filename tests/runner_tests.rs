use portfolio_site::config::RunnerConfig;
use portfolio_site::runner::{
    CapturedStreams, CodeRunner, Interpreter, InterpreterLoader, InterpreterRuntime, OutputView,
    RunOutcome, RunPhase, RunnerError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Scripted stand-in for the sandboxed interpreter.
#[derive(Default)]
struct FakeInterpreter {
    stdout: String,
    stderr: String,
    fail_with: Option<String>,
    figure: Option<Vec<u8>>,
    export_fails: bool,
    gate: Option<Arc<Notify>>,
    loaded: Mutex<Vec<String>>,
    installed: Mutex<Vec<String>>,
    captures: AtomicUsize,
    exports: AtomicUsize,
}

impl Interpreter for FakeInterpreter {
    async fn load_packages(&self, packages: &[String]) -> Result<(), RunnerError> {
        self.loaded.lock().unwrap().extend_from_slice(packages);
        Ok(())
    }

    async fn install_package(&self, package: &str) -> Result<(), RunnerError> {
        self.installed.lock().unwrap().push(package.to_string());
        Ok(())
    }

    fn begin_capture(&self) -> Result<(), RunnerError> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn run(&self, _code: &str) -> Result<(), RunnerError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.fail_with {
            Some(msg) => Err(RunnerError::Execution(msg.clone())),
            None => Ok(()),
        }
    }

    fn captured(&self) -> Result<CapturedStreams, RunnerError> {
        Ok(CapturedStreams {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        })
    }

    async fn export_figure_png(&self) -> Result<Option<Vec<u8>>, RunnerError> {
        self.exports.fetch_add(1, Ordering::SeqCst);
        if self.export_fails {
            return Err(RunnerError::Execution("savefig failed".into()));
        }
        Ok(self.figure.clone())
    }
}

/// Hands out one pre-built interpreter; counts load attempts.
struct FakeLoader {
    interpreter: Mutex<Option<FakeInterpreter>>,
    attempts: Arc<AtomicUsize>,
    fail_first: bool,
}

impl FakeLoader {
    fn new(interpreter: FakeInterpreter) -> Self {
        Self {
            interpreter: Mutex::new(Some(interpreter)),
            attempts: Arc::new(AtomicUsize::new(0)),
            fail_first: false,
        }
    }
}

impl InterpreterLoader for FakeLoader {
    type Interpreter = FakeInterpreter;

    async fn load(&self) -> Result<FakeInterpreter, RunnerError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_first && attempt == 0 {
            return Err(RunnerError::Unavailable("runtime script missing".into()));
        }
        self.interpreter
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| RunnerError::Unavailable("already loaded".into()))
    }
}

fn runner_for(interpreter: FakeInterpreter) -> CodeRunner<FakeLoader> {
    let runtime = InterpreterRuntime::new(FakeLoader::new(interpreter), &RunnerConfig::default());
    CodeRunner::new(Arc::new(runtime))
}

async fn run(runner: &CodeRunner<FakeLoader>, source: &str) -> (OutputView, Vec<OutputView>) {
    let mut shown = Vec::new();
    let view = runner
        .run(source, &mut |v: &OutputView| shown.push(v.clone()))
        .await
        .expect("runner was idle");
    (view, shown)
}

#[tokio::test]
async fn prints_are_rendered_line_by_line() {
    let runner = runner_for(FakeInterpreter {
        stdout: "hello\n\nworld\n".into(),
        stderr: "warning: x\n".into(),
        ..Default::default()
    });

    let (view, shown) = run(&runner, "print('hello')\nprint()\nprint('world')").await;
    assert_eq!(shown.first(), Some(&OutputView::Running));
    assert_eq!(shown.last(), Some(&view));
    assert_eq!(
        view,
        OutputView::Output {
            lines: vec!["hello".into(), "world".into(), "warning: x".into()],
            plot: None,
        }
    );
    assert_eq!(runner.phase(), RunPhase::Idle);
    assert_eq!(runner.last_outcome(), Some(RunOutcome::Succeeded));
}

#[tokio::test]
async fn empty_source_never_touches_the_interpreter() {
    let runner = runner_for(FakeInterpreter::default());
    assert_eq!(runner.last_outcome(), None);
    let (view, _) = run(&runner, "   \n\t").await;
    assert_eq!(view, OutputView::EmptySource);
    assert_eq!(
        view.to_string(),
        "Please enter some Python code to run."
    );
}

#[tokio::test]
async fn silent_code_reports_no_output() {
    let runner = runner_for(FakeInterpreter::default());
    let (view, _) = run(&runner, "x = 1").await;
    assert_eq!(view, OutputView::NoOutput);
}

#[tokio::test]
async fn plotting_code_embeds_the_figure() {
    let runner = runner_for(FakeInterpreter {
        figure: Some(vec![0x89, b'P', b'N', b'G']),
        ..Default::default()
    });
    let (view, _) = run(&runner, "import matplotlib.pyplot as plt\nplt.plot([1, 2])").await;
    let plot = view.plot().expect("figure exported");
    assert_eq!(plot.data_url(), "data:image/png;base64,iVBORw==");
}

#[tokio::test]
async fn figure_export_is_skipped_without_plotting_calls() {
    let interpreter = FakeInterpreter {
        stdout: "3\n".into(),
        figure: Some(vec![1, 2, 3]),
        ..Default::default()
    };
    let runner = runner_for(interpreter);
    let (view, _) = run(&runner, "print(1 + 2)").await;
    assert!(view.plot().is_none());
}

#[tokio::test]
async fn failed_export_falls_back_to_text() {
    let runner = runner_for(FakeInterpreter {
        stdout: "done\n".into(),
        export_fails: true,
        ..Default::default()
    });
    let (view, _) = run(&runner, "df.plot()\nprint('done')").await;
    assert_eq!(
        view,
        OutputView::Output {
            lines: vec!["done".into()],
            plot: None
        }
    );
}

#[tokio::test]
async fn execution_errors_render_inline() {
    let runner = runner_for(FakeInterpreter {
        fail_with: Some("NameError: name 'x' is not defined".into()),
        ..Default::default()
    });
    let (view, _) = run(&runner, "print(x)").await;
    assert!(view.is_error());
    assert_eq!(
        view.to_string(),
        "❌ Error:\nNameError: name 'x' is not defined"
    );
    assert_eq!(runner.phase(), RunPhase::Idle);
    assert_eq!(runner.last_outcome(), Some(RunOutcome::Failed));
}

#[tokio::test]
async fn overlapping_run_is_rejected_while_busy() {
    let gate = Arc::new(Notify::new());
    let runner = runner_for(FakeInterpreter {
        stdout: "slow\n".into(),
        gate: Some(gate.clone()),
        ..Default::default()
    });

    let mut first_sink = |_: &OutputView| {};
    let first = runner.run("print('slow')", &mut first_sink);
    let second = async {
        // Let the first run reach the gate before competing with it.
        tokio::task::yield_now().await;
        assert_eq!(runner.phase(), RunPhase::Running);
        let mut shown = Vec::new();
        let res = runner
            .run("print('fast')", &mut |v: &OutputView| shown.push(v.clone()))
            .await;
        gate.notify_one();
        (res, shown)
    };

    let (first, (second, second_shown)) = tokio::join!(first, second);
    assert_eq!(second, Err(RunnerError::Busy));
    assert!(second_shown.is_empty());
    assert!(matches!(first, Ok(OutputView::Output { .. })));
    assert_eq!(runner.phase(), RunPhase::Idle);
}

#[tokio::test]
async fn runtime_loads_once_and_prepares_packages() {
    let loader = FakeLoader::new(FakeInterpreter::default());
    let attempts = loader.attempts.clone();
    let runtime = Arc::new(InterpreterRuntime::new(loader, &RunnerConfig::default()));
    let runner = CodeRunner::new(runtime.clone());

    assert!(!runtime.is_ready());
    run(&runner, "x = 1").await;
    run(&runner, "y = 2").await;
    assert!(runtime.is_ready());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    let interpreter = runtime.get().await.unwrap();
    assert_eq!(
        *interpreter.loaded.lock().unwrap(),
        vec!["micropip", "matplotlib", "numpy", "pandas"]
    );
    assert_eq!(*interpreter.installed.lock().unwrap(), vec!["seaborn"]);
    assert_eq!(interpreter.captures.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_load_is_shown_and_retried() {
    let mut loader = FakeLoader::new(FakeInterpreter {
        stdout: "ok\n".into(),
        ..Default::default()
    });
    loader.fail_first = true;
    let runtime = Arc::new(InterpreterRuntime::new(loader, &RunnerConfig::default()));
    let runner = CodeRunner::new(runtime);

    let (view, _) = run(&runner, "print('ok')").await;
    assert_eq!(
        view,
        OutputView::Error("interpreter unavailable: runtime script missing".into())
    );

    let (view, _) = run(&runner, "print('ok')").await;
    assert_eq!(
        view,
        OutputView::Output {
            lines: vec!["ok".into()],
            plot: None
        }
    );
}
