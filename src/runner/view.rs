use super::plot::PlotImage;
use std::fmt;

/// What the output panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputView {
    Running,
    EmptySource,
    /// Non-blank output lines and an optional figure; never both empty.
    Output {
        lines: Vec<String>,
        plot: Option<PlotImage>,
    },
    NoOutput,
    /// Error text shown verbatim.
    Error(String),
}

impl OutputView {
    pub fn from_output(text: &str, plot: Option<PlotImage>) -> Self {
        let lines: Vec<String> = text
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        if lines.is_empty() && plot.is_none() {
            return OutputView::NoOutput;
        }
        OutputView::Output { lines, plot }
    }

    pub fn error(err: impl fmt::Display) -> Self {
        OutputView::Error(err.to_string())
    }

    pub fn plot(&self) -> Option<&PlotImage> {
        match self {
            OutputView::Output { plot, .. } => plot.as_ref(),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, OutputView::Error(_))
    }
}

impl fmt::Display for OutputView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputView::Running => f.write_str("⏳ Running..."),
            OutputView::EmptySource => f.write_str("Please enter some Python code to run."),
            OutputView::NoOutput => {
                f.write_str("✅ Code executed with no printed output or plot.")
            }
            OutputView::Error(text) => write!(f, "❌ Error:\n{text}"),
            OutputView::Output { lines, plot } => {
                f.write_str(&lines.join("\n"))?;
                if let Some(plot) = plot {
                    if !lines.is_empty() {
                        f.write_str("\n")?;
                    }
                    write!(f, "[{}]", plot.alt())?;
                }
                Ok(())
            }
        }
    }
}

/// Full-screen zoom of a generated figure.
#[derive(Debug, Default)]
pub struct ZoomOverlay {
    image: Option<PlotImage>,
}

impl ZoomOverlay {
    /// Clicking the figure opens the overlay with a copy of it.
    pub fn open(&mut self, image: &PlotImage) {
        self.image = Some(image.clone());
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    pub fn image(&self) -> Option<&PlotImage> {
        self.image.as_ref()
    }

    pub fn click(&mut self) {
        self.image = None;
    }

    /// Returns whether the key closed the overlay.
    pub fn key_down(&mut self, key: &str) -> bool {
        if key == "Escape" && self.is_open() {
            self.image = None;
            return true;
        }
        false
    }
}
