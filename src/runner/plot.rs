use base64::{Engine, engine::general_purpose::STANDARD};

const PLOT_LIBRARIES: [&str; 4] = ["matplotlib", "seaborn", "plotly", "bokeh"];
const PLOT_CALLS: [&str; 8] = [
    "plot", "hist", "scatter", "bar", "boxplot", "line", "show", "savefig",
];

/// Heuristic on the source text: an `import <plotting library>` statement, or
/// a `.plot(`-style call on anything.
pub fn uses_plot_library(source: &str) -> bool {
    imports_plot_library(source) || calls_plot_method(source)
}

fn imports_plot_library(source: &str) -> bool {
    source.match_indices("import").any(|(idx, kw)| {
        let rest = &source[idx + kw.len()..];
        let trimmed = rest.trim_start();
        trimmed.len() < rest.len() && PLOT_LIBRARIES.iter().any(|lib| trimmed.starts_with(lib))
    })
}

fn calls_plot_method(source: &str) -> bool {
    source.match_indices('.').any(|(idx, _)| {
        let rest = &source[idx + 1..];
        PLOT_CALLS.iter().any(|name| {
            rest.strip_prefix(name)
                .is_some_and(|after| after.starts_with('('))
        })
    })
}

/// A PNG figure exported by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotImage {
    base64: String,
}

impl PlotImage {
    pub const ALT_TEXT: &'static str = "Generated Plot";

    pub fn from_png(png: &[u8]) -> Self {
        Self {
            base64: STANDARD.encode(png),
        }
    }

    /// `data:` URL suitable for an `<img src>`.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.base64)
    }

    pub fn alt(&self) -> &'static str {
        Self::ALT_TEXT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_plotting_imports() {
        assert!(uses_plot_library("import matplotlib.pyplot as plt"));
        assert!(uses_plot_library("import   seaborn as sns"));
        assert!(uses_plot_library("x = 1\nimport\tplotly.express as px"));
        assert!(!uses_plot_library("import numpy as np"));
        assert!(!uses_plot_library("importmatplotlib"));
    }

    #[test]
    fn detects_plotting_calls() {
        assert!(uses_plot_library("df.plot()"));
        assert!(uses_plot_library("ax.hist(data, bins=10)"));
        assert!(uses_plot_library("plt.show()"));
        assert!(!uses_plot_library("s.lineplot (x)"));
        assert!(!uses_plot_library("print('hello')"));
        assert!(!uses_plot_library("obj.plotter()"));
    }

    #[test]
    fn data_url_embeds_png_as_base64() {
        let img = PlotImage::from_png(&[0x89, b'P', b'N', b'G']);
        assert_eq!(img.data_url(), "data:image/png;base64,iVBORw==");
        assert_eq!(img.alt(), "Generated Plot");
    }
}
