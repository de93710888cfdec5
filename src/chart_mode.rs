use crate::utils::*;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCALE: f64 = 4.;
pub const DEFAULT_WIDTH: usize = 700;
pub const DEFAULT_HEIGHT: usize = 500;

/// What kind of data a csv holds, decided from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartMode {
    /// Fitted model curves, columns `x` and `y`.
    Models,
    /// Distribution histograms, columns `bucket_lower` and `bucket_value`.
    Histogram,
}

impl ChartMode {
    /// "models" wins over "histogram" when a path contains both.
    pub fn detect<P>(fin: P) -> Option<ChartMode>
    where
        P: AsRef<Path>,
    {
        let name = fin.as_ref().to_string_lossy();
        if contains_ignore_case(&name, "models") {
            Some(ChartMode::Models)
        } else if contains_ignore_case(&name, "histogram") {
            Some(ChartMode::Histogram)
        } else {
            None
        }
    }

    /// The (x, y) column names.
    pub fn columns(&self) -> (&'static str, &'static str) {
        match self {
            ChartMode::Models => ("x", "y"),
            ChartMode::Histogram => ("bucket_lower", "bucket_value"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

/// Rendering options shared by every job of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub scale: f64,
    pub width: usize,
    pub height: usize,
    pub histogram_kind: ChartKind,
    pub show_histograms: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            scale: DEFAULT_SCALE,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            histogram_kind: ChartKind::Line,
            show_histograms: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    Display,
    Image(ImageSpec),
}

/// One input file and everything needed to turn it into a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartJob {
    pub input: PathBuf,
    pub mode: ChartMode,
    pub kind: ChartKind,
    pub target: OutputTarget,
}

impl ChartJob {
    /// Decide mode, chart kind and output for one input path.
    /// Models are always exported, whatever the settings say.
    pub fn plan(input: PathBuf, settings: &RenderSettings) -> Result<ChartJob, PlotError> {
        let mode = match ChartMode::detect(&input) {
            Some(mode) => mode,
            None => return Err(PlotError::UnrecognizedPath(input)),
        };
        let image = OutputTarget::Image(ImageSpec {
            path: png_path(&input),
            width: settings.width,
            height: settings.height,
            scale: settings.scale,
        });
        let (kind, target) = match mode {
            ChartMode::Models => (ChartKind::Line, image),
            ChartMode::Histogram if settings.show_histograms => {
                (settings.histogram_kind, OutputTarget::Display)
            }
            ChartMode::Histogram => (settings.histogram_kind, image),
        };
        Ok(ChartJob {
            input,
            mode,
            kind,
            target,
        })
    }

    /// The file this job writes, if it writes one.
    pub fn output_path(&self) -> Option<&Path> {
        match &self.target {
            OutputTarget::Image(spec) => Some(&spec.path),
            OutputTarget::Display => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("results/models_rmi.csv", Some(ChartMode::Models))]
    #[case("results/RMI_MODELS.csv", Some(ChartMode::Models))]
    #[case("results/RMI_wiki_histogram.csv", Some(ChartMode::Histogram))]
    #[case("histograms/RMI_fb.csv", Some(ChartMode::Histogram))]
    #[case("histogram_of_models.csv", Some(ChartMode::Models))]
    #[case("results/RMI_wiki.csv", None)]
    fn detect_mode_from_path(#[case] fin: &str, #[case] expected: Option<ChartMode>) {
        assert_eq!(ChartMode::detect(fin), expected);
    }

    #[test]
    fn models_job_exports_at_default_scale() {
        let job = ChartJob::plan(
            PathBuf::from("results/models_rmi.csv"),
            &RenderSettings::default(),
        )
        .unwrap();
        assert_eq!(job.mode, ChartMode::Models);
        assert_eq!(job.kind, ChartKind::Line);
        assert_eq!(
            job.target,
            OutputTarget::Image(ImageSpec {
                path: PathBuf::from("results/models_rmi.png"),
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
                scale: 4.,
            })
        );
    }

    #[test]
    fn models_are_never_displayed() {
        let settings = RenderSettings {
            show_histograms: true,
            histogram_kind: ChartKind::Bar,
            ..RenderSettings::default()
        };
        let job = ChartJob::plan(PathBuf::from("models_rmi.csv"), &settings).unwrap();
        assert_eq!(job.kind, ChartKind::Line);
        assert_eq!(job.output_path(), Some(Path::new("models_rmi.png")));
    }

    #[test]
    fn histogram_follows_settings() {
        let settings = RenderSettings {
            show_histograms: true,
            histogram_kind: ChartKind::Bar,
            ..RenderSettings::default()
        };
        let job = ChartJob::plan(PathBuf::from("RMI_wiki_histogram.csv"), &settings).unwrap();
        assert_eq!(job.kind, ChartKind::Bar);
        assert_eq!(job.target, OutputTarget::Display);
        assert_eq!(job.output_path(), None);
    }

    #[test]
    fn unrecognized_path_is_rejected() {
        let err = ChartJob::plan(PathBuf::from("RMI_wiki.csv"), &RenderSettings::default())
            .unwrap_err();
        assert!(matches!(err, PlotError::UnrecognizedPath(_)));
    }

    #[test]
    fn histogram_columns() {
        assert_eq!(
            ChartMode::Histogram.columns(),
            ("bucket_lower", "bucket_value")
        );
        assert_eq!(ChartMode::Models.columns(), ("x", "y"));
    }
}
