use crate::chart_mode::*;
use crate::utils::*;
use crate::Table;
use plotly::common::{Mode, Title};
use plotly::layout::Axis;
use plotly::{Bar, ImageFormat, Layout, Plot, Scatter};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Histograms are titled with their path and bucket count, models carry no title.
pub fn chart_title<P>(mode: ChartMode, fin: P, rows: usize) -> Option<String>
where
    P: AsRef<Path>,
{
    match mode {
        ChartMode::Models => None,
        ChartMode::Histogram => Some(format!("{} ({} buckets)", fin.as_ref().display(), rows)),
    }
}

/// Build the plotly figure for one job from its loaded table.
pub fn build_plot(table: &Table, job: &ChartJob) -> Result<Plot, PlotError> {
    let (xcol, ycol) = job.mode.columns();
    let x = table.numeric_column(xcol)?;
    let y = table.numeric_column(ycol)?;
    let name = job
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut plot = Plot::new();
    match job.kind {
        ChartKind::Line => plot.add_trace(Scatter::new(x, y).mode(Mode::Lines).name(&name)),
        ChartKind::Bar => plot.add_trace(Bar::new(x, y).name(&name)),
    }

    let mut layout = Layout::new()
        .x_axis(Axis::new().title(Title::new(xcol)))
        .y_axis(Axis::new().title(Title::new(ycol)));
    if let Some(title) = chart_title(job.mode, &job.input, table.len()) {
        layout = layout.title(Title::new(&title));
    }
    plot.set_layout(layout);
    Ok(plot)
}

/// Where finished figures go. The plotly implementation needs the kaleido
/// exporter and a browser; tests substitute their own.
pub trait ChartSink {
    fn export(&self, plot: &Plot, image: &ImageSpec) -> Result<(), PlotError>;
    fn display(&self, plot: &Plot) -> Result<(), PlotError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlotlySink;

/// Run `write` against a fresh `path`: any image left by an earlier run is removed
/// first, so the file existing afterwards means `write` produced it.
pub fn write_fresh<F>(path: &Path, write: F) -> Result<(), PlotError>
where
    F: FnOnce(),
{
    let export_err = |reason: String| PlotError::Export {
        path: path.to_path_buf(),
        reason,
    };
    match std::fs::remove_file(path) {
        Ok(()) => debug!("removed previous image {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(export_err(format!("could not remove previous image: {}", e))),
    }
    write();
    if !path.exists() {
        return Err(export_err("the exporter finished without writing the file".to_owned()));
    }
    Ok(())
}

impl ChartSink for PlotlySink {
    fn export(&self, plot: &Plot, image: &ImageSpec) -> Result<(), PlotError> {
        // kaleido reports some failures by panicking, the caller isolates those,
        // and others by writing nothing at all
        write_fresh(&image.path, || {
            plot.write_image(
                &image.path,
                ImageFormat::PNG,
                image.width,
                image.height,
                image.scale,
            )
        })
    }

    fn display(&self, plot: &Plot) -> Result<(), PlotError> {
        plot.show();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job_for(fin: &str, settings: &RenderSettings) -> ChartJob {
        ChartJob::plan(PathBuf::from(fin), settings).unwrap()
    }

    #[test]
    fn histogram_title_has_row_count() {
        let fin = "./test/RMI_wiki_histogram.csv";
        let table = Table::from_csv(fin).unwrap();
        let job = job_for(fin, &RenderSettings::default());
        let title = chart_title(job.mode, &job.input, table.len()).unwrap();
        assert!(title.contains("10"), "{}", title);
        assert!(title.contains("RMI_wiki_histogram.csv"), "{}", title);

        let json = build_plot(&table, &job).unwrap().to_json();
        assert!(json.contains("(10 buckets)"), "{}", json);
        assert!(json.contains("\"scatter\""), "{}", json);
        assert!(json.contains("bucket_lower"), "{}", json);
    }

    #[test]
    fn models_have_no_title() {
        assert_eq!(chart_title(ChartMode::Models, "models_rmi.csv", 6), None);
        let fin = "./test/models_rmi.csv";
        let table = Table::from_csv(fin).unwrap();
        let json = build_plot(&table, &job_for(fin, &RenderSettings::default()))
            .unwrap()
            .to_json();
        assert!(!json.contains("buckets"), "{}", json);
        assert!(json.contains("models_rmi"), "{}", json);
    }

    #[test]
    fn bar_kind_builds_bar_trace() {
        let settings = RenderSettings {
            histogram_kind: ChartKind::Bar,
            ..RenderSettings::default()
        };
        let fin = "./test/RMI_wiki_histogram.csv";
        let table = Table::from_csv(fin).unwrap();
        let json = build_plot(&table, &job_for(fin, &settings)).unwrap().to_json();
        assert!(json.contains("\"bar\""), "{}", json);
    }

    #[test]
    fn same_input_same_figure() {
        let fin = "./test/RMI_wiki_histogram.csv";
        let job = job_for(fin, &RenderSettings::default());
        let first = build_plot(&Table::from_csv(fin).unwrap(), &job).unwrap();
        let second = build_plot(&Table::from_csv(fin).unwrap(), &job).unwrap();
        assert_eq!(first.to_json(), second.to_json());
    }

    #[test]
    fn stale_image_does_not_count_as_written() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("RMI_histogram.png");
        std::fs::write(&png, b"previous run").unwrap();
        // an exporter that silently writes nothing
        let err = write_fresh(&png, || {}).unwrap_err();
        assert!(matches!(err, PlotError::Export { .. }), "{:?}", err);
        assert!(!png.exists());
    }

    #[test]
    fn fresh_write_replaces_previous_image() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("RMI_histogram.png");
        std::fs::write(&png, b"previous run").unwrap();
        write_fresh(&png, || std::fs::write(&png, b"this run").unwrap()).unwrap();
        assert_eq!(std::fs::read(&png).unwrap(), b"this run");

        let missing = dir.path().join("models_rmi.png");
        write_fresh(&missing, || std::fs::write(&missing, b"first run").unwrap()).unwrap();
        assert!(missing.exists());
    }

    #[test]
    fn wrong_columns_fail_the_build() {
        // histogram name, models content
        let dir = tempfile::tempdir().unwrap();
        let fin = dir.path().join("histogram_xy.csv");
        std::fs::copy("./test/models_rmi.csv", &fin).unwrap();
        let table = Table::from_csv(&fin).unwrap();
        let job = ChartJob::plan(fin, &RenderSettings::default()).unwrap();
        let err = build_plot(&table, &job).err().unwrap();
        assert!(matches!(err, PlotError::MissingColumn { .. }), "{:?}", err);
    }
}
