use crate::chart_mode::*;
use crate::render::*;
use crate::utils::*;
use crate::Table;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Size of the worker pool, fixed and independent of the hardware.
pub const DEFAULT_WORKERS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Written(PathBuf),
    Displayed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub input: PathBuf,
    pub status: JobStatus,
}

/// Outcomes in submission order, one per input path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn written(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                JobStatus::Written(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn displayed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Displayed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Failed(_)))
    }

    fn count(&self, f: impl Fn(&JobStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.status)).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} written, {} displayed, {} skipped, {} failed",
            self.written().len(),
            self.displayed(),
            self.skipped(),
            self.failed()
        )
    }
}

/// Plan a job per input path, in order.
/// A path whose image was already claimed by an earlier path gets `OutputCollision`,
/// so no two jobs ever write the same file.
pub fn plan_batch(
    inputs: &[PathBuf],
    settings: &RenderSettings,
) -> Vec<(PathBuf, Result<ChartJob, PlotError>)> {
    let mut claimed: HashSet<PathBuf> = HashSet::with_capacity(inputs.len());
    inputs
        .iter()
        .map(|input| {
            let planned = ChartJob::plan(input.clone(), settings).and_then(|job| {
                match job.output_path() {
                    Some(out) if !claimed.insert(out.to_path_buf()) => {
                        Err(PlotError::OutputCollision {
                            input: input.clone(),
                            output: out.to_path_buf(),
                        })
                    }
                    _ => Ok(job),
                }
            });
            (input.clone(), planned)
        })
        .collect()
}

/// Load, build and emit one chart.
pub fn run_job<S>(job: &ChartJob, sink: &S) -> Result<JobStatus, PlotError>
where
    S: ChartSink + ?Sized,
{
    let start = Instant::now();
    let table = Table::from_csv(&job.input)?;
    let plot = build_plot(&table, job)?;
    let status = match &job.target {
        OutputTarget::Image(image) => {
            sink.export(&plot, image)?;
            JobStatus::Written(image.path.clone())
        }
        OutputTarget::Display => {
            sink.display(&plot)?;
            JobStatus::Displayed
        }
    };
    debug!("{:?} done in {:?}", job.input, start.elapsed());
    Ok(status)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_owned()
    }
}

/// Run one planned entry to a terminal status; errors and panics stay inside.
fn run_isolated<S>(input: &Path, planned: &Result<ChartJob, PlotError>, sink: &S) -> JobOutcome
where
    S: ChartSink + ?Sized,
{
    let status = match planned {
        Err(PlotError::UnrecognizedPath(_)) => {
            warn!("skipping {:?}: neither models nor histogram", input);
            JobStatus::Skipped("neither models nor histogram".to_owned())
        }
        Err(e) => {
            error!("{:?}: {}", input, e);
            JobStatus::Failed(e.to_string())
        }
        Ok(job) => match catch_unwind(AssertUnwindSafe(|| run_job(job, sink))) {
            Ok(Ok(status)) => {
                info!("{:?} -> {:?}", input, status);
                status
            }
            Ok(Err(e)) => {
                error!("{:?}: {}", input, e);
                JobStatus::Failed(e.to_string())
            }
            Err(payload) => {
                let msg = panic_message(payload);
                error!("{:?}: panicked: {}", input, msg);
                JobStatus::Failed(msg)
            }
        },
    };
    JobOutcome {
        input: input.to_path_buf(),
        status,
    }
}

/// Fan the inputs out over a pool of `workers` threads and wait for all of them.
/// A failing job never stops its siblings; its failure only shows in the report.
pub fn run_parallel<S>(
    inputs: &[PathBuf],
    settings: &RenderSettings,
    workers: usize,
    sink: &S,
) -> Result<BatchReport, PlotError>
where
    S: ChartSink + Sync + ?Sized,
{
    if workers == 0 {
        return Err(PlotError::InvalidArgument(
            "the worker pool needs at least one worker".to_owned(),
        ));
    }
    let planned = plan_batch(inputs, settings);
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("plot-worker-{}", i))
        .build()?;
    info!(
        "plotting {} files on {} workers",
        planned.len(),
        pool.current_num_threads()
    );
    let outcomes: Vec<JobOutcome> = pool.install(|| {
        planned
            .par_iter()
            .map(|(input, job)| run_isolated(input, job, sink))
            .collect()
    });
    Ok(BatchReport { outcomes })
}

/// Plot the inputs one after the other; the first error aborts the remaining files.
/// Unrecognized paths are skipped, not fatal.
pub fn run_sequential<S>(
    inputs: &[PathBuf],
    settings: &RenderSettings,
    sink: &S,
) -> Result<BatchReport, PlotError>
where
    S: ChartSink + ?Sized,
{
    let mut report = BatchReport::default();
    for (input, planned) in plan_batch(inputs, settings) {
        let status = match planned {
            Err(PlotError::UnrecognizedPath(_)) => {
                warn!("skipping {:?}: neither models nor histogram", input);
                JobStatus::Skipped("neither models nor histogram".to_owned())
            }
            Err(e) => return Err(e),
            Ok(job) => {
                let status = run_job(&job, sink)?;
                info!("{:?} -> {:?}", input, status);
                status
            }
        };
        report.outcomes.push(JobOutcome { input, status });
    }
    Ok(report)
}
