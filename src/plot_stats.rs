use super::VERSION;
use crate::chart_mode::*;
use crate::utils::PlotError;
use clap::{value_parser, Arg, ArgAction, Command};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Printed to stdout when no csv file is given.
pub const USAGE: &str = "Please specify at least one csv file as parameter";

/// Everything the plot_stats app takes from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotArgs {
    pub csvin: Vec<PathBuf>,
    pub settings: RenderSettings,
    pub workers: usize,
    pub sequential: bool,
    pub verbose: u8,
}

pub fn build_cli() -> Command {
    let arg_csvin = Arg::new("input_csvfiles")
        .help("csv files to plot; paths containing \"models\" or \"histogram\" are plotted")
        .num_args(0..)
        .value_parser(value_parser!(PathBuf));
    let arg_jobs = Arg::new("jobs")
        .help("number of workers plotting in parallel")
        .short('j')
        .long("jobs")
        .num_args(1)
        .value_parser(value_parser!(u16).range(1..))
        .default_value("20");
    let arg_scale = Arg::new("scale")
        .help("scale factor applied to the png size")
        .short('s')
        .long("scale")
        .num_args(1)
        .value_parser(value_parser!(f64))
        .default_value("4");
    let arg_width = Arg::new("width")
        .help("base width of the png, before scaling")
        .long("width")
        .num_args(1)
        .value_parser(value_parser!(u16).range(1..))
        .default_value("700");
    let arg_height = Arg::new("height")
        .help("base height of the png, before scaling")
        .long("height")
        .num_args(1)
        .value_parser(value_parser!(u16).range(1..))
        .default_value("500");
    let arg_bar = Arg::new("bar")
        .help("draw histograms as bars instead of lines")
        .short('b')
        .long("bar")
        .action(ArgAction::SetTrue);
    let arg_show = Arg::new("show")
        .help("open histograms in the browser instead of writing png files")
        .long("show")
        .action(ArgAction::SetTrue);
    let arg_sequential = Arg::new("sequential")
        .help("plot one file at a time and stop at the first error")
        .long("sequential")
        .action(ArgAction::SetTrue);
    let arg_verbose = Arg::new("verbose")
        .help("print verbose information, repeat for more")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count);
    Command::new("plot_stats")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot histogram and model csv files to png")
        .arg(arg_csvin)
        .arg(arg_jobs)
        .arg(arg_scale)
        .arg(arg_width)
        .arg(arg_height)
        .arg(arg_bar)
        .arg(arg_show)
        .arg(arg_sequential)
        .arg(arg_verbose)
}

/// Takes the CLI arguments of the running process.
pub fn parse_cli() -> Result<PlotArgs, PlotError> {
    parse_cli_from(std::env::args_os())
}

/// Takes the CLI arguments from `args`, the first being the program name.
/// No csv file is a `PlotError::Usage`, clap errors (including --help) are `PlotError::Cli`.
/// It is safe to unwrap get_one for the arguments with a default value.
pub fn parse_cli_from<I, T>(args: I) -> Result<PlotArgs, PlotError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = build_cli().try_get_matches_from(args)?;
    let csvin: Vec<PathBuf> = cli_args
        .get_many::<PathBuf>("input_csvfiles")
        .map(|p| p.cloned().collect())
        .unwrap_or_default();
    if csvin.is_empty() {
        return Err(PlotError::Usage);
    }
    let scale = *cli_args.get_one::<f64>("scale").unwrap();
    if !(scale.is_finite() && scale > 0.) {
        return Err(PlotError::InvalidArgument(format!(
            "scale must be a positive number, got {}",
            scale
        )));
    }
    let histogram_kind = if cli_args.get_flag("bar") {
        ChartKind::Bar
    } else {
        ChartKind::Line
    };
    let settings = RenderSettings {
        scale,
        width: *cli_args.get_one::<u16>("width").unwrap() as usize,
        height: *cli_args.get_one::<u16>("height").unwrap() as usize,
        histogram_kind,
        show_histograms: cli_args.get_flag("show"),
    };
    Ok(PlotArgs {
        csvin,
        settings,
        workers: *cli_args.get_one::<u16>("jobs").unwrap() as usize,
        sequential: cli_args.get_flag("sequential"),
        verbose: cli_args.get_count("verbose"),
    })
}

/// Level filter for the app's logs.
/// A RUST_LOG value is used as is, full directives included;
/// without it the verbosity count picks the level of this crate.
pub fn log_filter(verbose: u8, rust_log: Option<&str>) -> Result<EnvFilter, PlotError> {
    if let Some(directives) = rust_log {
        return EnvFilter::try_new(directives)
            .map_err(|e| PlotError::InvalidArgument(format!("RUST_LOG {directives:?}: {e}")));
    }
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    Ok(EnvFilter::new(format!("plot_stats={level}")))
}

/// Log to stderr with local timestamps.
pub fn init_logging(verbose: u8) -> Result<(), PlotError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = log_filter(verbose, rust_log.as_deref())?;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
    Ok(())
}

/// What the binary does after reading its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Startup {
    Run(PlotArgs),
    /// Stop before any job with this exit code.
    Exit(i32),
}

/// Parse `args`; without csv files write the usage line to `out` and stop with -1.
/// Other clap errors (--help, --version, bad values) are left to the caller.
pub fn startup<I, T, W>(args: I, out: &mut W) -> Result<Startup, PlotError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
{
    match parse_cli_from(args) {
        Ok(args) => Ok(Startup::Run(args)),
        Err(PlotError::Usage) => {
            writeln!(out, "{}", USAGE)?;
            Ok(Startup::Exit(-1))
        }
        Err(e) => Err(e),
    }
}
