use plot_stats::dispatch::{run_parallel, run_sequential};
use plot_stats::plot_stats::{init_logging, startup, Startup};
use plot_stats::render::PlotlySink;
use plot_stats::utils::PlotError;
use tracing::info;

fn main() -> eyre::Result<()> {
    let args = match startup(std::env::args_os(), &mut std::io::stdout()) {
        Ok(Startup::Run(args)) => args,
        Ok(Startup::Exit(code)) => std::process::exit(code),
        Err(PlotError::Cli(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };
    init_logging(args.verbose)?;
    let report = if args.sequential {
        run_sequential(&args.csvin, &args.settings, &PlotlySink)?
    } else {
        run_parallel(&args.csvin, &args.settings, args.workers, &PlotlySink)?
    };
    info!("{}", report.summary());
    Ok(())
}
