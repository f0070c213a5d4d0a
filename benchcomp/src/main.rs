use anyhow::{Context, Result};
use benchcomp::logging::init_logging;
use benchcomp::{
    select_benchmarks, Build, Cli, CommandRunner, Config, DisplaySink, FileDisplay, JsonReporter,
    NullDisplay, Orchestrator, OrchestratorError, ReportFormat, Reporter, TableReporter,
    TerminalDisplay,
};
use clap::Parser;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing::{debug, info};

/// Conventional exit status for a process stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_interrupted(&e) => {
            eprintln!("Interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load config and apply CLI overrides
    let mut config = Config::load_from(cli.config.as_deref())?;
    cli.apply_to_config(&mut config);
    config.validate().context("Invalid configuration")?;

    // A live table is only useful on a terminal; anything else gets the
    // final report once.
    let to_terminal = cli.output.is_none() && io::stdout().is_terminal();
    if !to_terminal {
        config.report.colors = false;
    }
    let live = to_terminal && config.report.format == ReportFormat::Table;

    if let Err(e) = init_logging(cli.verbose, cli.quiet, live) {
        eprintln!("Failed to initialize logging: {e}");
    }
    debug!(?config, live, "Configuration");

    // 1. Resolve builds and benchmarks
    let builds = cli
        .builds
        .iter()
        .map(|spec| Build::parse(spec).with_context(|| format!("Invalid build '{spec}'")))
        .collect::<Result<Vec<_>>>()?;
    let benchmarks = select_benchmarks(&config.benchmarks, &cli.tests)?;

    // 2. Run everything, refreshing the live report as results arrive
    info!(
        builds = builds.len(),
        benchmarks = benchmarks.len(),
        runs = config.orchestration.runs,
        warmup_runs = config.orchestration.warmup_runs,
        "Running benchmarks"
    );
    let reporter = reporter(&config);
    let mut display: Box<dyn DisplaySink> = if live {
        Box::new(TerminalDisplay::new())
    } else {
        Box::new(NullDisplay)
    };

    let mut orchestrator = Orchestrator::new(
        CommandRunner::new(),
        builds,
        benchmarks,
        config.orchestration.runs,
        config.orchestration.warmup_runs,
    );
    let results = orchestrator
        .run(reporter.as_ref(), display.as_mut())
        .await
        .context("Failed to run benchmarks")?;

    // 3. Write the final report where the live one did not go
    if !live {
        match &cli.output {
            Some(path) => {
                let mut file = FileDisplay::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                reporter.report(&results, &mut file)?;
                info!(path = %path.display(), "Report written");
            }
            None => {
                let mut stdout = FileDisplay::new(io::stdout().lock());
                reporter.report(&results, &mut stdout)?;
            }
        }
    }

    Ok(())
}

fn reporter(config: &Config) -> Box<dyn Reporter> {
    match config.report.format {
        ReportFormat::Json => Box::new(JsonReporter::new()),
        ReportFormat::Table => Box::new(
            TableReporter::new()
                .with_colors(config.report.colors)
                .with_samples(config.report.show_samples)
                .compact(config.report.compact)
                .with_confidence_level(config.hypothesis.confidence_level),
        ),
    }
}

fn is_interrupted(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<OrchestratorError>()
        .is_some_and(OrchestratorError::is_interrupted)
}
