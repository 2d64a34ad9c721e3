use std::{
    io::{IsTerminal, Write},
    path::PathBuf,
};

use clap::Parser;
use eyre::WrapErr;
use protocol::{ThreadId, testing::ScriptedVm};
use replay::{RecordedLaunch, load_recording, resolve_config};
use tracer::{ThreadedLauncher, Tracer};
use tracing_subscriber::EnvFilter;

/// Replay a recorded debugging session and print the trace document
#[derive(Debug, Parser)]
struct Args {
    /// Recorded session, as JSON
    script: PathBuf,

    /// Source of the traced program, embedded in the output
    #[clap(short, long)]
    source: Option<PathBuf>,

    /// Tracer configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    #[clap(long)]
    max_steps: Option<usize>,

    #[clap(long)]
    max_stack_depth: Option<usize>,
}

fn main() -> eyre::Result<()> {
    if std::io::stderr().is_terminal() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .json()
            .init();
    }
    color_eyre::install()?;

    let args = Args::parse();
    tracing::debug!(?args, "parsed command line arguments");

    let mut config = resolve_config(args.config.as_deref()).wrap_err("loading configuration")?;
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps;
    }
    if let Some(max_stack_depth) = args.max_stack_depth {
        config.max_stack_depth = max_stack_depth;
    }
    eyre::ensure!(
        config.max_steps > 0 && config.max_stack_depth > 0,
        "limits must be positive"
    );

    let code = match &args.source {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading source {}", path.display()))?,
        None => String::new(),
    };

    let recording = load_recording(&args.script).wrap_err("loading recording")?;
    let launch = recording.launch.unwrap_or(RecordedLaunch::Succeeded);
    let launcher = ThreadedLauncher::new(move |thread: ThreadId| {
        tracing::debug!(%thread, "replaying launch outcome");
        launch.into_result()
    });

    let vm = ScriptedVm::from_script(recording.script);
    let mut tracer =
        Tracer::with_defaults(vm, config, code, launcher).wrap_err("attaching tracer")?;

    let mut stdout = std::io::stdout().lock();
    let document = tracer.run(&mut stdout).wrap_err("tracing recording")?;
    writeln!(stdout).wrap_err("writing output")?;

    tracing::info!(
        records = document.records().len(),
        state = ?tracer.state(),
        "replay finished"
    );
    Ok(())
}
