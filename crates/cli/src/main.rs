use anyhow::Context;
use clap::{Parser, ValueEnum};
use sortlab_config::{AuxiliaryPolicy, HarnessConfig, TestCorpus};
use sortlab_core::metrics::HarnessMetrics;
use sortlab_core::peripherals::uart::CaptureSink;
use sortlab_core::routines::{IdentityRoutine, ReferenceRoutine, UnsignedOnlyRoutine};
use sortlab_core::snapshot::RunSnapshot;
use sortlab_core::{Harness, RoutineUnderTest};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod junit;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoutineChoice {
    /// Known-good swap and bubble sort
    Reference,
    /// Leaves every buffer untouched
    Identity,
    /// Ignores the sign flag
    UnsignedOnly,
}

impl RoutineChoice {
    fn build(self) -> Box<dyn RoutineUnderTest> {
        match self {
            RoutineChoice::Reference => Box::new(ReferenceRoutine),
            RoutineChoice::Identity => Box::new(IdentityRoutine),
            RoutineChoice::UnsignedOnly => Box::new(UnsignedOnlyRoutine),
        }
    }

    fn name(self) -> &'static str {
        match self {
            RoutineChoice::Reference => "reference",
            RoutineChoice::Identity => "identity",
            RoutineChoice::UnsignedOnly => "unsigned-only",
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "SortLab test harness for asmSwap/asmSort", long_about = None)]
struct Args {
    /// Path to the harness configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a test corpus (YAML); overrides the one named in the config
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Routine to run the tests against
    #[arg(short, long, value_enum, default_value_t = RoutineChoice::Reference)]
    routine: RoutineChoice,

    /// Name printed in the final report
    #[arg(long)]
    student: Option<String>,

    /// Milliseconds between test cases
    #[arg(long)]
    period_ms: Option<u64>,

    /// Stop idling after this many counter lines (default: idle forever)
    #[arg(long)]
    idle_cycles: Option<u64>,

    /// Fail cases whose swap status or swap count is implausible
    #[arg(long)]
    strict: bool,

    /// Directory for result.json, junit.xml and uart.log
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write a JUnit XML report to this path
    #[arg(long)]
    junit: Option<PathBuf>,

    /// Do not echo serial output to stdout
    #[arg(long)]
    no_uart_stdout: bool,

    /// Enable per-case debug logging
    #[arg(short, long)]
    trace: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the serial stream.
    if args.trace {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    info!("Starting SortLab harness");

    let (mut config, config_corpus) = if let Some(path) = &args.config {
        info!("Loading harness config: {:?}", path);
        let config = HarnessConfig::from_file(path)?;
        let corpus = config.corpus_path(path);
        (config, corpus)
    } else {
        info!("Using default harness configuration");
        (HarnessConfig::default(), None)
    };

    if let Some(ms) = args.period_ms {
        config.pacing.case_period_ms = ms;
    }
    if args.strict {
        config.scoring.auxiliary_policy = AuxiliaryPolicy::Enforced;
    }
    if let Some(name) = &args.student {
        config.student_name = name.clone();
    }
    config.validate()?;

    let corpus = match args.corpus.clone().or(config_corpus) {
        Some(path) => {
            info!("Loading test corpus: {:?}", path);
            TestCorpus::from_file(&path)?
        }
        None => TestCorpus::builtin(),
    };

    let tx_buffer_len = usize::try_from(config.tx_buffer_len()?)
        .context("Serial 'tx_buffer' does not fit in memory")?;
    let sink = CaptureSink::new(!args.no_uart_stdout);

    let mut harness = Harness::new(
        args.routine.build(),
        corpus.clone(),
        config.clone(),
        Box::new(sink.clone()),
        tx_buffer_len,
    )?;
    let metrics = Arc::new(HarnessMetrics::new());
    harness.observers.push(metrics.clone());

    info!("Testing routine '{}'", args.routine.name());
    let report = harness.run()?;
    info!(
        "{} cases ({} passed, {} failed) at {:.1} cases/s",
        metrics.get_cases(),
        metrics.get_passes(),
        metrics.get_fails(),
        metrics.get_cases_per_sec()
    );

    let snapshot = RunSnapshot::new(
        &report,
        &config.student_name,
        args.routine.name(),
        config.scoring.auxiliary_policy,
        &corpus,
    );

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output dir {:?}", dir))?;

        let result_path = dir.join("result.json");
        std::fs::write(&result_path, serde_json::to_string_pretty(&snapshot)?)
            .with_context(|| format!("Failed to write {:?}", result_path))?;
        std::fs::write(dir.join("uart.log"), sink.contents())
            .context("Failed to write uart.log")?;
        junit::write_junit(&dir.join("junit.xml"), &report)?;
        info!("Artifacts written to {:?}", dir);
    }

    if let Some(path) = &args.junit {
        junit::write_junit(path, &report)?;
        info!("JUnit report written to {:?}", path);
    }

    let cycles = harness.idle(args.idle_cycles)?;
    info!("Idle loop finished after {} cycles", cycles);

    Ok(())
}
