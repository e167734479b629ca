use clap::{Args, Parser, Subcommand, ValueEnum};
use pn_core::{
    CancelToken, CaseConfig, CoreError, ProgressEvent, ProgressSink, SnapshotFrame,
};
use pn_network::{LatticeSpec, Network, NetworkError};
use pn_results::types::RunKind;
use pn_results::{ResultsError, RunManifest, RunStore, Series, compute_run_id};
use pn_sim::{
    SequenceReport, SimError, StageKind, UnsteadyReport, run_quasi_static_sequence,
    run_single_stage, run_waterflood_case,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Results(#[from] ResultsError),
}

type CliResult<T> = Result<T, CliError>;

const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pn-cli")]
#[command(about = "Pore-network two-phase flow simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a case configuration file
    Validate {
        /// Path to the case JSON file
        config_path: PathBuf,
    },
    /// Print the default case configuration as JSON
    DefaultConfig,
    /// Run a simulation on a generated lattice
    #[command(subcommand)]
    Run(RunCommands),
    /// List stored runs
    Runs {
        /// Run store directory
        store_dir: PathBuf,
    },
    /// Show a stored run's manifest
    ShowRun {
        /// Run store directory
        store_dir: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export one series of a stored run
    ExportSeries {
        /// Run store directory
        store_dir: PathBuf,
        /// Run ID
        run_id: String,
        /// Series name (e.g. primary_drainage_pc, waterflood_sw)
        series: String,
        /// Output file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct LatticeArgs {
    /// Lattice nodes along the flow axis
    #[arg(long, default_value_t = 5)]
    nx: u32,
    /// Lattice nodes across
    #[arg(long, default_value_t = 5)]
    ny: u32,
    /// Lattice layers
    #[arg(long, default_value_t = 1)]
    nz: u32,
    /// Case JSON file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Save results into this run store directory
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum RunCommands {
    /// Full quasi-static five-stage displacement cycle
    Sweep {
        #[command(flatten)]
        lattice: LatticeArgs,
    },
    /// One quasi-static stage on a fresh network
    Stage {
        /// Which stage to run
        stage: StageArg,
        /// Stop once water saturation crosses this value
        #[arg(long)]
        target_sw: Option<f64>,
        #[command(flatten)]
        lattice: LatticeArgs,
    },
    /// Rate-controlled waterflood of an oil-saturated network
    Flood {
        #[command(flatten)]
        lattice: LatticeArgs,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StageArg {
    Drainage,
    Imbibition,
    ForcedInjection,
    OilInvasion,
    SecondaryDrainage,
}

impl StageArg {
    fn kind(self) -> StageKind {
        match self {
            StageArg::Drainage => StageKind::PrimaryDrainage,
            StageArg::Imbibition => StageKind::SpontaneousImbibition,
            StageArg::ForcedInjection => StageKind::ForcedWaterInjection,
            StageArg::OilInvasion => StageKind::SpontaneousOilInvasion,
            StageArg::SecondaryDrainage => StageKind::SecondaryDrainage,
        }
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::DefaultConfig => cmd_default_config(),
        Commands::Run(run_cmd) => match run_cmd {
            RunCommands::Sweep { lattice } => cmd_run_sweep(&lattice),
            RunCommands::Stage {
                stage,
                target_sw,
                lattice,
            } => cmd_run_stage(stage, target_sw, &lattice),
            RunCommands::Flood { lattice } => cmd_run_flood(&lattice),
        },
        Commands::Runs { store_dir } => cmd_runs(&store_dir),
        Commands::ShowRun { store_dir, run_id } => cmd_show_run(&store_dir, &run_id),
        Commands::ExportSeries {
            store_dir,
            run_id,
            series,
            output,
        } => cmd_export_series(&store_dir, &run_id, &series, output.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<CaseConfig> {
    let cfg = match path {
        Some(p) => serde_json::from_str(&std::fs::read_to_string(p)?)?,
        None => CaseConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn build_lattice(args: &LatticeArgs, cfg: &CaseConfig) -> CliResult<Network> {
    let spec = LatticeSpec {
        nx: args.nx,
        ny: args.ny,
        nz: args.nz,
        ..LatticeSpec::default()
    };
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let net = spec.build(&mut rng)?;
    println!(
        "Network: {} nodes, {} throats, porosity {:.4}",
        net.node_count(),
        net.throat_count(),
        net.porosity()
    );
    Ok(net)
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating case: {}", config_path.display());
    load_config(Some(config_path))?;
    println!("✓ Case is valid");
    Ok(())
}

fn cmd_default_config() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&CaseConfig::default())?);
    Ok(())
}

fn cmd_run_sweep(args: &LatticeArgs) -> CliResult<()> {
    let cfg = load_config(args.config.as_deref())?;
    let mut net = build_lattice(args, &cfg)?;
    let cancel = CancelToken::new();
    let mut sink = ConsoleSink::default();

    let start = Instant::now();
    let report = run_quasi_static_sequence(&mut net, &cfg, &cancel, &mut sink)?;
    clear_progress_line();
    println!(
        "✓ Sequence completed in {:.2}s",
        start.elapsed().as_secs_f64()
    );
    println!(
        "  Absolute permeability: {:.3e} m²",
        report.absolute_permeability
    );
    for stage in &report.stages {
        println!(
            "  {:<26} {:?}  Sw={:.3}  ({} samples)",
            stage.kind.label(),
            stage.outcome,
            stage.final_sw,
            stage.pc_curve.len()
        );
    }

    if let Some(dir) = &args.store {
        save_sequence(dir, &cfg, &net, &report)?;
    }
    Ok(())
}

fn cmd_run_stage(stage: StageArg, target_sw: Option<f64>, args: &LatticeArgs) -> CliResult<()> {
    let cfg = load_config(args.config.as_deref())?;
    let kind = stage.kind();
    let mut net = build_lattice(args, &cfg)?;
    let cancel = CancelToken::new();
    let mut sink = ConsoleSink::default();

    let start = Instant::now();
    let report = run_single_stage(&mut net, &cfg, kind, &cancel, &mut sink, target_sw)?;
    clear_progress_line();
    println!(
        "✓ {} finished in {:.2}s: {:?}, Sw={:.3}",
        kind.label(),
        start.elapsed().as_secs_f64(),
        report.outcome,
        report.final_sw
    );

    if let Some(dir) = &args.store {
        let store = RunStore::new(dir.clone())?;
        let config_json = serde_json::to_string_pretty(&cfg)?;
        let run_id = compute_run_id(&config_json, kind.label(), ENGINE_VERSION);
        let mut series: Vec<&Series> = vec![&report.pc_curve];
        if let Some(kr) = &report.kr_curve {
            series.push(kr);
        }
        let manifest = manifest_for(
            run_id.clone(),
            RunKind::QuasiStatic {
                stage: kind.label().to_string(),
            },
            config_json,
            &series,
            &net,
        );
        store.save_run(&manifest, &series, &sink.frames)?;
        println!("✓ Saved run {run_id}");
    }
    Ok(())
}

fn cmd_run_flood(args: &LatticeArgs) -> CliResult<()> {
    let cfg = load_config(args.config.as_deref())?;
    let mut net = build_lattice(args, &cfg)?;
    let cancel = CancelToken::new();
    let mut sink = ConsoleSink::default();

    let start = Instant::now();
    let report: UnsteadyReport = run_waterflood_case(&mut net, &cfg, &cancel, &mut sink)?;
    clear_progress_line();
    println!(
        "✓ Waterflood finished in {:.2}s: {:?}",
        start.elapsed().as_secs_f64(),
        report.outcome
    );
    println!("  Time steps: {}", report.steps);
    println!("  Simulated time: {:.3e} s", report.elapsed);
    println!("  Injected PVs: {:.3}", report.injected_pvs);
    println!("  Final Sw: {:.3}", report.final_sw);

    if let Some(dir) = &args.store {
        let store = RunStore::new(dir.clone())?;
        let config_json = serde_json::to_string_pretty(&cfg)?;
        let run_id = compute_run_id(&config_json, "waterflood", ENGINE_VERSION);
        let series: Vec<&Series> = vec![&report.sw_history, &report.dp_history];
        let manifest = manifest_for(
            run_id.clone(),
            RunKind::Unsteady,
            config_json,
            &series,
            &net,
        );
        store.save_run(&manifest, &series, &sink.frames)?;
        println!("✓ Saved run {run_id}");
    }
    Ok(())
}

fn save_sequence(
    dir: &Path,
    cfg: &CaseConfig,
    net: &Network,
    report: &SequenceReport,
) -> CliResult<()> {
    let store = RunStore::new(dir.to_path_buf())?;
    let config_json = serde_json::to_string_pretty(cfg)?;
    for stage in &report.stages {
        let run_id = compute_run_id(&config_json, stage.kind.label(), ENGINE_VERSION);
        let mut series: Vec<&Series> = vec![&stage.pc_curve];
        if let Some(kr) = &stage.kr_curve {
            series.push(kr);
        }
        let manifest = manifest_for(
            run_id.clone(),
            RunKind::QuasiStatic {
                stage: stage.kind.label().to_string(),
            },
            config_json.clone(),
            &series,
            net,
        );
        store.save_run(&manifest, &series, &[])?;
        println!("✓ Saved run {run_id} ({})", stage.kind.label());
    }
    Ok(())
}

fn manifest_for(
    run_id: String,
    kind: RunKind,
    config_json: String,
    series: &[&Series],
    net: &Network,
) -> RunManifest {
    RunManifest {
        run_id,
        kind,
        config_json,
        series: series.iter().map(|s| s.name().to_string()).collect(),
        node_count: net.node_count(),
        throat_count: net.throat_count(),
        porosity: net.porosity(),
        absolute_permeability: net.absolute_permeability,
    }
}

fn cmd_runs(store_dir: &Path) -> CliResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    let runs = store.list_runs()?;
    if runs.is_empty() {
        println!("No runs in {}", store_dir.display());
        return Ok(());
    }
    println!("Runs in {}:", store_dir.display());
    for run_id in runs {
        match store.load_manifest(&run_id) {
            Ok(m) => println!("  {} ({:?})", run_id, m.kind),
            Err(_) => println!("  {} (unreadable manifest)", run_id),
        }
    }
    Ok(())
}

fn cmd_show_run(store_dir: &Path, run_id: &str) -> CliResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    let manifest = store.load_manifest(run_id)?;

    println!("Run {}", manifest.run_id);
    println!("  Kind: {:?}", manifest.kind);
    println!(
        "  Network: {} nodes, {} throats, porosity {:.4}",
        manifest.node_count, manifest.throat_count, manifest.porosity
    );
    if let Some(k) = manifest.absolute_permeability {
        println!("  Absolute permeability: {:.3e} m²", k);
    }
    println!("  Series:");
    for name in &manifest.series {
        println!("    {name}");
    }
    Ok(())
}

fn cmd_export_series(
    store_dir: &Path,
    run_id: &str,
    series: &str,
    output: Option<&Path>,
) -> CliResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    // Fails with RunNotFound when the run directory is absent.
    store.load_manifest(run_id)?;
    let path = store.root().join(run_id).join(format!("{series}.tsv"));
    let content = std::fs::read_to_string(path)?;

    if let Some(out) = output {
        std::fs::write(out, &content)?;
        println!("✓ Exported {series} to {}", out.display());
    } else {
        print!("{content}");
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

/// Renders a progress bar on stdout and keeps snapshot frames for saving.
#[derive(Default)]
struct ConsoleSink {
    frames: Vec<SnapshotFrame>,
    last_percent: Option<u8>,
}

impl ProgressSink for ConsoleSink {
    fn on_progress(&mut self, event: ProgressEvent) {
        if self.last_percent == Some(event.percent) {
            return;
        }
        self.last_percent = Some(event.percent);
        let width = 28usize;
        let filled = (event.percent as usize * width / 100).min(width);
        let bar = format!(
            "{}{}",
            "#".repeat(filled),
            "-".repeat(width.saturating_sub(filled))
        );
        print!("\r[{}] {:>3}%  {}", bar, event.percent, event.status);
        let _ = io::stdout().flush();
    }

    fn on_snapshot(&mut self, frame: SnapshotFrame) {
        self.frames.push(frame);
    }
}
