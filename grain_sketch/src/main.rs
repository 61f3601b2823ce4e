//! grain_sketch: interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use grain_sketch::activation::ResumePolicy;
use grain_sketch::app::run;
use grain_sketch::config::AppConfig;
use grain_sketch::error::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "grain_sketch")]
#[command(about = "Draw on a canvas to play a granular sampler")]
#[command(version)]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Patch definition (JSON)
    #[arg(long)]
    patch: Option<PathBuf>,

    /// Dependency manifest (JSON)
    #[arg(long)]
    dependencies: Option<PathBuf>,

    /// WAV file to load into the sample slot once the patch is ready
    #[arg(long)]
    sample: Option<PathBuf>,

    /// Require an explicit permission grant before audio starts
    #[arg(long)]
    consent: bool,

    /// Run without a sound card
    #[arg(long)]
    headless_audio: bool,

    /// Output device name (uses the default if not specified)
    #[arg(long)]
    output: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    if let Err(e) = load_config(args).and_then(run) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(args: Args) -> Result<AppConfig, AppError> {
    let mut cfg = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None       => AppConfig::default(),
    };

    if let Some(patch)  = args.patch        { cfg.patch = patch; }
    if let Some(deps)   = args.dependencies { cfg.dependencies = deps; }
    if let Some(sample) = args.sample       { cfg.sample = Some(sample); }
    if let Some(output) = args.output       { cfg.output_device = Some(output); }
    if args.consent        { cfg.resume_policy = ResumePolicy::ConsentGated; }
    if args.headless_audio { cfg.headless_audio = true; }

    tracing::info!(
        patch = %cfg.patch.display(),
        dependencies = %cfg.dependencies.display(),
        policy = ?cfg.resume_policy,
        "configuration loaded"
    );
    Ok(cfg)
}
