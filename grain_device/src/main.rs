//! grain_patch: inspect a patch and check its dependency manifest.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use grain_device::{Device, FileResolver, Manifest, NullContext, Patch};

#[derive(Parser, Debug)]
#[command(name = "grain_patch")]
#[command(about = "Print a granular patch's parameters and verify its dependencies")]
struct Args {
    /// Patch definition (JSON)
    patch: PathBuf,

    /// Dependency manifest (JSON); files resolve relative to its directory
    #[arg(long, short)]
    dependencies: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();
    match inspect(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn inspect(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let patch = Patch::from_file(&args.patch)?;
    let mut ctx = NullContext::new(48_000);
    let device = Device::load_patch(&mut ctx, &patch)?;

    println!();
    println!("  Patch: {}", device.name());
    println!();
    println!("  {:<12} {:>8} {:>8} {:>8}", "parameter", "min", "max", "value");
    for p in device.parameters() {
        println!("  {:<12} {:>8.3} {:>8.3} {:>8.3}", p.id(), p.min(), p.max(), p.get());
    }
    println!();
    println!("  Buffers: {}", device.buffer_ids().collect::<Vec<_>>().join(", "));
    println!(
        "  Grains:  {:.0} ms @ {:.1}/s, ±{:.1} oct",
        patch.grains.grain_ms, patch.grains.density, patch.grains.octaves
    );

    if let Some(path) = &args.dependencies {
        let manifest = Manifest::from_file(path)?;
        println!();
        println!("  Dependencies ({}):", manifest.len());
        let result = device.load_dependencies(&manifest, &FileResolver::beside(path));
        for dep in &manifest.entries {
            let frames = device.buffer(&dep.id).map(|b| b.len());
            match frames {
                Some(n) => println!("    ✓ {:<12} {} ({} frames)", dep.id, dep.file, n),
                None    => println!("    ✗ {:<12} {}", dep.id, dep.file),
            }
        }
        result?;
    }
    println!();
    Ok(())
}
