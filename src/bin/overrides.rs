//! Schema Overrides CLI
//!
//! Validates override files against base schemas and writes merged graphs.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use schema_overrides::loader::{self, discover_units};
use schema_overrides::{
    diff, Checksum, DriverSettings, OverrideError, OverridesConfig, Runner, Validator,
};

#[derive(Parser)]
#[command(name = "schema-overrides")]
#[command(about = "Validate and apply provider overrides to API schemas")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output target whose attribute whitelists apply
    #[arg(short, long, global = true)]
    target: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that every override targets something real
    Validate {
        /// Base schema (.json or .toml)
        #[arg(long)]
        api: PathBuf,
        /// Override file (.json or .toml)
        #[arg(long)]
        overrides: PathBuf,
    },

    /// Validate and merge, printing or writing the merged schema
    Merge {
        #[arg(long)]
        api: PathBuf,
        #[arg(long)]
        overrides: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what the overrides change
    Diff {
        #[arg(long)]
        api: PathBuf,
        #[arg(long)]
        overrides: PathBuf,
    },

    /// Compile every unit found below a directory
    Batch {
        /// Directory holding one subdirectory per product
        dir: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<OverrideError>() {
            Some(err) => eprintln!("❌ [{}] {}", err.kind(), err),
            None => eprintln!("❌ Error: {}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = OverridesConfig::load_from(cli.config.as_deref())?;
    if let Some(name) = cli.target {
        config.target.name = name;
    }
    let target = config.active_target()?;

    match cli.command {
        Commands::Validate { api, overrides } => {
            let (product, overrides_map) = load_pair(&api, &overrides)?;
            eprintln!("🔍 Validating {} against {}", overrides.display(), api.display());

            Validator::new(&product, &overrides_map, &target).run()?;
            eprintln!(
                "✅ {} override target(s) valid for '{}'",
                overrides_map.len(),
                target.name
            );
            Ok(())
        }

        Commands::Merge { api, overrides, output } => {
            let (product, overrides_map) = load_pair(&api, &overrides)?;
            let merged = Runner::build(&product, &overrides_map, &target)?;
            let checksum = Checksum::of_product(&merged)?;
            let rendered = config.output.format.render(&merged)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    let count = merged.resources.len();
                    eprintln!("✅ Wrote {} ({} resources)", path.display(), count);
                }
                None => println!("{}", rendered),
            }
            eprintln!("   fingerprint: {}", checksum.short());
            Ok(())
        }

        Commands::Diff { api, overrides } => {
            let (product, overrides_map) = load_pair(&api, &overrides)?;
            let merged = Runner::build(&product, &overrides_map, &target)?;

            let changed = diff::changed_paths(&product, &merged)?;
            if changed.is_empty() {
                eprintln!("✅ Overrides change nothing");
                return Ok(());
            }

            print!("{}", diff::render(&product, &merged)?);
            let (inserted, deleted) = diff::line_stats(&product, &merged)?;
            eprintln!();
            eprintln!("📝 {} node(s) changed (+{} -{}):", changed.len(), inserted, deleted);
            for path in &changed {
                eprintln!("   └─ {}", path);
            }
            Ok(())
        }

        Commands::Batch { dir } => {
            let units = discover_units(&dir)?;
            if units.is_empty() {
                return Err(format!("No compilation units found in {}", dir.display()).into());
            }

            eprintln!("🔨 Compiling {} unit(s) for '{}'", units.len(), target.name);
            let settings = DriverSettings::new(target, config.driver.max_parallel_units);
            let outcomes = schema_overrides::compile_all(&units, &settings);

            let mut failed = 0;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(merged) => {
                        let checksum = Checksum::of_product(merged)?;
                        eprintln!("  ✅ {} ({})", outcome.name, checksum.short());
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("  ❌ {} [{}] {}", outcome.name, e.kind(), e);
                    }
                }
            }

            eprintln!();
            if failed > 0 {
                eprintln!("❌ {} of {} unit(s) failed", failed, outcomes.len());
                std::process::exit(1);
            }
            eprintln!("✅ All units compiled");
            Ok(())
        }
    }
}

fn load_pair(
    api: &Path,
    overrides: &Path,
) -> schema_overrides::Result<(schema_overrides::Product, schema_overrides::OverrideMap)> {
    Ok((loader::load_product(api)?, loader::load_overrides(overrides)?))
}
