use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rstage_installer::{FailurePolicy, RRunner, StagingLayout};
use rstage_locator::{resolve_sources, scan_vendor_dir, CranIndex};

use crate::flows::{
    format_resolution_lines, load_manifest, manifest_path, run_install_flow, InstallFlowOptions,
};
use crate::render::{
    detect_output_style, finish_spinner, render_status_line, start_spinner, OutputStyle,
};

#[derive(Parser, Debug)]
#[command(name = "rstage")]
#[command(about = "Staging-time R package installer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve and install every package the application declares.
    Install {
        #[arg(long, default_value = ".")]
        app_dir: PathBuf,
        /// Manifest path; defaults to r.toml at the application root.
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Concurrency budget; overrides the manifest's num_threads.
        /// Must be at least 1.
        #[arg(long)]
        ncpus: Option<NonZeroUsize>,
        /// CRAN-style mirror; overrides the manifest's cran_mirror.
        #[arg(long)]
        mirror: Option<String>,
        /// Policy for failures of packages only declared as dependencies:
        /// strict or warn-transitive.
        #[arg(long)]
        failure_policy: Option<String>,
        /// Print per-package source resolutions and exit without installing.
        #[arg(long)]
        dry_run: bool,
        /// Disable styled output even on a terminal.
        #[arg(long)]
        plain: bool,
    },
    /// Print per-package source resolutions without installing.
    Resolve {
        #[arg(long, default_value = ".")]
        app_dir: PathBuf,
        #[arg(long)]
        mirror: Option<String>,
    },
    Version,
    Completions {
        shell: Shell,
    },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Install {
            app_dir,
            manifest: manifest_override,
            ncpus,
            mirror,
            failure_policy,
            dry_run,
            plain,
        } => {
            let layout = StagingLayout::new(app_dir);
            let manifest = load_manifest(&layout, manifest_override.as_deref())?;
            let mirror = mirror.unwrap_or_else(|| manifest.effective_mirror().to_string());
            let style = detect_output_style(plain);
            let failure_policy = match failure_policy {
                Some(value) => FailurePolicy::parse(&value)?,
                None => FailurePolicy::default(),
            };

            println!(
                "{}",
                render_status_line(
                    style,
                    "step",
                    &format!(
                        "staging {} R package(s) from {}",
                        manifest.packages.len(),
                        manifest_path(&layout, manifest_override.as_deref()).display()
                    )
                )
            );

            let options = InstallFlowOptions {
                manifest_override,
                ncpus_override: ncpus.map(NonZeroUsize::get),
                failure_policy,
                dry_run,
            };
            let runner = RRunner::new(&mirror, layout.r_library_dir());
            let mut probe = mirror_probe(mirror, style);
            let stdout = std::io::stdout();
            let outcome =
                run_install_flow(&layout, &options, &runner, &mut probe, stdout.lock())?;

            if outcome.is_success() {
                println!("{}", render_status_line(style, "done", "R packages staged"));
                return Ok(());
            }
            println!(
                "{}",
                render_status_line(style, "fail", &format!("staging {}", outcome.as_str()))
            );
            Err(anyhow!("staging failed: {}", outcome.as_str()))
        }
        Commands::Resolve { app_dir, mirror } => {
            let layout = StagingLayout::new(app_dir);
            let manifest = load_manifest(&layout, None)?;
            let mirror = mirror.unwrap_or_else(|| manifest.effective_mirror().to_string());
            let vendored = scan_vendor_dir(&layout.vendor_dir())?;
            let mut probe = mirror_probe(mirror, OutputStyle::Plain);
            let resolutions = resolve_sources(&manifest.packages, &vendored, &mut probe)?;
            for line in format_resolution_lines(&manifest.packages, &resolutions) {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "rstage", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Remote membership probe backed by the mirror's package index, fetched
/// lazily on the first non-vendored package and reused for the rest of the
/// run. Fully vendored applications never touch the network.
fn mirror_probe(
    mirror: String,
    style: OutputStyle,
) -> impl FnMut(&str) -> Result<bool> {
    let mut index: Option<CranIndex> = None;
    move |name: &str| {
        if index.is_none() {
            let spinner = start_spinner(style, "fetching package index");
            let fetched = CranIndex::fetch(&mirror);
            finish_spinner(spinner);
            index = Some(fetched?);
        }
        Ok(index
            .as_ref()
            .map(|idx| idx.contains(name))
            .unwrap_or(false))
    }
}
