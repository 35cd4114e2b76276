use anyhow::Context;
use clap::Parser;
use colonies_report_model::{list_experiments, read_experiment};
use colonies_reporter::style::ReportStyle;
use colonies_reporter::{generate_comparison_report, generate_experiment_reports, ReportError};
use std::path::PathBuf;

/// Render chart reports from Colonies scaling benchmark results.
#[derive(Parser)]
#[command(name = "colonies-reporter", about, long_about = None)]
struct Cli {
    /// Experiment directories to report on. Defaults to every experiment
    /// discovered under the results root.
    experiments: Vec<PathBuf>,

    /// Root directory scanned for scaling experiment directories
    #[clap(long, default_value = "results")]
    results_root: PathBuf,

    /// Only report on the most recently modified experiment
    #[clap(long, default_value = "false")]
    latest: bool,

    /// List discovered experiments and exit
    #[clap(long, default_value = "false")]
    list: bool,

    /// Write artifacts here instead of into each experiment directory
    #[clap(long, short)]
    output: Option<PathBuf>,

    /// Publication styling: compact typography, no point annotations and
    /// vector + raster output per artifact
    #[clap(long, short, default_value = "false")]
    publication: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let discovered = list_experiments(&cli.results_root)?;

    if cli.list {
        println!("Available experiments:");
        for path in &discovered {
            let experiment = read_experiment(path)
                .with_context(|| format!("Failed to read experiment {}", path.display()))?;
            println!(
                "  {}: {} replica counts, {} executors, {} processes",
                experiment.name,
                experiment.replicas.len(),
                experiment.executors,
                experiment.processes
            );
            println!("    Path: {}", path.display());
        }
        return Ok(());
    }

    let selected = if !cli.experiments.is_empty() {
        cli.experiments.clone()
    } else if cli.latest {
        discovered.last().cloned().into_iter().collect()
    } else {
        discovered
    };
    if selected.is_empty() {
        return Err(ReportError::NoExperiments {
            root: cli.results_root,
        }
        .into());
    }

    let mut experiments = Vec::new();
    for path in &selected {
        if !path.is_dir() {
            log::warn!("{} is not a directory, skipping", path.display());
            continue;
        }
        let experiment = read_experiment(path)
            .with_context(|| format!("Failed to read experiment {}", path.display()))?;
        if experiment.is_empty() {
            log::warn!("No results found in {}", path.display());
            continue;
        }
        experiments.push(experiment);
    }
    if experiments.is_empty() {
        return Err(ReportError::NoUsableData.into());
    }

    let style = if cli.publication {
        ReportStyle::publication()
    } else {
        ReportStyle::interactive()
    };

    let mut artifact_count = 0;
    for experiment in &experiments {
        let out_dir = cli
            .output
            .clone()
            .unwrap_or_else(|| experiment.path.clone());
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
        artifact_count += generate_experiment_reports(experiment, &out_dir, &style)?.len();
    }

    let comparison_dir = cli.output.clone().unwrap_or_else(|| cli.results_root.clone());
    if let Some(written) = generate_comparison_report(&experiments, &comparison_dir, &style)? {
        artifact_count += written.len();
    }

    println!(
        "Generated {artifact_count} artifact(s) for {} experiment(s)",
        experiments.len()
    );
    Ok(())
}
