use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fleet_export::report::write_json_file;
use fleet_export::timeline::write_timeline_file;
use fleet_sizing::report::{fleet_report, timeline};
use fleet_sizing::scenario::Scenario;
use log::{LevelFilter, info};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Size a spacecraft fleet against its mission plan"
)]
struct Cli {
    /// Scenario document (YAML or TOML)
    #[arg(long)]
    scenario: PathBuf,

    /// Simulation settings overriding the scenario's own
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the fleet report as JSON (`-` for stdout)
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the phase timeline as CSV (`-` for stdout)
    #[arg(long)]
    timeline: Option<PathBuf>,

    /// Skip group homogenization and the propellant-only pass
    #[arg(long, default_value_t = false)]
    no_homogenize: bool,

    /// Print the snapshot of every phase
    #[arg(long, default_value_t = false)]
    phases: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    match verbose {
        0 => {
            builder.filter_level(LevelFilter::Warn);
            if let Ok(filters) = std::env::var("RUST_LOG") {
                builder.parse_filters(&filters);
            }
        }
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        2 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    let _ = builder.try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = fleet_config::load_scenario(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;
    if let Some(path) = &cli.settings {
        config.simulation = fleet_config::load_simulation(path)
            .with_context(|| format!("loading settings {}", path.display()))?;
    }
    if cli.no_homogenize {
        config.simulation.convergence.homogenize = false;
    }

    let Scenario {
        name,
        mut fleet,
        mut plan,
        program_margin_days,
    } = Scenario::try_from(&config).context("building fleet and plan")?;
    info!("designing '{name}' ({} phases)", plan.phases().len());

    let convergence = fleet
        .design(&mut plan)
        .with_context(|| format!("designing fleet '{name}'"))?;

    println!("Fleet: {name} ({})", fleet.architecture);
    println!(
        "Convergence: {} after {} iterations",
        if convergence.converged { "reached" } else { "NOT reached" },
        convergence.iterations
    );
    if !convergence.all_passes_converged() {
        println!("  passes converged: {:?}", convergence.passes);
    }
    for module in &convergence.unsettled {
        println!("  unsettled: {module}");
    }
    println!();
    println!("{}", fleet.mass_summary());
    println!();
    println!("{}", fleet.cost_summary(&plan));
    println!(
        "Program duration: {:.1} days",
        plan.program_duration_s(program_margin_days) / 86_400.0
    );
    if cli.phases {
        println!();
        println!("{}", plan.report());
    }

    if let Some(path) = &cli.json {
        let report = fleet_report(&fleet, &plan, &convergence, program_margin_days);
        write_json_file(path, &report)
            .with_context(|| format!("writing report {}", path.display()))?;
    }
    if let Some(path) = &cli.timeline {
        write_timeline_file(path, &timeline(&plan))
            .with_context(|| format!("writing timeline {}", path.display()))?;
    }
    Ok(())
}
