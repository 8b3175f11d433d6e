use std::path::{Path, PathBuf};
use std::sync::Arc;

use budget_core::{
    drop_rate_for, load_monster_catalog_from_env, load_tracker_config, threshold_for,
    ConfigStore, DropRate, JsonFileStore, KillBudgetTracker, KillThreshold, TrackerServices,
};
use budget_schema::parse_drop_denominator;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result};
use tracing::info;

mod replay;

use replay::{run_replay, ReplayScript};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fifty-Fifty kill budget inspector", long_about = None)]
struct Cli {
    /// JSON file standing in for the host's config store.
    #[arg(long, global = true, default_value = "fifty_fifty_store.json")]
    store: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert between a drop rate and a kill budget.
    Threshold {
        /// Rarest drop rate as `x` or `1/x`.
        #[arg(long, conflicts_with = "kills")]
        denominator: Option<String>,
        /// Kill budget to turn back into a drop rate.
        #[arg(long)]
        kills: Option<u32>,
    },
    /// List the built-in catalog (or `MONSTER_CATALOG_PATH`).
    Catalog {
        /// Only names containing this text, ignoring case.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Recorded kills against each budget.
    Kills,
    /// Set the kill count for one monster.
    Set { name: String, kills: u32 },
    /// Clear every kill count, or every custom monster with `--overrides`.
    Reset {
        #[arg(long)]
        overrides: bool,
    },
    /// Custom monsters the catalog does not know, as catalog rows.
    Export,
    /// Feed a scripted session through the tracker.
    Replay { script: PathBuf },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Threshold { denominator, kills } => threshold(denominator, kills),
        Command::Catalog { filter } => {
            catalog(filter.as_deref());
            Ok(())
        }
        Command::Kills => {
            let tracker = open_tracker(&cli.store)?;
            print_kills(&tracker);
            Ok(())
        }
        Command::Set { name, kills } => {
            let tracker = open_tracker(&cli.store)?;
            println!("{}", tracker.set_kills(&name, kills));
            Ok(())
        }
        Command::Reset { overrides } => {
            let tracker = open_tracker(&cli.store)?;
            if overrides {
                tracker.reset_overrides();
                println!("Reset all custom monster data.");
            } else {
                tracker.reset_all_kills();
                println!("Reset all kill counts.");
            }
            Ok(())
        }
        Command::Export => {
            let tracker = open_tracker(&cli.store)?;
            println!("{}", tracker.export_overrides());
            Ok(())
        }
        Command::Replay { script } => replay(&cli.store, &script),
    }
}

fn open_store(path: &Path) -> Result<Arc<dyn ConfigStore>> {
    let store = JsonFileStore::open(path)?;
    info!(path = %store.path().display(), "store.opened");
    Ok(Arc::new(store))
}

fn open_tracker(path: &Path) -> Result<KillBudgetTracker> {
    let store = open_store(path)?;
    Ok(KillBudgetTracker::from_env(store, TrackerServices::default()))
}

fn threshold(denominator: Option<String>, kills: Option<u32>) -> Result<()> {
    match (denominator, kills) {
        (Some(raw), _) => {
            let denominator = parse_drop_denominator(&raw).map_err(|err| eyre!(err.usage()))?;
            let rate = DropRate::from_denominator(denominator)
                .ok_or_else(|| eyre!("denominator must be positive"))?;
            println!("{rate} -> {} kills", threshold_for(rate));
        }
        (None, Some(0)) => bail!("a kill budget must be at least 1"),
        (None, Some(kills)) => {
            let rate = drop_rate_for(KillThreshold::Finite(kills));
            let p = rate.probability().unwrap_or(0.0);
            println!("{kills} kills <- p = {p:.6} ({rate})");
        }
        (None, None) => bail!("pass --denominator or --kills"),
    }
    Ok(())
}

fn catalog(filter: Option<&str>) {
    let catalog = load_monster_catalog_from_env();
    let needle = filter.map(str::to_ascii_lowercase);
    for definition in catalog.definitions() {
        if let Some(needle) = &needle {
            if !definition.name.to_ascii_lowercase().contains(needle.as_str()) {
                continue;
            }
        }
        println!(
            "{:<32} {:<32} {:>10} {:>8}",
            definition.name,
            definition.rarest_drop,
            definition.rate.to_string(),
            definition.threshold.to_string()
        );
    }
}

fn print_kills(tracker: &KillBudgetTracker) {
    let counts = tracker.all_kill_counts();
    if counts.is_empty() {
        println!("No kills recorded.");
        return;
    }
    for (name, kills) in counts {
        let threshold = tracker.threshold(&name);
        let budget = threshold.to_string();
        let percent = (tracker.progress(&name) * 100.0) as u32;
        let marker = if threshold.is_reached(kills) { " (maxed)" } else { "" };
        println!("{name:<32} {kills:>6} / {budget:<8} {percent:>3}%{marker}");
    }
}

fn replay(store_path: &Path, script_path: &Path) -> Result<()> {
    let script = ReplayScript::from_file(script_path)?;
    let store = open_store(store_path)?;
    let config = load_tracker_config(store.as_ref());
    let report = run_replay(&script, store, load_monster_catalog_from_env(), config);

    for line in &report.lines {
        println!("[{:>3}] {:>8}ms  {}", line.step, line.at_ms, line.summary);
    }
    for notification in &report.notifications {
        println!("  > {}", notification.text);
    }
    report.tracker.shutdown();
    print_kills(&report.tracker);
    Ok(())
}
