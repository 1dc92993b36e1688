use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use volley_stats::config::StatsConfig;
use volley_stats::simulate::{SimOptions, simulate_match};
use volley_stats::{MatchAggregator, MemoryStore, SqliteStore, logging};

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let (config, rest) = StatsConfig::load(&args);
    logging::init(&config.log_filter);

    let seed = parse_seed_arg(&rest);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let opts = SimOptions::default();

    // Default to a throwaway store; only write to sqlite when a path was asked for.
    let box_score = if config.memory || !config.db_explicit {
        let store = MemoryStore::new();
        let sim = simulate_match(&store, &mut rng, &opts)?;
        print_summary(&sim.summary, sim.actions_recorded);
        MatchAggregator::new(&store).box_score(sim.summary.match_info.id)?
    } else {
        let path = config.db_path.context("unable to resolve sqlite path")?;
        let store = SqliteStore::open(&path)
            .with_context(|| format!("open stats db {}", path.display()))?;
        let sim = simulate_match(&store, &mut rng, &opts)?;
        print_summary(&sim.summary, sim.actions_recorded);
        println!("DB: {}", path.display());
        MatchAggregator::new(&store).box_score(sim.summary.match_info.id)?
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&box_score).context("serialize box score")?
    );
    Ok(())
}

fn print_summary(summary: &volley_stats::MatchSummary, actions: usize) {
    println!(
        "Simulated match {} vs {}: {}-{}",
        summary.match_info.id,
        summary.match_info.opponent,
        summary.home_sets_won,
        summary.opponent_sets_won
    );
    for set in &summary.sets {
        println!(
            " - set {}: {}-{}",
            set.set_number, set.home_score, set.opponent_score
        );
    }
    println!("Actions recorded: {actions}");
}

fn parse_seed_arg(args: &[String]) -> Option<u64> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--seed=") {
            return raw.trim().parse().ok();
        }
        if arg == "--seed" {
            return args.get(idx + 1)?.trim().parse().ok();
        }
    }
    None
}
