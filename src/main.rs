use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use volley_stats::config::StatsConfig;
use volley_stats::export::export_box_score;
use volley_stats::{
    Action, ActionRecorder, MatchAggregator, MatchStore, MemoryStore, RosterSlot, SetTracker,
    Side, SqliteStore, StatStore, logging,
};

const USAGE: &str = "usage: volley_stats [--db <path>] [--memory] <command> [args]

commands:
  new-match <opponent> [yyyy-mm-dd]
  start-set <match_id> <player[:s]>...     (:s marks a starter)
  record <set_id> <player_id> <action>     (kill, attack-attempt, kill-error, service-ace,
                                            service-attempt, service-error, dig, dig-error,
                                            block, block-error, assist, set-attempt,
                                            set-error, pass-0..pass-3)
  point <home|opp> <set_id>
  line <set_id> <player_id>
  totals <match_id> [player_id]
  summary <match_id>
  box-score <match_id>
  export <match_id> <file.xlsx>
  delete-match <match_id>";

trait Backend: StatStore + MatchStore {}

impl<T: StatStore + MatchStore> Backend for T {}

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let (config, rest) = StatsConfig::load(&args);
    logging::init(&config.log_filter);

    match run(&config, &rest) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &StatsConfig, args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };
    let store = open_store(config)?;
    let store = store.as_ref();
    let tracker = SetTracker::new(store);
    let recorder = ActionRecorder::new(store);
    let aggregator = MatchAggregator::new(store);

    match command.as_str() {
        "new-match" => {
            let opponent = args.get(1).context("missing opponent")?;
            let played_on = match args.get(2) {
                Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .with_context(|| format!("invalid date {raw:?}"))?,
                None => Utc::now().date_naive(),
            };
            print_json(&tracker.create_match(opponent, played_on)?)
        }
        "start-set" => {
            let match_id = parse_arg(args, 1, "match_id")?;
            let roster = args[2..]
                .iter()
                .map(|raw| parse_roster_slot(raw))
                .collect::<Result<Vec<_>>>()?;
            print_json(&tracker.start_set(match_id, &roster)?)
        }
        "record" => {
            let set_id = parse_arg(args, 1, "set_id")?;
            let player_id = parse_arg(args, 2, "player_id")?;
            let action: Action = parse_arg(args, 3, "action")?;
            let record = recorder.record(set_id, player_id, action)?;
            print_json(&record.view())
        }
        "point" => {
            let side = match args.get(1).map(String::as_str) {
                Some("home") => Side::Home,
                Some("opp") | Some("opponent") => Side::Opponent,
                other => bail!("expected home or opp, got {other:?}"),
            };
            let set_id = parse_arg(args, 2, "set_id")?;
            print_json(&tracker.record_point(set_id, side)?)
        }
        "line" => {
            let set_id = parse_arg(args, 1, "set_id")?;
            let player_id = parse_arg(args, 2, "player_id")?;
            print_json(&recorder.stat_line(set_id, player_id)?.view())
        }
        "totals" => {
            let match_id = parse_arg(args, 1, "match_id")?;
            let totals = match args.get(2) {
                Some(_) => {
                    let player_id = parse_arg(args, 2, "player_id")?;
                    aggregator.individual_match_totals(match_id, player_id)?
                }
                None => aggregator.team_match_totals(match_id)?,
            };
            print_json(&totals)
        }
        "summary" => {
            let match_id = parse_arg(args, 1, "match_id")?;
            print_json(&tracker.match_summary(match_id)?)
        }
        "box-score" => {
            let match_id = parse_arg(args, 1, "match_id")?;
            print_json(&aggregator.box_score(match_id)?)
        }
        "export" => {
            let match_id = parse_arg(args, 1, "match_id")?;
            let path = PathBuf::from(args.get(2).context("missing output path")?);
            let summary = tracker.match_summary(match_id)?;
            let box_score = aggregator.box_score(match_id)?;
            let report = export_box_score(&path, &summary, &box_score)?;
            println!(
                "Exported {} sets, {} players to {}",
                report.sets,
                report.players,
                path.display()
            );
            Ok(())
        }
        "delete-match" => {
            let match_id = parse_arg(args, 1, "match_id")?;
            tracker.delete_match(match_id)?;
            println!("Deleted match {match_id}");
            Ok(())
        }
        other => Err(anyhow!("unknown command {other:?}\n\n{USAGE}")),
    }
}

fn open_store(config: &StatsConfig) -> Result<Box<dyn Backend>> {
    if config.memory {
        return Ok(Box::new(MemoryStore::new()));
    }
    let path = config
        .db_path
        .as_ref()
        .context("unable to resolve sqlite path (set VOLLEY_STATS_DB or pass --db)")?;
    let store = SqliteStore::open(path)
        .with_context(|| format!("open stats db {}", path.display()))?;
    Ok(Box::new(store))
}

fn parse_arg<T>(args: &[String], idx: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = args
        .get(idx)
        .with_context(|| format!("missing {name}"))?;
    raw.parse::<T>()
        .map_err(|err| anyhow!("invalid {name} {raw:?}: {err}"))
}

fn parse_roster_slot(raw: &str) -> Result<RosterSlot> {
    let (id, is_starter) = match raw.strip_suffix(":s") {
        Some(id) => (id, true),
        None => (raw, false),
    };
    let player_id = id
        .parse()
        .with_context(|| format!("invalid player id {raw:?}"))?;
    Ok(RosterSlot {
        player_id,
        is_starter,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}
