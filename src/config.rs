use std::path::PathBuf;

const DATA_DIR: &str = "volley_stats";
const DB_FILE: &str = "stats.sqlite";
const DEFAULT_LOG_FILTER: &str = "volley_stats=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsConfig {
    pub db_path: Option<PathBuf>,
    /// Set when `db_path` came from `VOLLEY_STATS_DB` or `--db` rather than the default.
    pub db_explicit: bool,
    pub log_filter: String,
    /// Keep everything in process memory instead of sqlite.
    pub memory: bool,
}

impl StatsConfig {
    /// Loads `.env.local` / `.env`, then reads the environment, then applies CLI flags.
    /// Returns the config plus the arguments that were not consumed as flags.
    pub fn load(args: &[String]) -> (Self, Vec<String>) {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        let env = |key: &str| std::env::var(key).ok();
        Self::from_sources(env, args)
    }

    pub fn from_sources(
        env: impl Fn(&str) -> Option<String>,
        args: &[String],
    ) -> (Self, Vec<String>) {
        let mut config = StatsConfig {
            db_path: env("VOLLEY_STATS_DB")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            db_explicit: false,
            log_filter: env("VOLLEY_STATS_LOG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            memory: env("VOLLEY_STATS_MEMORY")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        let mut rest = Vec::new();
        let mut idx = 0;
        while idx < args.len() {
            let arg = &args[idx];
            if let Some(path) = arg.strip_prefix("--db=") {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    config.db_path = Some(PathBuf::from(trimmed));
                }
            } else if arg == "--db" {
                if let Some(next) = args.get(idx + 1).filter(|n| !n.trim().is_empty()) {
                    config.db_path = Some(PathBuf::from(next));
                    idx += 1;
                }
            } else if arg == "--memory" {
                config.memory = true;
            } else {
                rest.push(arg.clone());
            }
            idx += 1;
        }

        config.db_explicit = config.db_path.is_some();
        if config.db_path.is_none() {
            config.db_path = default_db_path(&env);
        }
        (config, rest)
    }
}

fn default_db_path(env: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    // Prefer XDG data dir.
    if let Some(base) = env("XDG_DATA_HOME").filter(|b| !b.trim().is_empty()) {
        return Some(PathBuf::from(base).join(DATA_DIR).join(DB_FILE));
    }
    let home = env("HOME").filter(|h| !h.trim().is_empty())?;
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR)
            .join(DB_FILE),
    )
}
