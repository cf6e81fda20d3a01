use std::env;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Runtime settings taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: String,
    /// Fixed seed for the interactive flow; a fresh one is drawn when unset.
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Config, String> {
        Config::from_vars(env::var("TIMETABLE_BIND").ok(), env::var("TIMETABLE_SEED").ok())
    }

    fn from_vars(bind: Option<String>, seed: Option<String>) -> Result<Config, String> {
        let seed = match seed.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|e| format!("TIMETABLE_SEED '{}' is not a valid seed: {}", raw, e))?,
            ),
        };
        Ok(Config {
            bind_addr: bind
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            seed,
        })
    }

    /// Command-line values win over the environment.
    pub fn with_overrides(self, bind: Option<String>, seed: Option<u64>) -> Config {
        Config {
            bind_addr: bind.unwrap_or(self.bind_addr),
            seed: seed.or(self.seed),
        }
    }
}
