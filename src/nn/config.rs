/// Training loop configuration
///
/// `Default` can be overridden through the environment:
/// - `PONG_NN_LOG_INTERVAL`: log the loss every N epochs (default 10)
/// - `PONG_NN_VERBOSE`: `1`/`true` or `0`/`false` (default on)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainConfig {
    pub epochs: usize,
    /// Emit the loss at `info` level every `log_interval` epochs
    pub verbose: bool,
    pub log_interval: usize,
}

pub const DEFAULT_EPOCHS: usize = 100;
pub const DEFAULT_LOG_INTERVAL: usize = 10;

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

pub const LOG_INTERVAL_VAR: &str = "PONG_NN_LOG_INTERVAL";
pub const VERBOSE_VAR: &str = "PONG_NN_VERBOSE";

impl Default for TrainConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl TrainConfig {
    /// Defaults with overrides resolved through `lookup` instead of the
    /// process environment
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_interval = lookup(LOG_INTERVAL_VAR)
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_LOG_INTERVAL);

        let verbose = lookup(VERBOSE_VAR)
            .and_then(|s| parse_flag(s.trim()))
            .unwrap_or(true);

        Self {
            epochs: DEFAULT_EPOCHS,
            verbose,
            log_interval,
        }
    }

    /// `epochs` and `verbose` as given, log interval from the environment
    pub fn for_run(epochs: usize, verbose: bool) -> Self {
        Self {
            epochs,
            verbose,
            ..Self::default()
        }
    }

    /// Explicit configuration, ignoring the environment
    pub fn new(epochs: usize, verbose: bool) -> Self {
        Self {
            epochs,
            verbose,
            log_interval: DEFAULT_LOG_INTERVAL,
        }
    }

    pub fn with_log_interval(mut self, log_interval: usize) -> Self {
        self.log_interval = log_interval.max(1);
        self
    }

    /// Whether the loss of `epoch` is logged
    pub fn should_log(&self, epoch: usize) -> bool {
        self.verbose && epoch % self.log_interval.max(1) == 0
    }
}
