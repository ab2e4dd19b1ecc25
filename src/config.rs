use std::path::{Path, PathBuf};

use crate::heading::HeadingStrategy;

pub const DEFAULT_STOPS: &str = "stops.txt";
pub const DEFAULT_STOP_TIMES: &str = "stop_times.txt";
pub const DEFAULT_OUTPUT: &str = "stops.json";

/// Inputs, output and strategy for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub stops_path: PathBuf,
    pub stop_times_path: PathBuf,
    pub output_path: PathBuf,
    pub strategy: HeadingStrategy,
    /// CSV file to append run statistics to, if any.
    pub summary_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stops_path: PathBuf::from(DEFAULT_STOPS),
            stop_times_path: PathBuf::from(DEFAULT_STOP_TIMES),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            strategy: HeadingStrategy::default(),
            summary_path: None,
        }
    }
}

impl Config {
    /// Default file names, resolved inside `dir`.
    pub fn from_feed_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            stops_path: dir.join(DEFAULT_STOPS),
            stop_times_path: dir.join(DEFAULT_STOP_TIMES),
            output_path: dir.join(DEFAULT_OUTPUT),
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: HeadingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_summary(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = Some(path.into());
        self
    }
}
