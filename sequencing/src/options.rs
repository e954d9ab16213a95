//! Configuration for sequencers and logging.

use serde::Deserialize;
use sequencing_shared::errors::{SequencingError, SequencingResult};

pub const ENV_WORKER_THREADS: &str = "SEQUENCING_WORKER_THREADS";
pub const ENV_THREAD_NAME: &str = "SEQUENCING_THREAD_NAME";
pub const ENV_VERBOSE: &str = "SEQUENCING_VERBOSE";
pub const ENV_LOG: &str = "SEQUENCING_LOG";

const DEFAULT_THREAD_NAME: &str = "sequencing-worker";
const DEFAULT_LOG_DIRECTIVE: &str = "warn";

/// Options for a [`Sequencer`](crate::Sequencer) and its worker pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SequencingOptions {
    /// Worker threads in the pool. `None` lets tokio pick one per core.
    pub worker_threads: Option<usize>,
    pub thread_name: String,
    /// Print step labels to stdout as they complete.
    pub verbose: bool,
    pub log: LogOptions,
}

impl Default for SequencingOptions {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            verbose: false,
            log: LogOptions::default(),
        }
    }
}

/// Logging setup used by [`init_logging`](crate::init_logging).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub directive: String,
    pub ansi: bool,
    /// Route output through the test harness capture.
    pub test_writer: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            directive: DEFAULT_LOG_DIRECTIVE.to_string(),
            ansi: false,
            test_writer: false,
        }
    }
}

impl SequencingOptions {
    /// Defaults overridden by `SEQUENCING_*` environment variables.
    pub fn from_env() -> SequencingResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`SequencingOptions::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> SequencingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(raw) = lookup(ENV_WORKER_THREADS) {
            let threads = raw.trim().parse::<usize>().map_err(|e| {
                SequencingError::Config(format!(
                    "{}={:?} is not a number: {}",
                    ENV_WORKER_THREADS, raw, e
                ))
            })?;
            options.worker_threads = Some(threads);
        }
        if let Some(name) = lookup(ENV_THREAD_NAME) {
            options.thread_name = name;
        }
        if let Some(raw) = lookup(ENV_VERBOSE) {
            options.verbose = parse_bool(ENV_VERBOSE, &raw)?;
        }
        if let Some(directive) = lookup(ENV_LOG) {
            options.log.directive = directive;
        }

        options.sanitize()?;
        Ok(options)
    }

    /// Validate option values.
    pub fn sanitize(&self) -> SequencingResult<()> {
        if self.worker_threads == Some(0) {
            return Err(SequencingError::Config(
                "worker_threads must be at least 1".into(),
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(SequencingError::Config("thread_name must not be empty".into()));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, raw: &str) -> SequencingResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SequencingError::Config(format!(
            "{}={:?} is not a boolean",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let options = SequencingOptions::default();
        assert_eq!(options.worker_threads, None);
        assert_eq!(options.thread_name, "sequencing-worker");
        assert!(!options.verbose);
        assert_eq!(options.log.directive, "warn");
        options.sanitize().unwrap();
    }

    #[test]
    fn test_from_lookup_overrides() {
        let options = SequencingOptions::from_lookup(lookup_from(&[
            (ENV_WORKER_THREADS, "3"),
            (ENV_THREAD_NAME, "steps"),
            (ENV_VERBOSE, "yes"),
            (ENV_LOG, "sequencing=debug"),
        ]))
        .unwrap();
        assert_eq!(options.worker_threads, Some(3));
        assert_eq!(options.thread_name, "steps");
        assert!(options.verbose);
        assert_eq!(options.log.directive, "sequencing=debug");
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = SequencingOptions::from_lookup(lookup_from(&[(ENV_WORKER_THREADS, "many")]))
            .unwrap_err();
        assert!(matches!(err, SequencingError::Config(_)));

        let err = SequencingOptions::from_lookup(lookup_from(&[(ENV_WORKER_THREADS, "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"));

        let err =
            SequencingOptions::from_lookup(lookup_from(&[(ENV_VERBOSE, "maybe")])).unwrap_err();
        assert!(err.to_string().contains("not a boolean"));
    }

    #[test]
    fn test_sanitize_rejects_blank_thread_name() {
        let options = SequencingOptions {
            thread_name: "  ".into(),
            ..Default::default()
        };
        assert!(options.sanitize().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: SequencingOptions =
            serde_json::from_str(r#"{"worker_threads": 2, "log": {"ansi": true}}"#).unwrap();
        assert_eq!(options.worker_threads, Some(2));
        assert_eq!(options.thread_name, "sequencing-worker");
        assert!(options.log.ansi);
        assert_eq!(options.log.directive, "warn");
    }
}
