//! Tracing subscriber setup.

use sequencing_shared::errors::{SequencingError, SequencingResult};
use tracing_subscriber::EnvFilter;

use crate::options::LogOptions;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `options.directive`. Returns an error if
/// the directive is invalid; an already installed subscriber is left in
/// place and is not an error, so tests can call this freely.
pub fn init_logging(options: &LogOptions) -> SequencingResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&options.directive).map_err(|e| {
            SequencingError::Config(format!(
                "invalid log directive {:?}: {}",
                options.directive, e
            ))
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(options.ansi);

    let result = if options.test_writer {
        builder.with_test_writer().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Logging already initialized: {}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        let options = LogOptions {
            test_writer: true,
            ..Default::default()
        };
        init_logging(&options).unwrap();
        init_logging(&options).unwrap();
    }
}
