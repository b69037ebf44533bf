//! Logging setup for binaries and demos embedding the print pipeline
//!
//! The library itself only emits `tracing` events; installing a
//! subscriber is the embedding application's call.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global subscriber
///
/// `RUST_LOG` takes precedence over `level`. JSON output carries the
/// current span, so `job_id` and `format` show up on every event of a
/// print operation.
///
/// # Examples
/// ```no_run
/// crab_print::init_logger("crab_print=debug", false)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_thread_ids(true),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .try_init()?;
    }

    Ok(())
}
