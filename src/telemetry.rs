use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::DatasourceError;

static INIT: OnceCell<()> = OnceCell::new();

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over `level`.
/// Only the first successful call has an effect.
pub fn init_logging(level: &str) -> Result<(), DatasourceError> {
    let level: tracing::Level = level
        .parse()
        .map_err(|_| DatasourceError::Logging(format!("invalid log level {level:?}")))?;

    INIT.get_or_try_init(|| {
        tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(level.to_string())),
            )
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
            .map_err(|err| DatasourceError::Logging(err.to_string()))
    })?;
    Ok(())
}
