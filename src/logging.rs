//! Structured logging setup.
//!
//! Installs a global `tracing` subscriber once per process. The filter comes
//! from `RUST_LOG` when set, otherwise from `[logging].level`. Logs go to
//! stderr so stdout stays reserved for command output.

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

pub fn init(cfg: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&cfg.level))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        let fmt_layer = if cfg.json {
            fmt::layer()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .boxed()
        };

        let subscriber = Registry::default().with(filter).with(fmt_layer);
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("Warning: a global tracing subscriber was already installed");
        }
    });
}
