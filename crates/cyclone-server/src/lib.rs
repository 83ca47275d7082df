//! Shared library surface for the cyclone server binaries and tests.

pub mod api;
pub mod config;
pub mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with `RUST_LOG` plus a debug directive for `crate_directive`.
pub fn init_tracing(crate_directive: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(crate_directive.parse()?)
                .add_directive("cyclone_core=info".parse()?),
        )
        .try_init()?;
    Ok(())
}
