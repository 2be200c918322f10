//! Tracing subscriber installation for the `vine` binary.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a subscriber when `RUST_LOG` is set.
///
/// Safe to call more than once. `RUST_LOG=vine_eval=debug` shows scope and
/// task lifecycle events; setting `VINE_LOG_TREE` as well renders spans as
/// an indented tree instead of flat lines.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        let registry = tracing_subscriber::registry().with(filter);
        if std::env::var_os("VINE_LOG_TREE").is_some() {
            registry
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}
