//! Process-wide diagnostics: the tracing subscriber and color-eyre reports.

use crate::Environment;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Install color-eyre with source locations and without the environment section.
/// Repeated calls keep the first hook.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "info,sea_orm=warn,sqlx=warn,rdkafka=warn,reqwest=warn"
    } else {
        "debug,tower_http=debug,sea_orm=info,sqlx=warn,rdkafka=info,hyper=info,reqwest=info"
    }
}

fn fmt_layer(environment: &Environment) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer();
    if environment.is_production() {
        layer
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(false)
            .boxed()
    } else {
        layer.pretty().with_file(false).with_line_number(false).boxed()
    }
}

/// Install the global subscriber: flattened JSON in production, pretty output otherwise,
/// plus `tracing_error::ErrorLayer` so eyre reports carry span traces.
///
/// `RUST_LOG` replaces [`default_filter`]. Returns `false` when a subscriber was already set.
pub fn init_tracing(environment: &Environment) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let installed = tracing_subscriber::registry()
        .with(fmt_layer(environment))
        .with(tracing_error::ErrorLayer::default())
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(environment = %environment, "Tracing initialized");
    }
    installed
}
