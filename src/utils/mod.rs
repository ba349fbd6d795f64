//! Utility functions for the cascade.
//!
//! Image I/O helpers and logging setup.

pub mod image;

pub use self::image::{
    dynamic_to_rgb, encode_jpeg, jpeg_round_trip, load_image, load_image_from_memory, save_jpeg,
};

/// Default filter directive when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Initializes the tracing subscriber for logging.
///
/// Filtering follows `RUST_LOG`, falling back to `info`. Call once, early in
/// the process.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let directives = std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(log_filter(directives.as_deref()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn log_filter(directives: Option<&str>) -> tracing_subscriber::EnvFilter {
    directives
        .and_then(|d| tracing_subscriber::EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
}
