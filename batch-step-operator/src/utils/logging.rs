use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber. `RUST_LOG` wins when set; the fallback
/// keeps this crate at info.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(Level::INFO.into())
            .parse("batch_step_operator=info")
            .expect("Invalid filter directive")
    });

    // try_init: the embedding framework may already have installed a
    // subscriber, and tests initialize repeatedly.
    let _ = fmt().with_env_filter(env_filter).with_target(true).try_init();
}
