use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Env var selecting the console log format (`text` or `json`).
pub const LOG_FORMAT_VAR: &str = "VALIDATION_LOG_FORMAT";

/// Log output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text with timestamp, level, target and message
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Case-insensitive `"text"` / `"json"`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "text" => Some(LogFormat::Text),
            _ => None,
        }
    }

    /// Reads `VALIDATION_LOG_FORMAT`, falling back to [`LogFormat::Text`].
    pub fn from_env_or_default() -> Self {
        std::env::var(LOG_FORMAT_VAR)
            .ok()
            .and_then(|s| Self::parse(&s))
            .unwrap_or(LogFormat::Text)
    }
}

/// Installs the global tracing subscriber and the `log` bridge.
///
/// The engine logs through the `log` facade; `LogTracer` forwards those
/// records into tracing so `RUST_LOG` controls both. The level defaults to
/// `info` when `RUST_LOG` is unset.
///
/// Safe to call more than once: when a subscriber is already installed the
/// call returns `Ok(())` and leaves it in place.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_log::LogTracer;
    use tracing_subscriber::fmt;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = LogFormat::from_env_or_default();

    let (text_layer, json_layer) = match format {
        LogFormat::Text => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(fmt::layer().json().with_target(true))),
    };

    // Already-installed bridge is not an error
    let _ = LogTracer::init();

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .try_init()
    {
        Ok(()) => {
            tracing::debug!(?format, "validation logging initialized");
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "Tracing subscriber already initialized or failed to initialize: {:?}",
                e
            );
            Ok(())
        }
    }
}
