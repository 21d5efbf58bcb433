use tracing_subscriber::field::MakeExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

use yansi::Paint;

use crate::error::{ErrorKind, Result};
use crate::Config;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub enum Mode {
    Production,
    #[default]
    Formatted,
    Json,
}

impl From<String> for Mode {
    fn from(input: String) -> Self {
        match input.as_str() {
            "prod" | "production" => Self::Production,
            "json" => Self::Json,
            _ => Self::Formatted,
        }
    }
}

#[derive(PartialEq, Eq, Default, Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Only shows errors and warnings
    Critical,
    /// Shows errors, warnings, and some informational messages that are likely
    /// to be relevant when troubleshooting such as configuration
    Support,
    /// Shows everything except debug and trace information
    #[default]
    Normal,
    /// Shows debug information
    Debug,
    /// Shows everything
    Trace,
    /// Shows nothing
    Off,
}

impl From<&str> for Level {
    fn from(s: &str) -> Self {
        match &*s.to_ascii_lowercase() {
            "critical" | "error" => Level::Critical,
            "support" | "warn" => Level::Support,
            "debug" | "dbg" => Level::Debug,
            "trace" => Level::Trace,
            "off" | "none" => Level::Off,
            _ => Level::Normal,
        }
    }
}

pub fn filter_layer(level: Level) -> EnvFilter {
    let filter_str = match level {
        Level::Critical => "warn,hyper=off,rustls=off",
        Level::Support => "warn,hyper=off,rustls=off",
        Level::Normal => "info,hyper=off,rustls=off",
        Level::Debug => "debug,sled=info,hyper=info,reqwest=info",
        Level::Trace => "trace,sled=info,hyper=debug,want=off",
        Level::Off => "off",
    };

    EnvFilter::try_new(filter_str).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn default_logging_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber,
    S: for<'span> LookupSpan<'span>,
{
    let field_format = tracing_subscriber::fmt::format::debug_fn(|writer, field, value| {
        if field.name() == "message" {
            write!(writer, "{:?}", Paint::new(value).bold())
        } else {
            write!(writer, "{}: {:?}", field, Paint::default(value).bold())
        }
    })
    .delimited(", ")
    .display_messages();

    // Stdout is reserved for command output, e.g. rendered emails.
    tracing_subscriber::fmt::layer()
        .fmt_fields(field_format)
        .with_writer(std::io::stderr)
}

pub fn json_logging_layer<
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a> + tracing::Subscriber,
>() -> impl tracing_subscriber::Layer<S> {
    Paint::disable();

    tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
}

/// Initializes the global tracing subscriber as described by the config.
///
/// `Production` mode ships logs to loki and must be called from within a
/// tokio runtime, as the delivery task gets spawned onto it.
pub fn init(config: &Config) -> Result<()> {
    use tracing_log::LogTracer;
    use tracing_subscriber::prelude::*;

    if !config.tracing.enabled {
        return Ok(());
    }

    LogTracer::init().map_err(|e| ErrorKind::Other(e.to_string()))?;

    match config.tracing.mode {
        Mode::Production => {
            use tracing_loki::url::Url;
            let (loki_layer, task) = tracing_loki::layer(
                Url::parse(&config.tracing.loki_address)
                    .map_err(|e| ErrorKind::Other(e.to_string()))?,
                vec![
                    ("app".into(), config.name.clone()),
                    ("version".into(), config.version.clone()),
                ]
                .into_iter()
                .collect(),
                vec![].into_iter().collect(),
            )
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
            // The background task needs to be spawned so the logs actually get
            // delivered to loki.
            tokio::spawn(task);

            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(loki_layer)
                    .with(json_logging_layer())
                    .with(filter_layer(config.tracing.level)),
            )
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
        }
        Mode::Formatted => {
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(default_logging_layer())
                    .with(filter_layer(config.tracing.level)),
            )
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
        }
        Mode::Json => {
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry()
                    .with(json_logging_layer())
                    .with(filter_layer(config.tracing.level)),
            )
            .map_err(|e| ErrorKind::Other(e.to_string()))?;
        }
    };

    Ok(())
}
