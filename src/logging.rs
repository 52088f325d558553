//! Log output for keyproxy.
//!
//! In a container every event is one JSON object per line, with the event
//! fields (`correlation_id`, `status`, `params`, ...) flattened to top-level
//! keys so log pipelines can index them. On an interactive terminal the
//! pretty format is used instead. `--json` and `--pretty` override the
//! terminal check.

use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Registry};

use crate::cli::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub const fn resolve(pretty: bool, json: bool, stdout_is_terminal: bool) -> Self {
        if json {
            Self::Json
        } else if pretty || stdout_is_terminal {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = tracing_subscriber::filter::Targets::new().with_default(level.to_tracing_level());

    let output: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .init();
}
