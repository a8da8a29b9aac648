//! Tracing subscriber setup: console formatter, reloadable level, and initialisation.
use anyhow::{Result, anyhow};
use tracing_subscriber::{Registry, filter::LevelFilter, reload};

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
pub(super) struct MessageExtractor {
    pub(super) message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] that emits merge-style
/// console output.
struct MergeFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for MergeFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = &extractor.message;

        match level {
            tracing::Level::ERROR => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            tracing::Level::WARN => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            tracing::Level::INFO if target == "merge::stage" => {
                writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m")
            }
            tracing::Level::INFO if target == "merge::dry_run" => {
                writeln!(writer, "  \x1b[33m[DRY RUN]\x1b[0m {msg}")
            }
            tracing::Level::INFO => writeln!(writer, "  {msg}"),
            tracing::Level::DEBUG => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
            _ => writeln!(writer, "  \x1b[2m[trace] {msg}\x1b[0m"),
        }
    }
}

/// Handle for changing the console level after the subscriber is installed.
///
/// The level is known only once the profile being run has been resolved, so
/// the subscriber starts at the command-line level and is adjusted later.
pub struct LevelHandle(reload::Handle<LevelFilter, Registry>);

impl std::fmt::Debug for LevelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LevelHandle").finish_non_exhaustive()
    }
}

impl LevelHandle {
    /// Replace the active console level.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscriber owning the filter has been dropped.
    pub fn set(&self, level: LevelFilter) -> Result<()> {
        self.0
            .modify(|filter| *filter = level)
            .map_err(|e| anyhow!("failed to change log level: {e}"))
    }

    /// The active console level, if the subscriber is still alive.
    #[must_use]
    pub fn current(&self) -> Option<LevelFilter> {
        self.0.clone_current()
    }
}

/// Create a level filter layer together with the handle that adjusts it.
fn reloadable_level(level: LevelFilter) -> (reload::Layer<LevelFilter, Registry>, LevelHandle) {
    let (filter, handle) = reload::Layer::new(level);
    (filter, LevelHandle(handle))
}

/// Initialise the global [`tracing`] subscriber.
///
/// Errors and warnings go to stderr, everything else to stdout. Must be
/// called once at program startup, before any logging.
pub fn init_subscriber(level: LevelFilter) -> LevelHandle {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

    let (filter, handle) = reloadable_level(level);

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(MergeFormatter)
        .with_writer(make_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .init();

    handle
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn handle_reports_and_replaces_level() {
        let (_filter, handle) = reloadable_level(LevelFilter::INFO);
        assert_eq!(handle.current(), Some(LevelFilter::INFO));
        handle.set(LevelFilter::DEBUG).unwrap();
        assert_eq!(handle.current(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn handle_fails_once_filter_is_dropped() {
        let (filter, handle) = reloadable_level(LevelFilter::INFO);
        drop(filter);
        assert!(handle.set(LevelFilter::OFF).is_err());
        assert_eq!(handle.current(), None);
    }

    #[test]
    fn message_extractor_reads_message_field() {
        use tracing_subscriber::layer::SubscriberExt as _;

        #[derive(Clone, Default)]
        struct Last(std::sync::Arc<std::sync::Mutex<String>>);

        impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Last {
            fn on_event(
                &self,
                event: &tracing::Event<'_>,
                _ctx: tracing_subscriber::layer::Context<'_, S>,
            ) {
                let mut extractor = MessageExtractor::default();
                event.record(&mut extractor);
                *self.0.lock().unwrap() = extractor.message;
            }
        }

        let last = Last::default();
        let subscriber = tracing_subscriber::registry().with(last.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(count = 3, "copied {} files", 3);
        });
        assert_eq!(*last.0.lock().unwrap(), "copied 3 files");
    }
}
