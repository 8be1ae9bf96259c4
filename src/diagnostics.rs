//! The diagnostic sink the Compiler and Lifter/Lowerer write non-fatal
//! observations to: opaque-field trace notes, compiler warnings, and (via
//! the default implementation) anything worth surfacing to a log.
//!
//! Callers that want pretty terminal reports instead of log lines can enable
//! the `diagnostics` feature, which adds an `ariadne`-backed renderer for
//! anything implementing [`ToAriadne`].

/// Somewhere diagnostic messages can be sent. Implementations choose how
/// (and whether) each severity is surfaced; none of the four methods are
/// fatal to the operation in progress.
pub trait DiagnosticSink {
    /// A low-level trace note, e.g. an opaque field preserved verbatim.
    fn trace(&mut self, message: &str);
    /// An informational note.
    fn info(&mut self, message: &str);
    /// A recoverable problem the caller should probably look at.
    fn warning(&mut self, message: &str);
    /// A problem serious enough to abort the surrounding operation,
    /// reported here in addition to (not instead of) a returned `Err`.
    fn error(&mut self, message: &str);
}

/// The default sink: every severity is forwarded to [`tracing`] at the
/// matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn trace(&mut self, message: &str) {
        tracing::trace!("{message}");
    }

    fn info(&mut self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&mut self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&mut self, message: &str) {
        tracing::error!("{message}");
    }
}

/// A sink that discards everything. Useful in tests that only care about
/// the returned value, not the side-channel log.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn trace(&mut self, _message: &str) {}
    fn info(&mut self, _message: &str) {}
    fn warning(&mut self, _message: &str) {}
    fn error(&mut self, _message: &str) {}
}

#[cfg(feature = "diagnostics")]
mod pretty {
    use ariadne::{Label, Report, ReportKind, Source};

    /// A named source buffer, as [`ariadne`] wants to identify spans by.
    pub struct SimpleSource<'a> {
        /// The name shown in the report header (a file name, or a
        /// synthetic identifier for in-memory source).
        pub name: &'a str,
        /// The full source text the reported span indexes into.
        pub text: &'a str,
    }

    /// Something that can render itself as an [`ariadne::Report`] against a
    /// [`SimpleSource`]. Implemented for diagnostic types that carry a
    /// byte or line/column span.
    pub trait ToAriadne {
        /// Builds a pretty report for this diagnostic.
        fn to_ariadne(&self, source: &SimpleSource<'_>) -> Report<'static, (String, std::ops::Range<usize>)>;
    }

    /// Renders and prints every diagnostic in `items` to stderr, in order.
    pub fn emit_diagnostics<T: ToAriadne>(items: &[T], source: &SimpleSource<'_>) {
        for item in items {
            let report = item.to_ariadne(source);
            let _ = report.eprint((source.name.to_owned(), Source::from(source.text)));
        }
    }

    /// Builds a single-label error report at the given byte offset.
    pub fn simple_error_report(
        source_name: &str,
        offset: usize,
        message: impl ToString,
    ) -> Report<'static, (String, std::ops::Range<usize>)> {
        Report::build(ReportKind::Error, source_name.to_owned(), offset)
            .with_label(
                Label::new((source_name.to_owned(), offset..offset + 1)).with_message(message.to_string()),
            )
            .finish()
    }
}

#[cfg(feature = "diagnostics")]
pub use pretty::{emit_diagnostics, simple_error_report, SimpleSource, ToAriadne};

/// Installs a global `tracing` subscriber so [`TracingSink`]'s output
/// actually reaches a terminal or log file.
///
/// Level filtering honors the `MSGSCRIPT_LOG` environment variable, falling
/// back to `warn` if unset.
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::builder()
        .with_env_var("MSGSCRIPT_LOG")
        .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Installs a global `tracing` subscriber when the `logging` feature is
/// enabled; a no-op otherwise, so callers can unconditionally call
/// [`init_logging`] without pulling in `tracing-subscriber`.
#[cfg(not(feature = "logging"))]
pub fn init_logging() {}

#[cfg(test)]
mod logging_tests {
    use super::init_logging;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
