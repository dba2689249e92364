/// Severity of a single log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single structured key-value pair attached to a log record.
pub type Kv<'a> = (&'a str, &'a str);

/// Best-effort structured logging sink.
///
/// A failure to log is never allowed to fail the surrounding operation;
/// implementations are expected to swallow their own errors.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, component: &str, message: &str, kv: &[Kv<'_>]);
}

/// Best-effort metrics sink: counters, gauges, and timings, all tagged.
pub trait Metrics: Send + Sync {
    fn counter_add(&self, name: &str, value: u64, tags: &[Kv<'_>]);
    fn gauge_set(&self, name: &str, value: f64, tags: &[Kv<'_>]);
    fn timing_ms(&self, name: &str, value: u64, tags: &[Kv<'_>]);
}

/// Best-effort anomaly-breadcrumb sink, distinct from ordinary logging so a
/// consumer can alert on it without parsing log text (e.g.
/// `journal_nff_retry`, `rebuild_prep_failed`).
pub trait Diagnostics: Send + Sync {
    fn emit(&self, component: &str, event: &str, kv: &[Kv<'_>]);
}

/// A [`Logger`]/[`Metrics`]/[`Diagnostics`] trio that does nothing. Used as
/// the default when a caller does not care to observe the core, and as the
/// base every other implementation in this workspace layers telemetry
/// rendering on top of.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetry;

impl Logger for NullTelemetry {
    fn log(&self, _level: LogLevel, _component: &str, _message: &str, _kv: &[Kv<'_>]) {}
}

impl Metrics for NullTelemetry {
    fn counter_add(&self, _name: &str, _value: u64, _tags: &[Kv<'_>]) {}
    fn gauge_set(&self, _name: &str, _value: f64, _tags: &[Kv<'_>]) {}
    fn timing_ms(&self, _name: &str, _value: u64, _tags: &[Kv<'_>]) {}
}

impl Diagnostics for NullTelemetry {
    fn emit(&self, _component: &str, _event: &str, _kv: &[Kv<'_>]) {}
}

/// A `Logger`/`Metrics`/`Diagnostics` trio bundled together, since every
/// journal/cache operation that emits telemetry needs all three at once.
/// Plain references: the core never owns its telemetry sinks, it borrows
/// them for the duration of one call.
#[derive(Clone, Copy)]
pub struct TelemetryPorts<'a> {
    pub logger: &'a dyn Logger,
    pub metrics: &'a dyn Metrics,
    pub diagnostics: &'a dyn Diagnostics,
}

impl<'a> TelemetryPorts<'a> {
    pub const fn new(
        logger: &'a dyn Logger,
        metrics: &'a dyn Metrics,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        Self {
            logger,
            metrics,
            diagnostics,
        }
    }
}

static NULL_TELEMETRY: NullTelemetry = NullTelemetry;

impl TelemetryPorts<'static> {
    /// The all-swallowing trio, for callers that do not want to observe
    /// the core at all.
    pub fn null() -> Self {
        Self::new(&NULL_TELEMETRY, &NULL_TELEMETRY, &NULL_TELEMETRY)
    }
}
