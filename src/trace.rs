//! Tracing macros that vanish when the `tracing` feature is off.
//!
//! Spans wrap the major search stages; events record counts and scores that
//! help tune thresholds. Without the feature the macros expand to no-ops and
//! field expressions are evaluated only to keep bindings used.

/// Info-level span around a search stage.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Info-level event for per-call measurements.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Debug-level event for per-iteration detail, emitted only in debug mode.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($enabled:expr, $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        if $enabled {
            tracing::debug!(name: $name, $($key = $value),+)
        }
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($enabled:expr, $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($enabled, $($value,)+);
    };
}

pub(crate) use trace_debug;
pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in span guard used when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Returns self, mimicking `Span::entered()`.
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
