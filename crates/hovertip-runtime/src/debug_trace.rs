#![forbid(unsafe_code)]

//! Zero-cost debug tracing controlled by environment variable.
//!
//! Set `HOVERTIP_DEBUG_TRACE=1` before launching to print every transition
//! and timer firing to stderr. When disabled (the default), each check is a
//! single static bool load.
//!
//! ```ignore
//! use hovertip_runtime::debug_trace;
//! debug_trace!("timer fired: kind={:?}", kind);
//! ```

use std::sync::LazyLock;
use std::time::Instant;

/// Static flag checked once at startup. After initialization, this is just a bool load.
static DEBUG_TRACE_ENABLED: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("HOVERTIP_DEBUG_TRACE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
});

/// Startup timestamp for relative timing in debug output.
static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Check if debug tracing is enabled.
#[inline]
pub fn is_enabled() -> bool {
    *DEBUG_TRACE_ENABLED
}

/// Elapsed time since program start in milliseconds.
#[inline]
pub fn elapsed_ms() -> u64 {
    START_TIME.elapsed().as_millis() as u64
}

/// Conditionally print debug trace output to stderr.
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if $crate::debug_trace::is_enabled() {
            eprintln!(
                "[HOVERTIP {:>8}ms] {}",
                $crate::debug_trace::elapsed_ms(),
                format_args!($($arg)*)
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_enabled_returns_bool() {
        let _ = is_enabled();
    }

    #[test]
    fn elapsed_ms_is_monotonic() {
        let t1 = elapsed_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(elapsed_ms() >= t1);
    }
}
