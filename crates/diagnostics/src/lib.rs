//! Lightweight structured logging shared by the seriesload crates.
//!
//! Controlled by the SERIESLOAD_LOG environment variable:
//! - off (default) - no logs
//! - error / warn / info / debug - minimum emitted level

use std::sync::Once;

// Re-export emit so the macros can reach it from other crates
pub use emit;

static INIT: Once = Once::new();

/// Initialize diagnostics from the SERIESLOAD_LOG environment variable.
///
/// Call once at startup; repeated calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let level = std::env::var("SERIESLOAD_LOG").unwrap_or_else(|_| "off".to_string());

        let Some(min_level) = parse_level(&level) else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min_level))
            .init();

        // The emitter must outlive all logging call sites
        std::mem::forget(rt);
    });
}

fn parse_level(name: &str) -> Option<emit::Level> {
    match name {
        "off" => None,
        "debug" => Some(emit::Level::Debug),
        "info" => Some(emit::Level::Info),
        "warn" => Some(emit::Level::Warn),
        "error" => Some(emit::Level::Error),
        other => {
            eprintln!("Warning: unknown SERIESLOAD_LOG value '{other}', using 'info'");
            Some(emit::Level::Info)
        }
    }
}

/// Log basic operations users might want to see in normal usage.
/// Examples: "Loaded 5 series", "Wrote configuration file"
pub use emit::info;

/// Log detailed diagnostics useful for debugging.
/// Examples: "Resolved class column to position 3", "Row 12 has no location"
pub use emit::debug;

/// Log recoverable conditions worth noting.
/// Examples: "Config file not found, using defaults"
pub use emit::warn;

/// Log failures that prevent normal operation.
/// Examples: "Source query failed", "Invalid role specification"
pub use emit::error;

pub use init_diagnostics as init;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_safe_to_call_multiple_times() {
        init_diagnostics();
        init_diagnostics();
        init_diagnostics();
    }

    #[test]
    fn test_macros_compile() {
        info!("info message");
        debug!("debug message with {value}", value: 42);
        warn!("warn message");
        error!("error message");
    }
}
