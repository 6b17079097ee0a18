/// Crate-level constants
pub const CRATE_NAME: &str = "routine-analysis";
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable consulted by `init_tracing()` before the default filter.
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

/// Filter used when `RUST_LOG` is unset or invalid.
pub fn default_log_filter() -> &'static str {
    "routine_analysis=info,warn"
}

// ═══════════════════════════════════════════════════════════
// Extraction tunables
// ═══════════════════════════════════════════════════════════

/// Upper bound (characters) on the text captured by the loose keyword matcher.
pub const LOOSE_CAPTURE_MAX_CHARS: usize = 500;

/// Inputs longer than this (characters) are truncated before parsing.
pub const MAX_ANALYSIS_INPUT_CHARS: usize = 200_000;

// ═══════════════════════════════════════════════════════════
// Confidence heuristic
// ═══════════════════════════════════════════════════════════

/// Score assigned to any text before bonuses.
pub const CONFIDENCE_BASE: f64 = 0.5;

/// Scores never exceed this; AI output is never treated as certain.
pub const CONFIDENCE_CEILING: f64 = 0.95;

/// Length (characters) above which the first length bonus applies.
pub const CONFIDENCE_LONG_TEXT_CHARS: usize = 1000;

/// Length (characters) above which the second length bonus applies.
pub const CONFIDENCE_VERY_LONG_TEXT_CHARS: usize = 2000;
