pub mod analysis; // Markdown/JSON analysis extraction and normalization
pub mod config;
pub mod models;

pub use analysis::{
    decode, decode_envelope, encode, encode_envelope, normalize, normalize_for_routine, parse,
    reanalyze, schema_for, AnalysisError, AnalysisRecord, RoutineInfo, StoredEnvelope,
    TeacherFeedbackRecord,
};
pub use models::{ResponseSlot, RoutineType};

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, or the crate default.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(config::LOG_FILTER_ENV)
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();

    tracing::debug!("{} v{} tracing initialized", config::CRATE_NAME, config::CRATE_VERSION);
}
