// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Commodity Market Simulation - Errors

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Failures of the underlying key-value facility.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage write rejected: {0}")]
    WriteRejected(String),

    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Why a load or save of the market state did not go through.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("no persisted market state")]
    Missing,

    #[error("persisted market state is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("persisted market state is not a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot parse {name}={value:?}")]
    BadVar { name: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),

    #[error("listener panicked: {0}")]
    Panicked(String),
}
