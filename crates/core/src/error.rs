//! Error types for Oracle calls.

/// The single failure kind the engine recognises for content generation.
///
/// Every variant is handled at the call site by substituting a fallback value,
/// so this type never escapes a game session.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The request could not be completed (network, provider or client error).
    #[error("oracle transport error: {0}")]
    Transport(#[from] anyhow::Error),

    /// The provider answered, but the output could not be interpreted.
    #[error("malformed oracle output: {0}")]
    Malformed(String),

    /// No prompt template was registered under the given key.
    #[error("missing prompt template: '{0}'")]
    MissingPrompt(String),
}

/// Convenience result type for Oracle calls.
pub type OracleResult<T> = std::result::Result<T, OracleError>;
