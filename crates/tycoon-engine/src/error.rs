//! Error types for the engine binary.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tycoon_core::ConfigError,
    },

    /// Game setup failed.
    #[error("game setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: tycoon_core::GameError,
    },

    /// A turn advance or report failed.
    #[error("game error: {source}")]
    Command {
        /// The underlying command error.
        #[from]
        source: tycoon_core::CommandError,
    },
}
