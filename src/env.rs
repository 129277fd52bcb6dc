//! Environment variable constants used throughout the application
//!
//! This module centralizes all environment variable names to ensure consistency
//! and make it easier to manage configuration across the codebase.

/// Logging configuration
pub mod logging {
    /// Log level configuration (e.g., "debug", "info", "warn", "error")
    pub const LOG_LEVEL: &str = "ADFORGE_LOG_LEVEL";

    /// Log file path for file-based logging
    pub const LOG_FILE: &str = "ADFORGE_LOG_FILE";

    /// Disable colored output (follows the NO_COLOR standard)
    pub const NO_COLOR: &str = "NO_COLOR";
}

/// External API configuration
pub mod apis {
    /// Google AI API key (preferred name)
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

    /// Generic API key, read when GEMINI_API_KEY is unset
    pub const API_KEY: &str = "API_KEY";

    /// Override for the Google AI REST base URL
    pub const BASE_URL: &str = "ADFORGE_BASE_URL";
}

/// Generation and retry configuration
pub mod generation {
    /// Default model for text and structured generation
    pub const TEXT_MODEL: &str = "ADFORGE_TEXT_MODEL";

    /// Image model tier ("flash" or "pro")
    pub const IMAGE_MODEL: &str = "ADFORGE_IMAGE_MODEL";

    /// Attempts per call, including the first one
    pub const MAX_ATTEMPTS: &str = "ADFORGE_MAX_ATTEMPTS";

    /// Backoff base delay in milliseconds
    pub const BASE_DELAY_MS: &str = "ADFORGE_BASE_DELAY_MS";

    /// Per-request transport timeout (seconds)
    pub const TIMEOUT: &str = "ADFORGE_TIMEOUT";

    /// Maximum in-flight requests per client
    pub const CONCURRENT: &str = "ADFORGE_CONCURRENT";
}

/// Configuration file location
pub mod files {
    /// Path to the TOML configuration file
    pub const CONFIG_FILE: &str = "ADFORGE_CONFIG";
}
