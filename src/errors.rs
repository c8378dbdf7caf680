//! Centralized error handling
//!
//! Every failure carries a unique string code so log lines stay grep-able
//! in production.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - PARSE_xxx: source/AST errors (fatal for the injection path)
//! - DECODE_xxx: constructor argument recovery (non-fatal, degrades)
//! - EXEC_xxx: forge suite execution errors
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type. All fallible paths flow through this.
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Parse errors
    // ============================================
    /// AST has no identifiable entry contract
    ParseNoEntryContract,
    /// Source text cannot be processed (bad injection point, etc.)
    ParseInvalidSource,

    // ============================================
    // Decode errors (internal, non-fatal)
    // ============================================
    /// Constructor argument blob is not valid hex
    DecodeBadBlob,
    /// Blob does not decode against the resolved signature list
    DecodeSignatureMismatch,

    // ============================================
    // Execution errors
    // ============================================
    /// Could not spawn the forge process
    ExecSpawnFailed,
    /// Forge produced output that is not a JSON report
    ExecUnparsableReport,
    /// Report parsed but a suite entry is malformed
    ExecMalformedSuite,
    /// Suite file could not be materialized
    ExecSuiteWriteFailed,

    // ============================================
    // Configuration errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseNoEntryContract => "PARSE_NO_ENTRY_CONTRACT",
            Self::ParseInvalidSource => "PARSE_INVALID_SOURCE",

            Self::DecodeBadBlob => "DECODE_BAD_BLOB",
            Self::DecodeSignatureMismatch => "DECODE_SIGNATURE_MISMATCH",

            Self::ExecSpawnFailed => "EXEC_SPAWN_FAILED",
            Self::ExecUnparsableReport => "EXEC_UNPARSABLE_REPORT",
            Self::ExecMalformedSuite => "EXEC_MALFORMED_SUITE",
            Self::ExecSuiteWriteFailed => "EXEC_SUITE_WRITE_FAILED",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Decode failures degrade to an empty argument list instead of
    /// aborting the contract's analysis.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::DecodeBadBlob | Self::DecodeSignatureMismatch)
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// No identifiable entry contract in the AST
    pub fn parse_no_entry_contract() -> Self {
        Self::new(
            ErrorCode::ParseNoEntryContract,
            "AST has no identifiable entry contract",
        )
    }

    /// Injection point or source text is inconsistent
    pub fn parse_invalid_source(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseInvalidSource, msg)
    }

    /// Forge process could not be spawned
    pub fn exec_spawn_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecSpawnFailed, msg)
    }

    /// Forge output is not a JSON report
    pub fn exec_unparsable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecUnparsableReport, msg)
    }

    /// Report entry for one suite is malformed
    pub fn exec_malformed_suite(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecMalformedSuite, msg)
    }

    /// Invalid configuration value
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalidValue, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::ExecSuiteWriteFailed, "IO error", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ExecUnparsableReport, "JSON parse error", err)
    }
}

impl From<hex::FromHexError> for AppError {
    fn from(err: hex::FromHexError) -> Self {
        Self::with_source(ErrorCode::DecodeBadBlob, "hex decode error", err)
    }
}
