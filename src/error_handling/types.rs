//! Error type definitions.
//!
//! `ProbeError` is the typed error returned by probe, resolve, and measure
//! operations; `ErrorType` is the counter taxonomy tracked by
//! [`ProcessingStats`](super::ProcessingStats).

use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Errors produced by the probing and resolution components.
///
/// Nothing in the pipeline terminates the run on one of these: callers
/// pattern-match and degrade to "candidate excluded" or a sentinel value.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The input does not parse as four dot-separated octets in [0, 255].
    /// Raised before any network activity.
    #[error("malformed IPv4 address: {0}")]
    MalformedAddress(String),

    /// A TCP connect attempt exceeded its timeout.
    #[error("connect timed out")]
    ConnectTimeout,

    /// A TCP connect attempt was refused or failed at the socket level.
    #[error("connect failed: {0}")]
    ConnectRefused(String),

    /// An HTTP provider (geolocation or bandwidth endpoint) failed: timeout,
    /// non-2xx status, or an unparseable body.
    #[error("provider error: {0}")]
    Provider(String),

    /// The persisted region cache could not be read or parsed. Recovered by
    /// starting from an empty cache.
    #[error("region cache corrupted: {0}")]
    CacheCorruption(String),

    /// A batch-level deadline expired before the operation completed.
    #[error("batch deadline exceeded")]
    DeadlineExceeded,
}

impl ProbeError {
    /// Maps this error to its statistics bucket.
    ///
    /// `Provider` maps to the bandwidth-transfer bucket because the region
    /// resolver never surfaces provider errors to callers; it counts its
    /// primary/fallback failures itself and returns `"Unknown"`.
    pub fn error_type(&self) -> ErrorType {
        match self {
            ProbeError::MalformedAddress(_) => ErrorType::MalformedAddress,
            ProbeError::ConnectTimeout => ErrorType::ConnectTimeout,
            ProbeError::ConnectRefused(_) => ErrorType::ConnectRefused,
            ProbeError::Provider(_) => ErrorType::BandwidthTransferError,
            ProbeError::CacheCorruption(_) => ErrorType::CacheLoadError,
            ProbeError::DeadlineExceeded => ErrorType::OrchestratorDeadline,
        }
    }
}

/// Counter taxonomy for failures observed during a run.
///
/// Deadline exclusions are tracked separately from unreachability so the final
/// statistics distinguish "the address was dead" from "the orchestrator gave
/// up waiting".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    MalformedAddress,
    ConnectTimeout,
    ConnectRefused,
    PrimaryProviderError,
    FallbackProviderError,
    BandwidthTransferError,
    OrchestratorDeadline,
    CacheLoadError,
    SourceFetchError,
    TaskPanic,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::MalformedAddress => "Malformed address",
            ErrorType::ConnectTimeout => "Connect timeout",
            ErrorType::ConnectRefused => "Connect refused",
            ErrorType::PrimaryProviderError => "Primary geolocation provider error",
            ErrorType::FallbackProviderError => "Fallback geolocation provider error",
            ErrorType::BandwidthTransferError => "Bandwidth transfer error",
            ErrorType::OrchestratorDeadline => "Abandoned at batch deadline",
            ErrorType::CacheLoadError => "Region cache load error",
            ErrorType::SourceFetchError => "Source fetch error",
            ErrorType::TaskPanic => "Worker task panic",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_probe_error_bucket_mapping() {
        assert_eq!(
            ProbeError::MalformedAddress("x".into()).error_type(),
            ErrorType::MalformedAddress
        );
        assert_eq!(
            ProbeError::ConnectTimeout.error_type(),
            ErrorType::ConnectTimeout
        );
        assert_eq!(
            ProbeError::DeadlineExceeded.error_type(),
            ErrorType::OrchestratorDeadline
        );
        assert_eq!(
            ProbeError::CacheCorruption("bad json".into()).error_type(),
            ErrorType::CacheLoadError
        );
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::MalformedAddress("1.2.3".into());
        assert_eq!(err.to_string(), "malformed IPv4 address: 1.2.3");
        assert_eq!(ProbeError::ConnectTimeout.to_string(), "connect timed out");
    }
}
