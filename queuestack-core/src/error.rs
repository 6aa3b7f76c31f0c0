//! Broker faults and boundary error codes

use thiserror::Error;

/// Error codes a service layer reports when a broker operation comes back empty.
///
/// The broker itself never raises these: unknown queues, unknown receipt handles and
/// lost races are sentinel results (`None`, `false`, empty lists). The boundary decides
/// which sentinel becomes which code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    QueueDoesNotExist,
    QueueNameExists,
    ReceiptHandleIsInvalid,
    InvalidParameterValue,
    MessageTooLong,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueueDoesNotExist => "AWS.SimpleQueueService.NonExistentQueue",
            Self::QueueNameExists => "QueueAlreadyExists",
            Self::ReceiptHandleIsInvalid => "ReceiptHandleIsInvalid",
            Self::InvalidParameterValue => "InvalidParameterValue",
            Self::MessageTooLong => "MessageTooLong",
            Self::ServiceUnavailable => "ServiceUnavailable",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::QueueDoesNotExist
            | Self::QueueNameExists
            | Self::ReceiptHandleIsInvalid
            | Self::InvalidParameterValue
            | Self::MessageTooLong => 400,
            Self::ServiceUnavailable => 503,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecoverable broker faults.
///
/// These only come out of construction and configuration loading; steady-state
/// operations do not fail.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Scheduler unavailable: {0}")]
    SchedulerUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BrokerError {
    /// The boundary code this fault is surfaced as
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SchedulerUnavailable(_) => ErrorCode::ServiceUnavailable,
            Self::Config(_) => ErrorCode::InvalidParameterValue,
        }
    }
}
