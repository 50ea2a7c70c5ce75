//! Error types for lease operations
use thiserror::Error;

/// Result type for lease operations
pub type Result<T> = std::result::Result<T, Error>;

/// Every way a lease, release or delegation can be refused.
///
/// The `Display` text of the four operational variants is the message
/// reported through the `last_error_message` accessors and is kept
/// byte-for-byte stable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Release was attempted without a ticket.
    #[error("Please provide your parking ticket.")]
    MissingTicket,

    /// Ticket is not outstanding through this allocator (wrong, reused or foreign).
    #[error("Unrecognized parking ticket.")]
    UnrecognizedTicket,

    /// No owned pool has a free slot.
    #[error("The parking lot is full.")]
    CapacityExhausted,

    /// The manager was asked to delegate to an allocator it does not manage.
    #[error("That parking boy is not under management.")]
    UnauthorizedAgent,

    /// Pool or layout configuration is invalid
    #[error("Configuration error: {message}")]
    Configuration {
        /// The error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if retrying the same operation later may succeed.
    ///
    /// Only exhaustion is transient: a release elsewhere frees a slot.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CapacityExhausted)
    }
}
