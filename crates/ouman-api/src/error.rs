use thiserror::Error;

/// Top-level error type for the `ouman-api` crate.
///
/// Covers every failure mode of the device protocol: authentication,
/// transport, response interpretation, caller-side validation, and
/// registry composition. The CLI maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device rejected the username/password pair.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Timeout, non-2xx status, or network failure talking to the device.
    #[error("Communication with device failed: {0}")]
    Communication(#[from] CommunicationError),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {message}")]
    ClientBuild { message: String },

    // ── Protocol ────────────────────────────────────────────────────
    /// The device answered with something the protocol layer cannot
    /// interpret: missing field, unparsable value, or a mismatched echo.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Caller input ────────────────────────────────────────────────
    /// A write value was rejected before anything was sent.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    // ── Registry composition ────────────────────────────────────────
    /// Duplicate or conflicting registries in a `RegistrySet`.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a transport-level failure.
    pub fn is_communication(&self) -> bool {
        matches!(self, Self::Communication(_))
    }

    /// Returns `true` if the device signalled an expired session.
    ///
    /// The controller answers writes with HTTP 404 once its session is gone.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Communication(e) if e.status() == Some(404))
    }
}

/// Failures of the underlying HTTP round-trip.
#[derive(Debug, Error)]
pub enum CommunicationError {
    /// No response within the request deadline.
    #[error("Timeout connecting to device after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The device answered with a non-2xx status.
    #[error("HTTP Error: {status}")]
    Status { status: u16 },

    /// Connection refused, DNS failure, truncated body, etc.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
}

impl CommunicationError {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

/// Caller-supplied write value rejected before any request was issued.
///
/// `NotControllable` and `WrongType` are kind mismatches; `NotInteger` and
/// `OutOfRange` are value mismatches for an otherwise acceptable kind.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("endpoint {endpoint} is read-only")]
    NotControllable { endpoint: String },

    #[error("unexpected value type for {endpoint}: expected {expected}, got {got}")]
    WrongType {
        endpoint: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("value for {endpoint} must be a whole number, got {value}")]
    NotInteger { endpoint: String, value: f64 },

    #[error("value for {endpoint} out of bounds [{min},{max}]: {value}")]
    OutOfRange {
        endpoint: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("cannot interpret {input:?} as a value for {endpoint}")]
    Unparsable { endpoint: String, input: String },
}

impl ValidationError {
    /// Returns `true` for kind mismatches (wrong value type or read-only target).
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::NotControllable { .. } | Self::WrongType { .. })
    }
}
