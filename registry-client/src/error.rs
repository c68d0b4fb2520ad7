use std::fmt::Display;
use std::io::Error as IOError;

#[derive(Debug)]
pub enum Error {
    ConfigError(reqwest::Error),
    UrlParsingError(String),
    JSONParsingError(String),
    CertificateError(String),
    AuthError(String),

    ConnectionError,
    IOError(IOError),
    StatusError(u16),
    ResponseLengthInvalid,

    ReferenceInvalidError,
    DigestInvalidError,
    TagInvalidError,

    UnknownError,
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConfigError(e) => write!(f, "client configuration error: {}", e),
            Error::UrlParsingError(s) => write!(f, "invalid url: {}", s),
            Error::JSONParsingError(s) => write!(f, "invalid JSON response: {}", s),
            Error::CertificateError(s) => write!(f, "certificate error: {}", s),
            Error::AuthError(s) => write!(f, "authentication failed: {}", s),
            Error::ConnectionError => write!(f, "cannot connect to registry"),
            Error::IOError(e) => write!(f, "I/O error: {}", e),
            Error::StatusError(code) => write!(f, "registry responded with status {}", code),
            Error::ResponseLengthInvalid => write!(f, "response length doesn't match content-length"),
            Error::ReferenceInvalidError => write!(f, "invalid image reference"),
            Error::DigestInvalidError => write!(f, "invalid digest"),
            Error::TagInvalidError => write!(f, "invalid tag"),
            Error::UnknownError => write!(f, "unknown error"),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(value: url::ParseError) -> Self {
        Error::UrlParsingError(value.to_string())
    }
}

impl From<IOError> for Error {
    fn from(value: IOError) -> Self {
        Error::IOError(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONParsingError(value.to_string())
    }
}

impl Error {
    pub fn into_config(reqwest_error: reqwest::Error) -> Self {
        Self::ConfigError(reqwest_error)
    }

    pub fn into_certificate(reqwest_error: reqwest::Error) -> Self {
        Self::CertificateError(reqwest_error.to_string())
    }

    /// Connection level failures are the only ones worth retrying over
    /// another scheme.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::ConnectionError)
    }
}
