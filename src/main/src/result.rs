use std::path::PathBuf;

use thiserror::Error;
use tokio::task::JoinError;

pub type LMResult<T> = Result<T, LMError>;

#[derive(Debug)]
pub enum LMIoErr {
    Io { path: PathBuf, err: std::io::Error },
    Bind { addr: std::net::SocketAddr, err: hyper::Error },
    Serve(hyper::Error),
}

#[derive(Debug)]
pub enum LMDataErr {
    DecodeTelemetry {
        path: Option<PathBuf>,
        err: serde_json::Error,
    },
}

#[derive(Debug)]
pub enum LMConfigErr {
    DecodeYaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },
    InvalidDefaultThreshold(f64),
}

#[derive(Debug)]
pub enum LMRuntimeErr {
    TokioJoin { err: JoinError, context: String },
}

#[derive(Error, Debug)]
pub enum LMError {
    #[error("Io error: {0:?}")]
    LMIoErr(LMIoErr),

    #[error("Telemetry data error: {0:?}")]
    LMDataErr(LMDataErr),

    #[error("Config error: {0:?}")]
    LMConfigErr(LMConfigErr),

    #[error("Runtime error: {0:?}")]
    LMRuntimeErr(LMRuntimeErr),
}

impl From<LMIoErr> for LMError {
    fn from(e: LMIoErr) -> Self {
        LMError::LMIoErr(e)
    }
}

impl From<LMDataErr> for LMError {
    fn from(e: LMDataErr) -> Self {
        LMError::LMDataErr(e)
    }
}

impl From<LMConfigErr> for LMError {
    fn from(e: LMConfigErr) -> Self {
        LMError::LMConfigErr(e)
    }
}

impl From<LMRuntimeErr> for LMError {
    fn from(e: LMRuntimeErr) -> Self {
        LMError::LMRuntimeErr(e)
    }
}

/// Failures of a single latency request.
///
/// `Display` is the exact message placed in the `{"error": ...}` body, the
/// transport status is always 200.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Invalid JSON in request body")]
    InvalidBody,

    #[error("Request must include a 'regions' array")]
    MissingRegions,

    #[error("No data found for the specified regions")]
    NoData,

    #[error("An error occurred: {0}")]
    Internal(String),
}

impl RequestError {
    /// Label used for the request outcome counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            RequestError::InvalidBody => "invalid_body",
            RequestError::MissingRegions => "invalid_request",
            RequestError::NoData => "no_data",
            RequestError::Internal(_) => "internal",
        }
    }
}
