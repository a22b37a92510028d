use crate::view::ViewKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::ApiError),

    #[error("Refresh cycle exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("Unknown view '{0}'")]
    UnknownView(String),

    #[error("View '{0}' is not running")]
    NotRunning(ViewKind),
}

impl EngineError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EngineError::ApiClient(api_client::ApiError::Unauthorized))
    }
}
