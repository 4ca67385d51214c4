use thiserror::Error;
use xconnect_client::XConnectError;

use crate::contact_manager::ContactManagerError;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Remote(#[from] XConnectError),
    #[error(transparent)]
    ContactManager(#[from] ContactManagerError),
    #[error("facet encoding failed: {0}")]
    FacetEncoding(String),
}

impl TrackingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Remote(error) => error.code(),
            Self::ContactManager(error) => error.code(),
            Self::FacetEncoding(_) => "facet_encoding",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidArgument(message) | Self::FacetEncoding(message) => message.clone(),
            Self::Remote(error) => error.message(),
            Self::ContactManager(error) => error.to_string(),
        }
    }
}

pub(crate) fn require_non_empty(name: &str, value: &str) -> Result<(), TrackingError> {
    if value.trim().is_empty() {
        return Err(TrackingError::InvalidArgument(format!(
            "{name} must not be empty"
        )));
    }
    Ok(())
}

pub(crate) fn require_id(name: &str, id: uuid::Uuid) -> Result<(), TrackingError> {
    if id.is_nil() {
        return Err(TrackingError::InvalidArgument(format!(
            "{name} must not be the nil id"
        )));
    }
    Ok(())
}
