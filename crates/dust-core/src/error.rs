use std::io;

use thiserror::Error;

use crate::model::EventId;

#[derive(Debug, Error)]
pub enum GuideError {
    #[error("failed to fetch {resource}: {reason}")]
    Fetch { resource: String, reason: String },
    #[error("malformed {resource} document: {source}")]
    Parse {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("event {event} has an unparseable occurrence timestamp '{value}'")]
    MalformedOccurrence { event: EventId, value: String },
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("invalid argument for {operation}: {reason}")]
    InvalidArgument { operation: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl GuideError {
    pub fn fetch<R: Into<String>, T: ToString>(resource: R, reason: T) -> Self {
        GuideError::Fetch {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_argument<O: Into<String>, T: Into<String>>(operation: O, reason: T) -> Self {
        GuideError::InvalidArgument {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GuideError>;
