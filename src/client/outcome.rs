//! Call outcomes for the typed dispatcher.
//!
//! Exactly one [`Outcome`] is produced per dispatched call. The failure
//! taxonomy (transport / policy mismatch / decode) is recoverable from the
//! populated fields alone; callers never parse message text.

use thiserror::Error;

use crate::codec::CodecError;
use crate::message::Response;

use super::transport::TransportError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error("entity construction failed: {0}")]
    Decode(#[from] CodecError),
}

/// Result of one dispatched call: exactly one variant, never both,
/// never neither.
#[derive(Debug)]
pub enum Outcome<E> {
    Success { response: Response, entity: E },
    Failure(Failure),
}

impl<E> Outcome<E> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn entity(&self) -> Option<&E> {
        match self {
            Outcome::Success { entity, .. } => Some(entity),
            Outcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<E, Failure> {
        match self {
            Outcome::Success { entity, .. } => Ok(entity),
            Outcome::Failure(failure) => Err(failure),
        }
    }
}

/// Failed call. Which fields are populated tells the caller what went
/// wrong: no response means the transport never delivered one; a response
/// with no cause means the status fell outside the success policy; both
/// present means the entity strategy failed on an accepted response.
#[derive(Debug)]
pub struct Failure {
    pub response: Option<Response>,
    pub cause: Option<DispatchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    PolicyMismatch,
    Decode,
}

impl Failure {
    pub fn transport(error: TransportError) -> Self {
        Self {
            response: None,
            cause: Some(DispatchError::Transport(error)),
        }
    }

    pub fn policy_mismatch(response: Response) -> Self {
        Self {
            response: Some(response),
            cause: None,
        }
    }

    pub fn decode(response: Response, error: CodecError) -> Self {
        Self {
            response: Some(response),
            cause: Some(DispatchError::Decode(error)),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match (&self.response, &self.cause) {
            (None, _) => FailureKind::Transport,
            (Some(_), None) => FailureKind::PolicyMismatch,
            (Some(_), Some(_)) => FailureKind::Decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kind_from_populated_fields() {
        let transport = Failure::transport(TransportError::Timeout);
        assert_eq!(transport.kind(), FailureKind::Transport);
        assert!(transport.response.is_none());

        let mismatch = Failure::policy_mismatch(Response::new(404));
        assert_eq!(mismatch.kind(), FailureKind::PolicyMismatch);
        assert!(mismatch.cause.is_none());

        let decode = Failure::decode(
            Response::new(200),
            CodecError::XmlParse("truncated".to_string()),
        );
        assert_eq!(decode.kind(), FailureKind::Decode);
        assert!(decode.response.is_some());
        assert!(decode.cause.is_some());
    }
}
