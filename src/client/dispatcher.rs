//! Typed response dispatcher: submit now, resolve later, never block.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::codec::CodecError;
use crate::message::{Request, Response};
use crate::observability::Metrics;

use super::outcome::{Failure, Outcome};
use super::policy::SuccessPolicy;
use super::transport::{Transport, TransportError};

/// Issues one request per call and resolves exactly one [`Outcome`].
///
/// Holds no request-scoped state between calls; concurrent submissions do
/// not interfere. There is no cancellation: once submitted, a call runs to
/// completion or failure.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Counters recorded across every call this dispatcher issued.
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Submits the request asynchronously and returns immediately.
    ///
    /// The entity strategy runs only when the response status is a member
    /// of `policy`; a strategy error still surfaces as a decode failure
    /// with the response attached, never silently.
    pub fn submit<E, F>(
        &self,
        request: Request,
        policy: SuccessPolicy,
        make_entity: F,
    ) -> PendingCall<E>
    where
        E: Send + 'static,
        F: FnOnce(&Response) -> Result<E, CodecError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let metrics = Arc::clone(&self.metrics);
        metrics.dispatch();

        tokio::spawn(async move {
            let method = request.method();
            let path = request.path_and_query();

            let outcome = match transport.execute(request).await {
                Err(error) => {
                    debug!(%method, %path, %error, "transport failed");
                    Outcome::Failure(Failure::transport(error))
                }
                Ok(response) if policy.accepts(response.status) => {
                    match make_entity(&response) {
                        Ok(entity) => Outcome::Success { response, entity },
                        Err(error) => {
                            debug!(%method, %path, status = response.status, %error,
                                "entity construction failed");
                            Outcome::Failure(Failure::decode(response, error))
                        }
                    }
                }
                Ok(response) => {
                    debug!(%method, %path, status = response.status,
                        accepted = ?policy.codes(), "status outside success policy");
                    Outcome::Failure(Failure::policy_mismatch(response))
                }
            };

            if matches!(outcome, Outcome::Failure(_)) {
                metrics.dispatch_failure();
            }

            // The caller may have dropped the pending call; either way the
            // outcome was produced exactly once.
            let _ = tx.send(outcome);
        });

        PendingCall { rx }
    }
}

/// Handle to a submitted call. Awaiting it yields the single outcome.
pub struct PendingCall<E> {
    rx: oneshot::Receiver<Outcome<E>>,
}

impl<E> PendingCall<E> {
    pub async fn outcome(self) -> Outcome<E> {
        match self.rx.await {
            Ok(outcome) => outcome,
            // Only reachable if the dispatch task panicked before sending.
            Err(_) => Outcome::Failure(Failure::transport(TransportError::Failed(
                "dispatch task aborted".to_string(),
            ))),
        }
    }
}
