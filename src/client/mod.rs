//! Client side: typed request dispatch with status-policy branching and
//! injected entity-creation strategies.

mod dispatcher;
mod outcome;
mod policy;
mod repo;
pub mod transport;

pub use dispatcher::{Dispatcher, PendingCall};
pub use outcome::{DispatchError, Failure, FailureKind, Outcome};
pub use policy::SuccessPolicy;
pub use repo::{AuthSession, RepoClient};
pub use transport::{HttpConfig, HttpTransport, Transport, TransportError};
