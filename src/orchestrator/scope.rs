//! Externally controlled execution scope for the lanes.

use super::error::OrchestratorError;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Where lanes run and what cancels them.
///
/// The host owns the scope: cancelling its token stops every orchestrator
/// started in it, in addition to each orchestrator's own `stop`.
#[derive(Clone, Debug)]
pub struct Scope {
    handle: Handle,
    token: CancellationToken,
}

impl Scope {
    pub fn new(handle: Handle, token: CancellationToken) -> Self {
        Self { handle, token }
    }

    /// Scope on the current tokio runtime with a fresh token.
    pub fn current() -> Result<Self, OrchestratorError> {
        Ok(Self::new(Handle::try_current()?, CancellationToken::new()))
    }

    /// Nested scope on the same runtime; cancelled with its parent.
    pub fn child(&self) -> Self {
        Self::new(self.handle.clone(), self.token.child_token())
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
