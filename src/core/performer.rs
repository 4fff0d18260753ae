//! Action execution: the `Performer` trait and its inline-closure executor.

use super::state::Action;
use crate::orchestrator::{IntentSender, Scope};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Errors a performer returns for failures it did not anticipate.
///
/// Anticipated failures (a service being unreachable, a fetch timing out)
/// must be translated into a domain intent instead. Returning one of these
/// terminates the action lane and faults the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum PerformError {
    #[error("Action failed: {0}")]
    Failed(String),

    #[error("Action failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PerformError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn from_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(error))
    }
}

/// Result of performing one action: at most one follow-up intent.
pub type PerformResult<I> = Result<Option<I>, PerformError>;

/// What a performer can reach while executing an action.
///
/// Work can be bound to one of two lifetimes. [`PerformContext::spawn`] ties
/// it to the running lanes, so `stop` ends it. [`PerformContext::spawn_in_scope`]
/// and [`PerformContext::spawn_cancellable`] tie it to the host [`Scope`]
/// instead: timers and fetches keep going across a stop/start cycle, and an
/// intent they offer while the lanes are stopped is buffered until `start`.
pub struct PerformContext<I> {
    intents: IntentSender<I>,
    scope: Scope,
    lane: CancellationToken,
}

impl<I: Send + 'static> PerformContext<I> {
    pub(crate) fn new(intents: IntentSender<I>, scope: Scope, lane: CancellationToken) -> Self {
        Self {
            intents,
            scope,
            lane,
        }
    }

    /// Inject an intent at any later point, e.g. when a timer fires.
    pub fn offer(&self, intent: I) {
        self.intents.offer(intent);
    }

    /// Handle for offering intents from code that outlives this call.
    pub fn intents(&self) -> &IntentSender<I> {
        &self.intents
    }

    /// Cancellation token of the running lanes.
    pub fn token(&self) -> &CancellationToken {
        &self.lane
    }

    /// The host scope the lanes were started in.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Spawn background work that stops with the lanes.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        guarded(&self.scope, self.lane.clone(), task)
    }

    /// Spawn background work that outlives `stop` and ends with the host scope.
    pub fn spawn_in_scope<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        guarded(&self.scope, self.scope.token().clone(), task)
    }

    /// Spawn scope-bound background work that can also be cancelled on its own.
    ///
    /// Cancelling the returned token stops only this task. Cancelling the
    /// host scope stops it as well; stopping the orchestrator does not.
    pub fn spawn_cancellable<F>(&self, task: F) -> CancellationToken
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.scope.token().child_token();
        guarded(&self.scope, token.clone(), task);
        token
    }
}

fn guarded<F>(scope: &Scope, token: CancellationToken, task: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    scope.handle().spawn(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {}
            _ = task => {}
        }
    })
}

impl<I> Clone for PerformContext<I> {
    fn clone(&self) -> Self {
        Self {
            intents: self.intents.clone(),
            scope: self.scope.clone(),
            lane: self.lane.clone(),
        }
    }
}

/// Executes one action, possibly suspending, and yields at most one follow-up.
///
/// Called sequentially by the action lane, in dequeue order.
#[async_trait]
pub trait Performer<A, I>: Send + Sync + 'static
where
    A: Send + 'static,
    I: Send + 'static,
{
    async fn perform(&self, action: A, ctx: &PerformContext<I>) -> PerformResult<I>;
}

/// Performer backed by an async closure. See [`performer_fn`].
pub struct FnPerformer<F> {
    f: F,
}

/// Build a performer from `Fn(action, ctx) -> impl Future<Output = PerformResult<I>>`.
pub fn performer_fn<A, I, F, Fut>(f: F) -> FnPerformer<F>
where
    F: Fn(A, PerformContext<I>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PerformResult<I>> + Send + 'static,
{
    FnPerformer { f }
}

#[async_trait]
impl<A, I, F, Fut> Performer<A, I> for FnPerformer<F>
where
    A: Send + 'static,
    I: Send + 'static,
    F: Fn(A, PerformContext<I>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PerformResult<I>> + Send + 'static,
{
    async fn perform(&self, action: A, ctx: &PerformContext<I>) -> PerformResult<I> {
        (self.f)(action, ctx.clone()).await
    }
}

type SideEffectFn<I> = Box<dyn FnOnce(PerformContext<I>) -> BoxFuture<'static, PerformResult<I>> + Send>;

/// An action that carries its own behaviour.
///
/// Reducers that prefer closures over named action enums return
/// `SideEffect`s; they run through [`RunSideEffects`] like any other action.
pub struct SideEffect<I> {
    name: &'static str,
    run: SideEffectFn<I>,
}

impl<I: Send + 'static> SideEffect<I> {
    pub fn new<F, Fut>(name: &'static str, f: F) -> Self
    where
        F: FnOnce(PerformContext<I>) -> Fut + Send + 'static,
        Fut: Future<Output = PerformResult<I>> + Send + 'static,
    {
        Self {
            name,
            run: Box::new(move |ctx| Box::pin(f(ctx))),
        }
    }

    /// A side effect whose only result is the given follow-up intent.
    pub fn emit(name: &'static str, intent: I) -> Self {
        Self::new(name, move |_| async move { Ok(Some(intent)) })
    }

    /// A synchronous fire-and-forget side effect.
    pub fn fire<F>(name: &'static str, f: F) -> Self
    where
        F: FnOnce(&PerformContext<I>) + Send + 'static,
    {
        Self::new(name, move |ctx| {
            f(&ctx);
            async { Ok(None) }
        })
    }

    pub(crate) async fn run(self, ctx: PerformContext<I>) -> PerformResult<I> {
        (self.run)(ctx).await
    }
}

impl<I> fmt::Debug for SideEffect<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SideEffect").field("name", &self.name).finish()
    }
}

impl<I: Send + 'static> Action for SideEffect<I> {
    fn name(&self) -> &str {
        self.name
    }
}

/// Default executor for [`SideEffect`] actions: it just runs them.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunSideEffects;

#[async_trait]
impl<I: Send + 'static> Performer<SideEffect<I>, I> for RunSideEffects {
    async fn perform(&self, action: SideEffect<I>, ctx: &PerformContext<I>) -> PerformResult<I> {
        action.run(ctx.clone()).await
    }
}
