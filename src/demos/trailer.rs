//! Trailer autoplay for a banner carousel.
//!
//! A banner first shows a still preview. While the preview runs, the trailer's
//! play URL is fetched. When the preview period ends and a URL is known the
//! trailer plays; when the banner period ends first, the carousel moves on.
//!
//! ```text
//! Idle ──Start──→ Preview ──PreviewFinished (no url)──→ Playable
//!                    │                                     │
//!                    └──PreviewFinished (url)──→ Playing ←─┘ PlayUrlReady
//! ```
//!
//! Starting another trailer from any state restarts the cycle for the new id.
//! Finishing the banner or the trailer returns to `Idle` and sends a single
//! `NextBanner` event.

use crate::builder::{BuildError, OrchestratorBuilder};
use crate::core::{Effect, PerformContext, PerformResult, Performer, StateExt};
use crate::event::EventChannel;
use crate::holder::StateObserver;
use crate::lifecycle::LifecycleSwitch;
use crate::named_variants;
use crate::orchestrator::{Orchestrator, OrchestratorError, Scope};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Preview period used when none is configured.
pub const PREVIEW_PERIOD: Duration = Duration::from_secs(2);

/// Banner period used when none is configured.
pub const BANNER_PERIOD: Duration = Duration::from_secs(5);

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TrailerState {
    /// Nothing is happening.
    Idle,
    /// The banner shows its still image; `url` is set once fetched.
    Preview { id: String, url: Option<String> },
    /// The preview is over but there is nothing to play yet.
    Playable { id: String, url: Option<String> },
    /// The trailer is playing.
    Playing { id: String, url: String },
}

named_variants! {
    State for TrailerState { Idle, Preview, Playable, Playing }
}

impl TrailerState {
    /// Id of the banner this state is about, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Preview { id, .. } | Self::Playable { id, .. } | Self::Playing { id, .. } => {
                Some(id)
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TrailerIntent {
    Start { id: String },
    PlayUrlReady { id: String, url: String },
    PlayUrlFailed { id: String },
    PreviewFinished { id: String },
    BannerFinished { id: String },
    TrailerFinished { id: String },
}

named_variants! {
    Intent for TrailerIntent {
        Start,
        PlayUrlReady,
        PlayUrlFailed,
        PreviewFinished,
        BannerFinished,
        TrailerFinished,
    }
}

impl TrailerIntent {
    pub fn id(&self) -> &str {
        match self {
            Self::Start { id }
            | Self::PlayUrlReady { id, .. }
            | Self::PlayUrlFailed { id }
            | Self::PreviewFinished { id }
            | Self::BannerFinished { id }
            | Self::TrailerFinished { id } => id,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TrailerAction {
    /// Cancel running timers and start the preview and banner timers for `id`.
    RestartTimers { id: String },
    StopTimers,
    FetchPlayUrl { id: String },
    CancelFetch { id: String },
    NextBanner,
    StopTrailer { id: String },
}

named_variants! {
    Action for TrailerAction {
        RestartTimers,
        StopTimers,
        FetchPlayUrl,
        CancelFetch,
        NextBanner,
        StopTrailer,
    }
}

/// Notifications for the banner carousel.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TrailerEvent {
    NextBanner,
    StopTrailer { id: String },
}

type TrailerEffect = Effect<TrailerState, TrailerAction>;

/// Pure transition function of the autoplay.
pub fn reduce(state: &TrailerState, intent: TrailerIntent) -> TrailerEffect {
    match state {
        TrailerState::Idle => match intent {
            TrailerIntent::Start { id } => preview_of(&id)
                .with(TrailerAction::RestartTimers { id: id.clone() })
                + TrailerAction::FetchPlayUrl { id },
            _ => state.clone().state_only(),
        },
        TrailerState::Preview { id, url } => reduce_preview(state, id, url, intent),
        TrailerState::Playable { id, url } => reduce_playable(state, id, url, intent),
        TrailerState::Playing { id, .. } => reduce_playing(state, id, intent),
    }
}

fn reduce_preview(
    state: &TrailerState,
    current: &str,
    url: &Option<String>,
    intent: TrailerIntent,
) -> TrailerEffect {
    if intent.id() != current {
        return match intent {
            TrailerIntent::Start { id } => switch_preview(current, id),
            _ => state.clone().state_only(),
        };
    }

    match (intent, url) {
        (TrailerIntent::PlayUrlReady { id, url }, _) => TrailerState::Preview {
            id,
            url: Some(url),
        }
        .state_only(),
        (TrailerIntent::PreviewFinished { id }, Some(url)) => TrailerState::Playing {
            id,
            url: url.clone(),
        }
        .with(TrailerAction::StopTimers),
        (TrailerIntent::PreviewFinished { id }, None) => {
            TrailerState::Playable { id, url: None }.state_only()
        }
        (TrailerIntent::BannerFinished { .. } | TrailerIntent::TrailerFinished { .. }, _) => {
            finish()
        }
        (TrailerIntent::Start { .. } | TrailerIntent::PlayUrlFailed { .. }, _) => {
            state.clone().state_only()
        }
    }
}

fn reduce_playable(
    state: &TrailerState,
    current: &str,
    url: &Option<String>,
    intent: TrailerIntent,
) -> TrailerEffect {
    if intent.id() != current {
        return match intent {
            TrailerIntent::Start { id } => switch_preview(current, id),
            _ => state.clone().state_only(),
        };
    }

    match (intent, url) {
        (TrailerIntent::PlayUrlReady { id, url }, _) => {
            TrailerState::Playing { id, url }.with(TrailerAction::StopTimers)
        }
        (TrailerIntent::PreviewFinished { id }, Some(url)) => TrailerState::Playing {
            id,
            url: url.clone(),
        }
        .with(TrailerAction::StopTimers),
        (TrailerIntent::BannerFinished { .. } | TrailerIntent::TrailerFinished { .. }, _) => {
            finish()
        }
        (
            TrailerIntent::Start { .. }
            | TrailerIntent::PlayUrlFailed { .. }
            | TrailerIntent::PreviewFinished { .. },
            _,
        ) => state.clone().state_only(),
    }
}

fn reduce_playing(state: &TrailerState, current: &str, intent: TrailerIntent) -> TrailerEffect {
    match intent {
        TrailerIntent::Start { id } if id != current => preview_of(&id)
            .with(TrailerAction::StopTrailer {
                id: current.to_string(),
            })
            + TrailerAction::RestartTimers { id: id.clone() }
            + TrailerAction::FetchPlayUrl { id },
        TrailerIntent::TrailerFinished { id } if id == current => finish(),
        _ => state.clone().state_only(),
    }
}

/// Preview of `next`, dropping the fetch still pending for `current`.
fn switch_preview(current: &str, next: String) -> TrailerEffect {
    preview_of(&next).with(TrailerAction::RestartTimers { id: next.clone() })
        + TrailerAction::CancelFetch {
            id: current.to_string(),
        }
        + TrailerAction::FetchPlayUrl { id: next }
}

fn preview_of(id: &str) -> TrailerState {
    TrailerState::Preview {
        id: id.to_string(),
        url: None,
    }
}

fn finish() -> TrailerEffect {
    TrailerState::Idle.with(TrailerAction::NextBanner)
}

/// Anticipated failures of a play URL request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("No trailer for '{0}'")]
    NotFound(String),

    #[error("Trailer service unavailable: {0}")]
    Unavailable(String),
}

/// Source of trailer play URLs.
#[async_trait]
pub trait TrailerRepository: Send + Sync + 'static {
    async fn fetch_play_url(&self, id: &str) -> Result<String, FetchError>;

    /// Abort an in-flight request for `id`, if the source supports it.
    fn stop_request(&self, id: &str);
}

/// Receiver of carousel notifications. Sending never blocks.
pub trait TrailerEventTransmitter: Send + Sync + 'static {
    fn send_event(&self, event: TrailerEvent);
}

impl TrailerEventTransmitter for EventChannel<TrailerEvent> {
    fn send_event(&self, event: TrailerEvent) {
        self.send(event);
    }
}

impl<T: TrailerEventTransmitter + ?Sized> TrailerEventTransmitter for Arc<T> {
    fn send_event(&self, event: TrailerEvent) {
        (**self).send_event(event);
    }
}

/// Timing violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimingViolation {
    #[error("Preview period must be greater than zero")]
    ZeroPreview,

    #[error("Banner period must be greater than zero")]
    ZeroBanner,

    #[error("Preview period {preview:?} must be shorter than banner period {banner:?}")]
    PreviewNotShorter { preview: Duration, banner: Duration },
}

type TimingCheck = Validation<(), NonEmptyVec<TimingViolation>>;

/// Preview and banner periods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrailerTimings {
    pub preview: Duration,
    pub banner: Duration,
}

impl Default for TrailerTimings {
    fn default() -> Self {
        Self {
            preview: PREVIEW_PERIOD,
            banner: BANNER_PERIOD,
        }
    }
}

impl TrailerTimings {
    pub fn new(preview: Duration, banner: Duration) -> Result<Self, Vec<TimingViolation>> {
        let timings = Self { preview, banner };
        match timings.validate() {
            Validation::Success(_) => Ok(timings),
            Validation::Failure(violations) => Err(violations.iter().cloned().collect()),
        }
    }

    pub fn validate(&self) -> Validation<(), NonEmptyVec<TimingViolation>> {
        let checks: Vec<TimingCheck> = vec![
            if self.preview.is_zero() {
                Validation::fail(TimingViolation::ZeroPreview)
            } else {
                Validation::success(())
            },
            if self.banner.is_zero() {
                Validation::fail(TimingViolation::ZeroBanner)
            } else {
                Validation::success(())
            },
            if self.preview >= self.banner {
                Validation::fail(TimingViolation::PreviewNotShorter {
                    preview: self.preview,
                    banner: self.banner,
                })
            } else {
                Validation::success(())
            },
        ];

        Validation::all_vec(checks).map(|_| ())
    }
}

struct PendingFetch {
    id: String,
    token: CancellationToken,
}

/// Executes [`TrailerAction`]s: timers, URL fetches and carousel events.
///
/// Timers and fetches run as tasks in the host scope, so the action lane is
/// never held up by them. They survive a stop/start cycle: whatever they offer
/// while stopped is buffered and reduced on resume.
pub struct TrailerPerformer<R, T> {
    repository: Arc<R>,
    transmitter: T,
    timings: TrailerTimings,
    timers: Mutex<Vec<CancellationToken>>,
    fetch: Mutex<Option<PendingFetch>>,
}

impl<R: TrailerRepository, T: TrailerEventTransmitter> TrailerPerformer<R, T> {
    pub fn new(repository: R, transmitter: T, timings: TrailerTimings) -> Self {
        Self {
            repository: Arc::new(repository),
            transmitter,
            timings,
            timers: Mutex::new(Vec::new()),
            fetch: Mutex::new(None),
        }
    }

    fn restart_timers(&self, id: String, ctx: &PerformContext<TrailerIntent>) {
        let mut timers = self.timers.lock();
        for timer in timers.drain(..) {
            timer.cancel();
        }

        let preview = TrailerIntent::PreviewFinished { id: id.clone() };
        let preview = after(ctx, self.timings.preview, preview);
        let banner = after(ctx, self.timings.banner, TrailerIntent::BannerFinished { id });
        timers.extend([preview, banner]);
    }

    fn stop_timers(&self) {
        for timer in self.timers.lock().drain(..) {
            timer.cancel();
        }
    }

    fn fetch_play_url(&self, id: String, ctx: &PerformContext<TrailerIntent>) {
        let repository = Arc::clone(&self.repository);
        let intents = ctx.intents().clone();
        let request = id.clone();

        let token = ctx.spawn_cancellable(async move {
            let intent = match repository.fetch_play_url(&request).await {
                Ok(url) => TrailerIntent::PlayUrlReady { id: request, url },
                Err(err) => {
                    warn!(id = %request, error = %err, "play url fetch failed");
                    TrailerIntent::PlayUrlFailed { id: request }
                }
            };
            intents.offer(intent);
        });

        let previous = self.fetch.lock().replace(PendingFetch { id, token });
        if let Some(previous) = previous {
            previous.token.cancel();
        }
    }

    fn cancel_fetch(&self, id: &str) {
        let pending = {
            let mut slot = self.fetch.lock();
            match slot.as_ref() {
                Some(pending) if pending.id == id => slot.take(),
                _ => None,
            }
        };
        if let Some(pending) = pending {
            debug!(id, "cancelling play url fetch");
            pending.token.cancel();
        }
        self.repository.stop_request(id);
    }
}

fn after(
    ctx: &PerformContext<TrailerIntent>,
    delay: Duration,
    intent: TrailerIntent,
) -> CancellationToken {
    let intents = ctx.intents().clone();
    ctx.spawn_cancellable(async move {
        tokio::time::sleep(delay).await;
        intents.offer(intent);
    })
}

#[async_trait]
impl<R, T> Performer<TrailerAction, TrailerIntent> for TrailerPerformer<R, T>
where
    R: TrailerRepository,
    T: TrailerEventTransmitter,
{
    async fn perform(
        &self,
        action: TrailerAction,
        ctx: &PerformContext<TrailerIntent>,
    ) -> PerformResult<TrailerIntent> {
        match action {
            TrailerAction::RestartTimers { id } => self.restart_timers(id, ctx),
            TrailerAction::StopTimers => self.stop_timers(),
            TrailerAction::FetchPlayUrl { id } => self.fetch_play_url(id, ctx),
            TrailerAction::CancelFetch { id } => self.cancel_fetch(&id),
            TrailerAction::NextBanner => self.transmitter.send_event(TrailerEvent::NextBanner),
            TrailerAction::StopTrailer { id } => {
                self.transmitter.send_event(TrailerEvent::StopTrailer { id })
            }
        }
        Ok(None)
    }
}

/// The autoplay model a banner carousel talks to.
pub struct TrailerAutoplay {
    knot: Orchestrator<TrailerState, TrailerIntent, TrailerAction>,
}

impl TrailerAutoplay {
    pub fn new<R, T>(repository: R, transmitter: T) -> Result<Self, BuildError>
    where
        R: TrailerRepository,
        T: TrailerEventTransmitter,
    {
        Self::with_timings(repository, transmitter, TrailerTimings::default())
    }

    pub fn with_timings<R, T>(
        repository: R,
        transmitter: T,
        timings: TrailerTimings,
    ) -> Result<Self, BuildError>
    where
        R: TrailerRepository,
        T: TrailerEventTransmitter,
    {
        let knot = OrchestratorBuilder::new()
            .name("trailer-autoplay")
            .initial(TrailerState::Idle)
            .reducer(reduce)
            .performer(TrailerPerformer::new(repository, transmitter, timings))
            .build()?;
        Ok(Self { knot })
    }

    pub fn start(&self, scope: &Scope) -> Result<(), OrchestratorError> {
        self.knot.start(scope)
    }

    pub fn stop(&self) {
        self.knot.stop();
    }

    /// A banner became visible.
    pub fn start_banner(&self, id: impl Into<String>) {
        self.knot.offer_intent(TrailerIntent::Start { id: id.into() });
    }

    /// The trailer of a banner ended or was dismissed.
    pub fn stop_banner(&self, id: impl Into<String>) {
        self.knot
            .offer_intent(TrailerIntent::TrailerFinished { id: id.into() });
    }

    pub fn state(&self) -> TrailerState {
        self.knot.state()
    }

    pub fn observe(&self) -> StateObserver<TrailerState> {
        self.knot.observe()
    }

    pub fn orchestrator(&self) -> &Orchestrator<TrailerState, TrailerIntent, TrailerAction> {
        &self.knot
    }
}

impl LifecycleSwitch for TrailerAutoplay {
    fn start(&self, scope: &Scope) -> Result<(), OrchestratorError> {
        TrailerAutoplay::start(self, scope)
    }

    fn stop(&self) {
        TrailerAutoplay::stop(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::State;

    fn preview(id: &str, url: Option<&str>) -> TrailerState {
        TrailerState::Preview {
            id: id.into(),
            url: url.map(Into::into),
        }
    }

    fn playable(id: &str) -> TrailerState {
        TrailerState::Playable {
            id: id.into(),
            url: None,
        }
    }

    fn playing(id: &str, url: &str) -> TrailerState {
        TrailerState::Playing {
            id: id.into(),
            url: url.into(),
        }
    }

    #[test]
    fn idle_ignores_everything_but_start() {
        let effect = reduce(
            &TrailerState::Idle,
            TrailerIntent::PreviewFinished { id: "a".into() },
        );
        assert_eq!(effect, TrailerState::Idle.state_only());
    }

    #[test]
    fn url_ready_for_other_trailer_is_ignored() {
        let state = preview("a", None);
        let effect = reduce(
            &state,
            TrailerIntent::PlayUrlReady {
                id: "b".into(),
                url: "u".into(),
            },
        );
        assert_eq!(effect, state.state_only());
    }

    #[test]
    fn url_ready_in_playable_starts_playing() {
        let effect = reduce(
            &playable("a"),
            TrailerIntent::PlayUrlReady {
                id: "a".into(),
                url: "u".into(),
            },
        );
        assert_eq!(effect, playing("a", "u").with(TrailerAction::StopTimers));
    }

    #[test]
    fn preview_finished_for_other_trailer_keeps_playable() {
        let effect = reduce(&playable("a"), TrailerIntent::PreviewFinished { id: "b".into() });
        assert_eq!(effect.state, playable("a"));
        assert!(effect.actions.is_empty());
    }

    #[test]
    fn leaving_playable_cancels_fetch() {
        let effect = reduce(&playable("a"), TrailerIntent::Start { id: "b".into() });
        assert_eq!(
            effect.actions,
            vec![
                TrailerAction::RestartTimers { id: "b".into() },
                TrailerAction::CancelFetch { id: "a".into() },
                TrailerAction::FetchPlayUrl { id: "b".into() },
            ]
        );
    }

    #[test]
    fn leaving_playing_stops_trailer_first() {
        let effect = reduce(&playing("a", "u"), TrailerIntent::Start { id: "b".into() });
        assert_eq!(effect.state, preview("b", None));
        assert_eq!(
            effect.actions,
            vec![
                TrailerAction::StopTrailer { id: "a".into() },
                TrailerAction::RestartTimers { id: "b".into() },
                TrailerAction::FetchPlayUrl { id: "b".into() },
            ]
        );
    }

    #[test]
    fn banner_timeout_moves_carousel_on() {
        let effect = reduce(&preview("a", None), TrailerIntent::BannerFinished { id: "a".into() });
        assert_eq!(effect, TrailerState::Idle.with(TrailerAction::NextBanner));
    }

    #[test]
    fn playing_ignores_banner_timeout() {
        let state = playing("a", "u");
        let effect = reduce(&state, TrailerIntent::BannerFinished { id: "a".into() });
        assert_eq!(effect, state.state_only());
    }

    #[test]
    fn names_and_ids() {
        assert_eq!(preview("a", None).name(), "Preview");
        assert_eq!(preview("a", None).id(), Some("a"));
        assert_eq!(TrailerState::Idle.id(), None);
        assert_eq!(TrailerIntent::PlayUrlFailed { id: "x".into() }.id(), "x");
    }

    #[test]
    fn timings_accumulate_violations() {
        assert_eq!(
            TrailerTimings::new(Duration::ZERO, Duration::ZERO),
            Err(vec![
                TimingViolation::ZeroPreview,
                TimingViolation::ZeroBanner,
                TimingViolation::PreviewNotShorter {
                    preview: Duration::ZERO,
                    banner: Duration::ZERO,
                },
            ])
        );
        assert!(TrailerTimings::new(PREVIEW_PERIOD, BANNER_PERIOD).is_ok());
    }
}
