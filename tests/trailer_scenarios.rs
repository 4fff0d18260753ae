//! Trailer autoplay scenarios, at the reducer and end to end.

use async_trait::async_trait;
use knot::core::StateExt;
use knot::demos::trailer::{
    self, FetchError, TrailerAction, TrailerAutoplay, TrailerEvent, TrailerIntent,
    TrailerRepository, TrailerState, BANNER_PERIOD, PREVIEW_PERIOD,
};
use knot::event::EventChannel;
use knot::orchestrator::Scope;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn id(value: &str) -> String {
    value.to_string()
}

// Reducer level

#[test]
fn start_from_idle_previews_and_schedules_timers() {
    let effect = trailer::reduce(&TrailerState::Idle, TrailerIntent::Start { id: id("a") });
    assert_eq!(
        effect.state,
        TrailerState::Preview {
            id: id("a"),
            url: None
        }
    );
    assert_eq!(
        effect.actions,
        vec![
            TrailerAction::RestartTimers { id: id("a") },
            TrailerAction::FetchPlayUrl { id: id("a") },
        ]
    );

    let effect = trailer::reduce(&effect.state, TrailerIntent::PreviewFinished { id: id("a") });
    assert_eq!(
        effect.state,
        TrailerState::Playable {
            id: id("a"),
            url: None
        }
    );
}

#[test]
fn start_of_other_trailer_cancels_pending_fetch() {
    let state = TrailerState::Preview {
        id: id("a"),
        url: None,
    };
    let effect = trailer::reduce(&state, TrailerIntent::Start { id: id("b") });
    assert_eq!(
        effect.state,
        TrailerState::Preview {
            id: id("b"),
            url: None
        }
    );
    assert!(effect
        .actions
        .contains(&TrailerAction::CancelFetch { id: id("a") }));
    assert!(effect
        .actions
        .contains(&TrailerAction::FetchPlayUrl { id: id("b") }));
}

#[test]
fn preview_finished_with_url_plays_and_stops_timers() {
    let state = TrailerState::Preview {
        id: id("a"),
        url: Some(id("https://cdn/a")),
    };
    let effect = trailer::reduce(&state, TrailerIntent::PreviewFinished { id: id("a") });
    assert_eq!(
        effect,
        TrailerState::Playing {
            id: id("a"),
            url: id("https://cdn/a")
        }
        .with(TrailerAction::StopTimers)
    );
}

#[test]
fn trailer_finished_returns_to_idle_with_next_banner() {
    let state = TrailerState::Playing {
        id: id("a"),
        url: id("https://cdn/a"),
    };
    let effect = trailer::reduce(&state, TrailerIntent::TrailerFinished { id: id("a") });
    assert_eq!(effect, TrailerState::Idle.with(TrailerAction::NextBanner));
}

#[test]
fn repeated_start_for_same_trailer_is_noop() {
    let first = trailer::reduce(&TrailerState::Idle, TrailerIntent::Start { id: id("a") });
    let second = trailer::reduce(&first.state, TrailerIntent::Start { id: id("a") });
    assert_eq!(second.state, first.state);
    assert!(second.actions.is_empty());
}

// End to end

struct FakeRepository {
    urls: HashMap<String, String>,
    delay: Duration,
    fetches: Arc<Mutex<Vec<String>>>,
    stopped: Arc<Mutex<Vec<String>>>,
}

impl FakeRepository {
    fn new(delay: Duration, urls: &[(&str, &str)]) -> Self {
        Self {
            urls: urls
                .iter()
                .map(|(id, url)| (id.to_string(), url.to_string()))
                .collect(),
            delay,
            fetches: Arc::default(),
            stopped: Arc::default(),
        }
    }
}

#[async_trait]
impl TrailerRepository for FakeRepository {
    async fn fetch_play_url(&self, id: &str) -> Result<String, FetchError> {
        self.fetches.lock().push(id.to_string());
        tokio::time::sleep(self.delay).await;
        self.urls
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }

    fn stop_request(&self, id: &str) {
        self.stopped.lock().push(id.to_string());
    }
}

struct Harness {
    scope: Scope,
    autoplay: TrailerAutoplay,
    events: Arc<EventChannel<TrailerEvent>>,
    fetches: Arc<Mutex<Vec<String>>>,
    stopped: Arc<Mutex<Vec<String>>>,
}

fn harness(repository: FakeRepository) -> Harness {
    let fetches = Arc::clone(&repository.fetches);
    let stopped = Arc::clone(&repository.stopped);
    let events = Arc::new(EventChannel::new());
    let autoplay = TrailerAutoplay::new(repository, Arc::clone(&events)).unwrap();
    let scope = Scope::current().unwrap();
    autoplay.start(&scope).unwrap();
    Harness {
        scope,
        autoplay,
        events,
        fetches,
        stopped,
    }
}

#[tokio::test(start_paused = true)]
async fn fetched_trailer_plays_after_preview() {
    let h = harness(FakeRepository::new(
        Duration::from_millis(100),
        &[("a", "https://cdn/a")],
    ));
    let mut states = h.autoplay.observe();
    let mut carousel = h.events.subscribe();

    h.autoplay.start_banner("a");
    let started = tokio::time::Instant::now();
    let state = states
        .wait_for(|s| matches!(s, TrailerState::Playing { .. }))
        .await
        .unwrap();
    assert_eq!(
        state,
        TrailerState::Playing {
            id: id("a"),
            url: id("https://cdn/a")
        }
    );
    assert!(started.elapsed() >= PREVIEW_PERIOD);

    h.autoplay.stop_banner("a");
    states
        .wait_for(|s| *s == TrailerState::Idle)
        .await
        .unwrap();
    assert_eq!(carousel.next_event().await, Some(TrailerEvent::NextBanner));

    // Delivered once, to one observer only.
    let mut late = h.events.subscribe();
    assert!(tokio::time::timeout(BANNER_PERIOD, late.next_event())
        .await
        .is_err());
    assert!(tokio::time::timeout(BANNER_PERIOD, carousel.next_event())
        .await
        .is_err());
}

#[tokio::test(start_paused = true)]
async fn switching_trailers_abandons_previous_fetch() {
    let h = harness(FakeRepository::new(
        Duration::from_secs(1),
        &[("a", "https://cdn/a"), ("b", "https://cdn/b")],
    ));
    let mut states = h.autoplay.observe();

    h.autoplay.start_banner("a");
    states
        .wait_for(|s| s.id() == Some("a"))
        .await
        .unwrap();
    h.autoplay.start_banner("b");

    let state = states
        .wait_for(|s| matches!(s, TrailerState::Playing { .. }))
        .await
        .unwrap();
    assert_eq!(state.id(), Some("b"));
    assert_eq!(*h.stopped.lock(), vec![id("a")]);
    assert_eq!(h.fetches.lock().last(), Some(&id("b")));
}

#[tokio::test(start_paused = true)]
async fn missing_trailer_moves_on_after_banner_period() {
    let h = harness(FakeRepository::new(Duration::from_millis(100), &[]));
    let mut states = h.autoplay.observe();
    let mut carousel = h.events.subscribe();

    h.autoplay.start_banner("a");
    let state = states
        .wait_for(|s| matches!(s, TrailerState::Playable { .. }))
        .await
        .unwrap();
    assert_eq!(
        state,
        TrailerState::Playable {
            id: id("a"),
            url: None
        }
    );

    assert_eq!(carousel.next_event().await, Some(TrailerEvent::NextBanner));
    assert_eq!(h.autoplay.state(), TrailerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn repeated_start_fetches_once() {
    let h = harness(FakeRepository::new(Duration::from_millis(100), &[]));
    let mut states = h.autoplay.observe();

    h.autoplay.start_banner("a");
    h.autoplay.start_banner("a");
    states
        .wait_for(|s| matches!(s, TrailerState::Playable { .. }))
        .await
        .unwrap();
    assert_eq!(*h.fetches.lock(), vec![id("a")]);
}

#[tokio::test(start_paused = true)]
async fn leaving_a_playing_trailer_stops_it() {
    let h = harness(FakeRepository::new(
        Duration::from_millis(100),
        &[("a", "https://cdn/a")],
    ));
    let mut states = h.autoplay.observe();
    let mut carousel = h.events.subscribe();

    h.autoplay.start_banner("a");
    states
        .wait_for(|s| matches!(s, TrailerState::Playing { .. }))
        .await
        .unwrap();
    h.autoplay.start_banner("b");

    assert_eq!(
        carousel.next_event().await,
        Some(TrailerEvent::StopTrailer { id: id("a") })
    );
}

#[tokio::test(start_paused = true)]
async fn timers_survive_pause_and_resume() {
    let h = harness(FakeRepository::new(Duration::from_millis(100), &[]));
    let mut states = h.autoplay.observe();
    let mut carousel = h.events.subscribe();

    h.autoplay.start_banner("a");
    states.wait_for(|s| s.id() == Some("a")).await.unwrap();
    h.autoplay.stop();
    h.autoplay.start(&h.scope).unwrap();
    h.autoplay.start_banner("a");

    let state = tokio::time::timeout(BANNER_PERIOD * 2, states.wait_for(|s| *s == TrailerState::Idle))
        .await
        .expect("trailer stuck after resume")
        .unwrap();
    assert_eq!(state, TrailerState::Idle);
    assert_eq!(carousel.next_event().await, Some(TrailerEvent::NextBanner));
}

#[tokio::test(start_paused = true)]
async fn timers_firing_while_stopped_are_reduced_on_resume() {
    let h = harness(FakeRepository::new(Duration::from_millis(100), &[]));
    let mut states = h.autoplay.observe();
    let mut carousel = h.events.subscribe();

    h.autoplay.start_banner("a");
    states.wait_for(|s| s.id() == Some("a")).await.unwrap();
    h.autoplay.stop();

    tokio::time::sleep(BANNER_PERIOD * 2).await;
    assert!(matches!(h.autoplay.state(), TrailerState::Preview { .. }));

    h.autoplay.start(&h.scope).unwrap();
    states
        .wait_for(|s| *s == TrailerState::Idle)
        .await
        .unwrap();
    assert_eq!(carousel.next_event().await, Some(TrailerEvent::NextBanner));
}

#[tokio::test(start_paused = true)]
async fn cancelling_the_scope_cancels_timers() {
    let h = harness(FakeRepository::new(Duration::from_millis(100), &[]));
    let mut states = h.autoplay.observe();

    h.autoplay.start_banner("a");
    states.wait_for(|s| s.id() == Some("a")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    h.scope.cancel();

    tokio::time::sleep(BANNER_PERIOD * 2).await;
    h.autoplay.start(&Scope::current().unwrap()).unwrap();
    tokio::time::sleep(BANNER_PERIOD).await;
    assert!(matches!(h.autoplay.state(), TrailerState::Preview { .. }));
}
