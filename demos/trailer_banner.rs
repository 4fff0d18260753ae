//! Trailer Autoplay Banner
//!
//! Three banners rotate. Each shows a preview while its trailer URL is
//! fetched; banners with a URL play their trailer, the others move on when
//! the banner period ends.
//!
//! Run with: cargo run --example trailer_banner

use async_trait::async_trait;
use knot::demos::trailer::{
    FetchError, TrailerAutoplay, TrailerEvent, TrailerRepository, TrailerState, TrailerTimings,
};
use knot::event::EventChannel;
use knot::orchestrator::Scope;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Pretends to be a remote service: some trailers exist, some don't.
struct DemoRepository;

#[async_trait]
impl TrailerRepository for DemoRepository {
    async fn fetch_play_url(&self, id: &str) -> Result<String, FetchError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        match id {
            "dune" | "arrival" => Ok(format!("https://cdn.example.com/{id}.m3u8")),
            _ => Err(FetchError::NotFound(id.to_string())),
        }
    }

    fn stop_request(&self, id: &str) {
        tracing::info!(id, "request stopped");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Trailer Autoplay Banner ===\n");

    let events = Arc::new(EventChannel::new());
    let timings = TrailerTimings::new(Duration::from_millis(800), Duration::from_millis(2000))
        .map_err(|violations| format!("invalid timings: {violations:?}"))?;
    let autoplay = Arc::new(TrailerAutoplay::with_timings(
        DemoRepository,
        Arc::clone(&events),
        timings,
    )?);

    let scope = Scope::current()?;
    autoplay.start(&scope)?;

    let mut states = autoplay.observe();
    tokio::spawn(async move {
        while let Some(state) = states.next().await {
            match state {
                TrailerState::Idle => println!("  idle"),
                TrailerState::Preview { id, url } => println!("  preview  {id} (url: {url:?})"),
                TrailerState::Playable { id, .. } => println!("  playable {id}"),
                TrailerState::Playing { id, url } => println!("  playing  {id} from {url}"),
            }
        }
    });

    let banners = ["dune", "unknown", "arrival"];
    let mut carousel = events.subscribe();
    for (index, banner) in banners.iter().enumerate() {
        println!("banner {}: {banner}", index + 1);
        autoplay.start_banner(*banner);

        let mut watcher = autoplay.observe();
        let playing = watcher.wait_for(|s| matches!(s, TrailerState::Playing { .. }));
        if let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(1200), playing).await {
            tokio::time::sleep(Duration::from_millis(500)).await;
            autoplay.stop_banner(*banner);
        }

        match carousel.next_event().await {
            Some(TrailerEvent::NextBanner) => println!("  -> next banner"),
            Some(TrailerEvent::StopTrailer { id }) => println!("  -> stop trailer {id}"),
            None => break,
        }
    }

    autoplay.stop();
    scope.cancel();
    println!("\n=== Example Complete ===");
    Ok(())
}
