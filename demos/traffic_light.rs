//! Traffic Light Orchestrator
//!
//! A light cycling Red -> Green -> Yellow -> Red while cars queue on red and
//! pass on green. Every timer is an inline side effect.
//!
//! Run with: cargo run --example traffic_light
//! More detail: RUST_LOG=knot=debug cargo run --example traffic_light

use knot::demos::traffic::{traffic_light, Light, TrafficIntent};
use knot::lifecycle::{LifecycleObserver, LifecycleSignal};
use knot::orchestrator::Scope;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Traffic Light Orchestrator ===\n");

    let light = Arc::new(traffic_light()?);
    let (signals, rx) = mpsc::channel(4);
    let observer = LifecycleObserver::new(Arc::clone(&light), Scope::current()?);
    let lifecycle = tokio::spawn(observer.follow(rx));
    signals.send(LifecycleSignal::Resumed).await?;

    let mut states = light.observe();
    let cars = light.intents();
    tokio::spawn(async move {
        for _ in 0..6 {
            cars.offer(TrafficIntent::CarArrived);
            tokio::time::sleep(Duration::from_millis(700)).await;
        }
    });
    light.offer_intent(TrafficIntent::Start);

    let mut greens = 0;
    while let Some(state) = states.next().await {
        println!(
            "  {:<6} waiting: {}  passed: {}",
            state.light, state.waiting, state.passed
        );
        if state.light == Light::Yellow {
            greens += 1;
            if greens == 2 {
                break;
            }
        }
    }

    signals.send(LifecycleSignal::Destroyed).await?;
    drop(signals);
    lifecycle.await?;

    println!("\nFinal state: {:?}", light.state());
    println!("\n=== Example Complete ===");
    Ok(())
}
