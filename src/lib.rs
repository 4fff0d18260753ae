//! Knot: unidirectional data flow with a concurrent effect loop
//!
//! A knot turns a stream of intents into state transitions and side effects,
//! and turns completed side effects back into intents. The pure part is a
//! reducer; the effectful part is a performer; the orchestrator ties them
//! together with two independent lanes.
//!
//! # Core Concepts
//!
//! - **State**: the single current value, owned by a [`StateHolder`]
//! - **Reducer**: `(state, intent) -> Effect(next state, actions)`, pure
//! - **Performer**: executes one action and yields at most one follow-up intent
//! - **Orchestrator**: the intent lane and the action lane, started in a
//!   [`Scope`] and stopped on demand
//!
//! # Example
//!
//! ```rust
//! use knot::builder::OrchestratorBuilder;
//! use knot::core::{Effect, SideEffect, StateExt};
//! use knot::named_variants;
//! use knot::orchestrator::Scope;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! enum Door {
//!     Closed,
//!     Open,
//! }
//!
//! named_variants! {
//!     State for Door { Closed, Open }
//! }
//!
//! #[derive(Debug)]
//! enum DoorIntent {
//!     Push,
//!     Swing,
//! }
//!
//! named_variants! {
//!     Intent for DoorIntent { Push, Swing }
//! }
//!
//! fn reduce(door: &Door, intent: DoorIntent) -> Effect<Door, SideEffect<DoorIntent>> {
//!     match (door, intent) {
//!         (Door::Closed, DoorIntent::Push) => Door::Closed
//!             .with(SideEffect::emit("unlatch", DoorIntent::Swing)),
//!         (Door::Closed, DoorIntent::Swing) => Door::Open.state_only(),
//!         (door, _) => door.clone().state_only(),
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let door = OrchestratorBuilder::new()
//!     .initial(Door::Closed)
//!     .reducer(reduce)
//!     .run_side_effects()
//!     .build()
//!     .unwrap();
//!
//! door.start(&Scope::current().unwrap()).unwrap();
//! let mut observer = door.observe();
//! door.offer_intent(DoorIntent::Push);
//! assert_eq!(observer.wait_for(|d| *d == Door::Open).await, Some(Door::Open));
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod demos;
pub mod event;
pub mod holder;
pub mod lifecycle;
pub mod orchestrator;

// Re-export commonly used types
pub use crate::builder::{BuildError, OrchestratorBuilder};
pub use crate::core::{Effect, Performer, Reducer, SideEffect, State, StateExt};
pub use crate::event::{Event, EventChannel};
pub use crate::holder::{StateHolder, StateObserver};
pub use crate::orchestrator::{Orchestrator, OrchestratorError, Scope};
