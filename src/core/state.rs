//! Marker traits for the three value kinds flowing through a knot.
//!
//! States, intents and actions are plain immutable values. These traits only
//! pin down the bounds the runtime needs and give every value a stable name
//! for diagnostics.

use std::fmt::Debug;

/// Trait for the single state value owned by a state holder.
///
/// All methods are pure - no side effects. States are immutable snapshots;
/// a new value replaces the old one on every transition.
///
/// # Required Traits
///
/// - `Clone`: observers receive their own snapshot
/// - `PartialEq`: unchanged reductions do not wake observers
/// - `Debug`: states must be debuggable for diagnostics
/// - `Send` + `Sync`: states are shared between lanes and observers
///
/// # Example
///
/// ```rust
/// use knot::core::State;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum TaskState {
///     Pending,
///     Running,
///     Failed(String),
/// }
///
/// impl State for TaskState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Pending => "Pending",
///             Self::Running => "Running",
///             Self::Failed(_) => "Failed",
///         }
///     }
///
///     fn is_error(&self) -> bool {
///         matches!(self, Self::Failed(_))
///     }
/// }
///
/// assert!(TaskState::Failed("boom".into()).is_error());
/// ```
pub trait State: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this state carries a domain failure.
    ///
    /// Error states are how anticipated failures surface to observers.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}

/// An event requesting a state transition.
///
/// Intents are consumed exactly once by the intent lane.
pub trait Intent: Debug + Send + 'static {
    /// Get the intent's name for logging.
    fn name(&self) -> &str;
}

/// A side-effect request emitted by a reducer and consumed exactly once by a
/// performer.
pub trait Action: Debug + Send + 'static {
    /// Get the action's name for logging.
    fn name(&self) -> &str;
}
