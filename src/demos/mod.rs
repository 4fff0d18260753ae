//! Complete state machines built on the runtime.
//!
//! Each demo is a `(State, Intent, Action, reducer, performer)` set:
//! - [`trailer`]: banner preview, URL fetch and trailer playback with timers
//!   and one-shot carousel events
//! - [`books`]: a repository-backed list whose failures become an error state
//! - [`traffic`]: a cycling light driven entirely by inline side effects
//! - [`sms`]: a message classifier whose check in flight can be cancelled

pub mod books;
pub mod sms;
pub mod traffic;
pub mod trailer;
