//! Flux Tween Scheduler
//!
//! Declarative, tick-driven animation of externally owned numeric state.
//!
//! # Features
//!
//! - **Tweens**: interpolate any number of targets over a shared timeline
//! - **Easing**: the full easings.net family plus CSS cubic-bezier curves
//! - **Chaining**: `after` sequences and `after_all_else` synchronization
//! - **Running flags**: counters collaborators poll to wait on animations
//! - **Cancellation**: `stop` halts a tween and everything chained after it
//!
//! Nothing runs in the background. The host calls [`Group::update`] (or the
//! default-group [`update`]) once per frame with the frame's delta time in
//! seconds.
//!
//! # Example
//!
//! ```rust
//! use flux_animation::{Group, RunningFlag, Value};
//!
//! let group = Group::new();
//! let x = Value::new(0.0);
//! let moving = RunningFlag::new();
//!
//! group.to(1.0).bind(x.clone(), 10.0).running_flag(&moving);
//!
//! group.update(0.5);
//! assert_eq!(x.get(), 7.5); // quadratic ease-out
//! assert!(moving.is_running());
//!
//! group.update(0.5);
//! assert_eq!(x.get(), 10.0);
//! assert!(!moving.is_running());
//! assert!(group.is_empty());
//! ```

pub mod easing;
pub mod global;
pub mod group;
pub mod target;
pub mod tween;

pub use easing::{Easing, ParseEasingError};
pub use global::{to, total_remaining_time, update, with_default_group};
pub use group::Group;
pub use target::{FnTarget, RunningFlag, Target, Value};
pub use tween::{Tween, TweenId};
