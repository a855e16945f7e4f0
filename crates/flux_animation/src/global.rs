//! Default group
//!
//! Free functions that schedule on an ambient [`Group`], for call sites that
//! don't need isolation. The host loop must call [`update`] once per frame
//! if anything uses them.
//!
//! Tween handles are `Rc`-based, so the default group is per thread: it is
//! created the first time a function here is called and dropped when the
//! thread exits. For a game that is the main thread, for the life of the
//! process.
//!
//! ```rust
//! use flux_animation::Value;
//!
//! let alpha = Value::new(1.0);
//! flux_animation::to(0.5).bind(alpha.clone(), 0.0);
//!
//! flux_animation::update(0.5);
//! assert_eq!(alpha.get(), 0.0);
//! ```

use crate::group::Group;
use crate::tween::Tween;

thread_local! {
    static DEFAULT_GROUP: Group = Group::new();
}

/// Create a tween on the default group
pub fn to(duration: f32) -> Tween {
    DEFAULT_GROUP.with(|group| group.to(duration))
}

/// Advance the default group. Other groups are not affected.
pub fn update(dt: f32) {
    DEFAULT_GROUP.with(|group| group.update(dt));
}

/// Seconds until every tween on the default group has completed
pub fn total_remaining_time() -> f32 {
    DEFAULT_GROUP.with(Group::total_remaining_time)
}

/// Run `f` with the default group
pub fn with_default_group<R>(f: impl FnOnce(&Group) -> R) -> R {
    DEFAULT_GROUP.with(f)
}
