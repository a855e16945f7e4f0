//! Tween groups
//!
//! A [`Group`] owns an ordered set of tweens and advances all of them once
//! per host frame. Groups are independent: updating one never touches
//! another, so a host can pause a set of animations simply by not updating
//! its group.

use crate::tween::Tween;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

pub(crate) struct GroupInner {
    tweens: RefCell<Vec<Tween>>,
    updating: Cell<bool>,
}

impl GroupInner {
    pub(crate) fn register(this: &Rc<GroupInner>, tween: Tween) -> Tween {
        this.tweens.borrow_mut().push(tween.clone());
        tween
    }

    fn total_remaining_time(&self) -> f32 {
        self.tweens
            .borrow()
            .iter()
            .map(Tween::time_until_end)
            .fold(0.0, f32::max)
    }

    pub(crate) fn remaining_time_excluding(&self, tween: &Tween) -> f32 {
        self.tweens
            .borrow()
            .iter()
            .filter(|other| !other.ptr_eq(tween))
            .map(Tween::time_until_end)
            .fold(0.0, f32::max)
    }
}

/// Clears the update flag on scope exit, including when a callback panics.
struct Updating<'a>(&'a Cell<bool>);

impl Drop for Updating<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// An ordered collection of tweens sharing one update cadence
///
/// Tweens run in creation order. Callbacks fired during [`Group::update`]
/// may create new tweens in the same group; those are first advanced on the
/// following update.
///
/// A `Group` is deliberately not `Clone`. Share it behind an `Rc` if
/// callbacks need to reach it.
pub struct Group {
    inner: Rc<GroupInner>,
}

impl Group {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(GroupInner {
                tweens: RefCell::new(Vec::new()),
                updating: Cell::new(false),
            }),
        }
    }

    pub(crate) fn inner(&self) -> &Rc<GroupInner> {
        &self.inner
    }

    /// Create a tween lasting `duration` seconds
    pub fn to(&self, duration: f32) -> Tween {
        let tween = Tween::new(duration, Rc::downgrade(&self.inner));
        trace!("{} created ({duration}s)", tween.id());
        GroupInner::register(&self.inner, tween)
    }

    /// Advance every tween by `dt` seconds and drop the finished ones
    pub fn update(&self, dt: f32) {
        if self.inner.updating.replace(true) {
            warn!("Group::update called re-entrantly from a tween callback, ignoring");
            return;
        }
        let _updating = Updating(&self.inner.updating);

        let count = self.inner.tweens.borrow().len();
        let mut keep = Vec::with_capacity(count);
        for index in 0..count {
            // Clone the handle so no borrow is held while callbacks run
            let tween = self.inner.tweens.borrow()[index].clone();
            keep.push(tween.step(dt));
        }

        let mut keep = keep.into_iter();
        self.inner
            .tweens
            .borrow_mut()
            .retain(|_| keep.next().unwrap_or(true));
    }

    /// Seconds until every registered tween has completed
    pub fn total_remaining_time(&self) -> f32 {
        self.inner.total_remaining_time()
    }

    /// Stop every registered tween
    ///
    /// Outside of an update the group is emptied immediately; during one the
    /// stopped tweens are dropped on the next update.
    pub fn stop_all(&self) {
        let tweens = self.inner.tweens.borrow().clone();
        for tween in &tweens {
            tween.stop();
        }
        if !self.inner.updating.get() {
            self.inner.tweens.borrow_mut().clear();
        }
    }

    /// Number of registered tweens, including ones still waiting on a delay
    pub fn len(&self) -> usize {
        self.inner.tweens.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles to the registered tweens, in creation order
    pub fn tweens(&self) -> Vec<Tween> {
        self.inner.tweens.borrow().clone()
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group").field("tweens", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use crate::target::Value;
    use std::panic::{self, AssertUnwindSafe};

    #[test]
    fn test_update_empty_group() {
        let group = Group::new();
        group.update(1.0);
        assert!(group.is_empty());
        assert_eq!(group.total_remaining_time(), 0.0);
    }

    #[test]
    fn test_removal_preserves_order() {
        let group = Group::new();
        let a = group.to(1.0).bind(Value::new(0.0), 1.0);
        let _b = group.to(0.5).bind(Value::new(0.0), 1.0);
        let c = group.to(2.0).bind(Value::new(0.0), 1.0);

        group.update(0.75);
        let remaining = group.tweens();
        assert_eq!(remaining.len(), 2);
        assert!(remaining[0].ptr_eq(&a));
        assert!(remaining[1].ptr_eq(&c));
    }

    #[test]
    fn test_total_remaining_time() {
        let group = Group::new();
        group.to(1.0).bind(Value::new(0.0), 1.0);
        group.to(0.5).bind(Value::new(0.0), 1.0).delay(1.0);
        assert_eq!(group.total_remaining_time(), 1.5);

        group.update(0.5);
        assert_eq!(group.total_remaining_time(), 1.0);
    }

    #[test]
    fn test_tweens_run_in_creation_order() {
        let group = Group::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..4 {
            let order = order.clone();
            group
                .to(1.0)
                .bind(Value::new(0.0), 1.0)
                .on_activate(move || order.borrow_mut().push(i));
        }

        group.update(0.5);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_callback_may_append_to_group() {
        let group = Rc::new(Group::new());
        let x = Value::new(0.0);
        let spawned = Rc::new(Cell::new(0));

        let (g, target, count) = (group.clone(), x.clone(), spawned.clone());
        group
            .to(0.5)
            .bind(x.clone(), 1.0)
            .on_complete(move || {
                count.set(count.get() + 1);
                g.to(0.5).bind(target.clone(), 2.0).ease(Easing::Linear);
            });

        group.update(0.5);
        assert_eq!(spawned.get(), 1);
        assert_eq!(group.len(), 1);
        // The appended tween was not advanced in the tick that created it
        assert_eq!(group.tweens()[0].elapsed(), 0.0);
        assert_eq!(x.get(), 1.0);

        group.update(0.25);
        assert_eq!(x.get(), 1.5);
        group.update(0.25);
        assert_eq!(x.get(), 2.0);
        assert!(group.is_empty());
    }

    #[test]
    fn test_reentrant_update_is_ignored() {
        let group = Rc::new(Group::new());
        let g = group.clone();
        let x = Value::new(0.0);
        group
            .to(1.0)
            .bind(x.clone(), 1.0)
            .ease(Easing::Linear)
            .on_tick(move |dt| g.update(dt));

        group.update(0.5);
        assert_eq!(x.get(), 0.5);
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_stop_all() {
        let group = Group::new();
        let x = Value::new(0.0);
        let tween = group.to(1.0).bind(x.clone(), 1.0);
        group.to(2.0).bind(x.clone(), 5.0);

        group.update(0.5);
        let frozen = x.get();
        group.stop_all();
        assert!(group.is_empty());
        assert!(tween.is_stopped());

        group.update(1.0);
        assert_eq!(x.get(), frozen);
    }

    #[test]
    fn test_stop_all_from_callback() {
        let group = Rc::new(Group::new());
        let g = group.clone();
        let later = group.to(1.0).bind(Value::new(0.0), 1.0);
        group.to(0.5).bind(Value::new(0.0), 1.0).on_complete(move || g.stop_all());

        group.update(0.5);
        assert!(later.is_stopped());
        group.update(0.5);
        assert!(group.is_empty());
    }

    #[test]
    fn test_panicking_callback_does_not_wedge_group() {
        let group = Group::new();
        let x = Value::new(0.0);
        group
            .to(1.0)
            .bind(Value::new(0.0), 1.0)
            .on_tick(|_| panic!("tick failed"));
        group.to(1.0).bind(x.clone(), 1.0).ease(Easing::Linear);

        let result = panic::catch_unwind(AssertUnwindSafe(|| group.update(0.25)));
        assert!(result.is_err());

        group.update(0.25);
        assert_eq!(x.get(), 0.25);
        assert_eq!(group.len(), 2);
    }
}
