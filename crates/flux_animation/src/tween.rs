//! Tweens
//!
//! A [`Tween`] interpolates one or more [`Target`]s from the value they hold
//! when the tween activates to a fixed end value, over a fixed duration.
//! Tweens are created by a [`Group`](crate::Group), configured through the
//! returned handle, and advanced by [`Group::update`](crate::Group::update).
//!
//! ```rust
//! use flux_animation::{Easing, Group, Value};
//!
//! let group = Group::new();
//! let x = Value::new(0.0);
//!
//! group
//!     .to(1.0)
//!     .bind(x.clone(), 10.0)
//!     .ease(Easing::Linear)
//!     .after(0.5)
//!     .bind(x.clone(), 0.0);
//!
//! group.update(1.0);
//! assert_eq!(x.get(), 10.0);
//! group.update(0.5);
//! assert_eq!(x.get(), 0.0);
//! assert!(group.is_empty());
//! ```

use crate::easing::Easing;
use crate::group::{Group, GroupInner};
use crate::target::{RunningFlag, Target};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

/// Called once when the tween activates
pub type ActivateFn = Box<dyn FnMut()>;

/// Called every active tick with the tick's delta time
pub type TickFn = Box<dyn FnMut(f32)>;

/// Called once when the tween completes naturally
pub type CompleteFn = Box<dyn FnMut()>;

static NEXT_TWEEN_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier for a tween, unique for the life of the process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(u64);

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween#{}", self.0)
    }
}

/// Scalar timing state, kept in a `Cell` so callbacks may inspect or
/// reconfigure the tween while it is being stepped.
#[derive(Clone, Copy, Debug)]
struct Timing {
    duration: f32,
    delay: f32,
    forced_delay: f32,
    elapsed: f32,
    started: bool,
    ended: bool,
    easing: Easing,
}

impl Timing {
    /// Time from tween creation until completion
    fn span(&self) -> f32 {
        self.duration + self.delay + self.forced_delay
    }

    /// Raw progress, `None` until elapsed time exceeds both delays.
    ///
    /// A zero duration completes on the first tick past the gate.
    fn progress(&self) -> Option<f32> {
        let active = self.elapsed - self.delay - self.forced_delay;
        if active <= 0.0 {
            None
        } else if self.duration > 0.0 {
            Some(active / self.duration)
        } else {
            Some(1.0)
        }
    }
}

struct Binding {
    target: Rc<dyn Target>,
    initial: f32,
    end: f32,
}

impl Binding {
    fn value_at(&self, eased: f32) -> f32 {
        if eased == 1.0 {
            self.end
        } else {
            self.initial + (self.end - self.initial) * eased
        }
    }
}

#[derive(Default)]
struct Callbacks {
    activate: SmallVec<[ActivateFn; 2]>,
    tick: SmallVec<[TickFn; 2]>,
    complete: SmallVec<[CompleteFn; 2]>,
}

/// Cancellation state shared down a chain.
///
/// Links are weak in both directions: a parent reaches its chained children
/// to stop them, and a child knows its parent only so that a dropped flag
/// can hand its children up to it. No flag keeps another alive.
#[derive(Default)]
struct StopFlag {
    stopped: Cell<bool>,
    parent: RefCell<Weak<StopFlag>>,
    children: RefCell<Vec<Weak<StopFlag>>>,
}

impl StopFlag {
    fn chained(parent: &Rc<StopFlag>) -> Rc<StopFlag> {
        let child = Rc::new(StopFlag {
            stopped: Cell::new(parent.stopped.get()),
            parent: RefCell::new(Rc::downgrade(parent)),
            children: RefCell::new(Vec::new()),
        });
        parent.adopt([Rc::downgrade(&child)]);
        child
    }

    fn is_stopped(&self) -> bool {
        self.stopped.get()
    }

    /// Set this flag and every flag chained below it.
    fn cancel(&self) {
        if self.stopped.replace(true) {
            return;
        }
        let mut pending: Vec<Rc<StopFlag>> =
            self.children.borrow().iter().filter_map(Weak::upgrade).collect();
        while let Some(flag) = pending.pop() {
            // An already stopped flag has already stopped its descendants
            if flag.stopped.replace(true) {
                continue;
            }
            pending.extend(flag.children.borrow().iter().filter_map(Weak::upgrade));
        }
    }

    fn adopt(&self, children: impl IntoIterator<Item = Weak<StopFlag>>) {
        let mut list = self.children.borrow_mut();
        for child in children {
            if list.len() == list.capacity() {
                list.retain(|c| c.strong_count() > 0);
            }
            list.push(child);
        }
    }
}

impl Drop for StopFlag {
    fn drop(&mut self) {
        let children = mem::take(self.children.get_mut());
        let parent = self.parent.get_mut().upgrade();
        let link = parent.as_ref().map_or_else(Weak::new, Rc::downgrade);
        for child in children.iter().filter_map(Weak::upgrade) {
            *child.parent.borrow_mut() = link.clone();
        }
        if let Some(parent) = parent {
            parent.adopt(children.into_iter().filter(|c| c.strong_count() > 0));
        }
    }
}

struct TweenInner {
    id: TweenId,
    timing: Cell<Timing>,
    bindings: RefCell<SmallVec<[Binding; 2]>>,
    callbacks: RefCell<Callbacks>,
    running: RefCell<Option<RunningFlag>>,
    stop: Rc<StopFlag>,
    owner: Weak<GroupInner>,
}

/// Handle to a tween registered in a [`Group`]
///
/// Handles are cheap to clone; every clone refers to the same tween. All
/// configuration methods return the handle again so calls can be chained.
#[derive(Clone)]
pub struct Tween {
    inner: Rc<TweenInner>,
}

impl Tween {
    pub(crate) fn new(duration: f32, owner: Weak<GroupInner>) -> Self {
        Self::build(duration, owner, Rc::default(), 0.0, 0.0)
    }

    fn build(
        duration: f32,
        owner: Weak<GroupInner>,
        stop: Rc<StopFlag>,
        forced_delay: f32,
        elapsed: f32,
    ) -> Self {
        let duration = if duration >= 0.0 {
            duration
        } else {
            warn!("tween duration {duration} is negative or NaN, completing immediately");
            0.0
        };

        Self {
            inner: Rc::new(TweenInner {
                id: TweenId(NEXT_TWEEN_ID.fetch_add(1, Ordering::Relaxed)),
                timing: Cell::new(Timing {
                    duration,
                    delay: 0.0,
                    forced_delay,
                    elapsed,
                    started: false,
                    ended: false,
                    easing: Easing::default(),
                }),
                bindings: RefCell::new(SmallVec::new()),
                callbacks: RefCell::new(Callbacks::default()),
                running: RefCell::new(None),
                stop,
                owner,
            }),
        }
    }

    pub fn id(&self) -> TweenId {
        self.inner.id
    }

    /// Whether both handles refer to the same tween
    pub fn ptr_eq(&self, other: &Tween) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Animate `target` towards `end`
    ///
    /// The starting value is read from the target when the tween activates,
    /// so writes made during the delay are respected. A binding added after
    /// activation starts from the target's value at the time of the call.
    pub fn bind(&self, target: impl Target + 'static, end: f32) -> Tween {
        let initial = target.get();
        self.inner.bindings.borrow_mut().push(Binding {
            target: Rc::new(target),
            initial,
            end,
        });
        self.clone()
    }

    /// Set the easing curve (default [`Easing::EaseOutQuad`])
    pub fn ease(&self, easing: Easing) -> Tween {
        self.modify(|t| t.easing = easing);
        self.clone()
    }

    /// Set the time in seconds before the tween activates
    ///
    /// Negative delays are clamped to zero.
    pub fn delay(&self, seconds: f32) -> Tween {
        let seconds = if seconds < 0.0 {
            warn!("{}: negative delay {seconds} clamped to 0", self.inner.id);
            0.0
        } else {
            seconds
        };
        self.modify(|t| t.delay = seconds);
        self.clone()
    }

    /// Register a callback fired once on activation; callbacks run in
    /// registration order
    pub fn on_activate(&self, f: impl FnMut() + 'static) -> Tween {
        self.inner.callbacks.borrow_mut().activate.push(Box::new(f));
        self.clone()
    }

    /// Register a callback fired on every active tick with the tick's delta
    pub fn on_tick(&self, f: impl FnMut(f32) + 'static) -> Tween {
        self.inner.callbacks.borrow_mut().tick.push(Box::new(f));
        self.clone()
    }

    /// Register a callback fired once on natural completion
    pub fn on_complete(&self, f: impl FnMut() + 'static) -> Tween {
        self.inner.callbacks.borrow_mut().complete.push(Box::new(f));
        self.clone()
    }

    /// Raise `flag` while this tween is active
    pub fn running_flag(&self, flag: &RunningFlag) -> Tween {
        *self.inner.running.borrow_mut() = Some(flag.clone());
        self.clone()
    }

    // =========================================================================
    // Chaining
    // =========================================================================

    /// Create a tween in the same group that activates when this one ends
    ///
    /// # Panics
    ///
    /// Panics if the group that created this tween has been dropped. Use
    /// [`Tween::after_in`] to chain into a group explicitly.
    pub fn after(&self, duration: f32) -> Tween {
        let owner = self.owner("after");
        self.chain(&owner, duration)
    }

    /// Create a tween in `group` that activates when this one ends
    pub fn after_in(&self, group: &Group, duration: f32) -> Tween {
        self.chain(group.inner(), duration)
    }

    fn chain(&self, group: &Rc<GroupInner>, duration: f32) -> Tween {
        let parent = self.inner.timing.get();
        let (forced_delay, elapsed) = if parent.elapsed > parent.span() {
            (0.0, 0.0)
        } else {
            (parent.span(), parent.elapsed)
        };

        let child = Tween::build(
            duration,
            Rc::downgrade(group),
            StopFlag::chained(&self.inner.stop),
            forced_delay,
            elapsed,
        );
        debug!(
            "{} chained after {} (forced delay {forced_delay}s)",
            child.inner.id, self.inner.id
        );
        GroupInner::register(group, child)
    }

    /// Delay this tween until every other tween in its group has finished
    ///
    /// Any delay configured before this call is kept on top of the wait.
    ///
    /// # Panics
    ///
    /// Panics if the group that created this tween has been dropped.
    pub fn after_all_else(&self) -> Tween {
        let owner = self.owner("after_all_else");
        let others = owner.remaining_time_excluding(self);
        let timing = self.inner.timing.get();
        self.delay(others + timing.delay + timing.elapsed - timing.forced_delay)
    }

    fn owner(&self, call: &str) -> Rc<GroupInner> {
        match self.inner.owner.upgrade() {
            Some(owner) => owner,
            None => panic!(
                "Tween::{call} on {} needs its owning Group, which has been dropped",
                self.inner.id
            ),
        }
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Stop the tween and every tween chained after it
    ///
    /// Values already written are left in place and no further callbacks
    /// fire, including completion callbacks and those of chained tweens.
    pub fn stop(&self) {
        if !self.inner.stop.is_stopped() {
            debug!("{} stopped", self.inner.id);
            self.inner.stop.cancel();
        }
        self.modify(|t| t.ended = true);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn duration(&self) -> f32 {
        self.inner.timing.get().duration
    }

    /// The configured delay, not counting delay imposed by chaining
    pub fn delay_time(&self) -> f32 {
        self.inner.timing.get().delay
    }

    /// Seconds this tween has been advanced, including the chain baseline
    pub fn elapsed(&self) -> f32 {
        self.inner.timing.get().elapsed
    }

    /// Seconds until this tween completes
    pub fn time_until_end(&self) -> f32 {
        let timing = self.inner.timing.get();
        timing.span() - timing.elapsed
    }

    /// Progress through the active window, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        self.inner
            .timing
            .get()
            .progress()
            .map_or(0.0, |p| p.min(1.0))
    }

    pub fn is_started(&self) -> bool {
        self.inner.timing.get().started
    }

    /// Whether the tween has completed or been stopped
    pub fn is_finished(&self) -> bool {
        self.inner.timing.get().ended || self.is_stopped()
    }

    /// Whether this tween or a tween it is chained after was stopped
    pub fn is_stopped(&self) -> bool {
        self.inner.stop.is_stopped()
    }

    // =========================================================================
    // Stepping
    // =========================================================================

    /// Advance by `dt` seconds. Returns whether the group should keep the
    /// tween for the next tick.
    pub(crate) fn step(&self, dt: f32) -> bool {
        let inner = &*self.inner;

        if inner.timing.get().ended || inner.bindings.borrow().is_empty() {
            return false;
        }
        if inner.stop.is_stopped() {
            self.modify(|t| t.ended = true);
            return false;
        }

        self.modify(|t| t.elapsed += dt);
        let timing = inner.timing.get();
        let Some(progress) = timing.progress() else {
            return true;
        };

        if !timing.started {
            self.activate();
            if inner.stop.is_stopped() {
                self.modify(|t| t.ended = true);
                return false;
            }
        }

        let progress = progress.min(1.0);
        let complete = progress >= 1.0;
        let eased = inner.timing.get().easing.apply(progress);
        // No borrow is held while targets run, so setters may bind more
        let writes: SmallVec<[(Rc<dyn Target>, f32); 2]> = inner
            .bindings
            .borrow()
            .iter()
            .map(|b| (b.target.clone(), b.value_at(eased)))
            .collect();
        for (target, value) in writes {
            target.set(value);
        }

        self.fire(|c| &mut c.tick, |f: &mut TickFn| f(dt));

        if inner.stop.is_stopped() {
            self.modify(|t| t.ended = true);
            return false;
        }
        if !complete {
            return true;
        }

        self.modify(|t| t.ended = true);
        trace!("{} complete", inner.id);
        self.fire(|c| &mut c.complete, |f: &mut CompleteFn| f());
        if let Some(flag) = inner.running.borrow().as_ref() {
            flag.lower();
        }
        false
    }

    fn activate(&self) {
        let inner = &*self.inner;
        self.modify(|t| t.started = true);
        let targets: SmallVec<[Rc<dyn Target>; 2]> = inner
            .bindings
            .borrow()
            .iter()
            .map(|b| b.target.clone())
            .collect();
        let initials: SmallVec<[f32; 2]> = targets.iter().map(|t| t.get()).collect();
        for (binding, initial) in inner.bindings.borrow_mut().iter_mut().zip(initials) {
            binding.initial = initial;
        }
        trace!("{} activated", inner.id);

        self.fire(|c| &mut c.activate, |f: &mut ActivateFn| f());
        if inner.stop.is_stopped() {
            return;
        }
        if let Some(flag) = inner.running.borrow().as_ref() {
            flag.raise();
        }
    }

    /// Run one callback list in FIFO order.
    ///
    /// The list is moved out while it runs, so callbacks may register more
    /// callbacks on this tween; those are appended after the originals.
    fn fire<F>(
        &self,
        list: impl Fn(&mut Callbacks) -> &mut SmallVec<[F; 2]>,
        mut call: impl FnMut(&mut F),
    ) {
        let mut callbacks = self.inner.callbacks.borrow_mut();
        let mut running = mem::take(list(&mut *callbacks));
        drop(callbacks);

        for f in running.iter_mut() {
            call(f);
        }

        let mut callbacks = self.inner.callbacks.borrow_mut();
        let added = mem::replace(list(&mut *callbacks), running);
        list(&mut *callbacks).extend(added);
    }

    fn modify(&self, f: impl FnOnce(&mut Timing)) {
        let mut timing = self.inner.timing.get();
        f(&mut timing);
        self.inner.timing.set(timing);
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timing = self.inner.timing.get();
        f.debug_struct("Tween")
            .field("id", &self.inner.id)
            .field("duration", &timing.duration)
            .field("delay", &timing.delay)
            .field("forced_delay", &timing.forced_delay)
            .field("elapsed", &timing.elapsed)
            .field("started", &timing.started)
            .field("ended", &timing.ended)
            .field("easing", &timing.easing)
            .field("bindings", &self.inner.bindings.borrow().len())
            .finish()
    }
}
