//! Animation targets and running flags
//!
//! A tween never owns the state it animates. It holds a [`Target`] handle
//! and writes through it every tick while active:
//!
//! - [`Value`]: a shared `f32` cell, the usual choice for game state
//! - [`FnTarget`]: getter/setter closures, for state that lives elsewhere
//!   (a field behind a `RefCell`, an ECS component, ...)
//!
//! Handles are reference counted, so the storage a tween writes always
//! outlives the tween.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Externally owned scalar a tween can read and write
pub trait Target {
    /// Read the current value (on bind and again at activation)
    fn get(&self) -> f32;

    /// Write the interpolated value
    fn set(&self, value: f32);
}

/// A shared, mutable `f32`
///
/// Cloning a `Value` yields another handle to the same storage.
#[derive(Clone, Default)]
pub struct Value(Rc<Cell<f32>>);

impl Value {
    pub fn new(value: f32) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn get(&self) -> f32 {
        self.0.get()
    }

    pub fn set(&self, value: f32) {
        self.0.set(value);
    }

    /// Whether both handles point at the same storage
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.get()).finish()
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl Target for Value {
    fn get(&self) -> f32 {
        Value::get(self)
    }

    fn set(&self, value: f32) {
        Value::set(self, value);
    }
}

impl Target for Rc<Cell<f32>> {
    fn get(&self) -> f32 {
        Cell::get(self)
    }

    fn set(&self, value: f32) {
        Cell::set(self, value);
    }
}

/// A target backed by a getter and a setter
pub struct FnTarget<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> FnTarget<G, S>
where
    G: Fn() -> f32,
    S: Fn(f32),
{
    pub fn new(getter: G, setter: S) -> Self {
        Self { getter, setter }
    }
}

impl<G, S> Target for FnTarget<G, S>
where
    G: Fn() -> f32,
    S: Fn(f32),
{
    fn get(&self) -> f32 {
        (self.getter)()
    }

    fn set(&self, value: f32) {
        (self.setter)(value);
    }
}

/// Counter raised while tweens bound to it are active
///
/// A tween increments the flag when it activates and decrements it when it
/// completes. Stopped tweens never decrement. Collaborators use
/// [`RunningFlag::is_running`] to wait for a set of animations, e.g. to
/// block input until a move has finished playing.
#[derive(Clone, Default)]
pub struct RunningFlag(Rc<Cell<i32>>);

impl RunningFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active tweens bound to this flag
    pub fn count(&self) -> i32 {
        self.0.get()
    }

    pub fn is_running(&self) -> bool {
        self.count() > 0
    }

    pub(crate) fn raise(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub(crate) fn lower(&self) {
        self.0.set(self.0.get() - 1);
    }
}

impl fmt::Debug for RunningFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RunningFlag").field(&self.count()).finish()
    }
}
