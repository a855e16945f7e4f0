//! Headless replay of a scenario against a fixed-step clock

use crate::scenario::{Scenario, ScenarioError};
use flux_animation::{Group, RunningFlag, Tween, Value};
use indexmap::IndexMap;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};

/// Lifecycle event observed during a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Activated,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub time: f32,
    pub tween: String,
    pub kind: EventKind,
}

/// Values and flags at the end of one frame
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub frame: u64,
    pub time: f32,
    pub values: IndexMap<String, f32>,
    pub flags: IndexMap<String, i32>,
}

/// Everything a replay produced
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub frames: Vec<Frame>,
    pub events: Vec<Event>,
    pub final_values: IndexMap<String, f32>,
    pub elapsed: f32,
    /// Tweens still registered when the replay stopped
    pub unfinished: usize,
}

/// Overrides applied on top of the scenario's own settings
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dt: Option<f32>,
    pub max_time: Option<f32>,
    pub every: Option<usize>,
}

/// A scenario loaded into a live group
pub struct Replay {
    group: Group,
    values: IndexMap<String, Value>,
    flags: IndexMap<String, RunningFlag>,
    clock: Rc<Cell<f32>>,
    events: Rc<RefCell<Vec<Event>>>,
}

impl Replay {
    /// Build the group described by `scenario`
    pub fn build(scenario: &Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let mut replay = Self {
            group: Group::new(),
            values: scenario
                .values
                .iter()
                .map(|(name, initial)| (name.clone(), Value::new(*initial)))
                .collect(),
            flags: IndexMap::new(),
            clock: Rc::new(Cell::new(0.0)),
            events: Rc::new(RefCell::new(Vec::new())),
        };
        let mut named: HashMap<&str, Tween> = HashMap::new();

        for (index, spec) in scenario.tweens.iter().enumerate() {
            let label = spec.label(index);
            let easing = spec.easing().map_err(|source| ScenarioError::Easing {
                tween: label.clone(),
                source,
            })?;

            let tween = match spec.after.as_deref().and_then(|after| named.get(after)) {
                Some(parent) => parent.after(spec.duration),
                None => replay.group.to(spec.duration),
            };

            for (name, end) in &spec.to {
                if let Some(value) = replay.values.get(name) {
                    tween.bind(value.clone(), *end);
                }
            }
            tween.ease(easing).delay(spec.delay);

            if let Some(flag) = &spec.flag {
                let flag = replay.flags.entry(flag.clone()).or_default();
                tween.running_flag(flag);
            }
            if spec.after_all_else {
                tween.after_all_else();
            }

            replay.record(&tween, label);
            debug!("loaded {:?}", tween);

            if let Some(name) = &spec.name {
                named.insert(name.as_str(), tween);
            }
        }

        Ok(replay)
    }

    fn record(&self, tween: &Tween, label: String) {
        let (clock, events, name) = (self.clock.clone(), self.events.clone(), label.clone());
        tween.on_activate(move || {
            info!(time = clock.get(), "{name} activated");
            events.borrow_mut().push(Event {
                time: clock.get(),
                tween: name.clone(),
                kind: EventKind::Activated,
            });
        });

        let (clock, events) = (self.clock.clone(), self.events.clone());
        tween.on_complete(move || {
            info!(time = clock.get(), "{label} completed");
            events.borrow_mut().push(Event {
                time: clock.get(),
                tween: label.clone(),
                kind: EventKind::Completed,
            });
        });
    }

    /// Step the group at a fixed rate until it is empty or `max_time` passes
    pub fn run(&self, scenario: &Scenario, options: RunOptions) -> Result<Report, ScenarioError> {
        let dt = options.dt.unwrap_or(scenario.settings.dt);
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ScenarioError::InvalidTimestep(dt));
        }
        let every = options.every.unwrap_or(scenario.settings.every);
        if every == 0 {
            return Err(ScenarioError::InvalidSampling);
        }
        let max_time = options.max_time.or(scenario.settings.max_time);

        let mut frames = vec![self.snapshot(0)];
        let mut frame = 0u64;
        while !self.group.is_empty() {
            if max_time.is_some_and(|max| self.clock.get() >= max) {
                break;
            }
            frame += 1;
            self.clock.set(frame as f32 * dt);
            self.group.update(dt);
            if frame % every as u64 == 0 || self.group.is_empty() {
                frames.push(self.snapshot(frame));
            }
        }

        Ok(Report {
            frames,
            events: self.events.borrow().clone(),
            final_values: self.current_values(),
            elapsed: self.clock.get(),
            unfinished: self.group.len(),
        })
    }

    fn current_values(&self) -> IndexMap<String, f32> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.get()))
            .collect()
    }

    fn snapshot(&self, frame: u64) -> Frame {
        Frame {
            frame,
            time: self.clock.get(),
            values: self.current_values(),
            flags: self
                .flags
                .iter()
                .map(|(name, flag)| (name.clone(), flag.count()))
                .collect(),
        }
    }
}
