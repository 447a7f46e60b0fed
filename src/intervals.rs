// src/intervals.rs - Raised/Cleared pairing into closed alarm intervals
//
// One two-state machine runs per (unit, alarm category):
//
//   Closed  + Raised       -> Open(ts)
//   Open(s) + Raised       -> Open(ts) or Open(s), per ReopenPolicy
//   Open(s) + Cleared      -> emit [s, min(ts, window end)], Closed
//   Closed  + Cleared      -> Closed (stray clear, not an error)
//   any     + Acknowledged -> unchanged
//
// A machine still Open at end of stream emits [s, window end].

use crate::model::{AlarmEvent, EventType, Interval, Window};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// What to do with a second `Raised` while an interval is already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum ReopenPolicy {
    /// The newer raise replaces the pending start; the older start is lost
    #[default]
    LastRaiseWins,
    /// The pending start is kept; the newer raise is ignored
    FirstRaiseWins,
}

/// Interval builder machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Closed,
    Open(DateTime<Utc>),
}

/// Pairs the events of a single alarm category into closed intervals.
///
/// Events must be fed in timestamp order. Events after the window end are
/// ignored, and every emitted interval is clamped to the window.
#[derive(Debug, Clone)]
pub struct IntervalBuilder {
    window: Window,
    policy: ReopenPolicy,
    state: BuilderState,
    intervals: Vec<Interval>,
    double_raises: usize,
}

impl IntervalBuilder {
    pub fn new(window: Window, policy: ReopenPolicy) -> Self {
        Self {
            window,
            policy,
            state: BuilderState::Closed,
            intervals: Vec::new(),
            double_raises: 0,
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Number of `Raised` events that arrived while already open
    pub fn double_raises(&self) -> usize {
        self.double_raises
    }

    /// Apply one event to the machine
    pub fn push(&mut self, event_type: EventType, ts: DateTime<Utc>) {
        if ts > self.window.end_time {
            return;
        }

        self.state = match (self.state, event_type) {
            (BuilderState::Closed, EventType::Raised) => BuilderState::Open(ts),

            (BuilderState::Open(start), EventType::Raised) => {
                self.double_raises += 1;
                match self.policy {
                    ReopenPolicy::LastRaiseWins => BuilderState::Open(ts),
                    ReopenPolicy::FirstRaiseWins => BuilderState::Open(start),
                }
            }

            (BuilderState::Open(start), EventType::Cleared) => {
                self.emit(start, ts.min(self.window.end_time));
                BuilderState::Closed
            }

            (state, EventType::Cleared) | (state, EventType::Acknowledged) => state,
        };
    }

    /// Close any dangling interval at the window end and return all intervals
    pub fn finish(mut self) -> Vec<Interval> {
        if let BuilderState::Open(start) = self.state {
            let end = self.window.end_time;
            self.emit(start, end);
            self.state = BuilderState::Closed;
        }
        self.intervals
    }

    fn emit(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        if end < self.window.start_time {
            return;
        }
        let start = start.max(self.window.start_time);
        if let Ok(interval) = Interval::new(start, end) {
            self.intervals.push(interval);
        }
    }
}

/// Build the intervals of one alarm category from a full alarm stream.
///
/// A category that never appears yields an empty sequence.
pub fn build_intervals(
    alarms: &[AlarmEvent],
    category_name: &str,
    window: Window,
    policy: ReopenPolicy,
) -> Vec<Interval> {
    let mut builder = IntervalBuilder::new(window, policy);
    for event in alarms.iter().filter(|e| e.category_name == category_name) {
        builder.push(event.event_type, event.timestamp);
    }

    if builder.double_raises() > 0 {
        warn!(
            "'{}' raised {} time(s) while already open ({:?})",
            category_name,
            builder.double_raises(),
            policy
        );
    }

    let intervals = builder.finish();
    debug!("'{}' -> {} interval(s)", category_name, intervals.len());
    intervals
}
