//! Scheduled audio parameters
//!
//! An [`AudioParam`] holds the live value of a node parameter together with a
//! queue of timed events. The audio thread advances the parameter once per
//! sample with the current clock time; due events are applied in time order
//! (and call order for equal times).
//!
//! - `set_value_at_time`: jump to a value
//! - `set_target_at_time`: approach a target exponentially. After one time
//!   constant the value has covered ~63% of the remaining distance, after
//!   five ~99.3%.
//!
//! A newly started target replaces any transition still in flight.

use std::collections::VecDeque;

/// Values closer than this to their target snap onto it
const SETTLE_EPSILON: f64 = 1e-9;

/// A scheduled parameter change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    SetValue { value: f64, time: f64 },
    SetTarget { target: f64, start: f64, time_constant: f64 },
}

impl ParamEvent {
    /// Clock time at which the event takes effect
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } => time,
            ParamEvent::SetTarget { start, .. } => start,
        }
    }

    /// Value the parameter ends up at once the event has fully played out
    pub fn destination(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { value, .. } => value,
            ParamEvent::SetTarget { target, .. } => target,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Approach {
    target: f64,
    coeff: f64,
}

/// A node parameter with sample-accurate scheduling
#[derive(Debug, Clone)]
pub struct AudioParam {
    value: f64,
    min: f64,
    max: f64,
    sample_rate: f64,
    events: VecDeque<ParamEvent>,
    approach: Option<Approach>,
}

impl AudioParam {
    pub fn new(value: f64, min: f64, max: f64, sample_rate: f64) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
            sample_rate,
            events: VecDeque::new(),
            approach: None,
        }
    }

    /// Current value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The value the parameter is heading to once every queued event has run
    pub fn target(&self) -> f64 {
        self.events
            .back()
            .map(ParamEvent::destination)
            .or_else(|| self.approach.map(|a| a.target))
            .unwrap_or(self.value)
    }

    /// Number of queued events not yet reached by the clock
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Whether an exponential approach is in progress
    pub fn is_ramping(&self) -> bool {
        self.approach.is_some()
    }

    /// Set the value now, dropping queued events and any transition
    pub fn set_value(&mut self, value: f64) {
        self.value = value.clamp(self.min, self.max);
        self.events.clear();
        self.approach = None;
    }

    /// Jump to `value` when the clock reaches `time`
    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(ParamEvent::SetValue {
            value: value.clamp(self.min, self.max),
            time,
        });
    }

    /// Start approaching `target` at `start` with the given time constant in seconds
    pub fn set_target_at_time(&mut self, target: f64, start: f64, time_constant: f64) {
        self.insert(ParamEvent::SetTarget {
            target: target.clamp(self.min, self.max),
            start,
            time_constant,
        });
    }

    fn insert(&mut self, event: ParamEvent) {
        let pos = self
            .events
            .iter()
            .position(|queued| queued.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(pos, event);
    }

    /// Advance one sample at clock time `now` and return the value for that sample
    pub fn advance(&mut self, now: f64) -> f64 {
        while let Some(event) = self.events.front().copied() {
            if event.time() > now {
                break;
            }
            self.events.pop_front();
            match event {
                ParamEvent::SetValue { value, .. } => {
                    self.value = value;
                    self.approach = None;
                }
                ParamEvent::SetTarget { target, time_constant, .. } => {
                    if time_constant <= 0.0 {
                        self.value = target;
                        self.approach = None;
                    } else {
                        let coeff = 1.0 - (-1.0 / (time_constant * self.sample_rate)).exp();
                        self.approach = Some(Approach { target, coeff });
                    }
                }
            }
        }

        if let Some(approach) = self.approach {
            self.value += (approach.target - self.value) * approach.coeff;
            if (approach.target - self.value).abs() < SETTLE_EPSILON {
                self.value = approach.target;
                self.approach = None;
            }
        }

        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 1000.0;

    fn run(param: &mut AudioParam, from_sample: u64, samples: u64) -> f64 {
        let mut value = param.value();
        for n in from_sample..from_sample + samples {
            value = param.advance(n as f64 / SR);
        }
        value
    }

    #[test]
    fn test_immediate_set() {
        let mut param = AudioParam::new(0.0, 0.0, 1.0, SR);
        param.set_value(0.5);
        assert_eq!(param.value(), 0.5);
        assert_eq!(param.target(), 0.5);
    }

    #[test]
    fn test_set_value_at_time_waits_for_clock() {
        let mut param = AudioParam::new(100.0, 0.0, 1000.0, SR);
        param.set_value_at_time(200.0, 0.010);

        assert_eq!(run(&mut param, 0, 10), 100.0);
        assert_eq!(param.advance(0.010), 200.0);
        assert_eq!(param.pending_events(), 0);
    }

    #[test]
    fn test_target_covers_63_percent_after_one_time_constant() {
        let mut param = AudioParam::new(0.0, 0.0, 1.0, SR);
        param.set_target_at_time(1.0, 0.0, 0.015);

        // 15 samples at 1 kHz = one time constant
        let value = run(&mut param, 0, 15);
        let expected = 1.0 - (-1.0f64).exp();
        assert!((value - expected).abs() < 1e-9, "got {}", value);
        assert!(param.is_ramping());
    }

    #[test]
    fn test_target_settles() {
        let mut param = AudioParam::new(1.0, 0.0, 1.0, SR);
        param.set_target_at_time(0.0, 0.0, 0.015);

        let value = run(&mut param, 0, 1000);
        assert_eq!(value, 0.0);
        assert!(!param.is_ramping());
    }

    #[test]
    fn test_later_target_supersedes() {
        let mut param = AudioParam::new(0.0, 0.0, 1.0, SR);
        param.set_target_at_time(1.0, 0.0, 0.015);
        run(&mut param, 0, 5);

        param.set_target_at_time(0.25, 0.005, 0.015);
        assert_eq!(param.target(), 0.25);
        let value = run(&mut param, 5, 1000);
        assert_eq!(value, 0.25);
    }

    #[test]
    fn test_equal_times_apply_in_call_order() {
        let mut param = AudioParam::new(0.0, 0.0, 1000.0, SR);
        param.set_value_at_time(300.0, 0.0);
        param.set_value_at_time(500.0, 0.0);
        assert_eq!(param.advance(0.0), 500.0);
    }

    #[test]
    fn test_events_sorted_by_time() {
        let mut param = AudioParam::new(0.0, 0.0, 1000.0, SR);
        param.set_value_at_time(2.0, 0.002);
        param.set_value_at_time(1.0, 0.001);

        assert_eq!(param.advance(0.001), 1.0);
        assert_eq!(param.advance(0.002), 2.0);
    }

    #[test]
    fn test_values_are_clamped() {
        let mut param = AudioParam::new(5.0, 0.0, 1.0, SR);
        assert_eq!(param.value(), 1.0);

        param.set_target_at_time(-3.0, 0.0, 0.0);
        assert_eq!(param.advance(0.0), 0.0);
    }
}
