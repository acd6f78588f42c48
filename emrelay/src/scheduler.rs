//! Zero-crossing-locked sampling scheduler
//!
//! Each rising-edge capture of the line signal yields the capture-counter value. The
//! scheduler derives the cycle period from consecutive captures and retargets the
//! sampling trigger to `period / SAMPLES_PER_CYCLE`, keeping the next cycle's samples
//! phase-locked to the crossing as the line frequency drifts. Drift needs no error
//! path; it simply shows up as an updated period.
//!
//! The retargeting happens synchronously inside the capture handler, before the first
//! sample tick of the new cycle can fire.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::control::SamplingTrigger;
use crate::core::SAMPLES_PER_CYCLE;
use crate::time::ticks_since;

/// Captures closer than this to the previous accepted one are line noise or contact
/// bounce, not a new cycle. 10 ms at the 1 MHz capture clock, half a 50 Hz cycle.
pub const DEBOUNCE_TICKS: u32 = 10_000;

/// Cycle period assumed until the first crossing is captured: 20 ms, nominal 50 Hz.
pub const INITIAL_CYCLE_PERIOD: u32 = 20_000;

#[derive(Debug, Clone, Copy)]
struct SchedulerState {
    last_capture: u32,
    cycle_period: u32,
}

/// Cycle-period tracker shared between the capture interrupt and the decision task.
pub struct SampleScheduler<M: RawMutex> {
    state: Mutex<M, Cell<SchedulerState>>,
}

impl<M: RawMutex> SampleScheduler<M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(SchedulerState {
                last_capture: 0,
                cycle_period: INITIAL_CYCLE_PERIOD,
            })),
        }
    }

    /// Handles one zero-crossing capture. Call from the capture interrupt.
    ///
    /// Spurious captures (within [`DEBOUNCE_TICKS`] of the last accepted one) are
    /// discarded without touching the state or the trigger.
    pub fn handle_capture<T: SamplingTrigger>(&self, timestamp: u32, trigger: &mut T) {
        let interval = self.state.lock(|cell| {
            let mut state = cell.get();
            let period = ticks_since(timestamp, state.last_capture);
            if period <= DEBOUNCE_TICKS {
                trace!("spurious capture discarded, period {} ticks", period);
                return None;
            }
            state.last_capture = timestamp;
            state.cycle_period = period;
            cell.set(state);
            Some(period / SAMPLES_PER_CYCLE as u32)
        });
        if let Some(ticks) = interval {
            trigger.set_interval(ticks);
        }
    }

    /// Period of the most recently completed cycle in capture ticks.
    pub fn cycle_period(&self) -> u32 {
        self.state.lock(|cell| cell.get().cycle_period)
    }
}

impl<M: RawMutex> Default for SampleScheduler<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;

    #[derive(Default)]
    struct FakeTrigger {
        intervals: Vec<u32>,
    }

    impl SamplingTrigger for FakeTrigger {
        fn set_interval(&mut self, ticks: u32) {
            self.intervals.push(ticks);
        }
    }

    #[test]
    fn test_capture_updates_period_and_trigger() {
        let scheduler = SampleScheduler::<NoopRawMutex>::new();
        let mut trigger = FakeTrigger::default();

        scheduler.handle_capture(20_000, &mut trigger);
        assert_eq!(scheduler.cycle_period(), 20_000);
        assert_eq!(trigger.intervals, [20_000 / 12]);

        // 60 Hz line: 16667 ticks later
        scheduler.handle_capture(36_667, &mut trigger);
        assert_eq!(scheduler.cycle_period(), 16_667);
        assert_eq!(trigger.intervals, [20_000 / 12, 16_667 / 12]);
    }

    #[test]
    fn test_spurious_capture_discarded() {
        let scheduler = SampleScheduler::<NoopRawMutex>::new();
        let mut trigger = FakeTrigger::default();

        scheduler.handle_capture(20_000, &mut trigger);
        scheduler.handle_capture(25_000, &mut trigger);

        // Neither the period nor the reference capture moved.
        assert_eq!(scheduler.cycle_period(), 20_000);
        assert_eq!(trigger.intervals.len(), 1);

        // The next real crossing is measured against the accepted capture.
        scheduler.handle_capture(40_000, &mut trigger);
        assert_eq!(scheduler.cycle_period(), 20_000);
        assert_eq!(trigger.intervals.len(), 2);
    }

    #[test]
    fn test_counter_wraparound() {
        let scheduler = SampleScheduler::<NoopRawMutex>::new();
        let mut trigger = FakeTrigger::default();

        scheduler.handle_capture(u32::MAX - 9_999, &mut trigger);
        scheduler.handle_capture(10_000, &mut trigger);

        assert_eq!(scheduler.cycle_period(), 20_000);
        assert_eq!(trigger.intervals.last(), Some(&(20_000 / 12)));
    }
}
