//! Directional trip-decision state machine
//!
//! Once per acquisition cycle the engine extracts the fundamental current and voltage
//! phasors, compares the current magnitude against the pickup threshold and integrates
//! trip progress at the rate the [`ProgressTable`] assigns to the measured pickup
//! multiple. Progress carries across cycles while the overcurrent persists and resets
//! to zero the moment the current falls back below pickup, so the accumulator models
//! the dwell time the trip curve demands rather than a one-shot threshold.
//!
//! The trip command fires when progress crosses [`FULL_SCALE`] and the fault power flow
//! lies in the protected direction. Direction gates the command only, not the
//! accumulation: a fault that starts reverse and swings forward trips as soon as the
//! direction test passes, without re-integrating from zero.

use core::convert::Infallible;
use core::future::pending;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::acquisition::{Consumer, CycleData, Desync};
use crate::control::TripOutput;
use crate::core::{Phasor, RelaySettings, SAMPLES_PER_CYCLE};
use crate::scheduler::SampleScheduler;
use crate::table::{FULL_SCALE, ProgressTable};
use crate::time::TICK_HZ;
use crate::window::ReferenceTable;

/// Decision state, advanced once per acquisition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineState {
    /// Current below pickup, no progress accumulated.
    Idle,
    /// Overcurrent present, trip progress integrating.
    Accumulating,
    /// Unrecoverable acquisition fault, decisions suspended.
    Fault,
}

/// Per-cycle trip-decision engine.
///
/// Pure with respect to hardware: it consumes completed [`CycleData`] and drives the
/// [`TripOutput`] it is handed. All curve evaluation happens at construction; the
/// per-cycle path is two phasor correlations, one square root and a table lookup.
pub struct TripEngine {
    reference: ReferenceTable,
    progress_rates: ProgressTable,
    /// Pickup threshold squared; compared against the squared RMS so the per-cycle
    /// path takes the square root only after pickup is exceeded.
    pickup_squared: f64,
    direction_cos: f64,
    direction_sin: f64,
    progress: f64,
    state: EngineState,
}

impl TripEngine {
    pub fn new(settings: &RelaySettings) -> Self {
        Self {
            reference: ReferenceTable::new(),
            progress_rates: ProgressTable::build(settings),
            pickup_squared: f64::from(settings.pickup_current) * f64::from(settings.pickup_current),
            direction_cos: libm::cos(settings.direction_angle),
            direction_sin: libm::sin(settings.direction_angle),
            progress: 0.0,
            state: EngineState::Idle,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Accumulated trip progress, `0.0..` with the trip point at [`FULL_SCALE`].
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Suspends decisions permanently. Entered when acquisition reports a fault.
    fn halt(&mut self) {
        self.state = EngineState::Fault;
    }

    /// Advances the decision by one completed cycle.
    ///
    /// `period_ticks` is the cycle period the scheduler measured for this cycle; it
    /// converts the cycle's sample spacing into the wall-clock time the progress
    /// integral advances by.
    pub fn step<T: TripOutput>(&mut self, cycle: &CycleData, period_ticks: u32, trip: &mut T) {
        if self.state == EngineState::Fault {
            return;
        }

        let current = self.reference.fundamental(&cycle.current);
        let rms_squared = current.rms_squared();

        if rms_squared <= self.pickup_squared {
            if self.state == EngineState::Accumulating {
                debug!("current back below pickup, progress reset");
            }
            self.state = EngineState::Idle;
            self.progress = 0.0;
            return;
        }

        self.state = EngineState::Accumulating;
        let multiple = libm::sqrt(rms_squared / self.pickup_squared);
        let elapsed =
            f64::from(period_ticks) / SAMPLES_PER_CYCLE as f64 / f64::from(TICK_HZ);
        self.progress += self.progress_rates.rate(multiple) * elapsed;

        if self.progress >= FULL_SCALE {
            let voltage = self.reference.fundamental(&cycle.voltage);
            if self.forward(&voltage, &current) {
                // Re-issued every cycle while the condition holds; the output latches.
                trip.assert_trip();
            }
        }
    }

    /// Directional test: projects the complex power onto the configured maximum-torque
    /// axis and requires a positive component.
    fn forward(&self, voltage: &Phasor, current: &Phasor) -> bool {
        let p = voltage.re * current.re + voltage.im * current.im;
        let q = voltage.re * current.im - voltage.im * current.re;
        p * self.direction_cos + q * self.direction_sin > 0.0
    }
}

/// Background decision task: drains the acquisition consumer and feeds the engine.
pub struct Runner<'a, M: RawMutex> {
    engine: TripEngine,
    consumer: Consumer<'a, M>,
    scheduler: &'a SampleScheduler<M>,
}

impl<'a, M: RawMutex> Runner<'a, M> {
    pub fn new(
        engine: TripEngine,
        consumer: Consumer<'a, M>,
        scheduler: &'a SampleScheduler<M>,
    ) -> Self {
        Self {
            engine,
            consumer,
            scheduler,
        }
    }

    /// Runs the decision loop forever.
    ///
    /// On an acquisition fault the engine is halted and the task parks; sample
    /// continuity is lost and only a restart recovers the relay.
    pub async fn run<T: TripOutput>(&mut self, trip: &mut T) -> ! {
        loop {
            match self.consumer.next_cycle().await {
                Ok(cycle) => {
                    let period = self.scheduler.cycle_period();
                    self.engine.step(&cycle, period, trip);
                }
                Err(Desync) => {
                    error!("acquisition desynchronized, protection suspended");
                    self.engine.halt();
                    let never: Infallible = pending().await;
                    match never {}
                }
            }
        }
    }
}
