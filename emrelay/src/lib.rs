//! # Emrelay
//!
//! This library implements the protection core of a single-phase directional
//! time-overcurrent relay for no_std environments. It samples the line current and
//! voltage phase-locked to the zero crossing, extracts the fundamental phasors with a
//! fixed-window correlation, and integrates an extremely-inverse trip curve until the
//! accumulated progress crosses full scale while the fault lies in the protected
//! direction.
//!
//! The library uses statically sized buffers and requires no dynamic memory allocation.
//! It is designed for systems with tight interrupt latency requirements, keeping all
//! critical section durations bounded.
//!
//! ## Architecture
//!
//! ```text
//! zero-crossing capture ──► SampleScheduler ──► sampling trigger (driver)
//!                                │ cycle period
//!                                ▼
//! sample ticks ──► Producer ──► Acquisition ──► Consumer ──► Runner
//!  (driver)                   (ping-pong)                      │
//!                                              ReferenceTable  │  ProgressTable
//!                                                    └────► TripEngine ────► trip output
//! ```
//!
//! Components:
//! * _SampleScheduler_ measures the AC cycle period from zero-crossing captures and
//!   reconfigures the sampling trigger so that exactly `SAMPLES_PER_CYCLE` sample pairs
//!   land in each cycle, phase-aligned to the crossing.
//! * _Acquisition_ is a ping-pong sample store. The conversion interrupt fills one side
//!   through the [`acquisition::Producer`] while the previously completed side is
//!   available to the [`acquisition::Consumer`].
//! * _ReferenceTable_ turns a completed sample window into the complex fundamental
//!   estimate with a single-bin DFT against precomputed cosine/sine references.
//! * _ProgressTable_ maps a quantized pickup multiple to a progress rate precomputed
//!   from the configured trip curve.
//! * _TripEngine_ is the per-cycle decision state machine; [`engine::Runner`] is the
//!   background task that drains the acquisition and feeds it.
//!
//! ## Concurrency model
//!
//! Two contexts touch shared state: the peripheral interrupts (zero-crossing capture and
//! conversion complete) and the background decision task. Each shared structure lives in
//! an `embassy_sync::blocking_mutex::Mutex` generic over the raw mutex:
//! * _CriticalSectionRawMutex_ when the producers run at interrupt level.
//! * _ThreadModeRawMutex_ or _NoopRawMutex_ when everything runs in one thread-mode
//!   executor, e.g. with the conversion interrupt deferred to a task.
//!
//! The consumer latches a completed side and clears the readiness flag within a single
//! lock, so it can never observe the selector and the flag torn by a concurrent toggle.
//! The longest critical section is the copy-out of one completed cycle
//! (2 × `SAMPLES_PER_CYCLE` samples).
//!
//! ## Limitations
//!
//! * Single phase only; current and voltage of one phase.
//! * Settings are fixed at startup; there is no runtime configuration surface.
//! * The trip command is re-issued every decision cycle while the trip condition holds.
#![no_std]

pub use emrelay_core as core;
pub use emrelay_driver::{control, sample, time};

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod acquisition;
pub mod engine;
pub mod scheduler;
pub mod table;
pub mod window;
