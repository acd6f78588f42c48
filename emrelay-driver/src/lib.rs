//! Emrelay driver interface
//!
//! The crate provides the interface between platform peripheral drivers and the Emrelay
//! protection stack. Limited scope facilitates compatibility across versions. Driver
//! crates should depend on this crate. Emrelay stack users should depend on the
//! `emrelay` crate instead.
//!
//! The stack consumes three peripheral collaborators:
//! * A *zero-crossing capture source* delivers the free-running capture-counter value on
//!   each rising edge of the line signal. The driver forwards each capture to
//!   `SampleScheduler::handle_capture` from the capture interrupt. The counter wraps at a
//!   fixed modulus; the stack performs wraparound-safe subtraction and never inspects the
//!   absolute value.
//! * A *sampling trigger* paces the acquisition source. The stack reconfigures it through
//!   [`control::SamplingTrigger`] synchronously within the capture handler, so the
//!   reconfiguration for a cycle completes before that cycle's first sample tick fires.
//! * An *acquisition source* delivers one raw conversion per sample tick, alternating
//!   channels in the fixed order Current then Voltage. The driver forwards each
//!   conversion to the acquisition producer from the conversion-complete interrupt.
//!
//! The stack exposes one output collaborator: [`control::TripOutput`], the breaker trip
//! command. The command is fire-and-forget and idempotent; the stack may re-issue it on
//! every decision cycle once the trip condition holds.
//!
//! All collaborator calls made by the stack are non-blocking and complete in bounded
//! time; drivers must not block inside them either.

#![no_std]

pub mod control;
pub mod sample;

/// Capture-counter tick domain shared by the zero-crossing source and the
/// sampling trigger.
pub mod time {
    /// Capture-counter frequency in ticks per second.
    pub const TICK_HZ: u32 = 1_000_000;

    /// Wraparound-safe distance from `last` to `now` on the capture counter.
    pub const fn ticks_since(now: u32, last: u32) -> u32 {
        now.wrapping_sub(last)
    }
}
