//! Control interfaces the stack drives on its peripheral collaborators

/// Sampling-trigger reconfiguration interface.
///
/// The stack calls [`set_interval`](Self::set_interval) from the zero-crossing capture
/// handler with the tick count between consecutive sample ticks. The driver must apply
/// the new interval before the next sample tick fires; a late application misaligns the
/// sample phase for one cycle but must not drop or duplicate ticks.
pub trait SamplingTrigger {
    fn set_interval(&mut self, ticks: u32);
}

/// Breaker trip command.
///
/// Fire-and-forget and idempotent: the stack may assert an already asserted output.
/// No return value is observed.
pub trait TripOutput {
    fn assert_trip(&mut self);
}

impl<T: SamplingTrigger + ?Sized> SamplingTrigger for &mut T {
    fn set_interval(&mut self, ticks: u32) {
        T::set_interval(self, ticks)
    }
}

impl<T: TripOutput + ?Sized> TripOutput for &mut T {
    fn assert_trip(&mut self) {
        T::assert_trip(self)
    }
}
