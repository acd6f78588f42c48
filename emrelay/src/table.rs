//! Precomputed trip-progress lookup table
//!
//! Evaluating the operate-time curve involves `pow` and a division, too slow to repeat
//! in the per-cycle decision path. The table is built once at startup: one progress rate
//! per quantized pickup multiple, covering 1.0 to just under 20.0 in steps of 1/40.
//! The accumulator trips at [`FULL_SCALE`], so an entry is the rate (progress per
//! second) that reaches full scale after exactly the curve's rated operate time.

use crate::core::RelaySettings;

/// Accumulated progress at which the trip condition is met.
pub const FULL_SCALE: f64 = 65535.0;

/// Number of quantized pickup-multiple bins.
pub const BIN_COUNT: usize = 760;

/// Quantization of the pickup multiple, bins per unit.
pub const BINS_PER_UNIT: f64 = 40.0;

/// Progress rate per pickup-multiple bin. Read-only after construction.
pub struct ProgressTable {
    rates: [f64; BIN_COUNT],
}

impl ProgressTable {
    pub fn build(settings: &RelaySettings) -> Self {
        let mut rates = [0.0; BIN_COUNT];
        for (bin, rate) in rates.iter_mut().enumerate() {
            let multiple = 1.0 + bin as f64 / BINS_PER_UNIT;
            // Bin 0 sits exactly at pickup where the curve is singular; no finite
            // overcurrent dwell time applies there and the engine never looks it up.
            if multiple > 1.0 {
                let time = settings.curve.operate_time(multiple, settings.time_dial);
                if time > 0.0 {
                    *rate = FULL_SCALE / time;
                }
            }
        }
        Self { rates }
    }

    /// Progress rate for the given pickup multiple, in progress units per second.
    ///
    /// The bin index is clamped into the table, so multiples at or beyond 20.0 use the
    /// last bin instead of reading out of range.
    pub fn rate(&self, multiple_of_pickup: f64) -> f64 {
        // The cast saturates, which also floors a sub-1.0 multiple into bin 0.
        let bin = ((multiple_of_pickup - 1.0) * BINS_PER_UNIT) as usize;
        self.rates[bin.min(BIN_COUNT - 1)]
    }
}
