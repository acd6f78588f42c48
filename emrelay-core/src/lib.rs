//! Protection-core basic data types
//!
//! This crate provides the data type definitions and the trip-curve math shared by the
//! Emrelay crates: sample window geometry, fundamental phasors, the CO curve constant
//! table, and the relay settings structure.
//!
//! Emrelay users should not depend on this crate directly. Use the `emrelay::core`
//! reexport instead.
#![no_std]

/// Number of samples taken per AC cycle and per signal.
///
/// The sampling trigger is reconfigured on every zero crossing so that exactly this many
/// samples land in one cycle regardless of line-frequency drift.
pub const SAMPLES_PER_CYCLE: usize = 12;

/// One signal's samples over one AC cycle, in volts, ordered from the zero crossing.
pub type SampleWindow = [f32; SAMPLES_PER_CYCLE];

/// Complex fundamental-frequency component of a signal over one window.
///
/// The convention follows the correlation extractor: `re = A*cos(phi)`, `im = A*sin(phi)`
/// for an input tone `A*cos(2*pi*k/N + phi)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Phasor {
    pub re: f64,
    pub im: f64,
}

impl Phasor {
    pub const ZERO: Phasor = Phasor { re: 0.0, im: 0.0 };

    /// Squared RMS value of the underlying sinusoid, `(re^2 + im^2) / 2`.
    pub fn rms_squared(&self) -> f64 {
        (self.re * self.re + self.im * self.im) / 2.0
    }
}

/// Native unit of the time-dial setting. A dial equal to this value leaves the curve
/// constants' operate times unscaled.
pub const TIME_DIAL_REFERENCE: f64 = 24000.0;

/// Constants of one extremely-inverse operate-time curve.
///
/// For a pickup multiple `m >= 1.5` the operate time is `t + k / (m - c)^p`, and
/// `r / (m - 1)` below that, both scaled by the time-dial ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CurveConstants {
    pub t: f64,
    pub k: f64,
    pub c: f64,
    pub p: u8,
    pub r: f64,
}

impl CurveConstants {
    pub const CO2: Self = Self {
        t: 111.99,
        k: 735.00,
        c: 0.675,
        p: 1,
        r: 501.0,
    };
    pub const CO5: Self = Self {
        t: 8196.67,
        k: 13768.94,
        c: 1.130,
        p: 1,
        r: 22705.0,
    };
    pub const CO6: Self = Self {
        t: 784.52,
        k: 671.01,
        c: 1.190,
        p: 1,
        r: 1475.0,
    };
    pub const CO7: Self = Self {
        t: 524.84,
        k: 3120.56,
        c: 0.800,
        p: 1,
        r: 2491.0,
    };
    pub const CO8: Self = Self {
        t: 477.84,
        k: 4122.08,
        c: 1.270,
        p: 1,
        r: 9200.0,
    };
    pub const CO9: Self = Self {
        t: 310.01,
        k: 2756.06,
        c: 1.350,
        p: 1,
        r: 9342.0,
    };
    pub const CO11: Self = Self {
        t: 110.00,
        k: 17640.00,
        c: 0.500,
        p: 2,
        r: 8875.0,
    };
}

/// Standard CO time-overcurrent curve family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CurveType {
    Co2,
    Co5,
    Co6,
    Co7,
    Co8,
    Co9,
    Co11,
}

impl CurveType {
    pub const fn constants(self) -> &'static CurveConstants {
        match self {
            CurveType::Co2 => &CurveConstants::CO2,
            CurveType::Co5 => &CurveConstants::CO5,
            CurveType::Co6 => &CurveConstants::CO6,
            CurveType::Co7 => &CurveConstants::CO7,
            CurveType::Co8 => &CurveConstants::CO8,
            CurveType::Co9 => &CurveConstants::CO9,
            CurveType::Co11 => &CurveConstants::CO11,
        }
    }

    /// Rated operate time in seconds for the given pickup multiple and time dial.
    ///
    /// The caller must guarantee `multiple_of_pickup > 1.0`: the below-1.5 branch is
    /// singular at exactly 1.0. The trip engine only evaluates the curve above pickup,
    /// so the boundary is unreachable there.
    pub fn operate_time(self, multiple_of_pickup: f64, time_dial: f64) -> f64 {
        debug_assert!(multiple_of_pickup > 1.0);
        let curve = self.constants();
        let dial = time_dial / TIME_DIAL_REFERENCE;
        if multiple_of_pickup >= 1.5 {
            (curve.t + curve.k / libm::pow(multiple_of_pickup - curve.c, f64::from(curve.p)))
                * dial
        } else {
            curve.r / (multiple_of_pickup - 1.0) * dial
        }
    }
}

/// Immutable relay configuration, supplied once before any interrupt is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RelaySettings {
    /// Pickup current magnitude, in the same unit as the sampled current signal.
    pub pickup_current: f32,
    /// Time-dial multiplier in native units, see [`TIME_DIAL_REFERENCE`].
    pub time_dial: f64,
    pub curve: CurveType,
    /// Directional reference angle in radians.
    pub direction_angle: f64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            pickup_current: 1.5,
            time_dial: TIME_DIAL_REFERENCE,
            curve: CurveType::Co2,
            direction_angle: core::f64::consts::FRAC_PI_3,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;

    const ALL_CURVES: [CurveType; 7] = [
        CurveType::Co2,
        CurveType::Co5,
        CurveType::Co6,
        CurveType::Co7,
        CurveType::Co8,
        CurveType::Co9,
        CurveType::Co11,
    ];

    #[test]
    fn test_operate_time_co2() {
        // 111.99 + 735 / (2 - 0.675) at the reference dial
        let time = CurveType::Co2.operate_time(2.0, TIME_DIAL_REFERENCE);
        assert!((time - 666.70698).abs() < 1e-4);
    }

    #[test]
    fn test_operate_time_below_inverse_knee() {
        // r / (m - 1) branch
        let time = CurveType::Co2.operate_time(1.25, TIME_DIAL_REFERENCE);
        assert!((time - 501.0 / 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_time_dial_scaling() {
        let base = CurveType::Co7.operate_time(3.0, TIME_DIAL_REFERENCE);
        let double = CurveType::Co7.operate_time(3.0, 2.0 * TIME_DIAL_REFERENCE);
        assert!((double - 2.0 * base).abs() < 1e-9);
    }

    #[test]
    fn test_operate_time_monotonic() {
        // Strictly decreasing on the 1/40 quantization grid used by the progress table.
        for curve in ALL_CURVES {
            let mut prev = f64::INFINITY;
            for bin in 1..760 {
                let multiple = 1.0 + f64::from(bin) / 40.0;
                let time = curve.operate_time(multiple, TIME_DIAL_REFERENCE);
                assert!(
                    time < prev,
                    "{curve:?} not decreasing at multiple {multiple}"
                );
                prev = time;
            }
        }
    }

    #[test]
    fn test_branches_meet_at_knee() {
        // The published R constants make the two branches line up at m = 1.5.
        for curve in ALL_CURVES {
            let below = curve.operate_time(1.4999999, TIME_DIAL_REFERENCE);
            let above = curve.operate_time(1.5, TIME_DIAL_REFERENCE);
            assert!(
                (below - above).abs() / above < 0.01,
                "{curve:?} discontinuous at the knee: {below} vs {above}"
            );
        }
    }

    #[test]
    fn test_phasor_rms() {
        let phasor = Phasor { re: 3.0, im: 4.0 };
        assert!((phasor.rms_squared() - 12.5).abs() < 1e-12);
        assert_eq!(Phasor::ZERO.rms_squared(), 0.0);
    }
}
