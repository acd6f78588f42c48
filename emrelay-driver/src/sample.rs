//! Acquisition sample delivery contract

/// Signal a raw conversion belongs to.
///
/// The acquisition source converts both channels on every sample tick, always in the
/// order Current then Voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcChannel {
    Current,
    Voltage,
}

/// Highest raw code the converter produces (10-bit resolution).
pub const ADC_FULL_SCALE: u16 = 1023;

/// Converter reference voltage.
pub const VREF_VOLTS: f32 = 3.3;

/// Linear map of a raw conversion onto the converter's input range in volts.
///
/// Defined for raw codes up to [`ADC_FULL_SCALE`]; larger codes extrapolate.
pub fn raw_to_volts(raw: u16) -> f32 {
    f32::from(raw) * VREF_VOLTS / f32::from(ADC_FULL_SCALE)
}
