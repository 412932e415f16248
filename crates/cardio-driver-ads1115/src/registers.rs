//! ADS1115 register map and configuration word layout.
//!
//! Config register bit fields (datasheet table 8):
//!
//! ```text
//! 15    OS        operational status / single-shot start
//! 14:12 MUX       input multiplexer
//! 11:9  PGA       programmable gain (full-scale range)
//! 8     MODE      continuous / single-shot
//! 7:5   DR        data rate
//! 4     COMP_MODE comparator mode
//! 3     COMP_POL  comparator polarity
//! 2     COMP_LAT  latching comparator
//! 1:0   COMP_QUE  comparator queue / disable
//! ```

use cardio_core::{SampleRate, VoltageRange};

/// Selectable I²C addresses, set by the ADDR pin strap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Address {
    #[default]
    Gnd = 0x48,
    Vdd = 0x49,
    Sda = 0x4A,
    Scl = 0x4B,
}

impl Address {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// The four 16-bit device registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// Latest conversion result (read-only).
    Conversion = 0x00,
    /// Configuration word (read/write).
    Config = 0x01,
    /// Comparator low threshold (unused here).
    LoThresh = 0x02,
    /// Comparator high threshold (unused here).
    HiThresh = 0x03,
}

impl Register {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Input multiplexer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum Mux {
    A0A1 = 0x0000,
    A0A3 = 0x1000,
    A1A3 = 0x2000,
    A2A3 = 0x3000,
    /// Single-ended AIN0 against ground: the ECG input channel.
    #[default]
    A0Gnd = 0x4000,
    A1Gnd = 0x5000,
    A2Gnd = 0x6000,
    A3Gnd = 0x7000,
}

/// Conversion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum Mode {
    #[default]
    Continuous = 0x0000,
    SingleShot = 0x0100,
}

/// Comparator queue field; `Disable` turns the comparator off entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum ComparatorQueue {
    AfterOne = 0x0000,
    AfterTwo = 0x0001,
    AfterFour = 0x0002,
    #[default]
    Disable = 0x0003,
}

/// PGA bits for a full-scale range.
pub fn gain_bits(range: VoltageRange) -> u16 {
    match range {
        VoltageRange::Fsr6V144 => 0x0000,
        VoltageRange::Fsr4V096 => 0x0200,
        VoltageRange::Fsr2V048 => 0x0400,
        VoltageRange::Fsr1V024 => 0x0600,
        VoltageRange::Fsr0V512 => 0x0800,
        VoltageRange::Fsr0V256 => 0x0A00,
    }
}

/// DR bits for a sample rate.
pub fn data_rate_bits(rate: SampleRate) -> u16 {
    match rate {
        SampleRate::Sps8 => 0x0000,
        SampleRate::Sps16 => 0x0020,
        SampleRate::Sps32 => 0x0040,
        SampleRate::Sps64 => 0x0060,
        SampleRate::Sps128 => 0x0080,
        SampleRate::Sps250 => 0x00A0,
        SampleRate::Sps475 => 0x00C0,
        SampleRate::Sps860 => 0x00E0,
    }
}

/// Assemble the configuration word. The comparator is disabled; the OS bit
/// stays clear, which is a no-op in continuous mode.
pub fn config_word(mux: Mux, range: VoltageRange, rate: SampleRate, mode: Mode) -> u16 {
    mux as u16
        | gain_bits(range)
        | data_rate_bits(rate)
        | mode as u16
        | ComparatorQueue::Disable as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ecg_configuration_word() {
        // AIN0/GND, ±4.096 V, 475 SPS, continuous, comparator disabled
        let word = config_word(
            Mux::A0Gnd,
            VoltageRange::Fsr4V096,
            SampleRate::Sps475,
            Mode::Continuous,
        );
        assert_eq!(word, 0x4000 | 0x0200 | 0x00C0 | 0x0003);
        assert_eq!(word, 0x42C3);
    }

    #[test]
    fn gain_bits_cover_every_range() {
        assert_eq!(gain_bits(VoltageRange::Fsr6V144), 0x0000);
        assert_eq!(gain_bits(VoltageRange::Fsr0V256), 0x0A00);
    }

    #[test]
    fn data_rate_bits_are_contiguous() {
        assert_eq!(data_rate_bits(SampleRate::Sps8), 0x0000);
        assert_eq!(data_rate_bits(SampleRate::Sps128), 0x0080);
        assert_eq!(data_rate_bits(SampleRate::Sps860), 0x00E0);
    }

    #[test]
    fn single_shot_sets_the_mode_bit() {
        let word = config_word(
            Mux::A0Gnd,
            VoltageRange::Fsr2V048,
            SampleRate::Sps128,
            Mode::SingleShot,
        );
        assert_ne!(word & 0x0100, 0);
    }

    #[test]
    fn addresses_match_the_strap_options() {
        assert_eq!(Address::Gnd.value(), 0x48);
        assert_eq!(Address::Scl.value(), 0x4B);
    }
}
