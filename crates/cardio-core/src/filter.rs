//! Signal conditioning filters for the ECG front end.
//!
//! Two streaming filters built from biquad sections: a narrow notch for
//! power-line interference and a band filter that strips baseline wander
//! below 0.67 Hz and noise above 45 Hz while preserving the diagnostic
//! content of the trace. Both are optional; detection runs on the raw
//! signal unless a filter is attached to the analyzer.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F64};

use crate::error::{CardioError, Result};

/// Default power-line interference frequency.
pub const POWER_LINE_HZ: f64 = 60.0;
/// Default notch quality factor; bandwidth is `f0 / Q` (2 Hz at 60 Hz).
pub const POWER_LINE_Q: f64 = 30.0;

/// High-pass corner removing DC offset and baseline wander.
const BASELINE_CUTOFF_HZ: f64 = 0.67;
/// Low-pass corner for noise reduction.
const NOISE_CUTOFF_HZ: f64 = 45.0;

fn design(
    filter: Type<f64>,
    f0_hz: f64,
    sample_rate_hz: f64,
    q: f64,
) -> Result<DirectForm2Transposed<f64>> {
    let coefficients =
        Coefficients::<f64>::from_params(filter, sample_rate_hz.hz(), f0_hz.hz(), q).map_err(
            |_| CardioError::InvalidFilter {
                message: format!("{f0_hz} Hz section is not realizable at {sample_rate_hz} S/s"),
            },
        )?;
    Ok(DirectForm2Transposed::<f64>::new(coefficients))
}

/// Second-order IIR notch filter for power-line rejection.
pub struct NotchFilter {
    section: DirectForm2Transposed<f64>,
}

impl NotchFilter {
    /// Design a notch at `center_hz` for the given sample rate.
    pub fn new(center_hz: f64, sample_rate_hz: f64, q: f64) -> Result<Self> {
        Ok(Self {
            section: design(Type::Notch, center_hz, sample_rate_hz, q)?,
        })
    }

    /// Notch at the default power-line frequency.
    pub fn power_line(sample_rate_hz: f64) -> Result<Self> {
        Self::new(POWER_LINE_HZ, sample_rate_hz, POWER_LINE_Q)
    }

    /// Process one sample.
    pub fn process(&mut self, input: f64) -> f64 {
        self.section.run(input)
    }

    /// Clear the filter state.
    pub fn reset(&mut self) {
        self.section.reset_state();
    }
}

/// Band filter for the ECG diagnostic range: 0.67 Hz high-pass followed by
/// a fourth-order 45 Hz low-pass (two cascaded sections).
pub struct EcgBandFilter {
    highpass: DirectForm2Transposed<f64>,
    lowpass: [DirectForm2Transposed<f64>; 2],
}

impl EcgBandFilter {
    pub fn new(sample_rate_hz: f64) -> Result<Self> {
        Ok(Self {
            highpass: design(
                Type::HighPass,
                BASELINE_CUTOFF_HZ,
                sample_rate_hz,
                Q_BUTTERWORTH_F64,
            )?,
            lowpass: [
                design(
                    Type::LowPass,
                    NOISE_CUTOFF_HZ,
                    sample_rate_hz,
                    Q_BUTTERWORTH_F64,
                )?,
                design(
                    Type::LowPass,
                    NOISE_CUTOFF_HZ,
                    sample_rate_hz,
                    Q_BUTTERWORTH_F64,
                )?,
            ],
        })
    }

    /// Settle the cascade on an initial baseline value.
    ///
    /// The high-pass stage sees the power-up DC level as a step and would
    /// ring above the detection threshold for the first second otherwise.
    pub fn prime(&mut self, baseline: f64) {
        for _ in 0..4096 {
            self.process(baseline);
        }
    }

    /// Process one sample through the cascade.
    pub fn process(&mut self, input: f64) -> f64 {
        let mut value = self.highpass.run(input);
        for section in &mut self.lowpass {
            value = section.run(value);
        }
        value
    }

    /// Clear all section states.
    pub fn reset(&mut self) {
        self.highpass.reset_state();
        for section in &mut self.lowpass {
            section.reset_state();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    const FS: f64 = 475.0;

    fn rms(values: &[f64]) -> f64 {
        (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
    }

    fn sine(freq: f64, seconds: f64) -> Vec<f64> {
        (0..(FS * seconds) as usize)
            .map(|i| (TAU * freq * i as f64 / FS).sin())
            .collect()
    }

    #[test]
    fn notch_passes_dc() {
        let mut filter = NotchFilter::power_line(FS).unwrap();
        let mut last = 0.0;
        for _ in 0..2000 {
            last = filter.process(1.0);
        }
        assert!((last - 1.0).abs() < 1e-3);
    }

    #[test]
    fn notch_attenuates_center_frequency() {
        let mut filter = NotchFilter::power_line(FS).unwrap();
        let input = sine(POWER_LINE_HZ, 4.0);
        let output: Vec<f64> = input.iter().map(|&v| filter.process(v)).collect();
        // Compare steady-state halves to skip the settling transient.
        let half = output.len() / 2;
        assert!(rms(&output[half..]) < 0.1 * rms(&input[half..]));
    }

    #[test]
    fn notch_preserves_nearby_content() {
        let mut filter = NotchFilter::power_line(FS).unwrap();
        let input = sine(10.0, 4.0);
        let output: Vec<f64> = input.iter().map(|&v| filter.process(v)).collect();
        let half = output.len() / 2;
        let ratio = rms(&output[half..]) / rms(&input[half..]);
        assert!((0.9..1.1).contains(&ratio));
    }

    #[test]
    fn band_filter_blocks_dc() {
        let mut filter = EcgBandFilter::new(FS).unwrap();
        let mut last = 1.0;
        for _ in 0..20_000 {
            last = filter.process(1.0);
        }
        assert!(last.abs() < 1e-2);
    }

    #[test]
    fn band_filter_passes_qrs_band() {
        let mut filter = EcgBandFilter::new(FS).unwrap();
        let input = sine(15.0, 4.0);
        let output: Vec<f64> = input.iter().map(|&v| filter.process(v)).collect();
        let half = output.len() / 2;
        let ratio = rms(&output[half..]) / rms(&input[half..]);
        assert!(ratio > 0.8);
    }

    #[test]
    fn priming_removes_the_startup_step() {
        let mut filter = EcgBandFilter::new(FS).unwrap();
        filter.prime(3.0);
        let first = filter.process(3.0);
        assert!(first.abs() < 1e-3);
    }

    #[test]
    fn unrealizable_design_is_rejected() {
        // 45 Hz low-pass cannot exist at 8 S/s
        assert!(EcgBandFilter::new(8.0).is_err());
    }

    #[test]
    fn reset_clears_state() {
        let mut filter = NotchFilter::power_line(FS).unwrap();
        for i in 0..100 {
            filter.process(i as f64);
        }
        filter.reset();
        let mut fresh = NotchFilter::power_line(FS).unwrap();
        assert_eq!(filter.process(1.0), fresh.process(1.0));
    }
}
