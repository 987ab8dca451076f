//! Demo Mode - Simulated step-response recordings
//!
//! Generates the recording a velocity controller would produce when its
//! input steps from zero to a fixed amplitude: a first-order plant sampled at
//! a fixed rate, optionally with uniform measurement noise.

use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::unit_conversion::{hz_to_period_nanos, seconds_to_nanos, NANOS_PER_SECOND};

/// Entity path of the logged control signal
pub const CONTROL_PATH: &str = "/control";

/// Entity path of the logged velocity
pub const VELOCITY_PATH: &str = "/velocity";

/// Timeline the samples are logged on
pub const SAMPLE_TIMELINE: &str = "sample_time";

/// Longest run the simulator accepts, in seconds
pub const MAX_DURATION_SECONDS: f64 = 3600.0;

/// Most samples a single run may produce
pub const MAX_SAMPLES: i64 = 10_000_000;

/// One simulated sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSample {
    /// Nanoseconds since the start of the run
    pub time_nanos: i64,
    /// Plant input
    pub control: f64,
    /// Measured plant output
    pub velocity: f64,
}

/// First-order plant driven by a single step
#[derive(Debug, Clone)]
pub struct StepResponseSimulator {
    /// Sample rate in Hz
    sample_rate: f64,
    /// Length of the run in seconds
    duration: f64,
    /// When the step happens, in seconds
    step_time: f64,
    /// Control value after the step
    step_amplitude: f64,
    /// Steady-state velocity per unit of control
    gain: f64,
    /// Plant time constant in seconds
    time_constant: f64,
    /// Peak measurement noise (uniform)
    noise: f64,
    /// Random number generator
    rng: StdRng,
}

impl Default for StepResponseSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StepResponseSimulator {
    /// 2 s at 100 Hz, unit step at 0.5 s, gain 1, time constant 0.1 s, no noise
    pub fn new() -> Self {
        Self {
            sample_rate: 100.0,
            duration: 2.0,
            step_time: 0.5,
            step_amplitude: 1.0,
            gain: 1.0,
            time_constant: 0.1,
            noise: 0.0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Set the sample rate in Hz
    pub fn with_sample_rate(mut self, hz: f64) -> Self {
        self.sample_rate = hz;
        self
    }

    /// Set the run length in seconds
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Set when the step happens and its amplitude
    pub fn with_step(mut self, at_seconds: f64, amplitude: f64) -> Self {
        self.step_time = at_seconds;
        self.step_amplitude = amplitude;
        self
    }

    /// Set plant gain and time constant
    pub fn with_plant(mut self, gain: f64, time_constant: f64) -> Self {
        self.gain = gain;
        self.time_constant = time_constant;
        self
    }

    /// Add uniform noise in `[-amplitude, amplitude]` to the measured velocity
    pub fn with_noise(mut self, amplitude: f64, seed: u64) -> Self {
        self.noise = amplitude.abs();
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Simulate the run
    pub fn samples(&mut self) -> Result<Vec<StepSample>> {
        let period = hz_to_period_nanos(self.sample_rate)
            .filter(|period| *period > 0)
            .ok_or_else(|| {
                Error::format("<demo>", format!("invalid sample rate {}", self.sample_rate))
            })?;
        if !self.time_constant.is_finite() || self.time_constant <= 0.0 {
            return Err(Error::format(
                "<demo>",
                format!("invalid time constant {}", self.time_constant),
            ));
        }

        let dt = period as f64 / NANOS_PER_SECOND;
        let decay = (-dt / self.time_constant).exp();
        let count = self.sample_count(period)?;

        let mut state = 0.0;
        let mut samples = Vec::with_capacity(count);
        for k in 0..count {
            let time_nanos = k as i64 * period;
            let t = time_nanos as f64 / NANOS_PER_SECOND;
            let control = if t >= self.step_time {
                self.step_amplitude
            } else {
                0.0
            };

            let measured = if self.noise > 0.0 {
                state + self.rng.gen_range(-self.noise..=self.noise)
            } else {
                state
            };
            samples.push(StepSample {
                time_nanos,
                control,
                velocity: measured,
            });

            state = decay * state + (1.0 - decay) * self.gain * control;
        }
        Ok(samples)
    }

    /// Samples on the grid `0, period, 2 * period, ...` up to the duration
    fn sample_count(&self, period: i64) -> Result<usize> {
        if !(0.0..=MAX_DURATION_SECONDS).contains(&self.duration) {
            return Err(Error::format(
                "<demo>",
                format!(
                    "invalid duration {} (must be between 0 and {MAX_DURATION_SECONDS} s)",
                    self.duration
                ),
            ));
        }
        let count = seconds_to_nanos(self.duration) / period + 1;
        if count > MAX_SAMPLES {
            return Err(Error::format(
                "<demo>",
                format!("{count} samples exceed the limit of {MAX_SAMPLES}"),
            ));
        }
        Ok(count as usize)
    }

    /// Simulate the run and log it to `stream`
    pub fn log_to(&mut self, stream: &rerun::RecordingStream) -> Result<()> {
        let samples = self.samples()?;
        for sample in &samples {
            stream.set_time(
                SAMPLE_TIMELINE,
                Duration::from_nanos(sample.time_nanos as u64),
            );
            stream.log(CONTROL_PATH, &rerun::Scalars::single(sample.control))?;
            stream.log(VELOCITY_PATH, &rerun::Scalars::single(sample.velocity))?;
        }
        tracing::debug!(samples = samples.len(), "simulated step response");
        Ok(())
    }

    /// Simulate the run and save it as an `.rrd` file
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let stream = rerun::RecordingStreamBuilder::new("steplog_demo").save(path)?;
        self.log_to(&stream)?;
        stream.flush_blocking();
        tracing::info!(path = %path.display(), "saved simulated step response");
        Ok(())
    }
}
