//! Synthetic demo signals, for running the viewer without input files

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use sigview_core::{config_error, SigResult};
use std::f64::consts::PI;

/// Shape of a generated signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SignalPattern {
    Constant { level: f64 },
    Sinusoidal {
        frequency: f64,
        amplitude: f64,
        baseline: f64,
    },
    Ramp {
        start_level: f64,
        end_level: f64,
        duration: f64,
    },
    /// On/off cycles
    Burst {
        on_duration: f64,
        off_duration: f64,
        amplitude: f64,
    },
    /// Exponentially decaying amplitude
    Decay {
        initial_amplitude: f64,
        decay_rate: f64,
    },
}

impl SignalPattern {
    /// Noise-free value at `time` seconds
    pub fn value_at(&self, time: f64) -> f64 {
        match *self {
            SignalPattern::Constant { level } => level,
            SignalPattern::Sinusoidal {
                frequency,
                amplitude,
                baseline,
            } => baseline + amplitude * (2.0 * PI * frequency * time).sin(),
            SignalPattern::Ramp {
                start_level,
                end_level,
                duration,
            } => {
                if time >= duration {
                    end_level
                } else {
                    start_level + (end_level - start_level) * (time / duration)
                }
            }
            SignalPattern::Burst {
                on_duration,
                off_duration,
                amplitude,
            } => {
                let phase = time % (on_duration + off_duration);
                if phase < on_duration {
                    amplitude
                } else {
                    0.0
                }
            }
            SignalPattern::Decay {
                initial_amplitude,
                decay_rate,
            } => initial_amplitude * (-decay_rate * time).exp(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SignalPattern::Constant { .. } => "Constant level",
            SignalPattern::Sinusoidal { .. } => "Sine wave",
            SignalPattern::Ramp { .. } => "Linear ramp",
            SignalPattern::Burst { .. } => "Burst pattern",
            SignalPattern::Decay { .. } => "Exponential decay",
        }
    }

    /// Named presets
    pub fn presets() -> Vec<(&'static str, SignalPattern)> {
        vec![
            ("flat", SignalPattern::Constant { level: 10.0 }),
            (
                "sine",
                SignalPattern::Sinusoidal {
                    frequency: 1.0,
                    amplitude: 50.0,
                    baseline: 0.0,
                },
            ),
            (
                "slow-sine",
                SignalPattern::Sinusoidal {
                    frequency: 0.25,
                    amplitude: 30.0,
                    baseline: 60.0,
                },
            ),
            (
                "ramp",
                SignalPattern::Ramp {
                    start_level: 0.0,
                    end_level: 100.0,
                    duration: 4.0,
                },
            ),
            (
                "bursts",
                SignalPattern::Burst {
                    on_duration: 0.5,
                    off_duration: 0.5,
                    amplitude: 80.0,
                },
            ),
            (
                "decay",
                SignalPattern::Decay {
                    initial_amplitude: 100.0,
                    decay_rate: 0.5,
                },
            ),
        ]
    }

    pub fn preset(name: &str) -> Option<SignalPattern> {
        Self::presets()
            .into_iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, pattern)| pattern)
    }
}

/// Sampling and noise settings for [`generate_series`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    pub sampling_rate: f64,
    /// Length in seconds
    pub duration: f64,
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub noise_std: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 50.0,
            duration: 10.0,
            noise_std: 1.0,
            seed: None,
        }
    }
}

/// Sample `pattern` into time and value arrays ready for loading
pub fn generate_series(pattern: SignalPattern, config: &SynthConfig) -> SigResult<(Vec<f64>, Vec<f64>)> {
    if !(config.sampling_rate > 0.0) {
        return Err(config_error!("Sampling rate must be positive"));
    }
    if config.duration < 0.0 {
        return Err(config_error!("Duration must not be negative"));
    }
    let noise = Normal::new(0.0, config.noise_std)
        .map_err(|e| config_error!("Invalid noise level {}: {}", config.noise_std, e))?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let count = (config.duration * config.sampling_rate).round() as usize;
    let times: Vec<f64> = (0..count).map(|i| i as f64 / config.sampling_rate).collect();
    let values = times
        .iter()
        .map(|&t| pattern.value_at(t) + noise.sample(&mut rng))
        .collect();
    Ok((times, values))
}
