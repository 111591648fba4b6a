//! Circular (radial) display: which samples are visible as the sweep
//! hand turns

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Angle the sweep advances per tick
pub const SWEEP_STEP: f64 = PI / 90.0;

/// A sample placed on the circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CirclePoint {
    pub index: usize,
    /// Angle of the sample in radians, `0..=2π`
    pub angle: f64,
    /// Sample value, used as the radius
    pub radius: f64,
    /// Offset from the circle center
    pub x: f64,
    pub y: f64,
}

/// Single-column values spread evenly around a full turn, revealed by a
/// sweep angle that advances every tick
#[derive(Debug, Clone, Default)]
pub struct CircleSweep {
    values: Vec<f64>,
    angle: f64,
}

impl CircleSweep {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, angle: 0.0 }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Advance the sweep one step, wrapping to zero after a full turn.
    /// Returns false when there is nothing to sweep.
    pub fn advance(&mut self) -> bool {
        if self.values.is_empty() {
            return false;
        }
        self.angle += SWEEP_STEP;
        if self.angle >= 2.0 * PI {
            self.angle = 0.0;
        }
        true
    }

    /// Angle at which sample `index` sits
    pub fn sample_angle(&self, index: usize) -> f64 {
        match self.values.len() {
            0 | 1 => 0.0,
            n => 2.0 * PI * index as f64 / (n - 1) as f64,
        }
    }

    /// Samples already reached by the sweep, in order
    pub fn visible_points(&self) -> Vec<CirclePoint> {
        self.values
            .iter()
            .enumerate()
            .map(|(index, &radius)| {
                let angle = self.sample_angle(index);
                CirclePoint {
                    index,
                    angle,
                    radius,
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                }
            })
            .take_while(|p| p.angle <= self.angle)
            .collect()
    }

    /// Sample that gets the value label: the last one reached by the sweep
    pub fn current_index(&self) -> usize {
        let first_ahead = (0..self.values.len())
            .find(|&i| self.sample_angle(i) >= self.angle)
            .unwrap_or(0);
        first_ahead.saturating_sub(1)
    }
}
