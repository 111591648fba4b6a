//! Summary statistics over a channel's values

use crate::channel::SamplePoint;
use serde::{Deserialize, Serialize};

/// Basic statistics for a signal channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ChannelStats {
    /// Population statistics of the values; all zero for an empty slice
    pub fn calculate(points: &[SamplePoint]) -> Self {
        if points.is_empty() {
            return Self {
                count: 0,
                mean: 0.0,
                median: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }

        let n = points.len() as f64;
        let mean = points.iter().map(|p| p.value).sum::<f64>() / n;

        let variance = points
            .iter()
            .map(|p| (p.value - mean).powi(2))
            .sum::<f64>()
            / n;

        let mut sorted: Vec<f64> = points.iter().map(|p| p.value).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            count: points.len(),
            mean,
            median,
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(values: &[f64]) -> Vec<SamplePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| SamplePoint::new(i as f64, v))
            .collect()
    }

    #[test]
    fn test_stats_even_count() {
        let stats = ChannelStats::calculate(&points(&[4.0, 1.0, 3.0, 2.0]));
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert!((stats.std_dev - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_stats_odd_count_and_empty() {
        let stats = ChannelStats::calculate(&points(&[9.0, -1.0, 5.0]));
        assert_eq!(stats.median, 5.0);

        let empty = ChannelStats::calculate(&[]);
        assert_eq!(empty.count, 0);
        assert_eq!(empty.mean, 0.0);
    }
}
