//! GlueEngine: splice two point lists into one signal

use crate::config::GlueParams;
use sigview_core::{SamplePoint, SigError, SigResult};
use tracing::debug;

/// Joins two extracted signals with a gap/overlap and an optional
/// interpolated bridge.
#[derive(Debug, Clone)]
pub struct GlueEngine {
    threshold: f64,
}

impl GlueEngine {
    pub fn new(params: &GlueParams) -> Self {
        Self {
            threshold: params.threshold,
        }
    }

    /// Value jump above which a bridge is generated
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Splice `second` onto the end of `first`.
    ///
    /// `second` is re-based to start `gap` time units after the last point
    /// of `first` (negative gaps overlap). When `order > 0` and the value
    /// jump between the two ends exceeds the threshold, `order` bridge
    /// points are inserted, evenly spaced from the last point of `first` to
    /// the start of the shifted `second`, both ends included. `order` counts
    /// points; the bridge is always linear.
    pub fn splice(
        &self,
        first: &[SamplePoint],
        second: &[SamplePoint],
        gap: f64,
        order: usize,
    ) -> SigResult<Vec<SamplePoint>> {
        let (Some(&last), Some(&head)) = (first.last(), second.first()) else {
            return Err(SigError::EmptyInput {
                reason: "both signals need at least one point to glue",
            });
        };

        let shift_x = last.time + gap;
        let bridge = if order > 0 && (last.value - head.value).abs() > self.threshold {
            bridge_points(last, SamplePoint::new(shift_x, head.value), order)
        } else {
            Vec::new()
        };

        let mut glued = Vec::with_capacity(first.len() + bridge.len() + second.len());
        glued.extend_from_slice(first);
        glued.extend(bridge.iter().copied());
        glued.extend(
            second
                .iter()
                .map(|p| SamplePoint::new(p.time - head.time + shift_x, p.value)),
        );

        debug!(
            first = first.len(),
            second = second.len(),
            bridge = bridge.len(),
            gap,
            "glued signals"
        );
        Ok(glued)
    }
}

impl Default for GlueEngine {
    fn default() -> Self {
        Self::new(&GlueParams::default())
    }
}

/// `count` points linearly spaced from `from` to `to` inclusive
fn bridge_points(from: SamplePoint, to: SamplePoint, count: usize) -> Vec<SamplePoint> {
    if count == 1 {
        return vec![from];
    }
    let steps = (count - 1) as f64;
    (0..count)
        .map(|i| {
            let frac = i as f64 / steps;
            SamplePoint::new(
                from.time + (to.time - from.time) * frac,
                from.value + (to.value - from.value) * frac,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<SamplePoint> {
        raw.iter().map(|&p| SamplePoint::from(p)).collect()
    }

    #[test]
    fn test_splice_without_bridge() {
        let glue = GlueEngine::default();
        let out = glue
            .splice(
                &pts(&[(0.0, 0.0), (1.0, 5.0)]),
                &pts(&[(0.0, 100.0), (1.0, 200.0)]),
                2.0,
                0,
            )
            .unwrap();
        assert_eq!(
            out,
            pts(&[(0.0, 0.0), (1.0, 5.0), (3.0, 100.0), (4.0, 200.0)])
        );
    }

    #[test]
    fn test_splice_inserts_bridge_points() {
        let glue = GlueEngine::default();
        let out = glue
            .splice(
                &pts(&[(0.0, 0.0), (1.0, 5.0)]),
                &pts(&[(0.0, 100.0), (1.0, 200.0)]),
                2.0,
                2,
            )
            .unwrap();
        assert_eq!(out.len(), 6);
        assert_eq!(out[2], SamplePoint::new(1.0, 5.0));
        assert_eq!(out[3], SamplePoint::new(3.0, 100.0));
        assert_eq!(out[4], SamplePoint::new(3.0, 100.0));
    }

    #[test]
    fn test_bridge_is_evenly_spaced() {
        let glue = GlueEngine::default();
        let out = glue
            .splice(&pts(&[(0.0, 0.0)]), &pts(&[(7.0, 40.0)]), 4.0, 5)
            .unwrap();
        let bridge = &out[1..6];
        for (i, p) in bridge.iter().enumerate() {
            assert!((p.time - i as f64).abs() < 1e-12);
            assert!((p.value - 10.0 * i as f64).abs() < 1e-12);
        }
        assert_eq!(out[6], SamplePoint::new(4.0, 40.0));
    }

    #[test]
    fn test_small_jump_skips_bridge() {
        let glue = GlueEngine::default();
        let out = glue
            .splice(&pts(&[(0.0, 10.0)]), &pts(&[(0.0, 25.0)]), 1.0, 3)
            .unwrap();
        assert_eq!(out, pts(&[(0.0, 10.0), (1.0, 25.0)]));
    }

    #[test]
    fn test_negative_gap_overlaps() {
        let glue = GlueEngine::default();
        let out = glue
            .splice(
                &pts(&[(0.0, 1.0), (4.0, 1.0)]),
                &pts(&[(10.0, 2.0), (11.0, 2.0)]),
                -1.5,
                0,
            )
            .unwrap();
        assert_eq!(out[2].time, 2.5);
        assert_eq!(out[3].time, 3.5);
    }

    #[test]
    fn test_empty_input() {
        let glue = GlueEngine::default();
        let err = glue.splice(&[], &pts(&[(0.0, 1.0)]), 0.0, 1).unwrap_err();
        assert!(matches!(err, SigError::EmptyInput { .. }));
        assert!(glue.splice(&pts(&[(0.0, 1.0)]), &[], 0.0, 1).is_err());
    }

    #[test]
    fn test_chained_splice_point_count() {
        let glue = GlueEngine::default();
        let a = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let b = pts(&[(0.0, 90.0), (1.0, 91.0)]);
        let c = pts(&[(5.0, 3.0), (6.0, 4.0), (7.0, 5.0), (8.0, 6.0)]);

        let ab = glue.splice(&a, &b, 1.0, 3).unwrap();
        let abc = glue.splice(&ab, &c, 0.5, 4).unwrap();
        assert_eq!(abc.len(), a.len() + b.len() + c.len() + 3 + 4);
    }
}
