//! ViewportMapper: data space <-> pixel space, and view range navigation

use crate::config::ViewportParams;
use serde::{Deserialize, Serialize};
use sigview_core::{Axis, Channel, SamplePoint, SigError, SigResult, ViewRange};

/// Size of a plot surface in pixels, supplied by the render sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

impl PixelSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A position on a plot surface, origin top-left, y growing downwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Coordinate mapping and view navigation for a single channel.
///
/// The free mapping functions fail on zero-span ranges; the
/// channel-level helpers (`project`, `unproject`) widen such ranges to
/// `min_span` first so a flat signal never interrupts playback.
#[derive(Debug, Clone)]
pub struct ViewportMapper {
    zoom_factor: f64,
    min_span: f64,
    pan_time_step: f64,
    pan_value_step: f64,
}

impl ViewportMapper {
    pub fn new(params: &ViewportParams) -> Self {
        Self {
            zoom_factor: params.zoom_factor,
            min_span: params.min_span,
            pan_time_step: params.pan_time_step,
            pan_value_step: params.pan_value_step,
        }
    }

    /// Map a data point to pixels: time onto `[0, width]`, value onto
    /// `[height, 0]`
    pub fn data_to_pixel(
        view: ViewRange,
        value_view: ViewRange,
        point: SamplePoint,
        size: PixelSize,
    ) -> SigResult<PixelPoint> {
        check_span(view, Axis::Time)?;
        check_span(value_view, Axis::Value)?;

        let x = (point.time - view.min) / view.span() * size.width;
        let y = size.height - (point.value - value_view.min) / value_view.span() * size.height;
        Ok(PixelPoint::new(x, y))
    }

    /// Exact inverse of [`ViewportMapper::data_to_pixel`]
    pub fn pixel_to_data(
        view: ViewRange,
        value_view: ViewRange,
        pixel: PixelPoint,
        size: PixelSize,
    ) -> SigResult<SamplePoint> {
        if size.width == 0.0 {
            return Err(SigError::DegenerateRange {
                axis: Axis::Time,
                at: view.min,
            });
        }
        if size.height == 0.0 {
            return Err(SigError::DegenerateRange {
                axis: Axis::Value,
                at: value_view.min,
            });
        }

        let time = view.min + pixel.x / size.width * view.span();
        let value = value_view.min + (size.height - pixel.y) / size.height * value_view.span();
        Ok(SamplePoint::new(time, value))
    }

    /// Project a point through the channel's current views
    pub fn project(&self, channel: &Channel, point: SamplePoint, size: PixelSize) -> PixelPoint {
        let (view, value_view) = self.safe_views(channel);
        let x = (point.time - view.min) / view.span() * size.width;
        let y = size.height - (point.value - value_view.min) / value_view.span() * size.height;
        PixelPoint::new(x, y)
    }

    /// Inverse of [`ViewportMapper::project`]
    pub fn unproject(
        &self,
        channel: &Channel,
        pixel: PixelPoint,
        size: PixelSize,
    ) -> SigResult<SamplePoint> {
        let (view, value_view) = self.safe_views(channel);
        Self::pixel_to_data(view, value_view, pixel, size)
    }

    fn safe_views(&self, channel: &Channel) -> (ViewRange, ViewRange) {
        (
            channel.view().with_min_span(self.min_span),
            channel.value_view().with_min_span(self.min_span),
        )
    }

    /// Range after one zoom-in step: each edge moves inwards by
    /// `zoom_factor` of the span
    pub fn zoomed_in(&self, view: ViewRange) -> ViewRange {
        let delta = view.span() * self.zoom_factor;
        ViewRange::new(view.min + delta, view.max - delta)
    }

    /// Range after one zoom-out step, the exact inverse of
    /// [`ViewportMapper::zoomed_in`]
    pub fn zoomed_out(&self, view: ViewRange) -> ViewRange {
        let delta = view.span() * self.zoom_factor / (1.0 - 2.0 * self.zoom_factor);
        ViewRange::new(view.min - delta, view.max + delta)
    }

    /// Same span, centered on `time`
    pub fn recentered(view: ViewRange, time: f64) -> ViewRange {
        let half = view.span() / 2.0;
        ViewRange::new(time - half, time + half)
    }

    pub fn zoom_in(&self, channel: &mut Channel) -> ViewRange {
        let target = self.zoomed_in(channel.view());
        channel.set_view(target)
    }

    pub fn zoom_out(&self, channel: &mut Channel) -> ViewRange {
        let target = self.zoomed_out(channel.view());
        channel.set_view(target)
    }

    /// Center the time view on the last plotted sample. No-op before the
    /// first sample is plotted.
    pub fn recenter(&self, channel: &mut Channel) -> ViewRange {
        match channel.last_plotted() {
            Some(last) => {
                let target = Self::recentered(channel.view(), last.time);
                channel.set_view(target)
            }
            None => channel.view(),
        }
    }

    /// Scroll the view by `steps` scroll units. Time stays clamped to the
    /// channel bounds; values are free.
    pub fn pan(&self, channel: &mut Channel, axis: Axis, steps: f64) -> ViewRange {
        match axis {
            Axis::Time => {
                let view = channel.view();
                let shift = steps * self.pan_time_step;
                let target = ViewRange::new(view.min + shift, view.max + shift);
                channel.set_view(target)
            }
            Axis::Value => {
                let view = channel.value_view();
                let shift = steps * self.pan_value_step;
                let target = ViewRange::new(view.min + shift, view.max + shift);
                channel.set_value_view(target);
                target
            }
        }
    }
}

impl Default for ViewportMapper {
    fn default() -> Self {
        Self::new(&ViewportParams::default())
    }
}

fn check_span(range: ViewRange, axis: Axis) -> SigResult<()> {
    if range.span() == 0.0 {
        Err(SigError::DegenerateRange {
            axis,
            at: range.min,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigview_core::{ChannelId, ChannelStore};

    const EPS: f64 = 1e-9;

    fn loaded_channel(n: usize) -> Channel {
        let mut store = ChannelStore::new();
        let times: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let values: Vec<f64> = (0..n).map(|i| (i % 5) as f64).collect();
        store.load(ChannelId::Graph1, &times, &values, false).unwrap();
        store.channel(ChannelId::Graph1).unwrap().clone()
    }

    #[test]
    fn test_data_to_pixel_corners() {
        let view = ViewRange::new(0.0, 10.0);
        let value_view = ViewRange::new(-1.0, 1.0);
        let size = PixelSize::new(400.0, 300.0);

        let origin =
            ViewportMapper::data_to_pixel(view, value_view, SamplePoint::new(0.0, -1.0), size)
                .unwrap();
        assert_eq!(origin, PixelPoint::new(0.0, 300.0));

        let corner =
            ViewportMapper::data_to_pixel(view, value_view, SamplePoint::new(10.0, 1.0), size)
                .unwrap();
        assert_eq!(corner, PixelPoint::new(400.0, 0.0));
    }

    #[test]
    fn test_round_trip() {
        let view = ViewRange::new(2.5, 7.25);
        let value_view = ViewRange::new(-3.0, 12.0);
        let size = PixelSize::new(640.0, 480.0);

        for &(t, v) in &[(2.5, -3.0), (3.1, 0.0), (5.0, 4.4), (7.25, 12.0)] {
            let pixel =
                ViewportMapper::data_to_pixel(view, value_view, SamplePoint::new(t, v), size)
                    .unwrap();
            let back = ViewportMapper::pixel_to_data(view, value_view, pixel, size).unwrap();
            assert!((back.time - t).abs() < EPS);
            assert!((back.value - v).abs() < EPS);
        }
    }

    #[test]
    fn test_degenerate_range() {
        let flat = ViewRange::new(3.0, 3.0);
        let err = ViewportMapper::data_to_pixel(
            ViewRange::new(0.0, 1.0),
            flat,
            SamplePoint::new(0.5, 3.0),
            PixelSize::new(10.0, 10.0),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SigError::DegenerateRange {
                axis: Axis::Value,
                at: 3.0
            }
        );
    }

    #[test]
    fn test_project_substitutes_min_span() {
        let mut store = ChannelStore::new().with_value_padding(0.0);
        store
            .load(ChannelId::Graph1, &[0.0, 1.0], &[5.0, 5.0], false)
            .unwrap();
        let channel = store.channel(ChannelId::Graph1).unwrap();
        let mapper = ViewportMapper::default();

        let pixel = mapper.project(channel, SamplePoint::new(1.0, 5.0), PixelSize::new(100.0, 50.0));
        assert!(pixel.x.is_finite() && pixel.y.is_finite());
        assert!((pixel.y - 25.0).abs() < 1e-2);
    }

    #[test]
    fn test_zoom_in_then_out_restores_range() {
        let mapper = ViewportMapper::default();
        let mut channel = loaded_channel(101);

        let original = channel.view();
        let zoomed = mapper.zoom_in(&mut channel);
        assert_eq!(zoomed, ViewRange::new(25.0, 75.0));

        let restored = mapper.zoom_out(&mut channel);
        assert!((restored.min - original.min).abs() < EPS);
        assert!((restored.max - original.max).abs() < EPS);
    }

    #[test]
    fn test_zoom_out_clamps_at_bounds() {
        let mapper = ViewportMapper::default();
        let mut channel = loaded_channel(11);
        let out = mapper.zoom_out(&mut channel);
        assert_eq!(out, ViewRange::new(0.0, 10.0));
    }

    #[test]
    fn test_recenter_on_last_plotted() {
        let mapper = ViewportMapper::default();
        let mut channel = loaded_channel(101);
        channel.set_view(ViewRange::new(0.0, 20.0));
        assert_eq!(mapper.recenter(&mut channel), ViewRange::new(0.0, 20.0));

        for _ in 0..51 {
            channel.advance();
        }
        let centered = mapper.recenter(&mut channel);
        assert_eq!(centered, ViewRange::new(40.0, 60.0));
    }

    #[test]
    fn test_pan_axes() {
        let mapper = ViewportMapper::default();
        let mut channel = loaded_channel(101);
        channel.set_view(ViewRange::new(10.0, 20.0));

        let moved = mapper.pan(&mut channel, Axis::Time, 10.0);
        assert!((moved.min - 11.0).abs() < EPS);
        assert!((moved.max - 21.0).abs() < EPS);

        let before = channel.value_view();
        let shifted = mapper.pan(&mut channel, Axis::Value, -2.0);
        assert!((shifted.min - (before.min - 2.0)).abs() < EPS);
    }
}
