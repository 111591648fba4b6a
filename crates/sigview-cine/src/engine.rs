//! SignalEngine: the host-facing facade over store, playback, viewport,
//! selection and glue

use crate::feed::FeedSample;
use crate::playback::PlaybackController;
use crate::sink::RenderSink;
use serde::{Deserialize, Serialize};
use sigview_core::{
    Axis, ChannelColor, ChannelId, ChannelStore, LinkGroup, SamplePoint, SigError, SigResult,
    ViewRange,
};
use sigview_processing::{
    CircleSweep, EngineConfig, GlueEngine, PixelPoint, RegionSelector, SelectionRect,
    ViewportMapper,
};
use std::time::Duration;
use tracing::{debug, info};

/// Point-in-time view of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub channel: ChannelId,
    pub plotted: Vec<SamplePoint>,
    /// Samples in the buffer, plotted or not
    pub buffered: usize,
    pub cursor: usize,
    pub playing: bool,
    pub visible: bool,
    pub color: ChannelColor,
    pub view: ViewRange,
    pub value_view: ViewRange,
}

/// Owns every piece of engine state and reports changes to a
/// [`RenderSink`]. All mutation goes through `&mut self`, so ticks and
/// commands never interleave.
pub struct SignalEngine<S> {
    config: EngineConfig,
    store: ChannelStore,
    playback: PlaybackController,
    mapper: ViewportMapper,
    selector: RegionSelector,
    glue: GlueEngine,
    circular: CircleSweep,
    circular_running: bool,
    sink: S,
}

impl<S: RenderSink> SignalEngine<S> {
    pub fn new(config: EngineConfig, sink: S) -> SigResult<Self> {
        config.validate()?;

        let mut store = ChannelStore::new().with_value_padding(config.viewport.value_padding);
        for id in ChannelId::ALL {
            store.set_color(id, config.color_for(id))?;
        }
        let (first, second) = config.link_pair;
        let playback = PlaybackController::new(config.tick_interval()?, LinkGroup::new(first, second))?;

        info!(
            profile = %config.name,
            interval_ms = playback.interval().as_millis() as u64,
            "signal engine ready"
        );

        Ok(Self {
            mapper: ViewportMapper::new(&config.viewport),
            glue: GlueEngine::new(&config.glue),
            store,
            playback,
            selector: RegionSelector::new(),
            circular: CircleSweep::default(),
            circular_running: false,
            config,
            sink,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ChannelStore {
        &self.store
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn link(&self) -> &LinkGroup {
        self.playback.link()
    }

    pub fn selector(&self) -> &RegionSelector {
        &self.selector
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    // ---- data ----

    /// Load a series into a channel. Playback state is left as it was.
    pub fn load(&mut self, id: ChannelId, times: &[f64], values: &[f64], append: bool) -> SigResult<()> {
        self.store.load(id, times, values, append)?;
        self.emit(id)
    }

    /// Append one streamed sample, plotted immediately
    pub fn append(&mut self, id: ChannelId, point: SamplePoint) -> SigResult<()> {
        self.store.append_stream(id, point)?;
        self.emit(id)
    }

    pub fn ingest_feed_sample(&mut self, sample: FeedSample) -> SigResult<()> {
        self.append(sample.channel, sample.point)
    }

    pub fn clear(&mut self, id: ChannelId) -> SigResult<()> {
        self.store.clear(id)?;
        self.emit(id)
    }

    /// Hand the signal of a playing channel over to `to`
    pub fn move_signal(&mut self, from: ChannelId, to: ChannelId) -> SigResult<bool> {
        let moved = self.store.move_signal(from, to)?;
        if moved {
            self.playback.sync_with(&self.store);
            self.emit(from)?;
            self.emit(to)?;
        }
        Ok(moved)
    }

    // ---- playback ----

    pub fn play(&mut self, id: ChannelId) -> SigResult<()> {
        self.playback.play(&mut self.store, id)?;
        Ok(())
    }

    pub fn pause(&mut self, id: ChannelId) -> SigResult<()> {
        self.playback.pause(&mut self.store, id)?;
        Ok(())
    }

    pub fn rewind(&mut self, id: ChannelId) -> SigResult<()> {
        for target in self.playback.rewind(&mut self.store, id)? {
            self.emit(target)?;
        }
        Ok(())
    }

    pub fn toggle_play_pause(&mut self, id: ChannelId) -> SigResult<()> {
        self.playback.toggle_play_pause(&mut self.store, id)?;
        Ok(())
    }

    /// Plot the next sample of `id`. Returns whether anything was plotted.
    pub fn tick(&mut self, id: ChannelId) -> SigResult<bool> {
        match self.playback.tick(&mut self.store, id)? {
            Some(_) => {
                self.emit(id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn set_interval(&mut self, interval_ms: u64) -> SigResult<()> {
        self.playback.set_interval(Duration::from_millis(interval_ms))
    }

    /// Apply a speed control value, returning the resulting interval
    pub fn set_speed(&mut self, speed: f64) -> SigResult<Duration> {
        let interval = self.config.interval_for_speed(speed)?;
        self.playback.set_interval(interval)?;
        Ok(interval)
    }

    // ---- view ----

    pub fn zoom_in(&mut self, id: ChannelId) -> SigResult<ViewRange> {
        self.change_view(id, |mapper, view| mapper.zoomed_in(view))
    }

    pub fn zoom_out(&mut self, id: ChannelId) -> SigResult<ViewRange> {
        self.change_view(id, |mapper, view| mapper.zoomed_out(view))
    }

    pub fn recenter(&mut self, id: ChannelId) -> SigResult<ViewRange> {
        let channel = self.store.channel_mut(id)?;
        Ok(self.mapper.recenter(channel))
    }

    pub fn pan(&mut self, id: ChannelId, axis: Axis, steps: f64) -> SigResult<ViewRange> {
        let channel = self.store.channel_mut(id)?;
        Ok(self.mapper.pan(channel, axis, steps))
    }

    /// Host-driven time range, clamped to the channel bounds
    pub fn set_view(&mut self, id: ChannelId, min: f64, max: f64) -> SigResult<ViewRange> {
        Ok(self.store.channel_mut(id)?.set_view(ViewRange::new(min, max)))
    }

    /// Apply a view transform to `id`. While both linked members play, the
    /// first member's result is applied to both.
    fn change_view(
        &mut self,
        id: ChannelId,
        transform: impl Fn(&ViewportMapper, ViewRange) -> ViewRange,
    ) -> SigResult<ViewRange> {
        let link = *self.playback.link();
        if !link.both_playing(id, &self.store)? {
            let channel = self.store.channel_mut(id)?;
            let target = transform(&self.mapper, channel.view());
            return Ok(channel.set_view(target));
        }

        let leader = self.store.channel_mut(link.first())?;
        let target = transform(&self.mapper, leader.view());
        let applied = leader.set_view(target);
        self.store.channel_mut(link.second())?.set_view(applied);
        Ok(self.store.channel(id)?.view())
    }

    // ---- presentation ----

    /// Flip visibility of `id`, and of its partner while both play.
    /// Returns the new visibility of `id`.
    pub fn toggle_visibility(&mut self, id: ChannelId) -> SigResult<bool> {
        let visible = self.store.toggle_visible(id)?;
        self.emit(id)?;
        if let Some(other) = self.mirror_target(id)? {
            self.store.toggle_visible(other)?;
            self.emit(other)?;
        }
        Ok(visible)
    }

    pub fn set_color(&mut self, id: ChannelId, color: ChannelColor) -> SigResult<()> {
        if let Some(other) = self.mirror_target(id)? {
            self.store.set_color(other, color.clone())?;
            self.emit(other)?;
        }
        self.store.set_color(id, color)?;
        self.emit(id)
    }

    fn mirror_target(&self, id: ChannelId) -> SigResult<Option<ChannelId>> {
        let link = self.playback.link();
        if link.both_playing(id, &self.store)? {
            Ok(link.partner(id))
        } else {
            Ok(None)
        }
    }

    // ---- link ----

    /// Link the pair; the second member takes the first member's view
    pub fn link_channels(&mut self) -> SigResult<()> {
        let link = self.playback.link_mut();
        link.link();
        let (first, second) = (link.first(), link.second());
        let view = self.store.channel(first)?.view();
        self.store.channel_mut(second)?.set_view(view);
        debug!(%first, %second, "linked");
        Ok(())
    }

    pub fn unlink_channels(&mut self) {
        self.playback.link_mut().unlink();
    }

    /// Returns the new link state
    pub fn toggle_link(&mut self) -> SigResult<bool> {
        if self.playback.link().is_linked() {
            self.unlink_channels();
            Ok(false)
        } else {
            self.link_channels()?;
            Ok(true)
        }
    }

    // ---- selection & glue ----

    pub fn toggle_selection_mode(&mut self) -> bool {
        let enabled = self.selector.toggle_mode();
        self.emit_rectangles();
        enabled
    }

    pub fn begin_selection(&mut self, id: ChannelId, point: PixelPoint) -> SigResult<bool> {
        self.store.channel(id)?;
        let started = self.selector.begin(id, point);
        if started {
            self.emit_rectangles();
        }
        Ok(started)
    }

    pub fn update_selection(&mut self, point: PixelPoint) -> bool {
        let moved = self.selector.update(point);
        if moved {
            self.emit_rectangles();
        }
        moved
    }

    /// Freeze the rectangle being drawn and extract the points under it
    pub fn finalize_selection(&mut self) -> SigResult<Option<Vec<SelectionRect>>> {
        let Some(id) = self.selector.pending_channel() else {
            return Ok(None);
        };
        let size = self.sink.viewport_size(id);
        let channel = self.store.channel(id)?;
        let rects = self.selector.finalize(channel, &self.mapper, size);
        self.emit_rectangles();
        Ok(rects)
    }

    /// Glue the two selections into the glued channel and emit it whole.
    /// Missing `gap`/`order` fall back to the configured defaults.
    pub fn splice_selected(&mut self, gap: Option<f64>, order: Option<usize>) -> SigResult<usize> {
        let (first, second) = self.selector.extracted_pair().ok_or(SigError::EmptyInput {
            reason: "two finalized selections are needed to glue",
        })?;
        let gap = gap.unwrap_or(self.config.glue.default_gap);
        let order = order.unwrap_or(self.config.glue.default_order);

        let glued = self.glue.splice(first, second, gap, order)?;
        let count = glued.len();
        self.store.load_points(ChannelId::Glued, glued)?;
        self.store.channel_mut(ChannelId::Glued)?.seek_end();
        self.emit(ChannelId::Glued)?;

        info!(points = count, gap, order, "spliced selections");
        Ok(count)
    }

    // ---- circular ----

    pub fn load_circular(&mut self, values: Vec<f64>) {
        self.circular = CircleSweep::new(values);
        self.circular_running = !self.circular.is_empty();
        self.emit_circle();
    }

    /// Advance the sweep. Returns false, and stops the sweep, when there is
    /// nothing loaded.
    pub fn tick_circular(&mut self) -> bool {
        if !self.circular.advance() {
            self.circular_running = false;
            return false;
        }
        self.emit_circle();
        true
    }

    pub fn is_circular_running(&self) -> bool {
        self.circular_running
    }

    pub fn stop_circular(&mut self) {
        self.circular_running = false;
    }

    pub fn circular(&self) -> &CircleSweep {
        &self.circular
    }

    // ---- inspection ----

    pub fn snapshot(&self, id: ChannelId) -> SigResult<ChannelSnapshot> {
        let channel = self.store.channel(id)?;
        Ok(ChannelSnapshot {
            channel: id,
            plotted: channel.plotted().to_vec(),
            buffered: channel.len(),
            cursor: channel.cursor(),
            playing: channel.is_playing(),
            visible: channel.is_visible(),
            color: channel.color().clone(),
            view: channel.view(),
            value_view: channel.value_view(),
        })
    }

    fn emit(&mut self, id: ChannelId) -> SigResult<()> {
        let channel = self.store.channel(id)?;
        let plotted = if channel.is_visible() {
            channel.plotted()
        } else {
            &[]
        };
        self.sink.on_channel_updated(id, plotted, channel.color());
        Ok(())
    }

    fn emit_rectangles(&mut self) {
        let rects = self.selector.rectangles();
        self.sink.on_selection_rectangles_changed(&rects);
    }

    fn emit_circle(&mut self) {
        let points = self.circular.visible_points();
        self.sink
            .on_circular_updated(&points, self.circular.current_index());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{NullSink, RecordingSink};
    use sigview_processing::PixelSize;

    const G1: ChannelId = ChannelId::Graph1;
    const G2: ChannelId = ChannelId::Graph2;

    fn engine() -> (SignalEngine<RecordingSink>, RecordingSink) {
        let sink = RecordingSink::new(PixelSize::new(100.0, 100.0));
        let engine = SignalEngine::new(EngineConfig::default(), sink.clone()).unwrap();
        (engine, sink)
    }

    fn ramp(n: usize) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
        (t.clone(), t)
    }

    #[test]
    fn test_tick_emits_plotted_prefix() {
        let (mut engine, sink) = engine();
        engine.load(G1, &[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], false).unwrap();
        engine.play(G1).unwrap();

        for _ in 0..3 {
            assert!(engine.tick(G1).unwrap());
        }
        assert!(!engine.tick(G1).unwrap());

        let log = sink.log();
        assert_eq!(
            log.plotted(G1),
            &[
                SamplePoint::new(0.0, 1.0),
                SamplePoint::new(1.0, 2.0),
                SamplePoint::new(2.0, 3.0)
            ]
        );
        assert_eq!(log.colors[&G1].as_str(), "r");
        // One update for the load, one per tick
        assert_eq!(log.update_count(G1), 4);
    }

    #[test]
    fn test_rewind_clears_plot() {
        let (mut engine, sink) = engine();
        let (t, v) = ramp(5);
        engine.load(G1, &t, &v, false).unwrap();
        engine.play(G1).unwrap();
        engine.tick(G1).unwrap();
        engine.tick(G1).unwrap();

        engine.rewind(G1).unwrap();
        let snap = engine.snapshot(G1).unwrap();
        assert_eq!(snap.cursor, 0);
        assert!(snap.plotted.is_empty());
        assert!(!snap.playing);
        assert!(sink.log().plotted(G1).is_empty());
    }

    #[test]
    fn test_shape_mismatch_surfaces() {
        let (mut engine, _) = engine();
        let err = engine.load(G1, &[0.0, 1.0], &[1.0], false).unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_hidden_channel_emits_empty() {
        let (mut engine, sink) = engine();
        let (t, v) = ramp(3);
        engine.load(G1, &t, &v, false).unwrap();
        engine.play(G1).unwrap();
        engine.tick(G1).unwrap();

        assert!(!engine.toggle_visibility(G1).unwrap());
        engine.tick(G1).unwrap();
        assert!(sink.log().plotted(G1).is_empty());
        assert_eq!(engine.snapshot(G1).unwrap().cursor, 2);

        assert!(engine.toggle_visibility(G1).unwrap());
        assert_eq!(sink.log().plotted(G1).len(), 2);
    }

    #[test]
    fn test_linked_zoom_only_when_both_playing() {
        let (mut engine, _) = engine();
        let (t, v) = ramp(101);
        engine.load(G1, &t, &v, false).unwrap();
        engine.load(G2, &t, &v, false).unwrap();
        engine.link_channels().unwrap();

        // Only one member playing: zoom stays local
        engine.play(G1).unwrap();
        engine.zoom_in(G1).unwrap();
        assert_eq!(engine.snapshot(G1).unwrap().view, ViewRange::new(25.0, 75.0));
        assert_eq!(engine.snapshot(G2).unwrap().view, ViewRange::new(0.0, 100.0));

        // Both playing: zooming the second member applies the first's result
        engine.play(G2).unwrap();
        let applied = engine.zoom_in(G2).unwrap();
        assert_eq!(applied, ViewRange::new(37.5, 62.5));
        assert_eq!(engine.snapshot(G1).unwrap().view, applied);
    }

    #[test]
    fn test_link_copies_first_view() {
        let (mut engine, _) = engine();
        let (t, v) = ramp(101);
        engine.load(G1, &t, &v, false).unwrap();
        engine.load(G2, &t, &v, false).unwrap();
        engine.set_view(G1, 10.0, 30.0).unwrap();

        assert!(engine.toggle_link().unwrap());
        assert_eq!(engine.snapshot(G2).unwrap().view, ViewRange::new(10.0, 30.0));
        assert!(!engine.toggle_link().unwrap());
    }

    #[test]
    fn test_color_mirrors_while_both_playing() {
        let (mut engine, sink) = engine();
        let (t, v) = ramp(3);
        engine.load(G1, &t, &v, false).unwrap();
        engine.load(G2, &t, &v, false).unwrap();
        engine.link_channels().unwrap();

        engine.set_color(G1, ChannelColor::new("m")).unwrap();
        assert_eq!(sink.log().colors[&G2].as_str(), "g");

        engine.play(G1).unwrap();
        engine.play(G2).unwrap();
        engine.set_color(G1, ChannelColor::new("c")).unwrap();
        assert_eq!(engine.snapshot(G2).unwrap().color.as_str(), "c");
    }

    #[test]
    fn test_select_and_splice_into_glued() {
        let (mut engine, sink) = engine();
        engine
            .load(G1, &[0.0, 1.0, 2.0, 3.0], &[0.0, 5.0, 100.0, 200.0], false)
            .unwrap();

        assert!(engine.splice_selected(None, None).is_err());
        assert!(engine.toggle_selection_mode());

        // Left half holds t = 0, 1; right half t = 2, 3
        assert!(engine.begin_selection(G1, PixelPoint::new(0.0, 0.0)).unwrap());
        engine.update_selection(PixelPoint::new(40.0, 100.0));
        assert_eq!(engine.finalize_selection().unwrap().unwrap().len(), 1);

        engine.begin_selection(G1, PixelPoint::new(60.0, 0.0)).unwrap();
        engine.update_selection(PixelPoint::new(100.0, 100.0));
        assert_eq!(engine.finalize_selection().unwrap().unwrap().len(), 2);
        assert_eq!(sink.log().rectangles.len(), 2);

        let count = engine.splice_selected(Some(2.0), Some(2)).unwrap();
        assert_eq!(count, 6);

        let glued = sink.log().plotted(ChannelId::Glued).to_vec();
        assert_eq!(glued.len(), 6);
        assert_eq!(glued[4], SamplePoint::new(3.0, 100.0));
        assert_eq!(glued[5], SamplePoint::new(4.0, 200.0));
        assert_eq!(sink.log().colors[&ChannelId::Glued].as_str(), "b");
    }

    #[test]
    fn test_move_signal_moves_tick_source() {
        let (mut engine, sink) = engine();
        let (t, v) = ramp(4);
        engine.load(G1, &t, &v, false).unwrap();

        assert!(!engine.move_signal(G1, ChannelId::Graph3).unwrap());
        engine.play(G1).unwrap();
        assert!(engine.move_signal(G1, ChannelId::Graph3).unwrap());

        assert!(engine.playback().tick_source(G1).is_none());
        assert!(engine.playback().tick_source(ChannelId::Graph3).is_some());
        assert!(engine.tick(ChannelId::Graph3).unwrap());
        assert_eq!(sink.log().plotted(ChannelId::Graph3).len(), 1);
        assert_eq!(engine.snapshot(G1).unwrap().buffered, 0);
    }

    #[test]
    fn test_speed_and_interval() {
        let (mut engine, _) = engine();
        assert_eq!(engine.set_speed(10.0).unwrap(), Duration::from_millis(100));
        assert!(matches!(
            engine.set_interval(0),
            Err(SigError::ConfigurationError { .. })
        ));
        assert_eq!(engine.playback().interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_feed_samples_are_plotted_immediately() {
        let (mut engine, sink) = engine();
        for i in 0..3 {
            engine
                .ingest_feed_sample(FeedSample {
                    channel: ChannelId::Graph3,
                    point: SamplePoint::new(1000.0 + i as f64, 50.0),
                })
                .unwrap();
        }
        assert_eq!(sink.log().plotted(ChannelId::Graph3).len(), 3);
        assert_eq!(engine.snapshot(ChannelId::Graph3).unwrap().cursor, 3);
    }

    #[test]
    fn test_circular_sweep() {
        let (mut engine, sink) = engine();
        assert!(!engine.tick_circular());

        engine.load_circular(vec![1.0, 2.0, 3.0]);
        assert!(engine.is_circular_running());
        for _ in 0..100 {
            assert!(engine.tick_circular());
        }
        assert!(sink.log().circle.len() >= 2);

        engine.load_circular(Vec::new());
        assert!(!engine.is_circular_running());
    }

    #[test]
    fn test_views_survive_unordered_times() {
        let (mut engine, _sink) = engine();
        engine.load(G1, &[2.0, 1.0, 0.0], &[0.0, 1.0, 2.0], false).unwrap();
        let view = engine.zoom_in(G1).unwrap();
        assert!(view.min >= 0.0 && view.max <= 2.0);
        assert!(view.span() < 2.0);

        engine.load(G2, &[5.0, 6.0], &[0.0, 0.0], false).unwrap();
        engine.load(G2, &[0.0, 1.0], &[0.0, 0.0], true).unwrap();
        let view = engine.zoom_out(G2).unwrap();
        assert!(view.min >= 0.0 && view.max <= 6.0);
        engine.recenter(G2).unwrap();
        engine.pan(G2, Axis::Time, 3.0).unwrap();

        engine.load(G1, &[f64::NAN, 2.0], &[0.0, 1.0], false).unwrap();
        let view = engine.set_view(G1, 0.0, 1.0).unwrap();
        assert!(!view.min.is_nan());
        engine.link_channels().unwrap();
    }

    #[test]
    fn test_unusable_rate_is_config_error() {
        let mut config = EngineConfig::default();
        config.playback.sampling_rate = 1e-30;
        assert!(matches!(
            SignalEngine::new(config, NullSink),
            Err(SigError::ConfigurationError { .. })
        ));
    }
}
