//! PlaybackController: per-channel Stopped/Playing state machine with
//! link propagation

use sigview_core::{config_error, ChannelId, ChannelStore, LinkGroup, SamplePoint, SigResult};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// An active tick source. A new `generation` means the source was
/// restarted and any pending deadline for it is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSource {
    pub interval: Duration,
    pub generation: u64,
}

/// Drives playback of every channel in a [`ChannelStore`]
#[derive(Debug, Clone)]
pub struct PlaybackController {
    interval: Duration,
    sources: BTreeMap<ChannelId, TickSource>,
    generation: u64,
    link: LinkGroup,
}

impl PlaybackController {
    pub fn new(interval: Duration, link: LinkGroup) -> SigResult<Self> {
        check_interval(interval)?;
        Ok(Self {
            interval,
            sources: BTreeMap::new(),
            generation: 0,
            link,
        })
    }

    /// Interval used for newly started tick sources
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn link(&self) -> &LinkGroup {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut LinkGroup {
        &mut self.link
    }

    /// Active tick sources
    pub fn tick_sources(&self) -> impl Iterator<Item = (ChannelId, TickSource)> + '_ {
        self.sources.iter().map(|(&id, &source)| (id, source))
    }

    pub fn tick_source(&self, id: ChannelId) -> Option<TickSource> {
        self.sources.get(&id).copied()
    }

    /// Start playing `id`, and its linked partner when that one is
    /// already playing. Returns the channels that were started.
    pub fn play(&mut self, store: &mut ChannelStore, id: ChannelId) -> SigResult<Vec<ChannelId>> {
        let targets = self.targets(store, id)?;
        for &target in &targets {
            self.start(store, target)?;
        }
        Ok(targets)
    }

    /// Stop `id` keeping its cursor, mirrored onto a playing partner
    pub fn pause(&mut self, store: &mut ChannelStore, id: ChannelId) -> SigResult<Vec<ChannelId>> {
        let targets = self.targets(store, id)?;
        for &target in &targets {
            self.stop(store, target)?;
        }
        Ok(targets)
    }

    /// Stop `id` and move its cursor back to the first sample, mirrored
    /// onto a playing partner
    pub fn rewind(&mut self, store: &mut ChannelStore, id: ChannelId) -> SigResult<Vec<ChannelId>> {
        let targets = self.targets(store, id)?;
        for &target in &targets {
            self.stop(store, target)?;
            store.channel_mut(target)?.rewind();
        }
        debug!(?targets, "rewound");
        Ok(targets)
    }

    /// Play/pause button. A linked pair moves together: if either member
    /// is playing both stop, otherwise both start.
    pub fn toggle_play_pause(
        &mut self,
        store: &mut ChannelStore,
        id: ChannelId,
    ) -> SigResult<Vec<ChannelId>> {
        let targets = match self.link.partner(id) {
            Some(other) => vec![id, other],
            None => vec![id],
        };

        let mut any_playing = false;
        for &target in &targets {
            any_playing |= store.is_playing(target)?;
        }

        for &target in &targets {
            if any_playing {
                self.stop(store, target)?;
            } else {
                self.start(store, target)?;
            }
        }
        Ok(targets)
    }

    /// Plot the next sample of a playing channel. Stopped channels and
    /// channels at the end of their buffer are left alone.
    pub fn tick(&mut self, store: &mut ChannelStore, id: ChannelId) -> SigResult<Option<SamplePoint>> {
        let channel = store.channel_mut(id)?;
        if !channel.is_playing() {
            return Ok(None);
        }
        Ok(channel.advance())
    }

    /// Change the global interval, restarting every active tick source
    pub fn set_interval(&mut self, interval: Duration) -> SigResult<()> {
        check_interval(interval)?;
        self.interval = interval;
        let ids: Vec<ChannelId> = self.sources.keys().copied().collect();
        for id in ids {
            self.restart_source(id);
        }
        info!(interval_ms = interval.as_millis() as u64, "playback interval changed");
        Ok(())
    }

    /// Bring tick sources in line with the playing flags of the store,
    /// for changes made behind the controller's back
    pub fn sync_with(&mut self, store: &ChannelStore) {
        self.sources.retain(|&id, _| store.is_playing(id).unwrap_or(false));
        let missing: Vec<ChannelId> = store
            .ids()
            .filter(|&id| store.is_playing(id).unwrap_or(false) && !self.sources.contains_key(&id))
            .collect();
        for id in missing {
            self.restart_source(id);
        }
    }

    /// `id` plus its partner, when linked and the partner is playing.
    /// Evaluated before any transition is applied.
    fn targets(&self, store: &ChannelStore, id: ChannelId) -> SigResult<Vec<ChannelId>> {
        store.channel(id)?;
        Ok(match self.link.partner_while_playing(id, store)? {
            Some(other) => vec![id, other],
            None => vec![id],
        })
    }

    fn start(&mut self, store: &mut ChannelStore, id: ChannelId) -> SigResult<()> {
        store.set_playing(id, true)?;
        if !self.sources.contains_key(&id) {
            self.restart_source(id);
        }
        Ok(())
    }

    fn stop(&mut self, store: &mut ChannelStore, id: ChannelId) -> SigResult<()> {
        store.set_playing(id, false)?;
        self.sources.remove(&id);
        Ok(())
    }

    fn restart_source(&mut self, id: ChannelId) {
        self.generation += 1;
        self.sources.insert(
            id,
            TickSource {
                interval: self.interval,
                generation: self.generation,
            },
        );
    }
}

fn check_interval(interval: Duration) -> SigResult<()> {
    if interval.is_zero() {
        return Err(config_error!("Tick interval must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const G1: ChannelId = ChannelId::Graph1;
    const G2: ChannelId = ChannelId::Graph2;

    fn setup() -> (ChannelStore, PlaybackController) {
        let mut store = ChannelStore::new();
        store.load(G1, &[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], false).unwrap();
        store.load(G2, &[0.0, 1.0], &[5.0, 6.0], false).unwrap();
        let controller =
            PlaybackController::new(Duration::from_millis(20), LinkGroup::default()).unwrap();
        (store, controller)
    }

    #[test]
    fn test_three_ticks_then_hold() {
        let (mut store, mut pc) = setup();
        pc.play(&mut store, G1).unwrap();

        for _ in 0..3 {
            assert!(pc.tick(&mut store, G1).unwrap().is_some());
        }
        let channel = store.channel(G1).unwrap();
        assert_eq!(channel.cursor(), 3);
        assert_eq!(channel.plotted(), channel.buffer());

        assert_eq!(pc.tick(&mut store, G1).unwrap(), None);
        assert_eq!(store.channel(G1).unwrap().cursor(), 3);
        assert!(store.is_playing(G1).unwrap());
    }

    #[test]
    fn test_tick_on_stopped_channel_is_noop() {
        let (mut store, mut pc) = setup();
        assert_eq!(pc.tick(&mut store, G1).unwrap(), None);
        assert_eq!(store.channel(G1).unwrap().cursor(), 0);
    }

    #[test]
    fn test_pause_keeps_cursor_and_rewind_clears() {
        let (mut store, mut pc) = setup();
        pc.play(&mut store, G1).unwrap();
        pc.tick(&mut store, G1).unwrap();
        pc.tick(&mut store, G1).unwrap();

        pc.pause(&mut store, G1).unwrap();
        assert_eq!(store.channel(G1).unwrap().cursor(), 2);
        assert!(pc.tick_source(G1).is_none());

        pc.play(&mut store, G1).unwrap();
        pc.rewind(&mut store, G1).unwrap();
        let channel = store.channel(G1).unwrap();
        assert_eq!(channel.cursor(), 0);
        assert!(channel.plotted().is_empty());
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_link_propagates_when_partner_playing() {
        let (mut store, mut pc) = setup();
        pc.link_mut().link();

        // Partner stopped: only the requested channel starts
        assert_eq!(pc.play(&mut store, G1).unwrap(), vec![G1]);
        assert!(!store.is_playing(G2).unwrap());

        // Partner playing: pause mirrors
        pc.play(&mut store, G2).unwrap();
        assert_eq!(pc.pause(&mut store, G1).unwrap(), vec![G1, G2]);
        assert!(!store.is_playing(G1).unwrap());
        assert!(!store.is_playing(G2).unwrap());
    }

    #[test]
    fn test_rewind_mirrors_when_partner_playing() {
        let (mut store, mut pc) = setup();
        pc.link_mut().link();
        pc.play(&mut store, G1).unwrap();
        pc.play(&mut store, G2).unwrap();
        pc.tick(&mut store, G1).unwrap();
        pc.tick(&mut store, G2).unwrap();

        assert_eq!(pc.rewind(&mut store, G1).unwrap(), vec![G1, G2]);
        for id in [G1, G2] {
            let channel = store.channel(id).unwrap();
            assert_eq!(channel.cursor(), 0);
            assert!(channel.plotted().is_empty());
            assert!(!channel.is_playing());
            assert!(pc.tick_source(id).is_none());
        }
    }

    #[test]
    fn test_rewind_leaves_stopped_partner_alone() {
        let (mut store, mut pc) = setup();
        pc.link_mut().link();
        pc.play(&mut store, G2).unwrap();
        pc.tick(&mut store, G2).unwrap();
        pc.pause(&mut store, G2).unwrap();
        pc.play(&mut store, G1).unwrap();
        pc.tick(&mut store, G1).unwrap();

        assert_eq!(pc.rewind(&mut store, G1).unwrap(), vec![G1]);
        assert_eq!(store.channel(G1).unwrap().cursor(), 0);
        assert!(!store.is_playing(G1).unwrap());
        assert_eq!(store.channel(G2).unwrap().cursor(), 1);
        assert!(!store.is_playing(G2).unwrap());
    }

    #[test]
    fn test_unlinked_channels_are_independent() {
        let (mut store, mut pc) = setup();
        pc.play(&mut store, G1).unwrap();
        pc.play(&mut store, G2).unwrap();
        pc.rewind(&mut store, G1).unwrap();
        assert!(store.is_playing(G2).unwrap());
    }

    #[test]
    fn test_toggle_play_pause_linked() {
        let (mut store, mut pc) = setup();
        pc.link_mut().link();
        pc.play(&mut store, G2).unwrap();

        // One member playing: both stop
        pc.toggle_play_pause(&mut store, G1).unwrap();
        assert!(!store.is_playing(G1).unwrap());
        assert!(!store.is_playing(G2).unwrap());

        // Neither playing: both start
        pc.toggle_play_pause(&mut store, G1).unwrap();
        assert!(store.is_playing(G1).unwrap());
        assert!(store.is_playing(G2).unwrap());
    }

    #[test]
    fn test_set_interval_restarts_sources() {
        let (mut store, mut pc) = setup();
        pc.play(&mut store, G1).unwrap();
        pc.tick(&mut store, G1).unwrap();
        let before = pc.tick_source(G1).unwrap();

        pc.set_interval(Duration::from_millis(5)).unwrap();
        let after = pc.tick_source(G1).unwrap();
        assert_eq!(after.interval, Duration::from_millis(5));
        assert!(after.generation > before.generation);
        assert_eq!(store.channel(G1).unwrap().cursor(), 1);
        assert!(pc.tick_source(G2).is_none());

        assert!(pc.set_interval(Duration::ZERO).is_err());
        assert_eq!(pc.interval(), Duration::from_millis(5));
    }

    #[test]
    fn test_play_twice_keeps_source() {
        let (mut store, mut pc) = setup();
        pc.play(&mut store, G1).unwrap();
        let first = pc.tick_source(G1).unwrap();
        pc.play(&mut store, G1).unwrap();
        assert_eq!(pc.tick_source(G1).unwrap(), first);
    }

    #[test]
    fn test_sync_with_store() {
        let (mut store, mut pc) = setup();
        pc.play(&mut store, G1).unwrap();
        assert!(store.move_signal(G1, ChannelId::Graph3).unwrap());

        pc.sync_with(&store);
        assert!(pc.tick_source(G1).is_none());
        assert!(pc.tick_source(ChannelId::Graph3).is_some());
    }
}
