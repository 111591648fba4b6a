//! LinkGroup: synchronized control of two channels

use crate::channel::ChannelId;
use crate::error::SigResult;
use crate::store::ChannelStore;
use serde::{Deserialize, Serialize};

/// Symmetric link between exactly two channels.
///
/// Linking only ever mirrors actions; whether a mirror happens depends on
/// the playing state of the members, which callers check through
/// [`LinkGroup::partner_while_playing`] or [`LinkGroup::both_playing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGroup {
    first: ChannelId,
    second: ChannelId,
    linked: bool,
}

impl LinkGroup {
    /// Unlinked group of two channels
    pub fn new(first: ChannelId, second: ChannelId) -> Self {
        Self {
            first,
            second,
            linked: false,
        }
    }

    /// First member; its view is the shared truth for mirrored actions
    pub fn first(&self) -> ChannelId {
        self.first
    }

    pub fn second(&self) -> ChannelId {
        self.second
    }

    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn link(&mut self) {
        self.linked = true;
    }

    pub fn unlink(&mut self) {
        self.linked = false;
    }

    /// Flip the link, returning the new state
    pub fn toggle(&mut self) -> bool {
        self.linked = !self.linked;
        self.linked
    }

    /// Other member of the pair while linked
    pub fn partner(&self, id: ChannelId) -> Option<ChannelId> {
        if !self.linked {
            return None;
        }
        if id == self.first {
            Some(self.second)
        } else if id == self.second {
            Some(self.first)
        } else {
            None
        }
    }

    /// Other member of the pair, when linked and that member is playing
    pub fn partner_while_playing(
        &self,
        id: ChannelId,
        store: &ChannelStore,
    ) -> SigResult<Option<ChannelId>> {
        match self.partner(id) {
            Some(other) if store.is_playing(other)? => Ok(Some(other)),
            _ => Ok(None),
        }
    }

    /// Linked, `id` is a member, and both members are playing
    pub fn both_playing(&self, id: ChannelId, store: &ChannelStore) -> SigResult<bool> {
        if self.partner(id).is_none() {
            return Ok(false);
        }
        Ok(store.is_playing(self.first)? && store.is_playing(self.second)?)
    }
}

impl Default for LinkGroup {
    fn default() -> Self {
        Self::new(ChannelId::Graph1, ChannelId::Graph2)
    }
}
