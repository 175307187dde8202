use crate::appearance::profile::StateColor;
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::ids::{ProductId, ProductIdx};
use crate::resolve::visibility::ResolvedState;

/// A product's state from `frame` until the next key.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct StateKey {
    pub frame: FrameIndex,
    pub visible: bool,
    pub color: StateColor,
    pub progress: f32,
}

impl StateKey {
    /// Same visible state, ignoring the frame.
    pub fn same_state(&self, other: &Self) -> bool {
        self.visible == other.visible
            && self.color == other.color
            && self.progress == other.progress
    }

    /// `true` when `other` differs in appearance (color or progress).
    pub fn appearance_differs(&self, other: &Self) -> bool {
        self.color != other.color || self.progress != other.progress
    }

    fn at(self, product: ProductId, frame: FrameIndex) -> ResolvedState {
        ResolvedState {
            product,
            frame,
            visible: self.visible,
            color: self.color,
            progress: self.progress,
        }
    }
}

impl From<ResolvedState> for StateKey {
    fn from(s: ResolvedState) -> Self {
        Self {
            frame: s.frame,
            visible: s.visible,
            color: s.color,
            progress: s.progress,
        }
    }
}

/// Run-length encoded states of one product. The first key sits on the first frame of the table.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StateTrack {
    pub product: ProductId,
    pub keys: Vec<StateKey>,
}

impl StateTrack {
    pub fn key_at(&self, frame: FrameIndex) -> Option<&StateKey> {
        let n = self.keys.partition_point(|k| k.frame <= frame);
        n.checked_sub(1).map(|i| &self.keys[i])
    }
}

/// Resolved state of every product over a frame range, stored as per-product change lists.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct StateTable {
    frames: FrameRange,
    tracks: Vec<StateTrack>,
}

impl StateTable {
    pub(crate) fn new(frames: FrameRange, tracks: Vec<StateTrack>) -> Self {
        Self { frames, tracks }
    }

    pub fn frames(&self) -> FrameRange {
        self.frames
    }

    /// Tracks in product index order.
    pub fn tracks(&self) -> &[StateTrack] {
        &self.tracks
    }

    pub fn track(&self, product: ProductIdx) -> Option<&StateTrack> {
        self.tracks.get(product.as_usize())
    }

    pub fn track_for(&self, product: ProductId) -> Option<&StateTrack> {
        self.tracks.iter().find(|t| t.product == product)
    }

    /// State of `product` at `frame`, or `None` outside the table.
    pub fn state_at(&self, product: ProductIdx, frame: FrameIndex) -> Option<ResolvedState> {
        if !self.frames.contains(frame) {
            return None;
        }
        let track = self.track(product)?;
        track.key_at(frame).map(|k| k.at(track.product, frame))
    }

    /// Every product's state at `frame`, in product order.
    pub fn states_at(&self, frame: FrameIndex) -> impl Iterator<Item = ResolvedState> + '_ {
        let inside = self.frames.contains(frame);
        self.tracks
            .iter()
            .filter(move |_| inside)
            .filter_map(move |t| t.key_at(frame).map(|k| k.at(t.product, frame)))
    }

    /// Total number of stored keys.
    pub fn key_count(&self) -> usize {
        self.tracks.iter().map(|t| t.keys.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
