use crate::foundation::core::{FrameIndex, Rgba};
use crate::foundation::error::ScheduleResult;
use crate::foundation::ids::ObjectHandle;

/// Concrete appearance of one object from a given frame on.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct AppearanceUpdate {
    pub object: ObjectHandle,
    pub color: Rgba,
    /// Effect progress in `[0, 1]`.
    pub progress: f32,
}

/// Rendering side of state application.
///
/// Ordering contract: calls arrive in non-decreasing frame order, and within one frame every
/// visibility call precedes the appearance call. How the host realizes a change (keyframes,
/// shading, ...) is up to the implementation.
pub trait RenderAdapter {
    fn set_visibility(
        &mut self,
        frame: FrameIndex,
        visible: bool,
        objects: &[ObjectHandle],
    ) -> ScheduleResult<()>;

    fn set_appearance(
        &mut self,
        frame: FrameIndex,
        updates: &[AppearanceUpdate],
    ) -> ScheduleResult<()>;
}

/// One call received by a [`RecordingAdapter`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AdapterCall {
    Visibility {
        frame: FrameIndex,
        visible: bool,
        objects: Vec<ObjectHandle>,
    },
    Appearance {
        frame: FrameIndex,
        updates: Vec<AppearanceUpdate>,
    },
}

impl AdapterCall {
    pub fn frame(&self) -> FrameIndex {
        match self {
            Self::Visibility { frame, .. } | Self::Appearance { frame, .. } => *frame,
        }
    }
}

/// In-memory adapter for tests and the CLI.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    /// Calls in arrival order.
    pub calls: Vec<AdapterCall>,
}

impl RecordingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visibility of `object` after replaying every recorded call up to and including `frame`.
    pub fn visibility_at(&self, object: ObjectHandle, frame: FrameIndex) -> Option<bool> {
        self.calls
            .iter()
            .take_while(|c| c.frame() <= frame)
            .filter_map(|c| match c {
                AdapterCall::Visibility {
                    visible, objects, ..
                } if objects.contains(&object) => Some(*visible),
                _ => None,
            })
            .last()
    }
}

impl RenderAdapter for RecordingAdapter {
    fn set_visibility(
        &mut self,
        frame: FrameIndex,
        visible: bool,
        objects: &[ObjectHandle],
    ) -> ScheduleResult<()> {
        self.calls.push(AdapterCall::Visibility {
            frame,
            visible,
            objects: objects.to_vec(),
        });
        Ok(())
    }

    fn set_appearance(
        &mut self,
        frame: FrameIndex,
        updates: &[AppearanceUpdate],
    ) -> ScheduleResult<()> {
        self.calls.push(AdapterCall::Appearance {
            frame,
            updates: updates.to_vec(),
        });
        Ok(())
    }
}
