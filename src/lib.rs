#![forbid(unsafe_code)]
//! Temporal lookup and frame-state resolution for construction-schedule (4D) animations.
//!
//! A [`AnimationSession`] flattens a task forest into a [`ScheduleIndex`], resolves effective
//! dates, maps them onto frame windows and evaluates the visibility and appearance of every
//! product per frame. The resulting [`StateTable`] is turned into per-frame batches for a
//! [`RenderAdapter`].
//!
//! ```no_run
//! use schedule4d::{Project, RecordingAdapter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let project = Project::from_reader(std::fs::File::open("project.json")?)?;
//! let mut session = project.into_session();
//! let mut adapter = RecordingAdapter::new();
//! let (build, report) = session.rebuild(&mut adapter)?;
//! println!("{} keys, {} batches", build.stats.state_keys, report.batches);
//! # Ok(())
//! # }
//! ```

mod appearance;
mod apply;
mod foundation;
mod project;
mod resolve;
mod scene;
mod schedule;
mod session;
mod timeline;

pub use appearance::library::{
    Assignment, AssignmentTable, DEFAULT_GROUP, FALLBACK_PROFILE, ProfileAssignment, ProfileGroup,
    ProfileLibrary, ProfileSource, TaskProfiles,
};
pub use appearance::profile::{AppearanceEffect, AppearanceProfile, StateColor};
pub use apply::adapter::{AdapterCall, AppearanceUpdate, RecordingAdapter, RenderAdapter};
pub use apply::batch::{
    ApplyReport, BatchFailure, BatchKind, BatchPayload, BatchStateApplier, StateBatch,
};
pub use foundation::core::{Fps, FrameIndex, FrameRange, Rgba};
pub use foundation::error::{ScheduleError, ScheduleResult};
pub use foundation::ids::{ObjectHandle, ProductId, ProductIdx, TaskId, TaskIdx};
pub use project::Project;
pub use resolve::fingerprint::{StateFingerprint, fingerprint_table};
pub use resolve::table::{StateKey, StateTable, StateTrack};
pub use resolve::visibility::{ResolvedState, VisibilityResolver};
pub use scene::objects::{ObjectCache, ObjectCacheStats, Scene, SceneObject};
pub use schedule::dates::{DatePriority, DateRange, DateResolver, EffectiveDates};
pub use schedule::index::{
    IndexOptions, ProductLink, Relationship, ScheduleIndex, TaskLink, TaskRecord,
};
pub use schedule::model::{DateSource, NOTDEFINED, Schedule, TaskDates, TaskDef};
pub use session::animation_session::{
    AnimationBuild, AnimationSession, BuildCounters, BuildStats,
};
pub use timeline::settings::{
    AnimationSettings, GroupStackEntry, MAX_ANIMATION_FRAMES, Speed, Timeline,
};
pub use timeline::window::{FrameWindow, FrameWindowCalculator, FrameWindowTable, TaskPhase};
