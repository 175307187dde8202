use std::io::Read;

use crate::appearance::library::{AssignmentTable, ProfileLibrary};
use crate::foundation::error::{ScheduleError, ScheduleResult};
use crate::scene::objects::Scene;
use crate::schedule::model::Schedule;
use crate::session::animation_session::AnimationSession;
use crate::timeline::settings::AnimationSettings;

/// Every input of a 4D animation in one serializable document.
///
/// ```json
/// {
///   "schedule": { "tasks": [ { "id": 1, "outputs": [10], "dates": { ... } } ] },
///   "scene": { "objects": [ { "handle": 1, "product": 10 } ] },
///   "settings": { "frames": { "start": 1, "end": 250 } }
/// }
/// ```
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub schedule: Schedule,
    #[serde(default)]
    pub scene: Scene,
    /// Profile groups; the built-in DEFAULT group is always added.
    #[serde(default)]
    pub profiles: ProfileLibrary,
    #[serde(default)]
    pub assignments: AssignmentTable,
    #[serde(default)]
    pub settings: AnimationSettings,
}

impl Project {
    pub fn from_json_str(s: &str) -> ScheduleResult<Self> {
        serde_json::from_str(s).map_err(|e| ScheduleError::serde(e.to_string()))
    }

    pub fn from_reader(r: impl Read) -> ScheduleResult<Self> {
        serde_json::from_reader(r).map_err(|e| ScheduleError::serde(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> ScheduleResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScheduleError::serde(e.to_string()))
    }

    pub fn into_session(self) -> AnimationSession {
        AnimationSession::new(
            self.schedule,
            self.scene,
            self.profiles,
            self.assignments,
            self.settings,
        )
    }
}
