use chrono::NaiveDateTime;

use crate::foundation::ids::{ProductId, TaskId};

/// Predefined type assumed when a task declares none.
pub const NOTDEFINED: &str = "NOTDEFINED";

/// Boundary schedule: a flat list of task definitions forming a forest through `children`.
///
/// Roots are the tasks no other task lists as a child, in declaration order.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Schedule {
    /// All tasks of the schedule.
    pub tasks: Vec<TaskDef>,
}

/// One task as delivered by the schedule collaborator.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TaskDef {
    /// Stable task id.
    pub id: TaskId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Predefined type (`CONSTRUCTION`, `DEMOLITION`, ...), used for profile fallback.
    #[serde(default = "default_predefined_type")]
    pub predefined_type: String,
    /// Nested tasks, in display order.
    #[serde(default)]
    pub children: Vec<TaskId>,
    /// Products the task builds.
    #[serde(default)]
    pub outputs: Vec<ProductId>,
    /// Products the task consumes or removes.
    #[serde(default)]
    pub inputs: Vec<ProductId>,
    /// Raw date fields.
    #[serde(default)]
    pub dates: TaskDates,
}

fn default_predefined_type() -> String {
    NOTDEFINED.to_owned()
}

impl TaskDef {
    /// Task with the given id and no links, dates or children.
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            name: String::new(),
            predefined_type: default_predefined_type(),
            children: Vec::new(),
            outputs: Vec::new(),
            inputs: Vec::new(),
            dates: TaskDates::default(),
        }
    }
}

/// Raw, optional date fields of a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaskDates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_start: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_finish: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_finish: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_start: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_finish: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_start: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_finish: Option<NaiveDateTime>,
}

/// Family of date fields a resolver may read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    Schedule,
    Actual,
    Early,
    Late,
}

impl DateSource {
    pub fn start(self, dates: &TaskDates) -> Option<NaiveDateTime> {
        match self {
            Self::Schedule => dates.schedule_start,
            Self::Actual => dates.actual_start,
            Self::Early => dates.early_start,
            Self::Late => dates.late_start,
        }
    }

    pub fn finish(self, dates: &TaskDates) -> Option<NaiveDateTime> {
        match self {
            Self::Schedule => dates.schedule_finish,
            Self::Actual => dates.actual_finish,
            Self::Early => dates.early_finish,
            Self::Late => dates.late_finish,
        }
    }
}
