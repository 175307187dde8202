use crate::foundation::ids::TaskId;

/// Result alias used across the crate.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Errors surfaced by schedule indexing, timeline setup and state application.
///
/// Configuration problems (cycles, duplicate ids, missing settings) abort a rebuild. Missing dates
/// and missing profile assignments are never reported here; they fall back locally.
#[derive(thiserror::Error, Debug)]
pub enum ScheduleError {
    /// Input data failed a structural check.
    #[error("validation error: {0}")]
    Validation(String),

    /// The task hierarchy contains a cycle reachable through `task`.
    #[error("cyclic schedule: task {task} is part of a parent/child cycle")]
    CyclicSchedule {
        /// First task found on the cycle, in declaration order.
        task: TaskId,
    },

    /// The same task id was declared twice.
    #[error("duplicate task id {task}")]
    DuplicateTask {
        /// Offending id.
        task: TaskId,
    },

    /// A task lists a child that does not exist.
    #[error("task {parent} references unknown child task {child}")]
    UnknownTask {
        /// Task declaring the child.
        parent: TaskId,
        /// Missing child id.
        child: TaskId,
    },

    /// A task is listed as the child of more than one parent.
    #[error("task {task} has more than one parent")]
    MultipleParents {
        /// Offending id.
        task: TaskId,
    },

    /// A setting required for the build is absent.
    #[error("missing setting: {0}")]
    MissingSetting(String),

    /// A cache was read after it was invalidated.
    #[error("stale cache: {0}")]
    StaleCache(String),

    /// The rendering adapter rejected a batch.
    #[error("adapter error: {0}")]
    Adapter(String),

    /// Project (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScheduleError {
    /// Build a [`ScheduleError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScheduleError::MissingSetting`].
    pub fn missing_setting(msg: impl Into<String>) -> Self {
        Self::MissingSetting(msg.into())
    }

    /// Build a [`ScheduleError::StaleCache`].
    pub fn stale_cache(msg: impl Into<String>) -> Self {
        Self::StaleCache(msg.into())
    }

    /// Build a [`ScheduleError::Adapter`].
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Adapter(msg.into())
    }

    /// Build a [`ScheduleError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors that indicate a broken schedule or settings rather than a runtime fault.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::CyclicSchedule { .. }
                | Self::DuplicateTask { .. }
                | Self::UnknownTask { .. }
                | Self::MultipleParents { .. }
                | Self::MissingSetting(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
