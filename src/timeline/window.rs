use chrono::NaiveDateTime;

use crate::foundation::core::FrameIndex;
use crate::foundation::ids::{TaskId, TaskIdx};
use crate::foundation::math::round_half_even;
use crate::schedule::dates::{DateResolver, EffectiveDates};
use crate::schedule::index::ScheduleIndex;
use crate::timeline::settings::Timeline;

/// Where a frame falls relative to a task window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    BeforeStart,
    Active,
    AfterEnd,
}

/// Inclusive frame interval during which a task is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameWindow {
    pub task: TaskId,
    pub start: FrameIndex,
    pub finish: FrameIndex,
}

impl FrameWindow {
    pub fn phase_at(&self, frame: FrameIndex) -> TaskPhase {
        if frame < self.start {
            TaskPhase::BeforeStart
        } else if frame <= self.finish {
            TaskPhase::Active
        } else {
            TaskPhase::AfterEnd
        }
    }
}

/// Linear date → frame mapping over a resolved [`Timeline`].
#[derive(Clone, Copy, Debug)]
pub struct FrameWindowCalculator {
    timeline: Timeline,
}

impl FrameWindowCalculator {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }

    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    /// Map a date onto the frame range, rounding half to even.
    ///
    /// Dates outside the range clamp to its bounds. A zero-length date range maps everything to
    /// the first frame.
    pub fn date_to_frame(&self, date: NaiveDateTime) -> FrameIndex {
        let frames = self.timeline.frames;
        let dates = self.timeline.dates;
        let span_ms = (dates.finish - dates.start).num_milliseconds();
        if span_ms <= 0 {
            return frames.start;
        }
        let date = date.clamp(dates.start, dates.finish);
        let t = (date - dates.start).num_milliseconds() as f64 / span_ms as f64;
        let f = frames.start.0 as f64 + t * frames.end.0.abs_diff(frames.start.0) as f64;
        frames.clamp(FrameIndex(round_half_even(f)))
    }

    /// Window for a task, or `None` when its dates are indeterminate.
    pub fn window(&self, task: TaskId, dates: EffectiveDates) -> Option<FrameWindow> {
        let EffectiveDates::Resolved { start, finish } = dates else {
            return None;
        };
        let start = self.date_to_frame(start);
        let finish = self.date_to_frame(finish).max(start);
        Some(FrameWindow {
            task,
            start,
            finish,
        })
    }
}

/// Frame windows of every indexed task, addressed by [`TaskIdx`].
#[derive(Clone, Debug, Default)]
pub struct FrameWindowTable {
    windows: Vec<Option<FrameWindow>>,
}

impl FrameWindowTable {
    #[tracing::instrument(skip_all, fields(tasks = index.len()))]
    pub fn compute(
        index: &ScheduleIndex,
        dates: &DateResolver,
        calc: &FrameWindowCalculator,
    ) -> Self {
        let windows = index
            .tasks()
            .iter()
            .enumerate()
            .map(|(i, rec)| calc.window(rec.id, dates.get(TaskIdx(i as u32))))
            .collect();
        Self { windows }
    }

    pub fn get(&self, idx: TaskIdx) -> Option<FrameWindow> {
        self.windows.get(idx.as_usize()).copied().flatten()
    }

    /// Windows in task pre-order, skipping tasks without one.
    pub fn iter(&self) -> impl Iterator<Item = FrameWindow> + '_ {
        self.windows.iter().filter_map(|w| *w)
    }

    /// Number of tasks that have a window.
    pub fn count(&self) -> usize {
        self.windows.iter().filter(|w| w.is_some()).count()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/window.rs"]
mod tests;
