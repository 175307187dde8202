use chrono::NaiveDateTime;

use crate::foundation::ids::TaskIdx;
use crate::schedule::index::ScheduleIndex;
use crate::schedule::model::{DateSource, TaskDates};

/// Ordered list of date sources tried for each of start and finish.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DatePriority(pub Vec<DateSource>);

impl Default for DatePriority {
    fn default() -> Self {
        Self(vec![
            DateSource::Actual,
            DateSource::Schedule,
            DateSource::Early,
            DateSource::Late,
        ])
    }
}

impl DatePriority {
    fn start(&self, dates: &TaskDates) -> Option<NaiveDateTime> {
        self.0.iter().find_map(|s| s.start(dates))
    }

    fn finish(&self, dates: &TaskDates) -> Option<NaiveDateTime> {
        self.0.iter().find_map(|s| s.finish(dates))
    }
}

/// Effective dates of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectiveDates {
    Resolved {
        start: NaiveDateTime,
        finish: NaiveDateTime,
    },
    /// No start or no finish could be found; the task contributes no frame window.
    Indeterminate,
}

impl EffectiveDates {
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Real-world date span `[start, finish]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
}

/// Effective start/finish per task, cached for one schedule index generation.
#[derive(Clone, Debug, Default)]
pub struct DateResolver {
    dates: Vec<EffectiveDates>,
    range: Option<DateRange>,
    indeterminate: usize,
}

impl DateResolver {
    /// Resolve every task of `index`.
    ///
    /// Each of start and finish independently takes the first source in `priority` that has a
    /// value. A field still missing is inherited from the descendants: earliest start, latest
    /// finish.
    #[tracing::instrument(skip_all, fields(tasks = index.len()))]
    pub fn resolve(index: &ScheduleIndex, priority: &DatePriority) -> Self {
        let tasks = index.tasks();
        let mut partial: Vec<(Option<NaiveDateTime>, Option<NaiveDateTime>)> = tasks
            .iter()
            .map(|t| (priority.start(&t.dates), priority.finish(&t.dates)))
            .collect();

        // Reverse pre-order: every child is final before its parent reads it.
        for i in (0..tasks.len()).rev() {
            let (own_start, own_finish) = partial[i];
            if own_start.is_some() && own_finish.is_some() {
                continue;
            }
            let (mut start, mut finish) = (own_start, own_finish);
            for c in &tasks[i].children {
                let (cs, cf) = partial[c.as_usize()];
                if own_start.is_none() {
                    start = earliest(start, cs);
                }
                if own_finish.is_none() {
                    finish = finish.max(cf);
                }
            }
            partial[i] = (start, finish);
        }

        let mut out = Self {
            dates: Vec::with_capacity(tasks.len()),
            range: None,
            indeterminate: 0,
        };
        for (rec, (start, finish)) in tasks.iter().zip(partial) {
            let eff = match (start, finish) {
                (Some(start), Some(finish)) if finish < start => {
                    tracing::warn!(task = %rec.id, %start, %finish, "finish precedes start; clamping");
                    EffectiveDates::Resolved {
                        start,
                        finish: start,
                    }
                }
                (Some(start), Some(finish)) => EffectiveDates::Resolved { start, finish },
                _ => {
                    tracing::debug!(task = %rec.id, "no resolvable dates");
                    out.indeterminate += 1;
                    EffectiveDates::Indeterminate
                }
            };
            if let EffectiveDates::Resolved { start, finish } = eff {
                out.range = Some(match out.range {
                    None => DateRange { start, finish },
                    Some(r) => DateRange {
                        start: r.start.min(start),
                        finish: r.finish.max(finish),
                    },
                });
            }
            out.dates.push(eff);
        }
        out
    }

    pub fn get(&self, idx: TaskIdx) -> EffectiveDates {
        self.dates
            .get(idx.as_usize())
            .copied()
            .unwrap_or(EffectiveDates::Indeterminate)
    }

    /// Earliest start and latest finish over all resolved tasks.
    pub fn schedule_range(&self) -> Option<DateRange> {
        self.range
    }

    pub fn indeterminate_count(&self) -> usize {
        self.indeterminate
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn earliest(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/dates.rs"]
mod tests;
