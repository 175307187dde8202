use super::*;
use crate::foundation::core::FrameRange;
use crate::schedule::dates::{DatePriority, DateRange};
use crate::schedule::index::IndexOptions;
use crate::schedule::model::{Schedule, TaskDef};
use chrono::NaiveDate;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn calc(start: i64, end: i64, from: NaiveDateTime, to: NaiveDateTime) -> FrameWindowCalculator {
    FrameWindowCalculator::new(Timeline {
        frames: FrameRange::new(FrameIndex(start), FrameIndex(end)).unwrap(),
        dates: DateRange {
            start: from,
            finish: to,
        },
    })
}

#[test]
fn phases_at_window_boundaries() {
    let w = FrameWindow {
        task: TaskId(1),
        start: FrameIndex(100),
        finish: FrameIndex(200),
    };
    assert_eq!(w.phase_at(FrameIndex(99)), TaskPhase::BeforeStart);
    assert_eq!(w.phase_at(FrameIndex(100)), TaskPhase::Active);
    assert_eq!(w.phase_at(FrameIndex(200)), TaskPhase::Active);
    assert_eq!(w.phase_at(FrameIndex(201)), TaskPhase::AfterEnd);
}

#[test]
fn maps_dates_linearly() {
    // 10 days over frames 0..=100: one day is 10 frames.
    let c = calc(0, 100, at(2024, 1, 1), at(2024, 1, 11));
    assert_eq!(c.date_to_frame(at(2024, 1, 1)), FrameIndex(0));
    assert_eq!(c.date_to_frame(at(2024, 1, 6)), FrameIndex(50));
    assert_eq!(c.date_to_frame(at(2024, 1, 11)), FrameIndex(100));
}

#[test]
fn rounds_half_to_even() {
    // 4 days over frames 0..=2: day 1 -> 0.5, day 3 -> 1.5.
    let c = calc(0, 2, at(2024, 1, 1), at(2024, 1, 5));
    assert_eq!(c.date_to_frame(at(2024, 1, 2)), FrameIndex(0));
    assert_eq!(c.date_to_frame(at(2024, 1, 4)), FrameIndex(2));
}

#[test]
fn out_of_range_dates_clamp() {
    let c = calc(10, 20, at(2024, 1, 1), at(2024, 1, 11));
    assert_eq!(c.date_to_frame(at(2023, 6, 1)), FrameIndex(10));
    assert_eq!(c.date_to_frame(at(2025, 6, 1)), FrameIndex(20));
}

#[test]
fn degenerate_date_range_collapses_to_start_frame() {
    let day = at(2024, 1, 1);
    let c = calc(7, 300, day, day);
    assert_eq!(c.date_to_frame(day), FrameIndex(7));
    assert_eq!(c.date_to_frame(at(2030, 1, 1)), FrameIndex(7));
    let w = c
        .window(
            TaskId(1),
            EffectiveDates::Resolved {
                start: day,
                finish: at(2024, 2, 1),
            },
        )
        .unwrap();
    assert_eq!((w.start, w.finish), (FrameIndex(7), FrameIndex(7)));
}

#[test]
fn indeterminate_dates_have_no_window() {
    let c = calc(0, 100, at(2024, 1, 1), at(2024, 1, 11));
    assert!(c.window(TaskId(1), EffectiveDates::Indeterminate).is_none());
}

#[test]
fn table_covers_every_resolved_task_with_ordered_bounds() {
    let mut tasks = Vec::new();
    for i in 0..20u32 {
        let mut t = TaskDef::new(TaskId(u64::from(i)));
        if i % 5 != 0 {
            t.dates.schedule_start = Some(at(2024, 1, 1 + i));
            t.dates.schedule_finish = Some(at(2024, 1, 2 + i));
        }
        tasks.push(t);
    }
    let schedule = Schedule { tasks };
    let index = ScheduleIndex::build(&schedule, IndexOptions::default()).unwrap();
    let dates = DateResolver::resolve(&index, &DatePriority::default());
    let c = calc(1, 250, at(2024, 1, 1), at(2024, 1, 22));
    let table = FrameWindowTable::compute(&index, &dates, &c);

    assert_eq!(table.count(), 16);
    for w in table.iter() {
        assert!(w.finish >= w.start);
    }
    assert!(table.get(index.lookup(TaskId(0)).unwrap()).is_none());
    assert!(table.get(index.lookup(TaskId(1)).unwrap()).is_some());
}

#[test]
fn full_i64_frame_span_does_not_overflow() {
    let c = calc(i64::MIN, i64::MAX, at(2024, 1, 1), at(2024, 1, 11));
    assert_eq!(c.date_to_frame(at(2024, 1, 1)), FrameIndex(i64::MIN));
    assert_eq!(c.date_to_frame(at(2024, 1, 6)), FrameIndex(0));
    assert_eq!(c.date_to_frame(at(2024, 1, 11)), FrameIndex(i64::MAX));
}
