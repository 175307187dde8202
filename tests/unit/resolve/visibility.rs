use super::*;
use crate::appearance::library::{AssignmentTable, DEFAULT_GROUP, ProfileGroup, ProfileLibrary};
use crate::foundation::core::Rgba;
use crate::foundation::ids::TaskId;
use crate::resolve::fingerprint::fingerprint_table;
use crate::schedule::dates::{DatePriority, DateRange, DateResolver};
use crate::schedule::index::IndexOptions;
use crate::schedule::model::{Schedule, TaskDef};
use crate::timeline::settings::Timeline;
use crate::timeline::window::FrameWindowCalculator;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

fn day(n: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + TimeDelta::days(n)
}

/// Task building `outputs` from day `start` to day `finish`; one day is one frame.
fn task(id: u64, ty: &str, start: i64, finish: i64, outputs: &[u64]) -> TaskDef {
    let mut t = TaskDef::new(TaskId(id));
    t.predefined_type = ty.to_owned();
    t.dates.schedule_start = Some(day(start));
    t.dates.schedule_finish = Some(day(finish));
    t.outputs = outputs.iter().map(|p| ProductId(*p)).collect();
    t
}

struct Fixture {
    index: ScheduleIndex,
    windows: FrameWindowTable,
    profiles: TaskProfiles,
}

impl Fixture {
    fn new(tasks: Vec<TaskDef>, library: &ProfileLibrary, assignment: &AssignmentTable) -> Self {
        let index = ScheduleIndex::build(&Schedule { tasks }, IndexOptions::default()).unwrap();
        let dates = DateResolver::resolve(&index, &DatePriority::default());
        let calc = FrameWindowCalculator::new(Timeline {
            frames: FrameRange::new(FrameIndex(0), FrameIndex(300)).unwrap(),
            dates: DateRange {
                start: day(0),
                finish: day(300),
            },
        });
        let windows = FrameWindowTable::compute(&index, &dates, &calc);
        let profiles = TaskProfiles::resolve(&index, library, assignment, DEFAULT_GROUP);
        Self {
            index,
            windows,
            profiles,
        }
    }

    fn simple(tasks: Vec<TaskDef>) -> Self {
        Self::new(
            tasks,
            &ProfileLibrary::with_default_group(),
            &AssignmentTable::default(),
        )
    }

    fn resolver(&self) -> VisibilityResolver<'_> {
        VisibilityResolver::new(&self.index, &self.windows, &self.profiles)
    }

    fn product(&self, id: u64) -> ProductIdx {
        self.index.product_idx(ProductId(id)).unwrap()
    }
}

#[test]
fn phase_boundaries_drive_visibility() {
    let fx = Fixture::simple(vec![task(1, "CONSTRUCTION", 100, 200, &[7])]);
    let r = fx.resolver();
    let p = fx.product(7);
    assert!(!r.resolve(p, FrameIndex(99)).visible);
    assert!(r.resolve(p, FrameIndex(100)).visible);
    assert!(r.resolve(p, FrameIndex(200)).visible);
    assert!(r.resolve(p, FrameIndex(201)).visible);
}

#[test]
fn growth_progress_tracks_the_window() {
    let fx = Fixture::simple(vec![task(1, "CONSTRUCTION", 100, 200, &[7])]);
    let r = fx.resolver();
    let p = fx.product(7);
    assert_eq!(r.resolve(p, FrameIndex(99)).progress, 0.0);
    assert_eq!(r.resolve(p, FrameIndex(150)).progress, 0.5);
    assert_eq!(r.resolve(p, FrameIndex(201)).progress, 1.0);
}

#[test]
fn colors_follow_phase() {
    let fx = Fixture::simple(vec![task(1, "CONSTRUCTION", 100, 200, &[7])]);
    let r = fx.resolver();
    let p = fx.product(7);
    assert_eq!(
        r.resolve(p, FrameIndex(150)).color,
        StateColor::Override {
            color: Rgba::new(0.0, 1.0, 0.0, 1.0)
        }
    );
    assert_eq!(r.resolve(p, FrameIndex(250)).color, StateColor::ORIGINAL);
}

#[test]
fn union_visibility_across_tasks() {
    let mut library = ProfileLibrary::with_default_group();
    library.insert_group(
        DEFAULT_GROUP,
        ProfileGroup {
            profiles: vec![
                AppearanceProfile {
                    name: "BUILD".to_owned(),
                    ..AppearanceProfile::default()
                },
                AppearanceProfile {
                    name: "TEMPORARY".to_owned(),
                    hide_at_end: true,
                    ..AppearanceProfile::default()
                },
            ],
        },
    );
    library.ensure_default_group();
    let fx = Fixture::new(
        vec![
            task(1, "BUILD", 10, 20, &[7]),
            task(2, "TEMPORARY", 30, 40, &[7]),
        ],
        &library,
        &AssignmentTable::default(),
    );
    let r = fx.resolver();
    let p = fx.product(7);

    assert!(!r.resolve(p, FrameIndex(5)).visible);
    assert!(r.resolve(p, FrameIndex(25)).visible);
    // The temporary task hides at its end, but the build task still shows the product.
    let after = r.resolve(p, FrameIndex(45));
    assert!(after.visible);
    assert_eq!(after.color, StateColor::ORIGINAL);
}

#[test]
fn removed_products_are_visible_before_their_task() {
    let mut t = task(1, "CONSTRUCTION", 100, 200, &[]);
    t.inputs = vec![ProductId(9)];
    let fx = Fixture::simple(vec![t]);
    let r = fx.resolver();
    let p = fx.product(9);
    assert!(r.resolve(p, FrameIndex(50)).visible);
    assert!(r.resolve(p, FrameIndex(150)).visible);
}

#[test]
fn demolition_hides_at_end() {
    let fx = Fixture::simple(vec![task(1, "DEMOLITION", 100, 200, &[7])]);
    let r = fx.resolver();
    let p = fx.product(7);
    assert!(r.resolve(p, FrameIndex(50)).visible);
    assert!(r.resolve(p, FrameIndex(150)).visible);
    assert!(!r.resolve(p, FrameIndex(250)).visible);
}

#[test]
fn products_without_windows_are_hidden() {
    let mut t = TaskDef::new(TaskId(1));
    t.outputs = vec![ProductId(7)];
    let fx = Fixture::simple(vec![t]);
    let s = fx.resolver().resolve(fx.product(7), FrameIndex(10));
    assert!(!s.visible);
    assert_eq!(s.color, StateColor::ORIGINAL);
    assert_eq!(s.progress, 0.0);
}

#[test]
fn latest_active_start_drives_appearance() {
    let mut library = ProfileLibrary::with_default_group();
    library.insert_group(
        DEFAULT_GROUP,
        ProfileGroup {
            profiles: vec![AppearanceProfile {
                name: "PAINT".to_owned(),
                active_color: Rgba::new(0.0, 0.0, 1.0, 1.0),
                ..AppearanceProfile::default()
            }],
        },
    );
    library.ensure_default_group();
    let fx = Fixture::new(
        vec![
            task(1, "CONSTRUCTION", 10, 100, &[7]),
            task(2, "PAINT", 50, 80, &[7]),
        ],
        &library,
        &AssignmentTable::default(),
    );
    let r = fx.resolver();
    let p = fx.product(7);
    assert_eq!(
        r.resolve(p, FrameIndex(60)).color,
        StateColor::Override {
            color: Rgba::new(0.0, 0.0, 1.0, 1.0)
        }
    );
    // Only the construction task is still active after the paint task ends.
    assert_eq!(
        r.resolve(p, FrameIndex(90)).color,
        StateColor::Override {
            color: Rgba::new(0.0, 1.0, 0.0, 1.0)
        }
    );
}

#[test]
fn resolution_is_pure_and_parallel_matches_sequential() {
    let tasks = (0..30)
        .map(|i| task(i + 1, "CONSTRUCTION", (i * 7) as i64, (i * 7 + 20) as i64, &[i % 11]))
        .collect();
    let fx = Fixture::simple(tasks);
    let r = fx.resolver();
    let frames = FrameRange::new(FrameIndex(0), FrameIndex(300)).unwrap();

    let a = r.resolve_all(frames, false);
    let b = r.resolve_all(frames, false);
    let c = r.resolve_all(frames, true);
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(fingerprint_table(&a), fingerprint_table(&c));

    for p in 0..r.products() {
        let p = ProductIdx(p as u32);
        for f in [0, 13, 150, 299] {
            assert_eq!(
                a.state_at(p, FrameIndex(f)),
                Some(r.resolve(p, FrameIndex(f)))
            );
        }
    }
}

const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 1.0);
const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0, 1.0);

/// Profile painting `tag` before start and after end, so the appearance task is observable.
fn tagged(name: &str, tag: Rgba, visible_before_start: bool) -> AppearanceProfile {
    AppearanceProfile {
        name: name.to_owned(),
        visible_before_start,
        start_color: tag,
        end_color: tag,
        use_end_original_color: false,
        ..AppearanceProfile::default()
    }
}

fn tagged_library(profiles: Vec<AppearanceProfile>) -> ProfileLibrary {
    let mut library = ProfileLibrary::default();
    library.insert_group(DEFAULT_GROUP, ProfileGroup { profiles });
    library.ensure_default_group();
    library
}

#[test]
fn later_task_visible_before_start_shows_the_product_early() {
    let library = tagged_library(vec![
        tagged("LATE_REVEAL", RED, false),
        tagged("PRESENT", BLUE, true),
    ]);
    let fx = Fixture::new(
        vec![
            task(1, "LATE_REVEAL", 20, 50, &[7]),
            task(2, "PRESENT", 40, 90, &[7]),
        ],
        &library,
        &AssignmentTable::default(),
    );
    let r = fx.resolver();
    let p = fx.product(7);

    let early = r.resolve(p, FrameIndex(10));
    assert!(early.visible);
    // Both tasks are upcoming; the earlier one still owns the appearance.
    assert_eq!(early.color, StateColor::Override { color: RED });

    let alone = Fixture::new(
        vec![task(1, "LATE_REVEAL", 20, 50, &[7])],
        &library,
        &AssignmentTable::default(),
    );
    assert!(!alone.resolver().resolve(alone.product(7), FrameIndex(10)).visible);
}

#[test]
fn latest_finish_drives_appearance_after_all_tasks_end() {
    let library = tagged_library(vec![
        tagged("EARLY_END", RED, false),
        tagged("LATE_END", BLUE, false),
    ]);
    let fx = Fixture::new(
        vec![
            task(1, "EARLY_END", 10, 30, &[7]),
            task(2, "LATE_END", 20, 60, &[7]),
        ],
        &library,
        &AssignmentTable::default(),
    );
    let r = fx.resolver();
    let p = fx.product(7);

    // Between the two finishes task 2 is still active.
    assert_eq!(
        r.resolve(p, FrameIndex(45)).color,
        StateColor::Override {
            color: Rgba::new(1.0, 1.0, 0.0, 1.0)
        }
    );
    let done = r.resolve(p, FrameIndex(100));
    assert!(done.visible);
    assert_eq!(done.color, StateColor::Override { color: BLUE });
}

#[test]
fn earliest_upcoming_start_drives_appearance_with_ties_to_lowest_index() {
    let library = tagged_library(vec![
        tagged("LATE_START", RED, false),
        tagged("TIED_FIRST", BLUE, false),
        tagged("TIED_SECOND", GREEN, false),
    ]);
    let fx = Fixture::new(
        vec![
            task(1, "LATE_START", 50, 80, &[7]),
            task(2, "TIED_FIRST", 20, 90, &[7]),
            task(3, "TIED_SECOND", 20, 40, &[7]),
        ],
        &library,
        &AssignmentTable::default(),
    );
    let r = fx.resolver();
    let p = fx.product(7);

    let before = r.resolve(p, FrameIndex(5));
    assert!(!before.visible);
    assert_eq!(before.color, StateColor::Override { color: BLUE });
    assert_eq!(before.progress, 0.0);
}
