use super::*;
use crate::appearance::library::{AssignmentTable, DEFAULT_GROUP};
use crate::apply::adapter::RecordingAdapter;
use crate::foundation::core::{FrameRange, Rgba};
use crate::foundation::ids::{ObjectHandle, ProductId, TaskId};
use crate::scene::objects::SceneObject;
use crate::schedule::dates::DateRange;
use crate::schedule::model::TaskDef;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

fn day(n: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
        + TimeDelta::days(n)
}

fn schedule() -> Schedule {
    let mut root = TaskDef::new(TaskId(1));
    root.name = "Structure".to_owned();
    root.children = vec![TaskId(2), TaskId(3)];

    let mut walls = TaskDef::new(TaskId(2));
    walls.predefined_type = "CONSTRUCTION".to_owned();
    walls.dates.schedule_start = Some(day(0));
    walls.dates.schedule_finish = Some(day(10));
    walls.outputs = vec![ProductId(100)];

    let mut strip = TaskDef::new(TaskId(3));
    strip.predefined_type = "DEMOLITION".to_owned();
    strip.dates.schedule_start = Some(day(10));
    strip.dates.schedule_finish = Some(day(20));
    strip.inputs = vec![ProductId(200)];

    Schedule {
        tasks: vec![root, walls, strip],
    }
}

fn scene() -> Scene {
    let obj = |h: u64, p: u64| SceneObject {
        handle: ObjectHandle(h),
        product: Some(ProductId(p)),
        color: Rgba::WHITE,
    };
    Scene {
        objects: vec![obj(1, 100), obj(2, 100), obj(3, 200)],
    }
}

fn settings() -> AnimationSettings {
    AnimationSettings {
        frames: FrameRange::new(FrameIndex(0), FrameIndex(200)).unwrap(),
        ..AnimationSettings::default()
    }
}

fn session() -> AnimationSession {
    AnimationSession::new(
        schedule(),
        scene(),
        ProfileLibrary::default(),
        AssignmentTable::default(),
        settings(),
    )
}

#[test]
fn caches_build_once_across_builds() {
    let mut s = session();
    let first = s.build().unwrap();
    let second = s.build().unwrap();
    assert_eq!(
        s.counters(),
        BuildCounters {
            index_builds: 1,
            object_builds: 1,
            builds: 2
        }
    );
    assert!(first.stats.index_rebuilt && first.stats.objects_rebuilt);
    assert!(!second.stats.index_rebuilt && !second.stats.objects_rebuilt);
    assert_eq!(first.stats.fingerprint, second.stats.fingerprint);
    assert_eq!(first.table, second.table);
}

#[test]
fn invalidation_rebuilds_only_the_affected_cache() {
    let mut s = session();
    s.build().unwrap();

    s.set_scene(scene());
    s.build().unwrap();
    assert_eq!(s.counters().object_builds, 2);
    assert_eq!(s.counters().index_builds, 1);

    s.set_schedule(schedule());
    s.build().unwrap();
    assert_eq!(s.counters().object_builds, 2);
    assert_eq!(s.counters().index_builds, 2);
}

#[test]
fn settings_changes_invalidate_only_when_the_index_depends_on_them() {
    let mut s = session();
    s.build().unwrap();

    s.set_settings(AnimationSettings {
        frames: FrameRange::new(FrameIndex(0), FrameIndex(50)).unwrap(),
        ..settings()
    });
    assert!(s.schedule_is_valid());

    s.set_settings(AnimationSettings {
        include_inputs: false,
        ..settings()
    });
    assert!(!s.schedule_is_valid());
    let build = s.build().unwrap();
    assert_eq!(build.stats.products, 1);
}

#[test]
fn summary_task_dates_drive_the_timeline() {
    let mut s = session();
    let build = s.build().unwrap();
    assert_eq!(
        build.timeline.dates,
        DateRange {
            start: day(0),
            finish: day(20)
        }
    );
    // Root derives its window from its children.
    assert_eq!(build.windows.count(), 3);
    assert_eq!(build.stats.tasks_indexed, 3);
    assert_eq!(build.stats.indeterminate_tasks, 0);
    // Root has no outputs; the two leaves resolve through DEFAULT by predefined type.
    assert_eq!(build.stats.profile_fallbacks, 3);
}

#[test]
fn rebuild_applies_state_to_the_adapter() {
    let mut s = session();
    let mut adapter = RecordingAdapter::new();
    let (build, report) = s.rebuild(&mut adapter).unwrap();
    assert!(report.is_clean());
    assert!(report.applied > 0);
    assert_eq!(build.timeline.frames.end, FrameIndex(200));

    // Walls appear at frame 0; the stripped element is visible until its task ends at frame 200.
    assert_eq!(adapter.visibility_at(ObjectHandle(1), FrameIndex(0)), Some(true));
    assert_eq!(adapter.visibility_at(ObjectHandle(3), FrameIndex(0)), Some(true));
    assert_eq!(adapter.visibility_at(ObjectHandle(3), FrameIndex(200)), Some(true));
}

#[test]
fn missing_dates_fail_the_build() {
    let mut s = AnimationSession::new(
        Schedule {
            tasks: vec![TaskDef::new(TaskId(1))],
        },
        Scene::default(),
        ProfileLibrary::default(),
        AssignmentTable::default(),
        AnimationSettings::default(),
    );
    let err = s.build().unwrap_err();
    assert!(matches!(err, ScheduleError::MissingSetting(_)));
}

#[test]
fn cyclic_schedules_are_rejected() {
    let mut a = TaskDef::new(TaskId(1));
    a.children = vec![TaskId(2)];
    let mut b = TaskDef::new(TaskId(2));
    b.children = vec![TaskId(1)];
    let mut s = AnimationSession::new(
        Schedule { tasks: vec![a, b] },
        Scene::default(),
        ProfileLibrary::default(),
        AssignmentTable::default(),
        AnimationSettings::default(),
    );
    assert!(matches!(
        s.build().unwrap_err(),
        ScheduleError::CyclicSchedule { .. }
    ));
    assert_eq!(s.counters().index_builds, 0);
}

#[test]
fn current_frame_is_reset_or_preserved() {
    let mut s = session();
    s.set_current_frame(FrameIndex(120));
    s.build().unwrap();
    assert_eq!(s.current_frame(), FrameIndex(0));

    s.set_settings(AnimationSettings {
        preserve_current_frame: true,
        frames: FrameRange::new(FrameIndex(0), FrameIndex(100)).unwrap(),
        ..settings()
    });
    s.set_current_frame(FrameIndex(150));
    s.build().unwrap();
    assert_eq!(s.current_frame(), FrameIndex(100));
}

#[test]
fn assignments_select_profiles_in_the_active_group() {
    let mut table = AssignmentTable::default();
    table.assign(TaskId(2), DEFAULT_GROUP, "DEMOLITION");
    let mut s = session();
    s.set_assignment(table);
    let build = s.build().unwrap();
    assert_eq!(build.stats.profile_fallbacks, 2);
}
