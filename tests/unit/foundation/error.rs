use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ScheduleError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ScheduleError::missing_setting("date range")
            .to_string()
            .contains("missing setting: date range")
    );
    assert!(
        ScheduleError::stale_cache("objects")
            .to_string()
            .contains("stale cache:")
    );
    assert!(
        ScheduleError::adapter("x")
            .to_string()
            .contains("adapter error:")
    );
    assert!(
        ScheduleError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn cycle_names_the_task() {
    let err = ScheduleError::CyclicSchedule { task: TaskId(42) };
    assert!(err.to_string().contains("task 42"));
    assert!(err.is_configuration());
}

#[test]
fn runtime_faults_are_not_configuration_errors() {
    assert!(!ScheduleError::adapter("rejected").is_configuration());
    assert!(!ScheduleError::stale_cache("objects").is_configuration());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ScheduleError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
