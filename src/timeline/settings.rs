use crate::appearance::library::DEFAULT_GROUP;
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{ScheduleError, ScheduleResult};
use crate::foundation::math::round_half_even;
use crate::schedule::dates::{DatePriority, DateRange};

const SECS_PER_DAY: f64 = 86_400.0;

/// Longest animation a rebuild accepts, in frames.
pub const MAX_ANIMATION_FRAMES: u64 = 10_000_000;

/// How real-world time maps onto animation length.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Speed {
    /// Use the end frame from [`AnimationSettings::frames`] as given.
    #[default]
    Fixed,
    /// `animation_frames` frames for every `real_duration_secs` of schedule time.
    FrameSpeed {
        animation_frames: f64,
        real_duration_secs: f64,
    },
    /// `real_duration_secs` of schedule time play in `animation_duration_secs` of video.
    DurationSpeed {
        animation_duration_secs: f64,
        real_duration_secs: f64,
    },
    /// Schedule seconds divided by `factor` give video seconds.
    Multiplier { factor: f64 },
}

/// One entry of the appearance group stack; the first enabled entry is the active group.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupStackEntry {
    pub group: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Global animation settings consumed by a rebuild.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Target frame range. With a non-`Fixed` speed only `start` is used.
    pub frames: FrameRange,
    pub fps: Fps,
    /// Real-world span mapped onto `frames`. Falls back to the schedule's own span.
    pub date_range: Option<DateRange>,
    pub speed: Speed,
    pub date_priority: DatePriority,
    /// Link task inputs (removed products) as well as outputs.
    pub include_inputs: bool,
    pub group_stack: Vec<GroupStackEntry>,
    /// Keep the caller's current frame across rebuilds instead of jumping to the start.
    pub preserve_current_frame: bool,
    /// Resolve products on the rayon pool.
    pub parallel: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            frames: FrameRange::default(),
            fps: Fps::default(),
            date_range: None,
            speed: Speed::Fixed,
            date_priority: DatePriority::default(),
            include_inputs: true,
            group_stack: Vec::new(),
            preserve_current_frame: false,
            parallel: false,
        }
    }
}

impl AnimationSettings {
    /// Name of the active appearance group.
    pub fn active_group(&self) -> &str {
        self.group_stack
            .iter()
            .find(|e| e.enabled && !e.group.is_empty())
            .map(|e| e.group.as_str())
            .unwrap_or(DEFAULT_GROUP)
    }

    pub fn validate(&self) -> ScheduleResult<()> {
        check_length(FrameRange::new(self.frames.start, self.frames.end)?)?;
        Fps::new(self.fps.num, self.fps.den)?;
        if self.date_priority.0.is_empty() {
            return Err(ScheduleError::missing_setting(
                "date_priority must name at least one date source",
            ));
        }
        if let Some(r) = self.date_range {
            if r.finish < r.start {
                return Err(ScheduleError::validation(
                    "date_range finish must not precede start",
                ));
            }
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let ok = match self.speed {
            Speed::Fixed => true,
            Speed::FrameSpeed {
                animation_frames,
                real_duration_secs,
            } => positive(animation_frames) && positive(real_duration_secs),
            Speed::DurationSpeed {
                animation_duration_secs,
                real_duration_secs,
            } => positive(animation_duration_secs) && positive(real_duration_secs),
            Speed::Multiplier { factor } => positive(factor),
        };
        if !ok {
            return Err(ScheduleError::validation(
                "speed parameters must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Resolved mapping between real-world dates and output frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Timeline {
    pub frames: FrameRange,
    pub dates: DateRange,
}

impl Timeline {
    /// Resolve the frame and date bounds of an animation.
    ///
    /// `schedule_range` is used when the settings pin no date range; without either the build
    /// cannot proceed.
    pub fn resolve(
        settings: &AnimationSettings,
        schedule_range: Option<DateRange>,
    ) -> ScheduleResult<Self> {
        settings.validate()?;
        let dates = settings.date_range.or(schedule_range).ok_or_else(|| {
            ScheduleError::missing_setting(
                "no date range configured and the schedule has no resolvable dates",
            )
        })?;

        let start = settings.frames.start;
        let end = match settings.speed {
            Speed::Fixed => settings.frames.end,
            speed => {
                let mut span = (dates.finish - dates.start).num_milliseconds() as f64 / 1000.0;
                if span <= 0.0 {
                    span = SECS_PER_DAY;
                }
                let total = total_frames(speed, span, settings.fps.as_f64());
                if !total.is_finite() || total < 0.0 {
                    return Err(ScheduleError::validation(
                        "speed settings produce an invalid animation length",
                    ));
                }
                if total >= MAX_ANIMATION_FRAMES as f64 {
                    return Err(too_long());
                }
                start
                    .0
                    .checked_add(round_half_even(total))
                    .map(FrameIndex)
                    .ok_or_else(too_long)?
            }
        };

        Ok(Self {
            frames: check_length(FrameRange::new(start, end)?)?,
            dates,
        })
    }

    /// Frame to show after a rebuild.
    pub fn initial_frame(&self, current: FrameIndex, preserve: bool) -> FrameIndex {
        if preserve {
            self.frames.clamp(current)
        } else {
            self.frames.start
        }
    }
}

fn too_long() -> ScheduleError {
    ScheduleError::validation(format!(
        "animation is longer than {MAX_ANIMATION_FRAMES} frames"
    ))
}

fn check_length(frames: FrameRange) -> ScheduleResult<FrameRange> {
    if frames.len_frames() > MAX_ANIMATION_FRAMES {
        return Err(too_long());
    }
    Ok(frames)
}

fn total_frames(speed: Speed, span_secs: f64, fps: f64) -> f64 {
    match speed {
        Speed::Fixed => 0.0,
        Speed::FrameSpeed {
            animation_frames,
            real_duration_secs,
        } => span_secs / real_duration_secs * animation_frames,
        Speed::DurationSpeed {
            animation_duration_secs,
            real_duration_secs,
        } => span_secs / (real_duration_secs / animation_duration_secs) * fps,
        Speed::Multiplier { factor } => span_secs / factor * fps,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/settings.rs"]
mod tests;
