use crate::foundation::core::Rgba;
use crate::foundation::math::lerp_f32;
use crate::timeline::window::TaskPhase;

/// How an object transitions into its built state while its task is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppearanceEffect {
    /// Fully present from the start frame on.
    #[default]
    Instant,
    /// Grows linearly from nothing at the start frame to complete at the finish frame.
    Growth,
}

impl AppearanceEffect {
    /// Effect progress in `[0, 1]`; `t` is the frame's linear position inside the window.
    pub fn progress(self, phase: TaskPhase, t: f32) -> f32 {
        match (self, phase) {
            (_, TaskPhase::BeforeStart) => 0.0,
            (Self::Instant, _) | (Self::Growth, TaskPhase::AfterEnd) => 1.0,
            (Self::Growth, TaskPhase::Active) => t.clamp(0.0, 1.0),
        }
    }
}

/// Color a resolved state asks for.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateColor {
    /// Explicit straight-alpha color.
    Override { color: Rgba },
    /// Keep the object's own color, scaling its alpha by `alpha`.
    Original { alpha: f32 },
}

impl StateColor {
    pub const ORIGINAL: Self = Self::Original { alpha: 1.0 };

    /// Concrete color for an object whose unanimated color is `original`.
    pub fn materialize(self, original: Rgba) -> Rgba {
        match self {
            Self::Override { color } => color,
            Self::Original { alpha } => original.with_alpha(original.a * alpha),
        }
    }
}

/// A named appearance profile ("color type"): visibility rules, effect and per-state colors.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppearanceProfile {
    pub name: String,
    pub visible_before_start: bool,
    pub visible_after_end: bool,
    /// Hide the object once its task concludes, regardless of `visible_after_end`.
    pub hide_at_end: bool,
    pub effect: AppearanceEffect,

    pub start_color: Rgba,
    pub active_color: Rgba,
    pub end_color: Rgba,
    pub use_start_original_color: bool,
    pub use_active_original_color: bool,
    pub use_end_original_color: bool,

    pub start_transparency: f32,
    /// Transparency at the first active frame; interpolated towards `active_finish_transparency`.
    pub active_start_transparency: f32,
    pub active_finish_transparency: f32,
    pub end_transparency: f32,
}

impl Default for AppearanceProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            visible_before_start: false,
            visible_after_end: true,
            hide_at_end: false,
            effect: AppearanceEffect::Instant,
            start_color: Rgba::WHITE,
            active_color: Rgba::new(1.0, 1.0, 0.0, 1.0),
            end_color: Rgba::new(0.0, 1.0, 0.0, 1.0),
            use_start_original_color: false,
            use_active_original_color: false,
            use_end_original_color: true,
            start_transparency: 0.0,
            active_start_transparency: 0.0,
            active_finish_transparency: 0.0,
            end_transparency: 0.0,
        }
    }
}

impl AppearanceProfile {
    /// Profile used when neither an assignment nor the DEFAULT group supplies one.
    pub fn generic_fallback() -> Self {
        Self {
            name: "GENERIC".to_owned(),
            ..Self::default()
        }
    }

    /// Color of the given phase; `t` is the frame's linear position inside the window.
    pub fn state_color(&self, phase: TaskPhase, t: f32) -> StateColor {
        let (color, use_original, transparency) = match phase {
            TaskPhase::BeforeStart => (
                self.start_color,
                self.use_start_original_color,
                self.start_transparency,
            ),
            TaskPhase::Active => (
                self.active_color,
                self.use_active_original_color,
                lerp_f32(
                    self.active_start_transparency,
                    self.active_finish_transparency,
                    t.clamp(0.0, 1.0),
                ),
            ),
            TaskPhase::AfterEnd => (
                self.end_color,
                self.use_end_original_color,
                self.end_transparency,
            ),
        };
        let alpha = (1.0 - transparency).clamp(0.0, 1.0);
        if use_original {
            StateColor::Original { alpha }
        } else {
            StateColor::Override {
                color: color.with_alpha(color.a * alpha),
            }
        }
    }
}
