use rayon::prelude::*;
use smallvec::SmallVec;

use crate::appearance::library::TaskProfiles;
use crate::appearance::profile::{AppearanceProfile, StateColor};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::ids::{ProductId, ProductIdx, TaskIdx};
use crate::foundation::math::progress_between;
use crate::resolve::table::{StateKey, StateTable, StateTrack};
use crate::schedule::index::{Relationship, ScheduleIndex};
use crate::timeline::window::{FrameWindow, FrameWindowTable, TaskPhase};

/// Canonical state of one product at one frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedState {
    pub product: ProductId,
    pub frame: FrameIndex,
    pub visible: bool,
    pub color: StateColor,
    /// Effect progress in `[0, 1]`.
    pub progress: f32,
}

/// A task window that affects a product.
#[derive(Clone, Copy, Debug)]
struct Contribution {
    task: TaskIdx,
    window: FrameWindow,
    relationship: Relationship,
}

/// Pure per-(product, frame) state resolution over precomputed windows and profiles.
pub struct VisibilityResolver<'a> {
    index: &'a ScheduleIndex,
    profiles: &'a TaskProfiles,
    contributions: Vec<SmallVec<[Contribution; 2]>>,
}

impl<'a> VisibilityResolver<'a> {
    pub fn new(
        index: &'a ScheduleIndex,
        windows: &FrameWindowTable,
        profiles: &'a TaskProfiles,
    ) -> Self {
        let contributions = (0..index.products().len())
            .map(|p| {
                index
                    .tasks_for_product(ProductIdx(p as u32))
                    .iter()
                    .filter_map(|link| {
                        windows.get(link.task).map(|window| Contribution {
                            task: link.task,
                            window,
                            relationship: link.relationship,
                        })
                    })
                    .collect()
            })
            .collect();
        Self {
            index,
            profiles,
            contributions,
        }
    }

    /// State of `product` at `frame`.
    ///
    /// Visibility is the union over every contributing task; color and progress come from the
    /// single appearance task. A product without windows is hidden and keeps its own color.
    pub fn resolve(&self, product: ProductIdx, frame: FrameIndex) -> ResolvedState {
        let contribs = &self.contributions[product.as_usize()];
        let product_id = self.index.product_id(product);
        let Some(lead) = appearance_task(contribs, frame) else {
            return ResolvedState {
                product: product_id,
                frame,
                visible: false,
                color: StateColor::ORIGINAL,
                progress: 0.0,
            };
        };

        let visible = contribs.iter().any(|c| {
            is_visible(
                self.profiles.get(c.task),
                c.relationship,
                c.window.phase_at(frame),
            )
        });

        let profile = self.profiles.get(lead.task);
        let phase = lead.window.phase_at(frame);
        let t = progress_between(lead.window.start.0, lead.window.finish.0, frame.0);
        ResolvedState {
            product: product_id,
            frame,
            visible,
            color: profile.state_color(phase, t),
            progress: profile.effect.progress(phase, t),
        }
    }

    /// Number of products the resolver covers.
    pub fn products(&self) -> usize {
        self.contributions.len()
    }

    /// Resolve every product over `frames` into a change-only [`StateTable`].
    ///
    /// With `parallel`, products are spread over the rayon pool; tracks still come out in product
    /// order.
    #[tracing::instrument(skip(self), fields(products = self.products()))]
    pub fn resolve_all(&self, frames: FrameRange, parallel: bool) -> StateTable {
        let n = self.products();
        let tracks: Vec<StateTrack> = if parallel {
            (0..n)
                .into_par_iter()
                .map(|p| self.track(ProductIdx(p as u32), frames))
                .collect()
        } else {
            (0..n)
                .map(|p| self.track(ProductIdx(p as u32), frames))
                .collect()
        };
        StateTable::new(frames, tracks)
    }

    fn track(&self, product: ProductIdx, frames: FrameRange) -> StateTrack {
        let mut keys: Vec<StateKey> = Vec::new();
        for frame in frames.iter() {
            let key = StateKey::from(self.resolve(product, frame));
            if keys.last().is_none_or(|prev| !prev.same_state(&key)) {
                keys.push(key);
            }
        }
        StateTrack {
            product: self.index.product_id(product),
            keys,
        }
    }
}

fn is_visible(profile: &AppearanceProfile, relationship: Relationship, phase: TaskPhase) -> bool {
    match phase {
        TaskPhase::BeforeStart => {
            profile.visible_before_start || relationship == Relationship::Input
        }
        TaskPhase::Active => true,
        TaskPhase::AfterEnd => profile.visible_after_end && !profile.hide_at_end,
    }
}

/// Pick the task whose profile drives color and effect.
///
/// Active first (latest start), then the most recently concluded (latest finish), then the next
/// upcoming (earliest start). Ties go to the lowest task index; `contribs` is in index order, so
/// only a strictly better candidate replaces the current one.
fn appearance_task(contribs: &[Contribution], frame: FrameIndex) -> Option<&Contribution> {
    let mut active: Option<&Contribution> = None;
    let mut concluded: Option<&Contribution> = None;
    let mut upcoming: Option<&Contribution> = None;

    for c in contribs {
        let w = &c.window;
        match w.phase_at(frame) {
            TaskPhase::Active => {
                if active.is_none_or(|cur| w.start > cur.window.start) {
                    active = Some(c);
                }
            }
            TaskPhase::AfterEnd => {
                if concluded.is_none_or(|cur| w.finish > cur.window.finish) {
                    concluded = Some(c);
                }
            }
            TaskPhase::BeforeStart => {
                if upcoming.is_none_or(|cur| w.start < cur.window.start) {
                    upcoming = Some(c);
                }
            }
        }
    }
    active.or(concluded).or(upcoming)
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/visibility.rs"]
mod tests;
