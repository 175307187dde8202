use std::collections::BTreeMap;

use crate::apply::adapter::{AppearanceUpdate, RenderAdapter};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::ScheduleResult;
use crate::foundation::ids::ObjectHandle;
use crate::resolve::table::{StateKey, StateTable};
use crate::scene::objects::ObjectCache;

/// Operation carried by a [`StateBatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Show,
    Hide,
    Appearance,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum BatchPayload {
    Objects(Vec<ObjectHandle>),
    Updates(Vec<AppearanceUpdate>),
}

/// One adapter call worth of state changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StateBatch {
    pub frame: FrameIndex,
    pub kind: BatchKind,
    pub payload: BatchPayload,
}

impl StateBatch {
    /// Number of objects the batch touches.
    pub fn len(&self) -> usize {
        match &self.payload {
            BatchPayload::Objects(v) => v.len(),
            BatchPayload::Updates(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A batch the adapter rejected.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct BatchFailure {
    pub frame: FrameIndex,
    pub kind: BatchKind,
    pub objects: usize,
    pub error: String,
}

/// Outcome of [`BatchStateApplier::apply`].
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ApplyReport {
    pub batches: usize,
    pub applied: usize,
    /// Object updates delivered by accepted batches.
    pub objects_touched: usize,
    pub failures: Vec<BatchFailure>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default)]
struct FrameChanges {
    show: Vec<ObjectHandle>,
    hide: Vec<ObjectHandle>,
    appearance: Vec<AppearanceUpdate>,
}

/// Turns a [`StateTable`] into per-frame adapter batches.
///
/// Stateless: planning the same table twice yields the same batches.
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchStateApplier;

impl BatchStateApplier {
    /// Group every state change by frame and operation.
    ///
    /// The first key of each product always emits. Batches come out in ascending frame order; in
    /// a frame, show precedes hide and both precede the appearance batch.
    pub fn plan(
        &self,
        table: &StateTable,
        objects: &ObjectCache,
    ) -> ScheduleResult<Vec<StateBatch>> {
        let mut by_frame = BTreeMap::<FrameIndex, FrameChanges>::new();

        for track in table.tracks() {
            let handles = objects.objects_for(track.product)?;
            if handles.is_empty() {
                continue;
            }
            let mut prev: Option<&StateKey> = None;
            for key in &track.keys {
                let (vis_changed, look_changed) = match prev {
                    None => (true, true),
                    Some(p) => (p.visible != key.visible, key.appearance_differs(p)),
                };
                prev = Some(key);
                if !vis_changed && !look_changed {
                    continue;
                }
                let changes = by_frame.entry(key.frame).or_default();
                if vis_changed {
                    let target = if key.visible {
                        &mut changes.show
                    } else {
                        &mut changes.hide
                    };
                    target.extend_from_slice(handles);
                }
                if look_changed {
                    changes
                        .appearance
                        .extend(handles.iter().map(|&object| AppearanceUpdate {
                            object,
                            color: key.color.materialize(objects.original_color(object)),
                            progress: key.progress,
                        }));
                }
            }
        }

        let mut out = Vec::new();
        for (frame, c) in by_frame {
            if !c.show.is_empty() {
                out.push(StateBatch {
                    frame,
                    kind: BatchKind::Show,
                    payload: BatchPayload::Objects(c.show),
                });
            }
            if !c.hide.is_empty() {
                out.push(StateBatch {
                    frame,
                    kind: BatchKind::Hide,
                    payload: BatchPayload::Objects(c.hide),
                });
            }
            if !c.appearance.is_empty() {
                out.push(StateBatch {
                    frame,
                    kind: BatchKind::Appearance,
                    payload: BatchPayload::Updates(c.appearance),
                });
            }
        }
        Ok(out)
    }

    /// Plan and push every batch to `adapter`.
    ///
    /// A rejected batch is recorded in the report and application continues with the next one.
    #[tracing::instrument(skip_all, fields(products = table.tracks().len()))]
    pub fn apply(
        &self,
        table: &StateTable,
        objects: &ObjectCache,
        adapter: &mut dyn RenderAdapter,
    ) -> ScheduleResult<ApplyReport> {
        let batches = self.plan(table, objects)?;
        let mut report = ApplyReport {
            batches: batches.len(),
            ..ApplyReport::default()
        };

        for batch in &batches {
            let res = match &batch.payload {
                BatchPayload::Objects(handles) => {
                    adapter.set_visibility(batch.frame, batch.kind == BatchKind::Show, handles)
                }
                BatchPayload::Updates(updates) => adapter.set_appearance(batch.frame, updates),
            };
            match res {
                Ok(()) => {
                    report.applied += 1;
                    report.objects_touched += batch.len();
                }
                Err(e) => {
                    tracing::warn!(frame = batch.frame.0, kind = ?batch.kind, error = %e, "adapter rejected batch");
                    report.failures.push(BatchFailure {
                        frame: batch.frame,
                        kind: batch.kind,
                        objects: batch.len(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            batches = report.batches,
            applied = report.applied,
            failed = report.failures.len(),
            "state applied"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/apply/batch.rs"]
mod tests;
