use std::collections::{BTreeMap, HashMap};

use crate::appearance::profile::{AppearanceEffect, AppearanceProfile};
use crate::foundation::core::Rgba;
use crate::foundation::ids::{TaskId, TaskIdx};
use crate::schedule::index::ScheduleIndex;
use crate::schedule::model::NOTDEFINED;

/// Group that always exists and backs every fallback.
pub const DEFAULT_GROUP: &str = "DEFAULT";

/// Profile of [`DEFAULT_GROUP`] used when a task's predefined type has no profile.
pub const FALLBACK_PROFILE: &str = NOTDEFINED;

/// Named set of profiles.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProfileGroup {
    pub profiles: Vec<AppearanceProfile>,
}

impl ProfileGroup {
    pub fn get(&self, name: &str) -> Option<&AppearanceProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.name == name)
    }
}

/// Profile groups keyed by name.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProfileLibrary {
    groups: BTreeMap<String, ProfileGroup>,
}

impl ProfileLibrary {
    /// Library holding only the built-in [`DEFAULT_GROUP`].
    pub fn with_default_group() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(DEFAULT_GROUP.to_owned(), default_group());
        Self { groups }
    }

    /// Add the built-in DEFAULT group when missing, and any built-in profile it lacks.
    pub fn ensure_default_group(&mut self) {
        let group = self.groups.entry(DEFAULT_GROUP.to_owned()).or_default();
        for p in default_group().profiles {
            if group.get(&p.name).is_none() {
                group.profiles.push(p);
            }
        }
    }

    pub fn insert_group(&mut self, name: impl Into<String>, group: ProfileGroup) {
        self.groups.insert(name.into(), group);
    }

    pub fn group(&self, name: &str) -> Option<&ProfileGroup> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn profile(&self, group: &str, name: &str) -> Option<&AppearanceProfile> {
        self.groups.get(group)?.get(name)
    }
}

/// Externally supplied task → profile name lookup, per group.
pub trait ProfileAssignment {
    fn assigned_profile(&self, task: TaskId, group: &str) -> Option<&str>;
}

/// One row of an [`AssignmentTable`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Assignment {
    pub task: TaskId,
    pub group: String,
    pub profile: String,
}

/// In-memory [`ProfileAssignment`], serialized as a list of [`Assignment`] rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<Assignment>", into = "Vec<Assignment>")]
pub struct AssignmentTable {
    by_task: HashMap<(TaskId, String), String>,
}

impl AssignmentTable {
    pub fn assign(&mut self, task: TaskId, group: impl Into<String>, profile: impl Into<String>) {
        self.by_task.insert((task, group.into()), profile.into());
    }

    pub fn len(&self) -> usize {
        self.by_task.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_task.is_empty()
    }
}

impl ProfileAssignment for AssignmentTable {
    fn assigned_profile(&self, task: TaskId, group: &str) -> Option<&str> {
        self.by_task
            .get(&(task, group.to_owned()))
            .map(String::as_str)
    }
}

impl From<Vec<Assignment>> for AssignmentTable {
    fn from(rows: Vec<Assignment>) -> Self {
        let mut out = Self::default();
        for r in rows {
            out.assign(r.task, r.group, r.profile);
        }
        out
    }
}

impl From<AssignmentTable> for Vec<Assignment> {
    fn from(t: AssignmentTable) -> Self {
        let mut rows: Vec<Assignment> = t
            .by_task
            .into_iter()
            .map(|((task, group), profile)| Assignment {
                task,
                group,
                profile,
            })
            .collect();
        rows.sort_by(|a, b| (a.task, &a.group).cmp(&(b.task, &b.group)));
        rows
    }
}

/// Which step of the fallback chain supplied a task's profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileSource {
    Assigned,
    GroupPredefinedType,
    DefaultPredefinedType,
    DefaultFallback,
    Generic,
}

/// One resolved profile per indexed task.
///
/// Distinct profiles are stored once and shared by index.
#[derive(Clone, Debug, Default)]
pub struct TaskProfiles {
    profiles: Vec<AppearanceProfile>,
    by_task: Vec<u32>,
    fallbacks: usize,
}

impl TaskProfiles {
    /// Resolve the profile of every task of `index` for `group`.
    ///
    /// Order: explicit assignment in `group`, `group` profile named by the task's predefined type,
    /// the same in [`DEFAULT_GROUP`], DEFAULT [`FALLBACK_PROFILE`], and finally the built-in
    /// generic profile. Never fails.
    #[tracing::instrument(skip_all, fields(tasks = index.len(), group = %group))]
    pub fn resolve(
        index: &ScheduleIndex,
        library: &ProfileLibrary,
        assignment: &dyn ProfileAssignment,
        group: &str,
    ) -> Self {
        let mut out = Self {
            profiles: Vec::new(),
            by_task: Vec::with_capacity(index.len()),
            fallbacks: 0,
        };
        let mut interned = HashMap::<(String, usize), u32>::new();
        let mut generic: Option<u32> = None;

        for rec in index.tasks() {
            let (found, source) = lookup(library, assignment, group, rec.id, &rec.predefined_type);
            if source != ProfileSource::Assigned {
                out.fallbacks += 1;
                tracing::debug!(task = %rec.id, ?source, "no profile assignment; falling back");
            }
            let slot = match found {
                Some((g, pos, profile)) => *interned.entry((g.to_owned(), pos)).or_insert_with(|| {
                    out.profiles.push(profile.clone());
                    (out.profiles.len() - 1) as u32
                }),
                None => *generic.get_or_insert_with(|| {
                    out.profiles.push(AppearanceProfile::generic_fallback());
                    (out.profiles.len() - 1) as u32
                }),
            };
            out.by_task.push(slot);
        }
        out
    }

    pub fn get(&self, task: TaskIdx) -> &AppearanceProfile {
        &self.profiles[self.by_task[task.as_usize()] as usize]
    }

    /// Tasks that did not resolve through an explicit assignment.
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }

    /// Number of distinct profiles in use.
    pub fn distinct(&self) -> usize {
        self.profiles.len()
    }
}

type Found<'a> = Option<(&'a str, usize, &'a AppearanceProfile)>;

fn lookup<'a>(
    library: &'a ProfileLibrary,
    assignment: &dyn ProfileAssignment,
    group: &str,
    task: TaskId,
    predefined_type: &str,
) -> (Found<'a>, ProfileSource) {
    let find = |g: &str, name: &str| -> Found<'a> {
        let (key, grp) = library.groups.get_key_value(g)?;
        let pos = grp.position(name)?;
        Some((key.as_str(), pos, &grp.profiles[pos]))
    };

    if let Some(name) = assignment.assigned_profile(task, group) {
        if let Some(f) = find(group, name) {
            return (Some(f), ProfileSource::Assigned);
        }
        tracing::warn!(task = %task, group, profile = name, "assigned profile does not exist");
    }
    if let Some(f) = find(group, predefined_type) {
        return (Some(f), ProfileSource::GroupPredefinedType);
    }
    if let Some(f) = find(DEFAULT_GROUP, predefined_type) {
        return (Some(f), ProfileSource::DefaultPredefinedType);
    }
    if let Some(f) = find(DEFAULT_GROUP, FALLBACK_PROFILE) {
        return (Some(f), ProfileSource::DefaultFallback);
    }
    (None, ProfileSource::Generic)
}

/// Built-in DEFAULT profiles, one per task predefined type.
fn default_group() -> ProfileGroup {
    let build = |name: &str, start: [f32; 4], active: [f32; 4], end: [f32; 4]| AppearanceProfile {
        name: name.to_owned(),
        start_color: Rgba::from(start),
        active_color: Rgba::from(active),
        end_color: Rgba::from(end),
        ..AppearanceProfile::default()
    };
    let removal = |name: &str| AppearanceProfile {
        visible_before_start: true,
        hide_at_end: true,
        use_start_original_color: true,
        use_end_original_color: false,
        ..build(name, [1.0, 1.0, 1.0, 1.0], [1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 0.0])
    };
    let existing = |name: &str| AppearanceProfile {
        visible_before_start: true,
        use_start_original_color: true,
        ..build(name, [1.0, 1.0, 1.0, 1.0], [0.0, 0.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0])
    };
    let neutral = |name: &str| {
        build(name, [0.7, 0.7, 0.7, 1.0], [0.5, 0.5, 0.5, 1.0], [0.3, 0.3, 0.3, 1.0])
    };
    let built = |name: &str, end: [f32; 4]| build(name, [1.0, 1.0, 1.0, 0.0], [0.0, 1.0, 0.0, 1.0], end);

    let profiles = vec![
        AppearanceProfile {
            effect: AppearanceEffect::Growth,
            ..built("CONSTRUCTION", [0.3, 1.0, 0.3, 1.0])
        },
        built("INSTALLATION", [0.3, 0.8, 0.5, 1.0]),
        built("RENOVATION", [0.9, 0.9, 0.9, 1.0]),
        build("LOGISTIC", [1.0, 1.0, 1.0, 0.0], [1.0, 1.0, 0.0, 1.0], [1.0, 0.8, 0.3, 1.0]),
        built("MOVE", [0.8, 0.6, 0.0, 1.0]),
        removal("DEMOLITION"),
        removal("REMOVAL"),
        removal("DISPOSAL"),
        removal("DISMANTLE"),
        existing("OPERATION"),
        existing("MAINTENANCE"),
        existing("ATTENDANCE"),
        neutral("USERDEFINED"),
        neutral(NOTDEFINED),
    ];
    ProfileGroup { profiles }
}

#[cfg(test)]
#[path = "../../tests/unit/appearance/library.rs"]
mod tests;
