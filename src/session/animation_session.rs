use std::time::{Duration, Instant};

use crate::appearance::library::{ProfileAssignment, ProfileLibrary, TaskProfiles};
use crate::apply::adapter::RenderAdapter;
use crate::apply::batch::{ApplyReport, BatchStateApplier};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ScheduleError, ScheduleResult};
use crate::resolve::fingerprint::{StateFingerprint, fingerprint_table};
use crate::resolve::table::StateTable;
use crate::resolve::visibility::VisibilityResolver;
use crate::scene::objects::{ObjectCache, Scene};
use crate::schedule::dates::{DatePriority, DateResolver};
use crate::schedule::index::{IndexOptions, ScheduleIndex};
use crate::schedule::model::Schedule;
use crate::timeline::settings::{AnimationSettings, Timeline};
use crate::timeline::window::{FrameWindowCalculator, FrameWindowTable};

/// How often each cache was (re)built over the lifetime of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct BuildCounters {
    pub index_builds: u64,
    pub object_builds: u64,
    pub builds: u64,
}

/// Diagnostics of one [`AnimationSession::build`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BuildStats {
    pub tasks_indexed: usize,
    pub products: usize,
    pub links: usize,
    pub indeterminate_tasks: usize,
    pub objects_cached: usize,
    pub windows: usize,
    pub profile_fallbacks: usize,
    pub state_keys: usize,
    pub fingerprint: StateFingerprint,
    /// Whether this build had to rebuild the schedule index.
    pub index_rebuilt: bool,
    /// Whether this build had to rebuild the object cache.
    pub objects_rebuilt: bool,
    pub index_duration: Duration,
    pub object_duration: Duration,
    pub resolve_duration: Duration,
    pub total_duration: Duration,
}

/// Output of a build: the timeline, per-task windows and the resolved state table.
#[derive(Clone, Debug)]
pub struct AnimationBuild {
    pub timeline: Timeline,
    pub windows: FrameWindowTable,
    pub table: StateTable,
    pub stats: BuildStats,
}

/// Schedule index plus the dates resolved against it, valid for one schedule and index setup.
struct ScheduleCache {
    index: ScheduleIndex,
    dates: DateResolver,
    opts: IndexOptions,
    priority: DatePriority,
}

/// Owns the inputs, caches and validity tokens of one 4D animation.
///
/// Caches are rebuilt lazily: a [`AnimationSession::build`] rebuilds whatever was invalidated
/// since the previous one, and nothing else.
pub struct AnimationSession {
    schedule: Schedule,
    scene: Scene,
    library: ProfileLibrary,
    assignment: Box<dyn ProfileAssignment>,
    settings: AnimationSettings,

    schedule_cache: Option<ScheduleCache>,
    objects: ObjectCache,
    current_frame: FrameIndex,
    counters: BuildCounters,
}

impl AnimationSession {
    pub fn new(
        schedule: Schedule,
        scene: Scene,
        mut library: ProfileLibrary,
        assignment: impl ProfileAssignment + 'static,
        settings: AnimationSettings,
    ) -> Self {
        library.ensure_default_group();
        let current_frame = settings.frames.start;
        Self {
            schedule,
            scene,
            library,
            assignment: Box::new(assignment),
            settings,
            schedule_cache: None,
            objects: ObjectCache::default(),
            current_frame,
            counters: BuildCounters::default(),
        }
    }

    /// Replace the schedule; the index is rebuilt on the next build.
    pub fn set_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
        self.invalidate_schedule();
    }

    /// Replace the scene inventory; the object cache is rebuilt on the next build.
    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
        self.invalidate_objects();
    }

    pub fn set_library(&mut self, mut library: ProfileLibrary) {
        library.ensure_default_group();
        self.library = library;
    }

    pub fn set_assignment(&mut self, assignment: impl ProfileAssignment + 'static) {
        self.assignment = Box::new(assignment);
    }

    /// Replace the settings. Only a change to the index options or date priority invalidates the
    /// schedule cache.
    pub fn set_settings(&mut self, settings: AnimationSettings) {
        if let Some(c) = &self.schedule_cache {
            if c.opts != index_options(&settings) || c.priority != settings.date_priority {
                self.schedule_cache = None;
            }
        }
        self.settings = settings;
    }

    pub fn invalidate_schedule(&mut self) {
        self.schedule_cache = None;
    }

    pub fn invalidate_objects(&mut self) {
        self.objects.invalidate();
    }

    pub fn schedule_is_valid(&self) -> bool {
        self.schedule_cache.is_some()
    }

    pub fn objects(&self) -> &ObjectCache {
        &self.objects
    }

    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    pub fn library(&self) -> &ProfileLibrary {
        &self.library
    }

    pub fn current_frame(&self) -> FrameIndex {
        self.current_frame
    }

    pub fn set_current_frame(&mut self, frame: FrameIndex) {
        self.current_frame = frame;
    }

    pub fn counters(&self) -> BuildCounters {
        self.counters
    }

    /// Rebuild stale caches and resolve the state of every product over the animation range.
    #[tracing::instrument(skip(self), fields(tasks = self.schedule.tasks.len()))]
    pub fn build(&mut self) -> ScheduleResult<AnimationBuild> {
        let t0 = Instant::now();

        let index_rebuilt = self.schedule_cache.is_none();
        let index_duration = if index_rebuilt {
            let t = Instant::now();
            let opts = index_options(&self.settings);
            let index = ScheduleIndex::build(&self.schedule, opts)?;
            let dates = DateResolver::resolve(&index, &self.settings.date_priority);
            self.schedule_cache = Some(ScheduleCache {
                index,
                dates,
                opts,
                priority: self.settings.date_priority.clone(),
            });
            self.counters.index_builds += 1;
            t.elapsed()
        } else {
            Duration::ZERO
        };

        let objects_rebuilt = !self.objects.is_valid();
        if objects_rebuilt {
            self.objects = ObjectCache::build(&self.scene);
            self.counters.object_builds += 1;
        }
        let object_duration = if objects_rebuilt {
            self.objects.stats().build_duration
        } else {
            Duration::ZERO
        };

        let Some(cache) = &self.schedule_cache else {
            return Err(ScheduleError::stale_cache("schedule index missing after rebuild"));
        };
        let timeline = Timeline::resolve(&self.settings, cache.dates.schedule_range())?;
        let calc = FrameWindowCalculator::new(timeline);
        let windows = FrameWindowTable::compute(&cache.index, &cache.dates, &calc);

        let t_resolve = Instant::now();
        let group = self.settings.active_group();
        let profiles =
            TaskProfiles::resolve(&cache.index, &self.library, self.assignment.as_ref(), group);
        let resolver = VisibilityResolver::new(&cache.index, &windows, &profiles);
        let table = resolver.resolve_all(timeline.frames, self.settings.parallel);
        let resolve_duration = t_resolve.elapsed();

        let stats = BuildStats {
            tasks_indexed: cache.index.len(),
            products: cache.index.products().len(),
            links: cache.index.link_count(),
            indeterminate_tasks: cache.dates.indeterminate_count(),
            objects_cached: self.objects.stats().objects_cached,
            windows: windows.count(),
            profile_fallbacks: profiles.fallback_count(),
            state_keys: table.key_count(),
            fingerprint: fingerprint_table(&table),
            index_rebuilt,
            objects_rebuilt,
            index_duration,
            object_duration,
            resolve_duration,
            total_duration: t0.elapsed(),
        };

        self.current_frame =
            timeline.initial_frame(self.current_frame, self.settings.preserve_current_frame);
        self.counters.builds += 1;
        tracing::info!(
            tasks = stats.tasks_indexed,
            products = stats.products,
            windows = stats.windows,
            keys = stats.state_keys,
            fingerprint = %stats.fingerprint,
            "animation built"
        );

        Ok(AnimationBuild {
            timeline,
            windows,
            table,
            stats,
        })
    }

    /// Build, then push the resulting state changes to `adapter`.
    pub fn rebuild(
        &mut self,
        adapter: &mut dyn RenderAdapter,
    ) -> ScheduleResult<(AnimationBuild, ApplyReport)> {
        let build = self.build()?;
        let report = BatchStateApplier.apply(&build.table, &self.objects, adapter)?;
        Ok((build, report))
    }
}

fn index_options(settings: &AnimationSettings) -> IndexOptions {
    IndexOptions {
        include_inputs: settings.include_inputs,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/animation_session.rs"]
mod tests;
