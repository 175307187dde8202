use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Range;

use smallvec::SmallVec;

use crate::foundation::error::{ScheduleError, ScheduleResult};
use crate::foundation::ids::{ProductId, ProductIdx, TaskId, TaskIdx};
use crate::schedule::model::{Schedule, TaskDates};

/// How a task relates to one of its products.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    /// The task builds the product.
    Output,
    /// The task consumes or removes the product.
    Input,
}

/// Options controlling which links the index resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexOptions {
    /// Resolve task inputs in addition to outputs.
    pub include_inputs: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            include_inputs: true,
        }
    }
}

/// Task → product edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductLink {
    pub product: ProductIdx,
    pub relationship: Relationship,
}

/// Product → task edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskLink {
    pub task: TaskIdx,
    pub relationship: Relationship,
}

/// A task flattened into the index arena.
#[derive(Clone, Debug)]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    pub predefined_type: String,
    pub parent: Option<TaskIdx>,
    pub children: Vec<TaskIdx>,
    /// Nesting depth, roots are `0`.
    pub depth: u32,
    pub dates: TaskDates,
    links: Range<u32>,
}

/// Flattened, pre-ordered task forest with interned products.
///
/// Parents always precede their children, so walking the arena backwards visits every child before
/// its parent. Task and product links are stored as index slices rather than owned collections per
/// record.
#[derive(Clone, Debug, Default)]
pub struct ScheduleIndex {
    tasks: Vec<TaskRecord>,
    roots: Vec<TaskIdx>,
    by_id: HashMap<TaskId, TaskIdx>,
    products: Vec<ProductId>,
    product_by_id: HashMap<ProductId, ProductIdx>,
    product_links: Vec<ProductLink>,
    product_tasks: Vec<SmallVec<[TaskLink; 2]>>,
}

impl ScheduleIndex {
    /// Flatten `schedule` in a single pass.
    ///
    /// Fails on duplicate ids, dangling children, tasks with two parents and parent/child cycles.
    #[tracing::instrument(skip_all, fields(tasks = schedule.tasks.len()))]
    pub fn build(schedule: &Schedule, opts: IndexOptions) -> ScheduleResult<Self> {
        let defs = &schedule.tasks;

        let mut def_pos = HashMap::<TaskId, usize>::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if def_pos.insert(def.id, i).is_some() {
                return Err(ScheduleError::DuplicateTask { task: def.id });
            }
        }

        let mut has_parent = vec![false; defs.len()];
        for def in defs {
            for &child in &def.children {
                if child == def.id {
                    return Err(ScheduleError::CyclicSchedule { task: child });
                }
                let Some(&ci) = def_pos.get(&child) else {
                    return Err(ScheduleError::UnknownTask {
                        parent: def.id,
                        child,
                    });
                };
                if std::mem::replace(&mut has_parent[ci], true) {
                    return Err(ScheduleError::MultipleParents { task: child });
                }
            }
        }

        let mut out = Self {
            tasks: Vec::with_capacity(defs.len()),
            ..Self::default()
        };
        let mut visited = vec![false; defs.len()];

        // (definition position, parent in the arena, depth)
        let mut stack: Vec<(usize, Option<TaskIdx>, u32)> = defs
            .iter()
            .enumerate()
            .rev()
            .filter(|(i, _)| !has_parent[*i])
            .map(|(i, _)| (i, None, 0))
            .collect();

        while let Some((di, parent, depth)) = stack.pop() {
            if std::mem::replace(&mut visited[di], true) {
                return Err(ScheduleError::CyclicSchedule { task: defs[di].id });
            }
            let def = &defs[di];
            let idx = TaskIdx(out.tasks.len() as u32);

            let links_start = out.product_links.len() as u32;
            out.push_links(idx, &def.outputs, Relationship::Output);
            if opts.include_inputs {
                out.push_links(idx, &def.inputs, Relationship::Input);
            }
            let links_end = out.product_links.len() as u32;

            out.tasks.push(TaskRecord {
                id: def.id,
                name: def.name.clone(),
                predefined_type: def.predefined_type.clone(),
                parent,
                children: Vec::with_capacity(def.children.len()),
                depth,
                dates: def.dates,
                links: links_start..links_end,
            });
            out.by_id.insert(def.id, idx);
            match parent {
                Some(p) => out.tasks[p.as_usize()].children.push(idx),
                None => out.roots.push(idx),
            }

            for child in def.children.iter().rev() {
                stack.push((def_pos[child], Some(idx), depth + 1));
            }
        }

        // Every non-root has exactly one parent, so anything unreached hangs off a cycle.
        if let Some(di) = visited.iter().position(|v| !v) {
            return Err(ScheduleError::CyclicSchedule { task: defs[di].id });
        }

        tracing::debug!(
            tasks = out.tasks.len(),
            roots = out.roots.len(),
            products = out.products.len(),
            links = out.product_links.len(),
            "schedule index built"
        );
        Ok(out)
    }

    fn push_links(&mut self, task: TaskIdx, products: &[ProductId], relationship: Relationship) {
        for &pid in products {
            let product = self.intern_product(pid);
            let link = TaskLink { task, relationship };
            // Tasks are pushed one at a time, so a repeat within this task is always the last link.
            let reverse = &mut self.product_tasks[product.as_usize()];
            if reverse.last() == Some(&link) {
                continue;
            }
            reverse.push(link);
            self.product_links.push(ProductLink {
                product,
                relationship,
            });
        }
    }

    fn intern_product(&mut self, pid: ProductId) -> ProductIdx {
        match self.product_by_id.entry(pid) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let idx = ProductIdx(self.products.len() as u32);
                self.products.push(pid);
                self.product_tasks.push(SmallVec::new());
                *e.insert(idx)
            }
        }
    }

    /// Number of indexed tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in pre-order.
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn task(&self, idx: TaskIdx) -> &TaskRecord {
        &self.tasks[idx.as_usize()]
    }

    pub fn roots(&self) -> &[TaskIdx] {
        &self.roots
    }

    pub fn lookup(&self, id: TaskId) -> Option<TaskIdx> {
        self.by_id.get(&id).copied()
    }

    /// Resolved product set of a task, outputs first.
    pub fn product_links(&self, idx: TaskIdx) -> &[ProductLink] {
        let r = &self.tasks[idx.as_usize()].links;
        &self.product_links[r.start as usize..r.end as usize]
    }

    /// Interned products, in first-reference order.
    pub fn products(&self) -> &[ProductId] {
        &self.products
    }

    pub fn product_id(&self, idx: ProductIdx) -> ProductId {
        self.products[idx.as_usize()]
    }

    pub fn product_idx(&self, id: ProductId) -> Option<ProductIdx> {
        self.product_by_id.get(&id).copied()
    }

    /// Tasks referencing `product`, in pre-order.
    pub fn tasks_for_product(&self, product: ProductIdx) -> &[TaskLink] {
        &self.product_tasks[product.as_usize()]
    }

    /// Total number of task → product links.
    pub fn link_count(&self) -> usize {
        self.product_links.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/index.rs"]
mod tests;
