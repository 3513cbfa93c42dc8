//! Kanban lane store: four ordered, independently keyed lanes.
//!
//! # Responsibility
//! - Own the task order of every lane for the active project.
//! - Implement move/reorder, the drag-and-drop session, and task CRUD.
//!
//! # Invariants
//! - A task id appears in exactly one lane.
//! - `move_task` and `reorder_task` conserve the total task count.
//! - Every mutation is written before the call returns. A cross-lane move
//!   writes both lane keys with one atomic `set_many`.
//! - Lookup by id scans lanes in `Lane::ALL` order.

use crate::model::project::Project;
use crate::model::task::{Lane, NewTask, Task, TaskId, TaskPatch};
use crate::model::Position;
use crate::repo::document_repo::{
    load_document, save_document_or_log, save_documents_atomic_or_log, LoadSource,
};
use crate::service::scoped_document::ProjectScoped;
use crate::storage_key::{BaseKey, BaseKeyError};
use crate::store::KvStore;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Default base key of the board; lanes use `{base}.{lane_slug}`.
pub const KANBAN_BASE_KEY: &str = "kanban";
const MODULE: &str = "kanban";

pub type KanbanResult<T> = Result<T, KanbanError>;

/// Errors from lane store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KanbanError {
    /// No lane holds a task with this id.
    TaskNotFound(TaskId),
    /// A reorder index is outside the lane.
    IndexOutOfRange { lane: Lane, index: usize, len: usize },
    /// Task title is blank after trim.
    InvalidTitle,
}

impl Display for KanbanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::IndexOutOfRange { lane, index, len } => write!(
                f,
                "index {index} is out of range for lane {lane} with {len} tasks"
            ),
            Self::InvalidTitle => write!(f, "task title must not be blank"),
        }
    }
}

impl Error for KanbanError {}

/// Pointer-down state of a drag gesture.
///
/// Dropping the value without calling `KanbanBoard::drop_on` cancels the
/// gesture and leaves the board untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub task_id: TaskId,
    pub origin_lane: Lane,
    pub origin_index: usize,
    /// Pointer offset inside the dragged card, for the caller's rendering.
    pub grab_offset: Position,
}

/// Where a dragged card was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub lane: Lane,
    /// Slot within `lane`; `None` means the end of the lane.
    pub index: Option<usize>,
}

/// What a drop did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Moved { from: Lane, to: Lane },
    Reordered { lane: Lane, from: usize, to: usize },
    Unchanged,
}

/// Lane store of one kanban board.
pub struct KanbanBoard<'s, S: KvStore + ?Sized> {
    store: &'s S,
    lane_bases: [BaseKey; 4],
    lane_keys: [String; 4],
    lanes: [Vec<Task>; 4],
    lane_sources: [LoadSource; 4],
}

impl<'s, S: KvStore + ?Sized> KanbanBoard<'s, S> {
    /// Binds the board `base_key` under `active` and loads all lanes.
    pub fn open(
        store: &'s S,
        base_key: &BaseKey,
        active: Option<&Project>,
    ) -> Result<Self, BaseKeyError> {
        let lane_bases = [
            base_key.child(Lane::Todo.slug())?,
            base_key.child(Lane::InProgress.slug())?,
            base_key.child(Lane::Parked.slug())?,
            base_key.child(Lane::Done.slug())?,
        ];
        let lane_keys = lane_bases.clone().map(|base| base.resolve(active));
        let mut board = Self {
            store,
            lane_bases,
            lane_keys,
            lanes: Default::default(),
            lane_sources: [LoadSource::Missing; 4],
        };
        board.load_lanes();
        Ok(board)
    }

    /// Tasks of `lane` in display order.
    pub fn lane(&self, lane: Lane) -> &[Task] {
        &self.lanes[lane.index()]
    }

    /// Storage key of `lane` in the active namespace.
    pub fn lane_key(&self, lane: Lane) -> &str {
        &self.lane_keys[lane.index()]
    }

    pub fn lane_source(&self, lane: Lane) -> LoadSource {
        self.lane_sources[lane.index()]
    }

    pub fn total_tasks(&self) -> usize {
        self.lanes.iter().map(Vec::len).sum()
    }

    /// Finds the lane and index of `task_id`, scanning lanes in order.
    pub fn locate(&self, task_id: TaskId) -> Option<(Lane, usize)> {
        Lane::ALL.into_iter().find_map(|lane| {
            self.lanes[lane.index()]
                .iter()
                .position(|task| task.id == task_id)
                .map(|index| (lane, index))
        })
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        let (lane, index) = self.locate(task_id)?;
        self.lanes[lane.index()].get(index)
    }

    /// Appends a new task to TODO, the only entry point for new tasks.
    pub fn add_task(&mut self, mut input: NewTask) -> KanbanResult<Task> {
        input.title = normalize_title(&input.title)?;
        let task = Task::from_new(input);
        self.lanes[Lane::Todo.index()].push(task.clone());
        self.persist_lane(Lane::Todo);
        info!("event=kanban_add module={MODULE} status=ok task_id={}", task.id);
        Ok(task)
    }

    /// Moves `task_id` from `from` into `to` at `to_index`, or to the end.
    ///
    /// `to_index` is clamped to the target lane length. Returns `false`
    /// and changes nothing when the task is not in `from`.
    pub fn move_task(
        &mut self,
        task_id: TaskId,
        from: Lane,
        to: Lane,
        to_index: Option<usize>,
    ) -> bool {
        let Some(from_index) = self.lanes[from.index()]
            .iter()
            .position(|task| task.id == task_id)
        else {
            debug!(
                "event=kanban_move module={MODULE} status=noop task_id={task_id} from={from} to={to}"
            );
            return false;
        };

        let task = self.lanes[from.index()].remove(from_index);
        let target = &mut self.lanes[to.index()];
        let index = to_index.map_or(target.len(), |index| index.min(target.len()));
        target.insert(index, task);

        self.persist_pair(from, to);
        info!(
            "event=kanban_move module={MODULE} status=ok task_id={task_id} from={from} to={to} index={index}"
        );
        true
    }

    /// Moves the task at `from_index` to `to_index` within `lane`.
    pub fn reorder_task(&mut self, lane: Lane, from_index: usize, to_index: usize) -> KanbanResult<()> {
        let tasks = &mut self.lanes[lane.index()];
        let len = tasks.len();
        for index in [from_index, to_index] {
            if index >= len {
                return Err(KanbanError::IndexOutOfRange { lane, index, len });
            }
        }
        if from_index == to_index {
            return Ok(());
        }

        let task = tasks.remove(from_index);
        tasks.insert(to_index, task);
        self.persist_lane(lane);
        info!(
            "event=kanban_reorder module={MODULE} status=ok lane={lane} from={from_index} to={to_index}"
        );
        Ok(())
    }

    /// Merges `patch` into the task, wherever it lives.
    pub fn update_task(&mut self, task_id: TaskId, mut patch: TaskPatch) -> KanbanResult<Task> {
        if let Some(title) = patch.title.take() {
            patch.title = Some(normalize_title(&title)?);
        }
        let (lane, index) = self
            .locate(task_id)
            .ok_or(KanbanError::TaskNotFound(task_id))?;
        let task = &mut self.lanes[lane.index()][index];
        task.apply(patch);
        let updated = task.clone();
        self.persist_lane(lane);
        Ok(updated)
    }

    /// Removes the task from whichever lane holds it.
    pub fn delete_task(&mut self, task_id: TaskId) -> KanbanResult<Task> {
        let (lane, index) = self
            .locate(task_id)
            .ok_or(KanbanError::TaskNotFound(task_id))?;
        let removed = self.lanes[lane.index()].remove(index);
        self.persist_lane(lane);
        info!("event=kanban_delete module={MODULE} status=ok task_id={task_id} lane={lane}");
        Ok(removed)
    }

    /// Starts a drag gesture on `task_id`; `None` when no lane holds it.
    pub fn begin_drag(&self, task_id: TaskId, grab_offset: Position) -> Option<DragSession> {
        let (origin_lane, origin_index) = self.locate(task_id)?;
        Some(DragSession {
            task_id,
            origin_lane,
            origin_index,
            grab_offset,
        })
    }

    /// Completes a drag gesture on `target`.
    ///
    /// The task is re-located first, so a drop stays correct even if the
    /// board changed while dragging. Same-lane drops reorder (index clamped
    /// to the last slot); cross-lane drops move.
    pub fn drop_on(&mut self, session: DragSession, target: DropTarget) -> KanbanResult<DropOutcome> {
        let (current_lane, current_index) = self
            .locate(session.task_id)
            .ok_or(KanbanError::TaskNotFound(session.task_id))?;

        if current_lane != target.lane {
            self.move_task(session.task_id, current_lane, target.lane, target.index);
            return Ok(DropOutcome::Moved {
                from: current_lane,
                to: target.lane,
            });
        }

        let last = self.lanes[current_lane.index()].len() - 1;
        let to_index = target.index.map_or(last, |index| index.min(last));
        if to_index == current_index {
            return Ok(DropOutcome::Unchanged);
        }
        self.reorder_task(current_lane, current_index, to_index)?;
        Ok(DropOutcome::Reordered {
            lane: current_lane,
            from: current_index,
            to: to_index,
        })
    }

    /// Discards in-memory lanes and reloads them from the current keys.
    pub fn reload(&mut self) {
        self.load_lanes();
    }

    fn load_lanes(&mut self) {
        let mut seen = HashSet::new();
        let mut repaired = Vec::new();
        for lane in Lane::ALL {
            let key = &self.lane_keys[lane.index()];
            let (mut tasks, source): (Vec<Task>, LoadSource) = load_document(self.store, key, MODULE);
            let loaded = tasks.len();
            tasks.retain(|task| {
                let first = seen.insert(task.id);
                if !first {
                    warn!(
                        "event=kanban_load module={MODULE} status=error error_code=duplicate_task key={key} task_id={}",
                        task.id
                    );
                }
                first
            });
            if tasks.len() != loaded {
                repaired.push(lane);
            }
            self.lanes[lane.index()] = tasks;
            self.lane_sources[lane.index()] = source;
        }
        if !repaired.is_empty() {
            self.persist_lanes(&repaired);
        }
        debug!(
            "event=kanban_load module={MODULE} status=ok tasks={} repaired_lanes={}",
            self.total_tasks(),
            repaired.len()
        );
    }

    /// Writes the deduplicated lanes back so storage holds each id once.
    fn persist_lanes(&self, lanes: &[Lane]) -> bool {
        let documents: Vec<(String, &Vec<Task>)> = lanes
            .iter()
            .map(|lane| (self.lane_keys[lane.index()].clone(), &self.lanes[lane.index()]))
            .collect();
        save_documents_atomic_or_log(self.store, &documents, MODULE)
    }

    fn persist_lane(&self, lane: Lane) -> bool {
        save_document_or_log(
            self.store,
            &self.lane_keys[lane.index()],
            &self.lanes[lane.index()],
            MODULE,
        )
    }

    fn persist_pair(&self, first: Lane, second: Lane) -> bool {
        if first == second {
            return self.persist_lane(first);
        }
        self.persist_lanes(&[first, second])
    }
}

impl<S: KvStore + ?Sized> ProjectScoped for KanbanBoard<'_, S> {
    fn rescope(&mut self, active: Option<&Project>) {
        for lane in Lane::ALL {
            self.lane_keys[lane.index()] = self.lane_bases[lane.index()].resolve(active);
        }
        self.load_lanes();
        info!(
            "event=kanban_rescope module={MODULE} status=ok todo_key={} tasks={}",
            self.lane_keys[Lane::Todo.index()],
            self.total_tasks()
        );
    }

    // Every mutation is already written synchronously.
    fn tick(&mut self, _now: Instant) {}

    fn flush(&mut self) {}
}

fn normalize_title(title: &str) -> KanbanResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(KanbanError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
