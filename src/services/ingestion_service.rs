use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::time::{interval, MissedTickBehavior};
use crate::models::ingestion_task::{
    advance, apply_event, IngestionError, IngestionEvent, IngestionStage, IngestionTask, ProgressPlan, TaskId,
};

/// Who moves tasks forward after `enqueue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressDriver {
    /// A tokio ticker per task advances the simulated clock.
    Simulated,
    /// The caller advances tasks itself (tests, or an external event source).
    Manual,
}

/// The set of in-progress and finished ingestion tasks for one workspace.
///
/// Each task is its own state machine; tasks share nothing but the lock.
#[derive(Clone)]
pub struct IngestionTracker {
    tasks: Arc<Mutex<Vec<IngestionTask>>>,
    plan: ProgressPlan,
    driver: ProgressDriver,
}

impl IngestionTracker {
    pub fn new(plan: ProgressPlan, driver: ProgressDriver) -> Self {
        IngestionTracker {
            tasks: Arc::new(Mutex::new(Vec::new())),
            plan,
            driver,
        }
    }

    pub fn simulated() -> Self {
        IngestionTracker::new(ProgressPlan::default(), ProgressDriver::Simulated)
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<IngestionTask>> {
        self.tasks.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn snapshot(&self) -> Vec<IngestionTask> {
        self.tasks().clone()
    }

    pub fn get(&self, id: &str) -> Option<IngestionTask> {
        self.tasks().iter().find(|t| t.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks().iter().any(|t| t.id == id)
    }

    /// Adds a task without starting any driver for it.
    pub fn register(&self, filename: &str) -> Result<IngestionTask, IngestionError> {
        let task = IngestionTask::new(filename)?;
        let mut tasks = self.tasks();
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(IngestionError::DuplicateTask(task.id));
        }
        tasks.push(task.clone());
        info!("Tracking ingestion of {} as {}", task.filename, task.id);
        Ok(task)
    }

    /// Adds a task and, under the simulated driver, starts advancing it.
    pub fn enqueue(&self, filename: &str) -> Result<IngestionTask, IngestionError> {
        let task = self.register(filename)?;
        if self.driver == ProgressDriver::Simulated {
            self.spawn_simulation(task.id.clone());
        }
        Ok(task)
    }

    /// Enqueues every file of one drop independently. Invalid files are
    /// reported alongside the tasks that were created.
    pub fn enqueue_batch<'a, I>(&self, filenames: I) -> Vec<Result<IngestionTask, IngestionError>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        filenames.into_iter().map(|name| self.enqueue(name)).collect()
    }

    /// Removes a task that has not completed. Further progress for its id is
    /// dropped.
    pub fn cancel(&self, id: &str) -> Result<IngestionTask, IngestionError> {
        let mut tasks = self.tasks();
        let index = tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| IngestionError::NotFound(id.to_string()))?;
        if tasks[index].stage == IngestionStage::Complete {
            return Err(IngestionError::AlreadyComplete(id.to_string()));
        }
        let removed = tasks.remove(index);
        info!("Cancelled ingestion of {} ({})", removed.filename, removed.id);
        Ok(removed)
    }

    /// Moves one task along the simulated clock. `None` once the task is gone.
    pub fn advance_task(&self, id: &str, elapsed: Duration) -> Option<IngestionTask> {
        let plan = self.plan;
        self.update(id, |task| advance(task, elapsed, &plan))
    }

    /// Feeds one transport event to a task. `None` once the task is gone.
    pub fn apply_event(&self, id: &str, event: IngestionEvent) -> Option<IngestionTask> {
        let plan = self.plan;
        self.update(id, |task| apply_event(task, &event, &plan))
    }

    fn update<F>(&self, id: &str, transition: F) -> Option<IngestionTask>
    where
        F: FnOnce(&IngestionTask) -> IngestionTask,
    {
        let mut tasks = self.tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            debug!("Dropping progress for removed task {}", id);
            return None;
        };
        let next = transition(task);
        if next.stage != task.stage {
            info!("{} moved to {}", next.filename, next.stage.label());
        }
        *task = next.clone();
        Some(next)
    }

    fn spawn_simulation(&self, id: TaskId) {
        let Ok(handle) = Handle::try_current() else {
            warn!("No async runtime; task {} will not advance on its own", id);
            return;
        };
        let tracker = self.clone();
        let tick = self.plan.tick;
        handle.spawn(async move {
            let mut ticker = interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match tracker.advance_task(&id, tick) {
                    None => break,
                    Some(task) if task.stage.is_terminal() => break,
                    Some(_) => {}
                }
            }
        });
    }
}
