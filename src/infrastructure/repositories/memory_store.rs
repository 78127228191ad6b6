// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::access_type_data::AccessTypeData;
use crate::domain::models::log_entry::LogEntry;
use crate::domain::models::suspension::{SchedulerState, SuspensionInterval};
use crate::domain::models::task::{Task, NEVER_SCHEDULED};
use crate::domain::repositories::access_type_data_repository::AccessTypeDataRepository;
use crate::domain::repositories::log_repository::LogRepository;
use crate::domain::repositories::scheduler_state_repository::SchedulerStateRepository;
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct StoreState {
    tasks: BTreeMap<i64, Task>,
    logs: Vec<LogEntry>,
    access_data: BTreeMap<i64, AccessTypeData>,
    scheduler_state: SchedulerState,
    intervals: BTreeMap<i64, SuspensionInterval>,
    last_task_id: i64,
    last_log_id: i64,
    last_data_id: i64,
    last_interval_id: i64,
    last_generation: i64,
}

impl StoreState {
    fn next_generation(&mut self) -> i64 {
        self.last_generation += 1;
        self.last_generation
    }

    fn task_mut(&mut self, id: i64) -> Result<&mut Task, RepositoryError> {
        self.tasks.get_mut(&id).ok_or(RepositoryError::NotFound)
    }
}

/// 内存存储
///
/// 在一个互斥锁下实现全部仓库接口，供 `database.url = "memory"` 以及测试使用
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn insert(&self, task: &Task) -> Result<Task, RepositoryError> {
        let mut state = self.state.lock();
        state.last_task_id += 1;
        let stored = Task {
            id: state.last_task_id,
            generation_id: 0,
            running: false,
            active_instances: 0,
            failure_count: 0,
            last_scheduled: NEVER_SCHEDULED,
            ..task.clone()
        };
        state.tasks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Task>, RepositoryError> {
        Ok(self.state.lock().tasks.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Task>, RepositoryError> {
        Ok(self.state.lock().tasks.values().cloned().collect())
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        let mut state = self.state.lock();
        let generation_id = state.next_generation();
        let stored = state.task_mut(task.id)?;
        stored.generation_id = generation_id;
        stored.address = task.address.clone();
        stored.port = task.port;
        stored.access_type = task.access_type;
        stored.interval_minutes = task.interval_minutes;
        stored.only_when_preferred_network = task.only_when_preferred_network;
        stored.notify_on_failure = task.notify_on_failure;
        stored.high_priority = task.high_priority;
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn update_running(&self, id: i64, running: bool) -> Result<i64, RepositoryError> {
        let mut state = self.state.lock();
        if !state.tasks.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        let generation_id = state.next_generation();
        let task = state.task_mut(id)?;
        task.running = running;
        task.generation_id = generation_id;
        Ok(generation_id)
    }

    async fn any_running(&self) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().tasks.values().any(|task| task.running))
    }

    async fn try_acquire_instance(
        &self,
        id: i64,
        max_instances: u32,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock();
        let task = state.task_mut(id)?;
        if task.active_instances >= max_instances {
            return Ok(false);
        }
        task.active_instances += 1;
        Ok(true)
    }

    async fn release_instance(&self, id: i64) -> Result<(), RepositoryError> {
        if let Some(task) = self.state.lock().tasks.get_mut(&id) {
            task.active_instances = task.active_instances.saturating_sub(1);
        }
        Ok(())
    }

    async fn reset_all_instances(&self) -> Result<(), RepositoryError> {
        for task in self.state.lock().tasks.values_mut() {
            task.active_instances = 0;
        }
        Ok(())
    }

    async fn update_failure_count(
        &self,
        id: i64,
        failure_count: u32,
    ) -> Result<(), RepositoryError> {
        if let Some(task) = self.state.lock().tasks.get_mut(&id) {
            task.failure_count = failure_count;
        }
        Ok(())
    }

    async fn increment_failure_count(&self, id: i64) -> Result<u32, RepositoryError> {
        let mut state = self.state.lock();
        let task = state.task_mut(id)?;
        task.failure_count = task.failure_count.saturating_add(1);
        Ok(task.failure_count)
    }

    async fn reset_failure_count(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock();
        let task = state.task_mut(id)?;
        let was_failing = task.failure_count > 0;
        task.failure_count = 0;
        Ok(was_failing)
    }

    async fn update_last_scheduled(
        &self,
        id: i64,
        last_scheduled: i64,
    ) -> Result<(), RepositoryError> {
        if let Some(task) = self.state.lock().tasks.get_mut(&id) {
            task.last_scheduled = last_scheduled;
        }
        Ok(())
    }

    async fn reset_counters(&self, id: i64) -> Result<(), RepositoryError> {
        if let Some(task) = self.state.lock().tasks.get_mut(&id) {
            task.failure_count = 0;
            task.last_scheduled = NEVER_SCHEDULED;
        }
        Ok(())
    }
}

/// 与数据库实现一致的倒序：时间戳优先，其次 ID
fn newest_first(a: &LogEntry, b: &LogEntry) -> std::cmp::Ordering {
    b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id))
}

#[async_trait]
impl LogRepository for InMemoryStore {
    async fn insert_and_trim(
        &self,
        entry: &LogEntry,
        limit: u64,
    ) -> Result<LogEntry, RepositoryError> {
        let mut state = self.state.lock();
        state.last_log_id += 1;
        let stored = LogEntry {
            id: state.last_log_id,
            ..entry.clone()
        };
        state.logs.push(stored.clone());

        let mut own: Vec<&LogEntry> = state
            .logs
            .iter()
            .filter(|log| log.task_id == entry.task_id)
            .collect();
        own.sort_by(|a, b| newest_first(a, b));
        let expired: Vec<i64> = own
            .iter()
            .skip(limit.max(1) as usize)
            .map(|log| log.id)
            .collect();
        state.logs.retain(|log| !expired.contains(&log.id));

        Ok(stored)
    }

    async fn find_by_task(
        &self,
        task_id: i64,
        limit: u64,
    ) -> Result<Vec<LogEntry>, RepositoryError> {
        let state = self.state.lock();
        let mut logs: Vec<LogEntry> = state
            .logs
            .iter()
            .filter(|log| log.task_id == task_id)
            .cloned()
            .collect();
        logs.sort_by(newest_first);
        logs.truncate(limit as usize);
        Ok(logs)
    }

    async fn find_latest(&self, task_id: i64) -> Result<Option<LogEntry>, RepositoryError> {
        let state = self.state.lock();
        Ok(state
            .logs
            .iter()
            .filter(|log| log.task_id == task_id)
            .min_by(|a, b| newest_first(a, b))
            .cloned())
    }

    async fn delete_by_task(&self, task_id: i64) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock();
        let before = state.logs.len();
        state.logs.retain(|log| log.task_id != task_id);
        Ok((before - state.logs.len()) as u64)
    }
}

#[async_trait]
impl AccessTypeDataRepository for InMemoryStore {
    async fn find_by_task(&self, task_id: i64) -> Result<Option<AccessTypeData>, RepositoryError> {
        Ok(self.state.lock().access_data.get(&task_id).cloned())
    }

    async fn upsert(&self, data: &AccessTypeData) -> Result<AccessTypeData, RepositoryError> {
        let mut state = self.state.lock();
        let id = match state.access_data.get(&data.task_id) {
            Some(existing) => existing.id,
            None => {
                state.last_data_id += 1;
                state.last_data_id
            }
        };
        let stored = AccessTypeData { id, ..data.clone() };
        state.access_data.insert(data.task_id, stored.clone());
        Ok(stored)
    }

    async fn delete_by_task(&self, task_id: i64) -> Result<(), RepositoryError> {
        self.state.lock().access_data.remove(&task_id);
        Ok(())
    }
}

#[async_trait]
impl SchedulerStateRepository for InMemoryStore {
    async fn read_state(&self) -> Result<SchedulerState, RepositoryError> {
        Ok(self.state.lock().scheduler_state)
    }

    async fn update_state(&self, scheduler_state: SchedulerState) -> Result<(), RepositoryError> {
        self.state.lock().scheduler_state = scheduler_state;
        Ok(())
    }

    async fn read_intervals(&self) -> Result<Vec<SuspensionInterval>, RepositoryError> {
        let mut intervals: Vec<SuspensionInterval> =
            self.state.lock().intervals.values().copied().collect();
        intervals.sort_by_key(|interval| (interval.start, interval.id));
        Ok(intervals)
    }

    async fn insert_interval(
        &self,
        interval: &SuspensionInterval,
    ) -> Result<SuspensionInterval, RepositoryError> {
        let mut state = self.state.lock();
        state.last_interval_id += 1;
        let stored = SuspensionInterval {
            id: state.last_interval_id,
            ..*interval
        };
        state.intervals.insert(stored.id, stored);
        Ok(stored)
    }

    async fn delete_interval(&self, id: i64) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .intervals
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}
