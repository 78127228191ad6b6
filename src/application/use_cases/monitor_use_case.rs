// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{
    application::{
        context::SchedulerContext,
        dto::{
            suspension_request::{SuspensionIntervalRequestDto, SuspensionStatusDto},
            task_request::{LogResponseDto, TaskRequestDto, TaskResponseDto},
        },
    },
    domain::{
        models::{
            access_type_data::AccessTypeData,
            suspension::SuspensionInterval,
            task::{DomainError, Task},
        },
        repositories::task_repository::RepositoryError,
    },
    queue::alarm::AlarmKey,
    utils::errors::SchedulerError,
};
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

/// 默认返回的日志条数
const DEFAULT_LOG_LIMIT: u64 = 50;

#[derive(Error, Debug)]
pub enum MonitorUseCaseError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Task {0} not found")]
    NotFound(i64),
    #[error("Suspension interval {0} not found")]
    IntervalNotFound(i64),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Scheduler error: {0}")]
    Scheduler(SchedulerError),
}

impl From<SchedulerError> for MonitorUseCaseError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::TaskNotFound(id) => MonitorUseCaseError::NotFound(id),
            SchedulerError::Domain(e) => MonitorUseCaseError::ValidationError(e.to_string()),
            other => MonitorUseCaseError::Scheduler(other),
        }
    }
}

impl From<DomainError> for MonitorUseCaseError {
    fn from(err: DomainError) -> Self {
        MonitorUseCaseError::ValidationError(err.to_string())
    }
}

/// 监控任务用例
///
/// 控制接口的全部操作，任务状态的变化都经由调度器完成
pub struct MonitorUseCase {
    context: Arc<SchedulerContext>,
}

impl MonitorUseCase {
    pub fn new(context: Arc<SchedulerContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<SchedulerContext> {
        &self.context
    }

    /// 创建任务，新任务处于停止状态
    pub async fn create_task(
        &self,
        request: &TaskRequestDto,
    ) -> Result<TaskResponseDto, MonitorUseCaseError> {
        validate(request)?;
        let task = request.to_task(0);
        task.validate()?;

        let repositories = &self.context.repositories;
        let stored = repositories.tasks.insert(&task).await?;
        let data = repositories
            .access_data
            .upsert(&request.to_access_type_data(stored.id))
            .await?;
        self.context.events.task_changed(stored.id);
        Ok(self.details(stored, data))
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskResponseDto>, MonitorUseCaseError> {
        let tasks = self.context.repositories.tasks.find_all().await?;
        let mut responses = Vec::with_capacity(tasks.len());
        for task in tasks {
            let data = self.access_data(task.id).await?;
            responses.push(self.details(task, data));
        }
        Ok(responses)
    }

    pub async fn get_task(&self, id: i64) -> Result<TaskResponseDto, MonitorUseCaseError> {
        let task = self.require(id).await?;
        let data = self.access_data(id).await?;
        Ok(self.details(task, data))
    }

    /// 修改任务定义，运行中的任务以新代号重新调度
    pub async fn update_task(
        &self,
        id: i64,
        request: &TaskRequestDto,
    ) -> Result<TaskResponseDto, MonitorUseCaseError> {
        validate(request)?;
        let task = request.to_task(id);
        task.validate()?;
        self.require(id).await?;

        // Store the probe parameters first so the restarted generation sees them.
        let data = self
            .context
            .repositories
            .access_data
            .upsert(&request.to_access_type_data(id))
            .await?;
        let updated = self.context.scheduler.update(&task).await?;
        Ok(self.details(updated, data))
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), MonitorUseCaseError> {
        Ok(self.context.scheduler.delete(id).await?)
    }

    pub async fn start_task(&self, id: i64) -> Result<TaskResponseDto, MonitorUseCaseError> {
        let task = self.context.scheduler.start(id).await?;
        let data = self.access_data(id).await?;
        Ok(self.details(task, data))
    }

    pub async fn stop_task(&self, id: i64) -> Result<TaskResponseDto, MonitorUseCaseError> {
        let task = self.context.scheduler.cancel(id).await?;
        let data = self.access_data(id).await?;
        Ok(self.details(task, data))
    }

    /// 按时间倒序读取任务日志
    pub async fn task_logs(
        &self,
        id: i64,
        limit: Option<u64>,
    ) -> Result<LogResponseDto, MonitorUseCaseError> {
        self.require(id).await?;
        let entries = self
            .context
            .repositories
            .logs
            .find_by_task(id, limit.unwrap_or(DEFAULT_LOG_LIMIT))
            .await?;
        Ok(LogResponseDto {
            task_id: id,
            entries,
        })
    }

    pub async fn suspension_status(&self) -> Result<SuspensionStatusDto, MonitorUseCaseError> {
        let suspension = self.context.scheduler.suspension();
        let intervals = suspension.intervals().await?;
        Ok(SuspensionStatusDto {
            enabled: suspension.is_enabled(),
            running: suspension.is_running(),
            suspended: suspension.is_suspended(),
            epoch: suspension.epoch(),
            intervals,
            next_transition_at: self.context.alarms.scheduled_at(AlarmKey::Suspension),
        })
    }

    pub async fn add_suspension_interval(
        &self,
        request: &SuspensionIntervalRequestDto,
    ) -> Result<SuspensionInterval, MonitorUseCaseError> {
        validate(request)?;
        let interval = SuspensionInterval::from_minutes(0, request.start_minute, request.end_minute)?;
        Ok(self.context.scheduler.add_suspension_interval(&interval).await?)
    }

    pub async fn remove_suspension_interval(&self, id: i64) -> Result<(), MonitorUseCaseError> {
        match self.context.scheduler.remove_suspension_interval(id).await {
            Err(SchedulerError::Repository(RepositoryError::NotFound)) => {
                Err(MonitorUseCaseError::IntervalNotFound(id))
            }
            other => Ok(other?),
        }
    }

    pub async fn set_suspension_enabled(
        &self,
        enabled: bool,
    ) -> Result<SuspensionStatusDto, MonitorUseCaseError> {
        self.context.scheduler.set_suspension_enabled(enabled).await?;
        self.suspension_status().await
    }

    async fn require(&self, id: i64) -> Result<Task, MonitorUseCaseError> {
        self.context
            .repositories
            .tasks
            .find_by_id(id)
            .await?
            .ok_or(MonitorUseCaseError::NotFound(id))
    }

    async fn access_data(&self, task_id: i64) -> Result<AccessTypeData, MonitorUseCaseError> {
        Ok(self
            .context
            .repositories
            .access_data
            .find_by_task(task_id)
            .await?
            .unwrap_or_else(|| AccessTypeData::for_task(task_id)))
    }

    fn details(&self, task: Task, access_type_data: AccessTypeData) -> TaskResponseDto {
        let next_run_at = self.context.alarms.scheduled_at(AlarmKey::Task(task.id));
        TaskResponseDto {
            task,
            access_type_data,
            next_run_at,
        }
    }
}

fn validate<T: Validate>(request: &T) -> Result<(), MonitorUseCaseError> {
    request
        .validate()
        .map_err(|errors| MonitorUseCaseError::ValidationError(errors.to_string()))
}
