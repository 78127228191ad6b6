// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Monitoring tasks
        manager
            .create_table(
                Table::create()
                    .table(NetworkTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NetworkTasks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NetworkTasks::GenerationId)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(NetworkTasks::Address).string().not_null())
                    .col(ColumnDef::new(NetworkTasks::Port).integer().not_null().default(0))
                    .col(ColumnDef::new(NetworkTasks::AccessType).string().not_null())
                    .col(
                        ColumnDef::new(NetworkTasks::IntervalMinutes)
                            .integer()
                            .not_null()
                            .default(15),
                    )
                    .col(
                        ColumnDef::new(NetworkTasks::OnlyWhenPreferredNetwork)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(NetworkTasks::NotifyOnFailure)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(NetworkTasks::Running)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(NetworkTasks::ActiveInstances)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NetworkTasks::FailureCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(NetworkTasks::LastScheduled)
                            .big_integer()
                            .not_null()
                            .default(-1),
                    )
                    .col(
                        ColumnDef::new(NetworkTasks::HighPriority)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_network_tasks_generation")
                    .table(NetworkTasks::Table)
                    .col(NetworkTasks::GenerationId)
                    .to_owned(),
            )
            .await?;

        // Probe results
        manager
            .create_table(
                Table::create()
                    .table(LogEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LogEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LogEntries::TaskId).big_integer().not_null())
                    .col(ColumnDef::new(LogEntries::Success).boolean().not_null())
                    .col(ColumnDef::new(LogEntries::Timestamp).big_integer().not_null())
                    .col(ColumnDef::new(LogEntries::Message).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_log_entries_task_timestamp")
                    .table(LogEntries::Table)
                    .col(LogEntries::TaskId)
                    .col(LogEntries::Timestamp)
                    .to_owned(),
            )
            .await?;

        // Per-task probe tunables
        manager
            .create_table(
                Table::create()
                    .table(AccessTypeData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessTypeData::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AccessTypeData::TaskId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AccessTypeData::PingCount).integer().not_null())
                    .col(
                        ColumnDef::new(AccessTypeData::PingPackageSize)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AccessTypeData::ConnectCount).integer().not_null())
                    .col(ColumnDef::new(AccessTypeData::StopOnSuccess).boolean().not_null())
                    .col(ColumnDef::new(AccessTypeData::IgnoreSslError).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SchedulerState::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchedulerState::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SchedulerState::Suspended)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SchedulerState::Timestamp)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SuspensionIntervals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SuspensionIntervals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SuspensionIntervals::StartMinute)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SuspensionIntervals::EndMinute)
                            .integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SuspensionIntervals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SchedulerState::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AccessTypeData::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LogEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NetworkTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NetworkTasks {
    Table,
    Id,
    GenerationId,
    Address,
    Port,
    AccessType,
    IntervalMinutes,
    OnlyWhenPreferredNetwork,
    NotifyOnFailure,
    Running,
    ActiveInstances,
    FailureCount,
    LastScheduled,
    HighPriority,
}

#[derive(DeriveIden)]
enum LogEntries {
    Table,
    Id,
    TaskId,
    Success,
    Timestamp,
    Message,
}

#[derive(DeriveIden)]
enum AccessTypeData {
    Table,
    Id,
    TaskId,
    PingCount,
    PingPackageSize,
    ConnectCount,
    StopOnSuccess,
    IgnoreSslError,
}

#[derive(DeriveIden)]
enum SchedulerState {
    Table,
    Id,
    Suspended,
    Timestamp,
}

#[derive(DeriveIden)]
enum SuspensionIntervals {
    Table,
    Id,
    StartMinute,
    EndMinute,
}
