// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "network_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub generation_id: i64,
    pub address: String,
    pub port: i32,
    pub access_type: String,
    pub interval_minutes: i32,
    pub only_when_preferred_network: bool,
    pub notify_on_failure: bool,
    pub running: bool,
    pub active_instances: i32,
    pub failure_count: i32,
    pub last_scheduled: i64,
    pub high_priority: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
