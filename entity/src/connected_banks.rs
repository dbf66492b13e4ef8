//! # 账户访问同意（Connection）实体定义
//!
//! 每行对应一个 (user, bank, bank_client_id) 三元组的账户访问授权生命周期。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 账户访问同意实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "connected_banks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub bank_name: String,
    pub bank_client_id: String,
    /// 授权前的请求标识
    #[sea_orm(unique)]
    pub request_id: Option<String>,
    /// 授权后的同意标识
    #[sea_orm(unique)]
    pub consent_id: Option<String>,
    pub status: String, // requested, awaitingauthorization, active, rejected, expired, revoked
    pub full_name: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::banks::Entity",
        from = "Column::BankName",
        to = "super::banks::Column::Name",
        on_update = "Restrict",
        on_delete = "Restrict"
    )]
    Bank,
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bank.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
