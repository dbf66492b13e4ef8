//! # 支付同意实体定义
//!
//! 与账户访问同意共享生命周期，可用状态为 `approved`。`details` 保存原始请求体用于审计。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 支付同意实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_consents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub bank_name: String,
    pub bank_client_id: String,
    #[sea_orm(unique)]
    pub request_id: Option<String>,
    #[sea_orm(unique)]
    pub consent_id: Option<String>,
    pub status: String, // requested, awaitingauthorization, approved, rejected, expired, revoked
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
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
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
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

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
