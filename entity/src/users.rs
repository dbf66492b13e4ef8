//! # 用户实体定义
//!
//! 用户基础信息表的 Sea-ORM 实体模型。凭据存储不在本服务内，表中只保留身份与权限。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 用户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::connected_banks::Entity")]
    ConnectedBanks,
    #[sea_orm(has_many = "super::payment_consents::Entity")]
    PaymentConsents,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::connected_banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConnectedBanks.def()
    }
}

impl Related<super::payment_consents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentConsents.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
