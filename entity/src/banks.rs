//! # 银行（Provider）实体定义
//!
//! 已知 Open Banking 提供方的静态配置，启动时加载到注册表后只读。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 银行实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "banks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub base_url: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub auto_approve: bool,
    pub icon_filename: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::connected_banks::Entity")]
    ConnectedBanks,
    #[sea_orm(has_many = "super::payment_consents::Entity")]
    PaymentConsents,
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

impl ActiveModelBehavior for ActiveModel {}
