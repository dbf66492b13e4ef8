//! # 银行账户实体定义
//!
//! 同意激活后从提供方同步的账户快照。`owner_data` / `balance_data` 以 JSON 文本保存。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 银行账户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub connection_id: i32,
    pub api_account_id: String,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub account_type: Option<String>,
    pub account_subtype: Option<String>,
    pub nickname: Option<String>,
    pub opening_date: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub owner_data: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub balance_data: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::connected_banks::Entity",
        from = "Column::ConnectionId",
        to = "super::connected_banks::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Connection,
}

impl Related<super::connected_banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Connection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
