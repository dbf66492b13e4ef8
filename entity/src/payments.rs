//! # 支付历史实体定义
//!
//! 只追加的支付记录，以幂等键唯一。创建后只允许刷新 `status`。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 支付记录实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub debtor_account_id: Option<i32>,
    pub payment_consent_id: Option<i32>,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub bank_payment_id: Option<String>,
    pub status: String,
    /// 精确十进制文本，例如 "100.50"
    pub amount: String,
    pub currency: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub creditor_details: Option<String>,
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
        belongs_to = "super::accounts::Entity",
        from = "Column::DebtorAccountId",
        to = "super::accounts::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    DebtorAccount,
    #[sea_orm(
        belongs_to = "super::payment_consents::Entity",
        from = "Column::PaymentConsentId",
        to = "super::payment_consents::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    PaymentConsent,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DebtorAccount.def()
    }
}

impl Related<super::payment_consents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentConsent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
