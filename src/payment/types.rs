//! 支付请求、银行请求体与结果

use entity::{accounts, payments};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::money::format_amount;
use crate::error::{BridgeError, Result};

/// 账户标识方案
pub const SCHEME_NAME: &str = "RU.CBR.PAN";

/// 向外部收款人付款
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub payment_consent_id: i32,
    pub debtor_account_id: i32,
    pub creditor_name: String,
    pub creditor_account: String,
    /// 收款银行代码，例如 `abank`
    pub creditor_bank_code: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    pub reference: Option<String>,
    pub idempotency_key: Option<String>,
}

fn default_transfer_reference() -> Option<String> {
    Some("Transfer between own accounts".to_string())
}

/// 本人账户之间的转账，收款方信息从本地账户数据解析
#[derive(Debug, Clone, Deserialize)]
pub struct InternalTransferRequest {
    pub payment_consent_id: i32,
    pub debtor_account_id: i32,
    pub creditor_account_id: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
    #[serde(default = "default_transfer_reference")]
    pub reference: Option<String>,
    pub idempotency_key: Option<String>,
}

/// 收款方，保存在 `payments.creditor_details`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditorDetails {
    pub name: String,
    pub identification: String,
    pub bank_code: String,
}

/// 账户持有人信息中的标识与名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    pub identification: String,
    pub name: Option<String>,
}

/// 从已保存的 `owner_data` 解析第一个持有人的账户标识
pub fn account_identity(account: &accounts::Model) -> Result<AccountIdentity> {
    let owner: Value = account
        .owner_data
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .map_err(|_| BridgeError::incomplete_account_data(account.id, "owner_data 不是有效的 JSON"))?
        .unwrap_or(Value::Null);

    let first = owner.get(0);
    let identification = first
        .and_then(|o| o.get("identification"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BridgeError::incomplete_account_data(account.id, "缺少账户标识 identification"))?;

    Ok(AccountIdentity {
        identification: identification.to_string(),
        name: first
            .and_then(|o| o.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// 一次支付的规范化字段
#[derive(Debug, Clone)]
pub struct PaymentInstruction<'a> {
    pub amount: &'a Decimal,
    pub currency: &'a str,
    pub debtor_identification: &'a str,
    pub creditor: &'a CreditorDetails,
    pub reference: Option<&'a str>,
}

impl PaymentInstruction<'_> {
    /// `POST /payments` 请求体
    #[must_use]
    pub fn to_api_body(&self) -> Value {
        json!({
            "data": {
                "initiation": {
                    "instructedAmount": {
                        "amount": format_amount(self.amount),
                        "currency": self.currency,
                    },
                    "debtorAccount": {
                        "schemeName": SCHEME_NAME,
                        "identification": self.debtor_identification,
                    },
                    "creditorAccount": {
                        "schemeName": SCHEME_NAME,
                        "identification": self.creditor.identification,
                        "bank_code": self.creditor.bank_code,
                        "name": self.creditor.name,
                    },
                    "comment": self.reference,
                }
            }
        })
    }
}

/// 发起支付的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResult {
    #[serde(flatten)]
    pub payment: payments::Model,
    /// 幂等键已有记录，本次没有调用银行
    pub replayed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn account(owner_data: Option<&str>) -> accounts::Model {
        let now = chrono::Utc::now().naive_utc();
        accounts::Model {
            id: 7,
            connection_id: 1,
            api_account_id: "acc-1".to_string(),
            status: None,
            currency: Some("RUB".to_string()),
            account_type: None,
            account_subtype: None,
            nickname: None,
            opening_date: None,
            owner_data: owner_data.map(str::to_string),
            balance_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_account_identity_from_owner_data() {
        let identity = account_identity(&account(Some(
            r#"[{"schemeName":"RU.CBR.PAN","identification":"40817810000000000001","name":"Иванов Иван"}]"#,
        )))
        .unwrap();
        assert_eq!(identity.identification, "40817810000000000001");
        assert_eq!(identity.name.as_deref(), Some("Иванов Иван"));
    }

    #[test]
    fn test_missing_identification_is_incomplete() {
        for owner in [None, Some("[]"), Some(r#"[{"name":"x"}]"#), Some("not json")] {
            let err = account_identity(&account(owner)).unwrap_err();
            assert!(matches!(err, BridgeError::IncompleteAccountData { account_id: 7, .. }));
        }
    }

    #[test]
    fn test_payment_body_shape() {
        let amount = Decimal::from_str("150.5").unwrap();
        let creditor = CreditorDetails {
            name: "Петров Петр".to_string(),
            identification: "40817810000000000002".to_string(),
            bank_code: "abank".to_string(),
        };
        let body = PaymentInstruction {
            amount: &amount,
            currency: "RUB",
            debtor_identification: "40817810000000000001",
            creditor: &creditor,
            reference: Some("Оплата услуг"),
        }
        .to_api_body();

        let initiation = &body["data"]["initiation"];
        assert_eq!(initiation["instructedAmount"]["amount"], json!("150.50"));
        assert_eq!(initiation["debtorAccount"]["schemeName"], json!(SCHEME_NAME));
        assert_eq!(initiation["creditorAccount"]["bank_code"], json!("abank"));
        assert_eq!(initiation["comment"], json!("Оплата услуг"));
    }

    #[test]
    fn test_request_parses_decimal_text() {
        let parsed: std::result::Result<PaymentRequest, _> = serde_json::from_value(json!({
            "payment_consent_id": 1,
            "debtor_account_id": 2,
            "creditor_name": "x",
            "creditor_account": "y",
            "creditor_bank_code": "abank",
            "amount": "10.25",
            "currency": "RUB"
        }));
        assert_eq!(parsed.unwrap().amount, Decimal::from_str("10.25").unwrap());
    }
}
