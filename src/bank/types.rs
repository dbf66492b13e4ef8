//! 银行接口的请求与响应结构
//!
//! 不同银行对同一字段的命名与嵌套并不统一（`consentId` / `consent_id`，
//! 顶层或 `data` 下），这里统一做宽松解析。

use serde::Deserialize;
use serde_json::Value;

/// `POST /auth/bank-token` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// 银行声明的有效期（秒）
    pub expires_in: i64,
}

/// 在顶层或 `data` 对象中按候选键查找字符串字段
fn pick_str(value: &Value, keys: &[&str]) -> Option<String> {
    let scopes = [Some(value), value.get("data")];
    scopes.into_iter().flatten().find_map(|scope| {
        keys.iter().find_map(|key| match scope.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    })
}

fn pick_bool(value: &Value, keys: &[&str]) -> Option<bool> {
    let scopes = [Some(value), value.get("data")];
    scopes
        .into_iter()
        .flatten()
        .find_map(|scope| keys.iter().find_map(|key| scope.get(*key)?.as_bool()))
}

/// 同意创建 / 查询接口的统一响应
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsentResponse {
    /// 银行原始状态字符串
    pub status: Option<String>,
    pub consent_id: Option<String>,
    pub request_id: Option<String>,
    pub auto_approved: Option<bool>,
}

impl ConsentResponse {
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            status: pick_str(value, &["status"]),
            consent_id: pick_str(value, &["consent_id", "consentId"]),
            request_id: pick_str(value, &["request_id", "requestId"]),
            auto_approved: pick_bool(value, &["auto_approved", "autoApproved"]),
        }
    }
}

/// `POST /payments` / `GET /payments/{id}` 响应
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentStatusResponse {
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
}

impl PaymentStatusResponse {
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            payment_id: pick_str(value, &["paymentId", "payment_id"]),
            status: pick_str(value, &["status"]),
            created_at: pick_str(value, &["creationDateTime", "created_at"]),
        }
    }
}

/// `GET /accounts` 中的单个账户
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteAccount {
    pub account_id: String,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub account_type: Option<String>,
    pub account_subtype: Option<String>,
    pub nickname: Option<String>,
    pub opening_date: Option<String>,
    /// 账户持有人/标识数组，原样保存
    pub owner_data: Option<Value>,
    /// 余额数组，原样保存
    pub balance_data: Option<Value>,
}

impl RemoteAccount {
    fn from_value(value: &Value) -> Option<Self> {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| value.get(*key)?.as_str().map(str::to_string))
        };

        Some(Self {
            account_id: get(&["accountId", "account_id"])?,
            status: get(&["status"]),
            currency: get(&["currency"]),
            account_type: get(&["accountType", "account_type"]),
            account_subtype: get(&["accountSubType", "account_subtype"]),
            nickname: get(&["nickname"]),
            opening_date: get(&["openingDate", "opening_date"]),
            owner_data: value.get("account").filter(|v| v.is_array()).cloned(),
            balance_data: value.get("balance").filter(|v| v.is_array()).cloned(),
        })
    }

    /// 第一个持有人的名称
    #[must_use]
    pub fn owner_name(&self) -> Option<String> {
        self.owner_data
            .as_ref()?
            .get(0)?
            .get("name")?
            .as_str()
            .map(str::to_string)
    }
}

/// 解析账户列表，兼容 `data.account` / `accounts` / 顶层数组
#[must_use]
pub fn parse_accounts(value: &Value) -> Vec<RemoteAccount> {
    let list = value
        .get("data")
        .and_then(|data| data.get("account"))
        .or_else(|| value.get("accounts"))
        .or(Some(value))
        .and_then(Value::as_array);

    list.map(|items| items.iter().filter_map(RemoteAccount::from_value).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_consent_response_top_level() {
        let parsed = ConsentResponse::from_value(&json!({
            "status": "approved",
            "consent_id": "c-1",
            "auto_approved": true
        }));
        assert_eq!(parsed.status.as_deref(), Some("approved"));
        assert_eq!(parsed.consent_id.as_deref(), Some("c-1"));
        assert_eq!(parsed.request_id, None);
        assert_eq!(parsed.auto_approved, Some(true));
    }

    #[test]
    fn test_consent_response_nested_camel_case() {
        let parsed = ConsentResponse::from_value(&json!({
            "data": {"status": "Authorized", "consentId": "c-2", "requestId": "r-9"}
        }));
        assert_eq!(parsed.status.as_deref(), Some("Authorized"));
        assert_eq!(parsed.consent_id.as_deref(), Some("c-2"));
        assert_eq!(parsed.request_id.as_deref(), Some("r-9"));
    }

    #[test]
    fn test_payment_status_response() {
        let parsed = PaymentStatusResponse::from_value(&json!({
            "data": {"paymentId": "p-1", "status": "AcceptedSettlementInProcess", "creationDateTime": "2025-01-01T00:00:00Z"}
        }));
        assert_eq!(parsed.payment_id.as_deref(), Some("p-1"));
        assert_eq!(parsed.status.as_deref(), Some("AcceptedSettlementInProcess"));
    }

    #[test]
    fn test_parse_accounts() {
        let accounts = parse_accounts(&json!({
            "data": {"account": [
                {
                    "accountId": "acc-1",
                    "status": "Enabled",
                    "currency": "RUB",
                    "accountType": "Personal",
                    "accountSubType": "Checking",
                    "account": [{"schemeName": "RU.CBR.PAN", "identification": "40817810099910004312", "name": "Ivan Petrov"}],
                    "balance": [{"type": "InterimAvailable", "amount": {"amount": "1200.00", "currency": "RUB"}}]
                },
                {"status": "missing id is skipped"}
            ]}
        }));

        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_id, "acc-1");
        assert_eq!(accounts[0].account_subtype.as_deref(), Some("Checking"));
        assert_eq!(accounts[0].owner_name().as_deref(), Some("Ivan Petrov"));
        assert_eq!(
            accounts[0].balance_data.as_ref().and_then(|b| b[0]["amount"]["amount"].as_str()),
            Some("1200.00")
        );
    }

    #[test]
    fn test_parse_accounts_unknown_shape() {
        assert!(parse_accounts(&json!({"unexpected": true})).is_empty());
    }
}
