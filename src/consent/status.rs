//! 同意状态词汇表与银行状态字符串的归一化

use std::fmt;

use serde::{Serialize, Serializer};

/// 同意的类别：两类同意的可用状态不同
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentKind {
    /// 账户访问同意，可用状态为 `active`
    Account,
    /// 支付同意，可用状态为 `approved`
    Payment,
}

impl ConsentKind {
    #[must_use]
    pub const fn usable_status(self) -> ConsentStatus {
        match self {
            Self::Account => ConsentStatus::Active,
            Self::Payment => ConsentStatus::Approved,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Payment => "payment",
        }
    }
}

/// 本地同意状态
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConsentStatus {
    Requested,
    AwaitingAuthorization,
    Active,
    Approved,
    Rejected,
    Expired,
    Revoked,
    /// 银行特有的中间状态，原样保存以便继续轮询
    Other(String),
}

impl ConsentStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Requested => "requested",
            Self::AwaitingAuthorization => "awaitingauthorization",
            Self::Active => "active",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Other(raw) => raw,
        }
    }

    /// 解析本地存储的状态
    #[must_use]
    pub fn parse(stored: &str) -> Self {
        let lowered = stored.trim().to_lowercase();
        match lowered.as_str() {
            "requested" => Self::Requested,
            "awaitingauthorization" => Self::AwaitingAuthorization,
            "active" => Self::Active,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "expired" => Self::Expired,
            "revoked" => Self::Revoked,
            _ => Self::Other(lowered),
        }
    }

    /// 把银行返回的状态映射到本地词汇：`authorized` 映射为该类同意的可用状态
    #[must_use]
    pub fn normalize(kind: ConsentKind, remote: &str) -> Self {
        let parsed = Self::parse(remote);
        match &parsed {
            Self::Other(raw) if raw == "authorized" => kind.usable_status(),
            _ => parsed,
        }
    }

    /// 终止状态：只能通过显式删除离开
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Rejected | Self::Expired | Self::Revoked)
    }

    #[must_use]
    pub const fn is_usable(&self) -> bool {
        matches!(self, Self::Active | Self::Approved)
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ConsentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ConsentKind::Account, "Authorized", ConsentStatus::Active)]
    #[case(ConsentKind::Payment, "authorized", ConsentStatus::Approved)]
    #[case(ConsentKind::Account, "REJECTED", ConsentStatus::Rejected)]
    #[case(ConsentKind::Payment, "AwaitingAuthorization", ConsentStatus::AwaitingAuthorization)]
    #[case(ConsentKind::Account, "Consumed", ConsentStatus::Other("consumed".to_string()))]
    fn test_normalize(#[case] kind: ConsentKind, #[case] remote: &str, #[case] expected: ConsentStatus) {
        assert_eq!(ConsentStatus::normalize(kind, remote), expected);
    }

    #[test]
    fn test_unknown_status_round_trips_verbatim() {
        let status = ConsentStatus::parse("pendingreview");
        assert_eq!(status.as_str(), "pendingreview");
        assert!(!status.is_final());
        assert!(!status.is_usable());
    }

    #[test]
    fn test_final_and_usable() {
        assert!(ConsentStatus::Revoked.is_final());
        assert!(ConsentStatus::Expired.is_final());
        assert!(!ConsentStatus::AwaitingAuthorization.is_final());
        assert!(ConsentStatus::Approved.is_usable());
        assert_eq!(ConsentKind::Account.usable_status(), ConsentStatus::Active);
    }
}
