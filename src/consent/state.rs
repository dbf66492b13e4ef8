//! # 同意状态机
//!
//! 纯函数部分：创建后的初始状态、是否需要轮询、轮询结果如何对账。
//! 服务层只负责取令牌、调银行接口和持久化。

use super::status::{ConsentKind, ConsentStatus};
use crate::bank::types::ConsentResponse;
use crate::error::{BridgeError, Result};

/// 轮询时使用的银行标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollTarget {
    /// 授权前的请求标识
    RequestId(String),
    /// 授权后的同意标识
    ConsentId(String),
}

impl PollTarget {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::RequestId(id) | Self::ConsentId(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// 不查询银行，原样返回记录
    Skip,
    Poll(PollTarget),
}

/// 判断一条记录是否需要查询银行
///
/// 终止状态永不轮询。已可用的账户同意只在调用方要求刷新时重新查询，
/// 已批准的支付同意不再查询。可用记录还没有 `consent_id` 时例外，
/// 按请求标识继续查询直到拿到它。
#[must_use]
pub fn poll_decision(
    kind: ConsentKind,
    status: &ConsentStatus,
    request_id: Option<&str>,
    consent_id: Option<&str>,
    refresh: bool,
) -> PollDecision {
    if status.is_final() {
        return PollDecision::Skip;
    }

    let consent = consent_id
        .filter(|id| !id.is_empty())
        .map(|id| PollTarget::ConsentId(id.to_string()));

    let usable = status.is_usable();
    if usable && consent.is_some() && !(kind == ConsentKind::Account && refresh) {
        return PollDecision::Skip;
    }

    let request = request_id
        .filter(|id| !id.is_empty())
        .map(|id| PollTarget::RequestId(id.to_string()));

    let target = if usable {
        consent.or(request)
    } else {
        request.or(consent)
    };

    target.map_or(PollDecision::Skip, PollDecision::Poll)
}

/// 一次需要持久化的状态变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub status: ConsentStatus,
    pub consent_id: Option<String>,
    /// 本次从不可用变为可用
    pub activated: bool,
}

/// 把银行返回的状态与本地记录对账
///
/// 只有状态真正变化，或可用记录第一次拿到 `consent_id` 时才返回 `Some`。
/// 银行未返回状态时不做任何变化。
#[must_use]
pub fn reconcile(
    kind: ConsentKind,
    current: &ConsentStatus,
    current_consent_id: Option<&str>,
    remote: &ConsentResponse,
) -> Option<Transition> {
    if current.is_final() {
        return None;
    }

    let next = ConsentStatus::normalize(kind, remote.status.as_deref()?);
    let consent_id = current_consent_id
        .map(str::to_string)
        .or_else(|| remote.consent_id.clone());

    if &next != current {
        return Some(Transition {
            activated: next.is_usable() && !current.is_usable(),
            status: next,
            consent_id,
        });
    }

    if next.is_usable() && current_consent_id.is_none() && consent_id.is_some() {
        return Some(Transition {
            status: next,
            consent_id,
            activated: false,
        });
    }

    None
}

/// 新建记录的初始字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialState {
    pub status: ConsentStatus,
    pub request_id: Option<String>,
    pub consent_id: Option<String>,
}

/// 根据创建接口的响应决定初始状态
///
/// 响应的 `auto_approved` 优先于银行配置。自动批准且带有 `consent_id` 时直接
/// 进入可用状态并丢弃请求标识，否则进入 `awaitingauthorization`。
pub fn initial_state(
    kind: ConsentKind,
    provider: &str,
    provider_auto_approve: bool,
    response: &ConsentResponse,
) -> Result<InitialState> {
    if response.request_id.is_none() && response.consent_id.is_none() {
        return Err(BridgeError::provider_rejected(
            provider,
            None,
            "响应中既没有 request_id 也没有 consent_id",
        ));
    }

    let normalized = response
        .status
        .as_deref()
        .map(|s| ConsentStatus::normalize(kind, s));

    if let Some(status) = normalized.as_ref().filter(|s| s.is_final()) {
        return Ok(InitialState {
            status: status.clone(),
            request_id: response.request_id.clone(),
            consent_id: response.consent_id.clone(),
        });
    }

    let approved = response.auto_approved.unwrap_or(provider_auto_approve)
        || normalized.as_ref().is_some_and(ConsentStatus::is_usable);

    if approved && let Some(consent_id) = &response.consent_id {
        return Ok(InitialState {
            status: kind.usable_status(),
            request_id: None,
            consent_id: Some(consent_id.clone()),
        });
    }

    Ok(InitialState {
        status: ConsentStatus::AwaitingAuthorization,
        request_id: response.request_id.clone(),
        consent_id: response.consent_id.clone(),
    })
}
