use super::invoice::Invoice;
use serde::Serialize;

/// 有效状态 (用于展示)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveStatus {
    ForReview,
    ForApproval,
    Approved,
    Declined,
    /// 未识别的原始状态值，原样保留
    Unknown(String),
}

impl EffectiveStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "for_review" => EffectiveStatus::ForReview,
            "for_approval" => EffectiveStatus::ForApproval,
            "approved" => EffectiveStatus::Approved,
            "declined" => EffectiveStatus::Declined,
            other => EffectiveStatus::Unknown(other.to_string()),
        }
    }

    /// 排序用的键：已知状态用规范名，未识别状态用原始值
    pub fn key(&self) -> &str {
        match self {
            EffectiveStatus::ForReview => "for_review",
            EffectiveStatus::ForApproval => "for_approval",
            EffectiveStatus::Approved => "approved",
            EffectiveStatus::Declined => "declined",
            EffectiveStatus::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EffectiveStatus::ForReview => "Awaiting Review",
            EffectiveStatus::ForApproval => "Awaiting Approval",
            EffectiveStatus::Approved => "Approved",
            EffectiveStatus::Declined => "Declined",
            EffectiveStatus::Unknown(_) => "Unknown",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            EffectiveStatus::ForReview => "clock",
            EffectiveStatus::ForApproval => "hourglass",
            EffectiveStatus::Approved => "check-circle",
            EffectiveStatus::Declined => "x-circle",
            EffectiveStatus::Unknown(_) => "help-circle",
        }
    }

    pub fn badge(&self) -> StatusBadge {
        StatusBadge {
            key: self.key().to_string(),
            label: self.label(),
            icon: self.icon(),
        }
    }
}

/// 状态徽章 (渲染层使用)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub key: String,
    pub label: &'static str,
    pub icon: &'static str,
}

/// 解析发票的有效状态
///
/// `status` 存在时直接使用；缺失时看 `approved` / `declined` 标志，
/// 两者都不为 true 时回落到 `for_approval`（不是 `for_review`）。
pub fn effective_status(invoice: &Invoice) -> EffectiveStatus {
    match invoice.status.as_deref() {
        Some(raw) if !raw.is_empty() => EffectiveStatus::from_raw(raw),
        _ if invoice.approved == Some(true) => EffectiveStatus::Approved,
        _ if invoice.declined == Some(true) => EffectiveStatus::Declined,
        _ => EffectiveStatus::ForApproval,
    }
}

/// 自动展开规则：被拒（或 `approved == false`）且带有意见
pub fn needs_attention(invoice: &Invoice) -> bool {
    let rejected =
        effective_status(invoice) == EffectiveStatus::Declined || invoice.approved == Some(false);
    rejected && invoice.has_comment()
}
