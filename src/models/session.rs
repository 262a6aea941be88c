use super::invoice::InvoiceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 角色标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    pub reviewer: bool,
    pub approver: bool,
    pub admin: bool,
}

impl RoleFlags {
    /// 解析逗号分隔的角色列表，忽略未知角色
    pub fn parse(raw: &str) -> Self {
        let mut flags = RoleFlags::default();
        for role in raw.split(',').map(|r| r.trim().to_ascii_lowercase()) {
            match role.as_str() {
                "reviewer" => flags.reviewer = true,
                "approver" => flags.approver = true,
                "admin" => flags.admin = true,
                _ => {}
            }
        }
        flags
    }
}

/// 请求上下文：令牌、用户 ID、角色 (显式传递，不读全局状态)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: String,
    pub user_id: String,
    pub roles: RoleFlags,
}

/// 发票列表队列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Queue {
    ForReview,
    ForApproval,
    Submitted,
    All,
}

impl Queue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Queue::ForReview => "for_review",
            Queue::ForApproval => "for_approval",
            Queue::Submitted => "submitted",
            Queue::All => "all",
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审批流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStage {
    Review,
    Approval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Approve,
    Decline,
}

/// 转发给 webhook 的审批决定
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub invoice_id: InvoiceId,
    pub action: DecisionAction,
    pub stage: DecisionStage,
    pub comment: Option<String>,
}
