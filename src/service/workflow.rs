use crate::error::AppError;
use crate::models::{
    effective_status, DecisionStage, EffectiveStatus, Invoice, Queue, RoleFlags, SessionContext,
};
use serde::Serialize;

/// 行上可执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Approve,
    Decline,
    Resubmit,
}

/// 角色可打开的队列
pub fn available_queues(roles: RoleFlags) -> Vec<Queue> {
    if roles.admin {
        return vec![Queue::ForReview, Queue::ForApproval, Queue::Submitted, Queue::All];
    }
    let mut queues = Vec::with_capacity(3);
    if roles.reviewer {
        queues.push(Queue::ForReview);
    }
    if roles.approver {
        queues.push(Queue::ForApproval);
    }
    queues.push(Queue::Submitted);
    queues
}

/// 登录后默认进入的队列
pub fn default_queue(roles: RoleFlags) -> Queue {
    if roles.admin {
        Queue::All
    } else if roles.approver {
        Queue::ForApproval
    } else if roles.reviewer {
        Queue::ForReview
    } else {
        Queue::Submitted
    }
}

pub fn authorize_queue(roles: RoleFlags, queue: Queue) -> Result<(), AppError> {
    if available_queues(roles).contains(&queue) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("queue {} is not available", queue)))
    }
}

fn may_decide(roles: RoleFlags, stage: DecisionStage) -> bool {
    roles.admin
        || match stage {
            DecisionStage::Review => roles.reviewer,
            DecisionStage::Approval => roles.approver,
        }
}

pub fn authorize_decision(roles: RoleFlags, stage: DecisionStage) -> Result<(), AppError> {
    if may_decide(roles, stage) {
        Ok(())
    } else {
        let stage = match stage {
            DecisionStage::Review => "review",
            DecisionStage::Approval => "approval",
        };
        Err(AppError::Forbidden(format!("not allowed to decide at {} stage", stage)))
    }
}

/// 根据有效状态和当前用户角色得出行操作
pub fn row_actions(invoice: &Invoice, ctx: &SessionContext) -> Vec<RowAction> {
    let stage = match effective_status(invoice) {
        EffectiveStatus::ForReview => Some(DecisionStage::Review),
        EffectiveStatus::ForApproval => Some(DecisionStage::Approval),
        EffectiveStatus::Declined => {
            let own = invoice.submitted_by.as_deref() == Some(ctx.user_id.as_str());
            return if own { vec![RowAction::Resubmit] } else { Vec::new() };
        }
        EffectiveStatus::Approved | EffectiveStatus::Unknown(_) => None,
    };

    match stage {
        Some(stage) if may_decide(ctx.roles, stage) => vec![RowAction::Approve, RowAction::Decline],
        _ => Vec::new(),
    }
}

/// 只有本人提交且被拒的发票可以重新提交
pub fn authorize_resubmit(invoice: &Invoice, ctx: &SessionContext) -> Result<(), AppError> {
    if row_actions(invoice, ctx).contains(&RowAction::Resubmit) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "invoice {} cannot be resubmitted",
            invoice.id
        )))
    }
}
