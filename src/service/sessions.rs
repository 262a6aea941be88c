use crate::error::AppError;
use crate::models::{Invoice, Queue, SessionContext};
use crate::service::view_state::ListViewState;
use dashmap::DashMap;
use uuid::Uuid;

/// 一次视图会话：一个用户打开的一个队列批次及其视图状态
#[derive(Debug, Clone)]
pub struct ViewSession {
    pub owner: String,
    pub queue: Queue,
    pub invoices: Vec<Invoice>,
    pub state: ListViewState,
}

impl ViewSession {
    pub fn new(owner: &str, queue: Queue, invoices: Vec<Invoice>) -> Self {
        let state = ListViewState::new(&invoices);
        Self {
            owner: owner.to_string(),
            queue,
            invoices,
            state,
        }
    }

    /// 换入新批次，视图状态按新批次收敛
    pub fn replace_batch(&mut self, invoices: Vec<Invoice>) {
        self.invoices = invoices;
        self.state.replace_batch(&self.invoices);
    }
}

/// 视图会话表
#[derive(Debug, Default)]
pub struct ViewSessions {
    sessions: DashMap<Uuid, ViewSession>,
}

impl ViewSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 打开新会话；同一用户之前的会话随之失效 (导航即重置)
    pub fn open(&self, session: ViewSession) -> Uuid {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.owner != session.owner);
        let dropped = before.saturating_sub(self.sessions.len());
        if dropped > 0 {
            tracing::debug!("Dropped {} stale view session(s) of {}", dropped, session.owner);
        }

        let id = Uuid::new_v4();
        tracing::info!(
            "Open view session {} for {} ({} invoices, queue {})",
            id,
            session.owner,
            session.invoices.len(),
            session.queue
        );
        self.sessions.insert(id, session);
        id
    }

    /// 在会话上执行操作；别人的会话按不存在处理
    pub fn with_session<R>(
        &self,
        ctx: &SessionContext,
        id: Uuid,
        f: impl FnOnce(&mut ViewSession) -> R,
    ) -> Result<R, AppError> {
        let mut entry = self
            .sessions
            .get_mut(&id)
            .filter(|s| s.owner == ctx.user_id)
            .ok_or(AppError::SessionNotFound(id))?;
        Ok(f(entry.value_mut()))
    }

    pub fn close(&self, ctx: &SessionContext, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .remove_if(&id, |_, s| s.owner == ctx.user_id)
            .map(|_| tracing::info!("Closed view session {}", id))
            .ok_or(AppError::SessionNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleFlags;

    fn ctx(user: &str) -> SessionContext {
        SessionContext {
            token: "t".into(),
            user_id: user.into(),
            roles: RoleFlags::default(),
        }
    }

    #[test]
    fn sessions_are_private_to_their_owner() {
        let sessions = ViewSessions::new();
        let id = sessions.open(ViewSession::new("ann", Queue::Submitted, vec![Invoice::new(1)]));

        let count = sessions.with_session(&ctx("ann"), id, |s| s.invoices.len()).unwrap();
        assert_eq!(count, 1);
        assert!(matches!(
            sessions.with_session(&ctx("bob"), id, |_| ()),
            Err(AppError::SessionNotFound(_))
        ));
        assert!(sessions.close(&ctx("bob"), id).is_err());
        assert!(sessions.close(&ctx("ann"), id).is_ok());
        assert!(sessions.is_empty());
    }

    #[test]
    fn reopening_replaces_the_previous_session() {
        let sessions = ViewSessions::new();
        let first = sessions.open(ViewSession::new("ann", Queue::Submitted, vec![Invoice::new(1)]));
        let other = sessions.open(ViewSession::new("bob", Queue::Submitted, Vec::new()));
        let second = sessions.open(ViewSession::new("ann", Queue::ForReview, Vec::new()));

        assert_eq!(sessions.len(), 2);
        assert!(sessions.with_session(&ctx("ann"), first, |_| ()).is_err());
        assert!(sessions.with_session(&ctx("ann"), second, |_| ()).is_ok());
        assert!(sessions.with_session(&ctx("bob"), other, |_| ()).is_ok());
    }
}
