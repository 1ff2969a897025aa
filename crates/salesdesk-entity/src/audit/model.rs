//! Audit event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::action::AuditAction;

/// An immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditEvent {
    pub id: Uuid,
    /// What happened, e.g. `"login_failed"`.
    pub action: String,
    /// The account that acted, when known.
    pub actor_id: Option<Uuid>,
    /// The company the action was scoped to.
    pub company_id: Option<Uuid>,
    /// The account or resource acted upon.
    pub target_id: Option<Uuid>,
    /// Free-form structured details.
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An audit event before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEvent {
    pub action: String,
    pub actor_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Stamped when the event is raised, not when it is written.
    pub created_at: DateTime<Utc>,
}

impl NewAuditEvent {
    pub fn new(action: AuditAction) -> Self {
        Self::custom(action.as_str())
    }

    /// An event with a caller-defined action name.
    pub fn custom(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            actor_id: None,
            company_id: None,
            target_id: None,
            metadata: serde_json::Value::Object(Default::default()),
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    pub fn actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn company(mut self, company_id: Uuid) -> Self {
        self.company_id = Some(company_id);
        self
    }

    pub fn target(mut self, target_id: Uuid) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn into_event(self) -> AuditEvent {
        AuditEvent {
            id: Uuid::now_v7(),
            action: self.action,
            actor_id: self.actor_id,
            company_id: self.company_id,
            target_id: self.target_id,
            metadata: self.metadata,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        }
    }
}

/// Query filter for the audit log. Every set field must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub actor_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    pub fn matches(&self, event: &AuditEvent) -> bool {
        self.action.as_deref().is_none_or(|a| a == event.action)
            && self.actor_id.is_none_or(|id| event.actor_id == Some(id))
            && self.company_id.is_none_or(|id| event.company_id == Some(id))
            && self.target_id.is_none_or(|id| event.target_id == Some(id))
            && self.from.is_none_or(|from| event.created_at >= from)
            && self.to.is_none_or(|to| event.created_at <= to)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn filter_requires_every_field() {
        let actor = Uuid::new_v4();
        let company = Uuid::new_v4();
        let event = NewAuditEvent::new(AuditAction::RoleAssigned)
            .actor(actor)
            .company(company)
            .into_event();

        let mut filter = AuditFilter {
            action: Some("role_assigned".into()),
            actor_id: Some(actor),
            ..Default::default()
        };
        assert!(filter.matches(&event));

        filter.company_id = Some(Uuid::new_v4());
        assert!(!filter.matches(&event));
    }

    #[test]
    fn filter_time_bounds_are_inclusive() {
        let event = NewAuditEvent::new(AuditAction::Logout).into_event();
        let filter = AuditFilter {
            from: Some(event.created_at),
            to: Some(event.created_at),
            ..Default::default()
        };
        assert!(filter.matches(&event));

        let later = AuditFilter {
            from: Some(event.created_at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!later.matches(&event));
    }
}
