//! Authorization requirements, one gate kind per variant.

use std::fmt;

use salesdesk_core::error::AppError;
use salesdesk_entity::company::{CompanyRole, CompanyRoleBinding, Permission};

/// What a call site demands of the caller's binding in a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// The bound role is one of these.
    AnyRole(Vec<CompanyRole>),
    /// The binding carries this permission flag.
    Permission(Permission),
    /// The bound role is exactly `role` and the level is at least `min_level`.
    Level { role: CompanyRole, min_level: i32 },
    /// The permission flag, or a level at or above the role's default level.
    Action(Permission),
}

impl Requirement {
    pub fn any_role(roles: &[CompanyRole]) -> Self {
        Self::AnyRole(roles.to_vec())
    }

    /// Evaluate against a binding. No binding never satisfies anything.
    pub fn is_met_by(&self, binding: Option<&CompanyRoleBinding>) -> bool {
        let Some(binding) = binding else {
            return false;
        };
        match self {
            Self::AnyRole(roles) => roles.contains(&binding.role),
            Self::Permission(permission) => binding.has_permission(*permission),
            Self::Level { role, min_level } => binding.role == *role && binding.level >= *min_level,
            Self::Action(permission) => {
                binding.has_permission(*permission) || binding.meets_role_level()
            }
        }
    }

    /// The error a `require` call reports for this requirement.
    pub fn denial(&self, is_member: bool) -> AppError {
        if !is_member {
            return AppError::forbidden("You are not a member of this company");
        }
        match self {
            Self::AnyRole(_) => AppError::forbidden(format!("Requires {self}")),
            Self::Permission(_) | Self::Action(_) => {
                AppError::insufficient_permission(format!("Requires {self}"))
            }
            Self::Level { .. } => AppError::insufficient_role_level(format!("Requires {self}")),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyRole(roles) => {
                let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(f, "role in [{}]", names.join(", "))
            }
            Self::Permission(p) => write!(f, "permission {}", p.as_str()),
            Self::Level { role, min_level } => write!(f, "role {role} at level {min_level}"),
            Self::Action(p) => write!(f, "permission {} or role level", p.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use salesdesk_core::error::ErrorCode;
    use uuid::Uuid;

    use super::*;

    fn binding(role: CompanyRole, level: i32) -> CompanyRoleBinding {
        let mut binding = CompanyRoleBinding::new(Uuid::new_v4(), Uuid::new_v4(), role);
        binding.level = level;
        binding
    }

    #[test]
    fn missing_binding_fails_closed() {
        let all = [
            Requirement::any_role(&CompanyRole::ALL),
            Requirement::Permission(Permission::CreateLead),
            Requirement::Level {
                role: CompanyRole::Salesman,
                min_level: 0,
            },
            Requirement::Action(Permission::CreateLead),
        ];
        for requirement in all {
            assert!(!requirement.is_met_by(None));
        }
    }

    #[test]
    fn level_gate_needs_the_exact_role() {
        let req = Requirement::Level {
            role: CompanyRole::Supervisor,
            min_level: 2,
        };
        assert!(req.is_met_by(Some(&binding(CompanyRole::Supervisor, 2))));
        assert!(!req.is_met_by(Some(&binding(CompanyRole::Supervisor, 1))));
        assert!(!req.is_met_by(Some(&binding(CompanyRole::Admin, 5))));
    }

    #[test]
    fn action_gate_accepts_flag_or_default_level() {
        let req = Requirement::Action(Permission::ApproveQuotation);

        let mut flagged = binding(CompanyRole::SalesManager, 1);
        assert!(!req.is_met_by(Some(&flagged)));
        flagged.permissions.insert(Permission::ApproveQuotation);
        assert!(req.is_met_by(Some(&flagged)));

        assert!(req.is_met_by(Some(&binding(CompanyRole::SalesManager, 3))));
        assert!(!req.is_met_by(Some(&binding(CompanyRole::SalesManager, 2))));
    }

    #[test]
    fn denial_codes_follow_the_gate() {
        let level = Requirement::Level {
            role: CompanyRole::Admin,
            min_level: 4,
        };
        assert_eq!(level.denial(true).code, ErrorCode::InsufficientRoleLevel);
        assert_eq!(
            Requirement::Permission(Permission::AssignLead).denial(true).code,
            ErrorCode::InsufficientPermission
        );
        assert_eq!(
            Requirement::any_role(&[CompanyRole::Admin]).denial(true).code,
            ErrorCode::Forbidden
        );
        assert_eq!(level.denial(false).code, ErrorCode::Forbidden);
    }
}
