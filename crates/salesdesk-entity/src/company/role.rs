//! Company role enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roles an account can hold inside one company.
///
/// Declared lowest first so the derived ordering follows seniority:
/// Salesman < Supervisor < Sales Manager < Admin < Superadmin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompanyRole {
    Salesman,
    Supervisor,
    #[serde(rename = "Sales Manager")]
    SalesManager,
    Admin,
    Superadmin,
}

impl CompanyRole {
    pub const ALL: [CompanyRole; 5] = [
        Self::Salesman,
        Self::Supervisor,
        Self::SalesManager,
        Self::Admin,
        Self::Superadmin,
    ];

    /// The level a binding needs to act on role authority alone.
    pub fn default_level(&self) -> i32 {
        match self {
            Self::Superadmin => 5,
            Self::Admin => 4,
            Self::SalesManager => 3,
            Self::Supervisor => 2,
            Self::Salesman => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salesman => "Salesman",
            Self::Supervisor => "Supervisor",
            Self::SalesManager => "Sales Manager",
            Self::Admin => "Admin",
            Self::Superadmin => "Superadmin",
        }
    }
}

impl fmt::Display for CompanyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompanyRole {
    type Err = salesdesk_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "salesman" => Ok(Self::Salesman),
            "supervisor" => Ok(Self::Supervisor),
            "salesmanager" => Ok(Self::SalesManager),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            _ => Err(salesdesk_core::AppError::validation(format!(
                "Invalid company role: '{s}'. Expected one of: Superadmin, Admin, Sales Manager, Supervisor, Salesman"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seniority_ordering() {
        assert!(CompanyRole::Superadmin > CompanyRole::Admin);
        assert!(CompanyRole::SalesManager > CompanyRole::Supervisor);
        assert!(CompanyRole::Salesman < CompanyRole::Supervisor);
    }

    #[test]
    fn test_default_levels_follow_ordering() {
        let levels: Vec<i32> = CompanyRole::ALL.iter().map(|r| r.default_level()).collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Sales Manager".parse::<CompanyRole>().unwrap(), CompanyRole::SalesManager);
        assert_eq!("sales_manager".parse::<CompanyRole>().unwrap(), CompanyRole::SalesManager);
        assert_eq!("SUPERADMIN".parse::<CompanyRole>().unwrap(), CompanyRole::Superadmin);
        assert!("owner".parse::<CompanyRole>().is_err());
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&CompanyRole::SalesManager).unwrap();
        assert_eq!(json, "\"Sales Manager\"");
    }
}
