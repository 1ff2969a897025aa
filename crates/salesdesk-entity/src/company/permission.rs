//! Fine-grained permission flags granted per company binding.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    CreateLead,
    AssignLead,
    ApproveQuotation,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateLead => "createLead",
            Self::AssignLead => "assignLead",
            Self::ApproveQuotation => "approveQuotation",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = salesdesk_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createLead" => Ok(Self::CreateLead),
            "assignLead" => Ok(Self::AssignLead),
            "approveQuotation" => Ok(Self::ApproveQuotation),
            _ => Err(salesdesk_core::AppError::validation(format!(
                "Invalid permission: '{s}'. Expected one of: createLead, assignLead, approveQuotation"
            ))),
        }
    }
}

/// A set of permission flags. Serializes as a sorted JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// Wire names, for storage in a text array column.
    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|p| p.as_str().to_string()).collect()
    }

    /// Parse stored names. Unknown names are rejected.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> salesdesk_core::AppResult<Self> {
        names
            .iter()
            .map(|n| n.as_ref().parse::<Permission>())
            .collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
