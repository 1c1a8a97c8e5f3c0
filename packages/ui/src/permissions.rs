//! Roles and the capabilities they grant.
//!
//! The backend stores roles as free text and two vocabularies exist in the
//! data: `coordinator`/`staff`/`intern` and the older
//! `admin`/`coordenador`/`funcionario`/`estagiario`. Only the first is
//! canonical. Legacy names are mapped explicitly and every mapping is logged
//! so rows still using them can be found and migrated.

use std::fmt;

/// Wildcard capability: grants everything.
pub const ALL: &str = "all";

pub const CLIENTS: &str = "clients";
pub const APPOINTMENTS: &str = "appointments";
pub const FINANCIAL: &str = "financial";
pub const INVENTORY: &str = "inventory";
pub const CLINICAL_RECORDS: &str = "clinical_records";
pub const TESTS: &str = "tests";
pub const REPORTS: &str = "reports";
pub const SUPERVISION: &str = "supervision";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Coordinator,
    Staff,
    Intern,
    /// A stored role this client does not recognise. Grants nothing.
    Unknown(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "coordinator" => Role::Coordinator,
            "staff" => Role::Staff,
            "intern" => Role::Intern,
            "admin" | "coordenador" => Self::legacy(raw, Role::Coordinator),
            "funcionario" => Self::legacy(raw, Role::Staff),
            "estagiario" => Self::legacy(raw, Role::Intern),
            _ => {
                tracing::warn!(role = raw, "unrecognised role, granting no capabilities");
                Role::Unknown(raw.to_string())
            }
        }
    }

    fn legacy(raw: &str, role: Role) -> Role {
        tracing::warn!(legacy = raw, mapped = %role, "legacy role name in profile");
        role
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Coordinator => "coordinator",
            Role::Staff => "staff",
            Role::Intern => "intern",
            Role::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Role::Coordinator => "Coordinator",
            Role::Staff => "Staff",
            Role::Intern => "Intern",
            Role::Unknown(_) => "Unknown role",
        }
    }

    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Coordinator => &[ALL],
            Role::Staff => &[CLIENTS, APPOINTMENTS, FINANCIAL, INVENTORY, REPORTS],
            Role::Intern => &[CLIENTS, APPOINTMENTS, CLINICAL_RECORDS, TESTS, SUPERVISION],
            Role::Unknown(_) => &[],
        }
    }

    pub fn allows(&self, permission: &str) -> bool {
        let granted = self.permissions();
        granted.contains(&ALL) || granted.contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_wildcard() {
        assert!(Role::Coordinator.allows(FINANCIAL));
        assert!(Role::Coordinator.allows("anything-at-all"));
    }

    #[test]
    fn test_staff_and_intern_tables() {
        assert!(Role::Staff.allows(FINANCIAL));
        assert!(!Role::Staff.allows(CLINICAL_RECORDS));
        assert!(Role::Intern.allows(SUPERVISION));
        assert!(!Role::Intern.allows(INVENTORY));
    }

    #[test]
    fn test_legacy_aliases_map_to_canonical_roles() {
        assert_eq!(Role::parse("admin"), Role::Coordinator);
        assert_eq!(Role::parse("Coordenador"), Role::Coordinator);
        assert_eq!(Role::parse("funcionario"), Role::Staff);
        assert_eq!(Role::parse(" estagiario "), Role::Intern);
    }

    #[test]
    fn test_unknown_role_grants_nothing() {
        let role = Role::parse("receptionist");
        assert_eq!(role, Role::Unknown("receptionist".into()));
        assert!(!role.allows(CLIENTS));
        assert_eq!(role.as_str(), "receptionist");
    }
}
