//! Professional role catalog.
//!
//! Maps the fine-grained role keys used at the API boundary (`architect`,
//! `land_owner`, ...) onto the coarse `(category, sub_category)` pair stored on
//! accounts and used for search, and back again.

use serde::Serialize;

/// Role key of the single administrator account.
pub const ADMIN_ROLE_KEY: &str = "admin";

/// Category that marks an account as the administrator.
pub const ADMIN_CATEGORY: &str = "Admin";

/// Category assigned to role keys the catalog does not know.
pub const FALLBACK_CATEGORY: &str = "Planning";

/// Role key reported for sub-categories the catalog does not know.
pub const FALLBACK_ROLE_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub key: &'static str,
    pub category: &'static str,
    pub sub_category: &'static str,
}

impl RoleDefinition {
    const fn new(key: &'static str, category: &'static str, sub_category: &'static str) -> Self {
        Self {
            key,
            category,
            sub_category,
        }
    }
}

pub static ROLES: [RoleDefinition; 14] = [
    RoleDefinition::new("architect", "Planning", "Architect"),
    RoleDefinition::new("interior_designer", "Planning", "Interior Designer"),
    RoleDefinition::new("landscape_architect", "Planning", "Landscape Architect"),
    RoleDefinition::new("structural_engineer", "Planning", "Structural Engineer"),
    RoleDefinition::new("urban_planner", "Planning", "Urban Planner"),
    RoleDefinition::new("surveyor", "Planning", "Surveyor"),
    RoleDefinition::new("civil_engineer", "Construction", "Civil Engineer"),
    RoleDefinition::new("contractor", "Construction", "Contractor"),
    RoleDefinition::new("site_supervisor", "Construction", "Site Supervisor"),
    RoleDefinition::new("electrician", "Construction", "Electrician"),
    RoleDefinition::new("plumber", "Construction", "Plumber"),
    RoleDefinition::new("real_estate_agent", "Real Estate", "Real Estate Agent"),
    RoleDefinition::new("land_owner", "Land Owner", "Land Owner"),
    RoleDefinition::new(ADMIN_ROLE_KEY, ADMIN_CATEGORY, "Admin"),
];

/// Storage-side classification of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleAssignment {
    pub category: String,
    pub sub_category: String,
}

impl RoleAssignment {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.category == ADMIN_CATEGORY
    }
}

/// Maps a role key onto its category pair.
///
/// Unknown keys are not an error: they land in [`FALLBACK_CATEGORY`] with the
/// raw key as sub-category, so every caller gets an assignment.
#[must_use]
pub fn resolve(role_key: &str) -> RoleAssignment {
    match find_by_key(role_key) {
        Some(role) => RoleAssignment {
            category: role.category.to_string(),
            sub_category: role.sub_category.to_string(),
        },
        None => RoleAssignment {
            category: FALLBACK_CATEGORY.to_string(),
            sub_category: role_key.to_string(),
        },
    }
}

/// Maps a stored sub-category back to its role key, or [`FALLBACK_ROLE_KEY`].
#[must_use]
pub fn reverse(sub_category: &str) -> &'static str {
    ROLES
        .iter()
        .find(|r| r.sub_category == sub_category)
        .map_or(FALLBACK_ROLE_KEY, |r| r.key)
}

#[must_use]
pub fn find_by_key(role_key: &str) -> Option<&'static RoleDefinition> {
    ROLES.iter().find(|r| r.key == role_key)
}

#[must_use]
pub fn is_admin_key(role_key: &str) -> bool {
    resolve(role_key).is_admin()
}
