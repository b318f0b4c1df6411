use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::accounts::{self, AccountStatus};
use crate::roles::{self, RoleAssignment};

/// Account data returned from the repository (without password hash or
/// recovery challenge).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub has_password: bool,
    pub external_subject_id: Option<String>,
    pub auth_provider: Option<String>,
    pub role_category: Option<String>,
    pub role_sub_category: Option<String>,
    pub profile_completed: bool,
    pub status: AccountStatus,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bio: Option<String>,
    pub portfolio_url: Option<String>,
    pub experience_years: Option<i32>,
    pub specialization: Option<String>,
    pub resume_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            has_password: model.password_hash.is_some(),
            external_subject_id: model.external_subject_id,
            auth_provider: model.auth_provider,
            role_category: model.role_category,
            role_sub_category: model.role_sub_category,
            profile_completed: model.profile_completed,
            status: model.status,
            phone: model.phone,
            address: model.address,
            latitude: model.latitude,
            longitude: model.longitude,
            bio: model.bio,
            portfolio_url: model.portfolio_url,
            experience_years: model.experience_years,
            specialization: model.specialization,
            resume_path: model.resume_path,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Account {
    /// Outward role key derived from the stored sub-category, if a role was chosen.
    #[must_use]
    pub fn role_key(&self) -> Option<&'static str> {
        self.role_sub_category.as_deref().map(roles::reverse)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role_category.as_deref() == Some(roles::ADMIN_CATEGORY)
    }

    #[must_use]
    pub const fn is_provider_linked(&self) -> bool {
        self.external_subject_id.is_some()
    }
}

/// The account view handed back to callers of the onboarding flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub profile_completed: bool,
    pub status: AccountStatus,
    pub auth_provider: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            role: account.role_key().map(str::to_string),
            category: account.role_category.clone(),
            sub_category: account.role_sub_category.clone(),
            profile_completed: account.profile_completed,
            status: account.status,
            auth_provider: account.auth_provider.clone(),
        }
    }
}

/// A fully specified account created by the password signup path.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: RoleAssignment,
    pub status: AccountStatus,
}

/// Identity-provider subject to link onto an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub subject_id: String,
    pub provider: String,
}

/// Field-level profile update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub bio: Option<String>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub portfolio_url: Option<String>,
    pub experience_years: Option<i32>,
    pub specialization: Option<String>,
    pub resume_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// The recovery challenge currently stored on an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChallenge {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}
