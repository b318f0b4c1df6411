use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Administrative lifecycle of an account. Independent of profile completion
/// and of the ability to log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[sea_orm(string_value = "pending")]
    Pending,

    #[sea_orm(string_value = "approved")]
    Approved,

    #[sea_orm(string_value = "rejected")]
    Rejected,

    #[sea_orm(string_value = "suspended")]
    Suspended,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// UUID v4, never reused
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    pub name: String,

    /// Argon2id password hash; absent for provider-only accounts
    pub password_hash: Option<String>,

    #[sea_orm(unique)]
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

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    pub portfolio_url: Option<String>,

    pub experience_years: Option<i32>,

    pub specialization: Option<String>,

    pub resume_path: Option<String>,

    /// Active recovery code; cleared together with `otp_expires_at`.
    pub otp_code: Option<String>,

    pub otp_expires_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
