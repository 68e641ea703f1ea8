//! Marketplace account.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::trimmed_name;
use crate::value_objects::EmailAddress;

/// Minimum length of a display name.
pub const MIN_NAME_LEN: usize = 2;

/// What a user may do on the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Buys from vendors.
    #[default]
    Client,

    /// Owns exactly one vendor.
    Vendor,

    /// Verifies vendors.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Vendor => "VENDOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for [`User::register`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub adult_confirmed: bool,
}

/// A registered user. Never hard-deleted.
///
/// Built only through [`User::register`]:
///
/// ```compile_fail
/// let user: domain::User = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    id: UserId,
    name: String,
    email: EmailAddress,
    password_hash: String,
    role: Role,
    adult_confirmed: bool,
    email_verified: bool,
    email_verified_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with a fresh id.
    pub fn register(new: NewUser, now: DateTime<Utc>) -> Result<Self> {
        let name = trimmed_name("name", &new.name, MIN_NAME_LEN)?;

        Ok(Self {
            id: UserId::new(),
            name,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            adult_confirmed: new.adult_confirmed,
            email_verified: false,
            email_verified_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

// Query methods
impl User {
    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_adult_confirmed(&self) -> bool {
        self.adult_confirmed
    }

    pub fn is_email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn email_verified_at(&self) -> Option<DateTime<Utc>> {
        self.email_verified_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_vendor(&self) -> bool {
        self.role == Role::Vendor
    }

    /// Fails with `Unauthorized` unless adulthood was confirmed.
    pub fn ensure_adult(&self) -> Result<()> {
        if !self.adult_confirmed {
            return Err(DomainError::Unauthorized(
                "user must be at least 18 years old".into(),
            ));
        }
        Ok(())
    }

    pub fn ensure_email_verified(&self) -> Result<()> {
        if !self.email_verified {
            return Err(DomainError::Unauthorized("email not verified".into()));
        }
        Ok(())
    }
}

// Mutations
impl User {
    pub fn confirm_adulthood(&mut self, now: DateTime<Utc>) {
        self.adult_confirmed = true;
        self.touch(now);
    }

    pub fn verify_email(&mut self, now: DateTime<Utc>) {
        self.email_verified = true;
        self.email_verified_at = Some(now);
        self.touch(now);
    }

    pub fn change_name(&mut self, name: &str, now: DateTime<Utc>) -> Result<()> {
        self.name = trimmed_name("name", name, MIN_NAME_LEN)?;
        self.touch(now);
        Ok(())
    }

    /// Replaces the email and clears its verification.
    pub fn change_email(&mut self, email: EmailAddress, now: DateTime<Utc>) {
        self.email = email;
        self.email_verified = false;
        self.email_verified_at = None;
        self.touch(now);
    }

    pub fn change_password_hash(&mut self, password_hash: String, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.touch(now);
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.touch(now);
    }

    pub fn restore_account(&mut self, now: DateTime<Utc>) {
        self.deleted_at = None;
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: EmailAddress::parse("ana@example.com").unwrap(),
            password_hash: "hash".to_string(),
            role: Role::Client,
            adult_confirmed: true,
        }
    }

    #[test]
    fn test_register_trims_name() {
        let user = User::register(new_user("  Ana  "), now()).unwrap();

        assert_eq!(user.name(), "Ana");
        assert_eq!(user.role(), Role::Client);
        assert!(!user.is_email_verified());
        assert!(!user.is_deleted());
        assert_eq!(user.created_at(), now());
        assert_eq!(user.updated_at(), now());
    }

    #[test]
    fn test_register_rejects_short_name() {
        let result = User::register(new_user(" A "), now());
        assert_eq!(
            result,
            Err(DomainError::Validation(ValidationError::InvalidName {
                field: "name",
                min: MIN_NAME_LEN,
            }))
        );
    }

    #[test]
    fn test_change_name_touches_updated_at() {
        let mut user = User::register(new_user("Ana"), now()).unwrap();
        let later = now() + Duration::minutes(5);

        user.change_name(" Ana Maria ", later).unwrap();
        assert_eq!(user.name(), "Ana Maria");
        assert_eq!(user.updated_at(), later);

        assert!(user.change_name("x", later).is_err());
        assert_eq!(user.name(), "Ana Maria");
    }

    #[test]
    fn test_change_email_resets_verification() {
        let mut user = User::register(new_user("Ana"), now()).unwrap();
        let later = now() + Duration::hours(1);

        user.verify_email(later);
        assert!(user.is_email_verified());
        assert_eq!(user.email_verified_at(), Some(later));

        let even_later = later + Duration::hours(1);
        user.change_email(EmailAddress::parse("new@example.com").unwrap(), even_later);
        assert!(!user.is_email_verified());
        assert_eq!(user.email_verified_at(), None);
        assert_eq!(user.updated_at(), even_later);
        assert!(user.ensure_email_verified().is_err());
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let mut user = User::register(new_user("Ana"), now()).unwrap();

        user.soft_delete(now());
        assert!(user.is_deleted());

        user.restore_account(now());
        assert!(!user.is_deleted());
    }

    #[test]
    fn test_ensure_adult() {
        let mut new = new_user("Ana");
        new.adult_confirmed = false;
        let mut user = User::register(new, now()).unwrap();

        assert!(matches!(
            user.ensure_adult(),
            Err(DomainError::Unauthorized(_))
        ));

        user.confirm_adulthood(now());
        assert!(user.ensure_adult().is_ok());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(Role::Vendor.to_string(), "VENDOR");
    }
}
