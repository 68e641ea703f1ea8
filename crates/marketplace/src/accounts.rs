//! Registration, login and credential recovery.

use std::sync::Arc;

use chrono::Duration;
use common::UserId;
use domain::{Clock, DomainError, EmailAddress, NewUser, Role, User, ValidationError};
use store::UserRepository;

use crate::credentials::{PasswordHasher, TokenClaims, TokenIssuer, TokenPurpose};
use crate::dto::{
    AuthTokensDto, LoginDto, MessageDto, PasswordResetRequestedDto, RegisterUserDto,
    ResetPasswordDto, UserDto,
};
use crate::error::{AppError, Result};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

const INVALID_CREDENTIALS: &str = "invalid credentials";
const RESET_REQUESTED: &str = "If the email is registered, a reset link has been sent.";

/// Lifetimes of the tokens handed out by [`AccountService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub email_verification_ttl: Duration,
    pub password_reset_ttl: Duration,
}

impl TokenPolicy {
    /// Default policy with a custom access token lifetime.
    pub fn with_access_ttl(access_ttl: Duration) -> Self {
        Self {
            access_ttl,
            ..Self::default()
        }
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            email_verification_ttl: Duration::hours(24),
            password_reset_ttl: Duration::hours(1),
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    policy: TokenPolicy,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
            policy,
        }
    }

    /// Creates a client or vendor account and signs it in.
    #[tracing::instrument(skip(self, dto), fields(email = %dto.email, role = %dto.role))]
    pub async fn register(&self, dto: RegisterUserDto) -> Result<AuthTokensDto> {
        if dto.role == Role::Admin {
            return Err(AppError::unauthorized("admin accounts cannot self-register"));
        }
        if !dto.adult_confirmed {
            return Err(ValidationError::AdultConfirmationRequired.into());
        }
        ensure_strong(&dto.password)?;

        let email = EmailAddress::parse(&dto.email)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict(format!("email already registered: {email}")).into());
        }

        let user = User::register(
            NewUser {
                name: dto.name,
                email,
                password_hash: self.hasher.hash(&dto.password)?,
                role: dto.role,
                adult_confirmed: dto.adult_confirmed,
            },
            self.clock.now(),
        )?;
        self.users.save(&user).await?;

        metrics::counter!("users_registered_total", "role" => user.role().as_str()).increment(1);
        tracing::info!(user_id = %user.id(), "user registered");

        Ok(self.sign_in(&user))
    }

    /// Checks email and password and issues a fresh token pair.
    ///
    /// An unknown email and a wrong password fail the same way.
    #[tracing::instrument(skip(self, dto), fields(email = %dto.email))]
    pub async fn authenticate(&self, dto: LoginDto) -> Result<AuthTokensDto> {
        let Ok(email) = EmailAddress::parse(&dto.email) else {
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };
        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::warn!("login for unknown email");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !self.hasher.verify(&dto.password, user.password_hash())? {
            tracing::warn!(user_id = %user.id(), "login with wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }
        if user.is_deleted() {
            return Err(AppError::unauthorized("account has been deleted"));
        }
        user.ensure_adult()?;

        tracing::info!(user_id = %user.id(), "user authenticated");
        Ok(self.sign_in(&user))
    }

    /// Exchanges a refresh token for a new token pair.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokensDto> {
        let claims = self
            .tokens
            .verify(refresh_token, TokenPurpose::Refresh)
            .ok_or_else(|| AppError::unauthorized("invalid refresh token"))?;
        let user = self.load(claims.user_id).await?;

        Ok(self.sign_in(&user))
    }

    /// Resolves a bearer access token to the caller it was issued to.
    ///
    /// The role comes from the stored account, so a deleted user is
    /// rejected even while the token is still live.
    #[tracing::instrument(skip_all)]
    pub async fn authenticate_access(&self, access_token: &str) -> Result<TokenClaims> {
        let claims = self
            .tokens
            .verify(access_token, TokenPurpose::Access)
            .ok_or_else(|| AppError::unauthorized("invalid or expired access token"))?;
        let Some(user) = self.users.find_by_id(claims.user_id).await? else {
            tracing::warn!(user_id = %claims.user_id, "access token for missing account");
            return Err(AppError::unauthorized("invalid or expired access token"));
        };

        Ok(TokenClaims {
            role: user.role(),
            ..claims
        })
    }

    /// Issues a token proving ownership of the user's email.
    #[tracing::instrument(skip(self))]
    pub async fn issue_email_verification(&self, user_id: UserId) -> Result<String> {
        let user = self.load(user_id).await?;
        Ok(self.issue(&user, TokenPurpose::EmailVerification))
    }

    #[tracing::instrument(skip_all)]
    pub async fn confirm_email(&self, token: &str) -> Result<MessageDto> {
        let claims = self
            .tokens
            .verify(token, TokenPurpose::EmailVerification)
            .ok_or_else(|| AppError::unauthorized("invalid or expired verification token"))?;
        let mut user = self.load(claims.user_id).await?;

        if user.is_email_verified() {
            return Ok(MessageDto::new("Email already verified."));
        }
        user.verify_email(self.clock.now());
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id(), "email verified");
        Ok(MessageDto::new("Email verified successfully."))
    }

    /// Starts a password reset.
    ///
    /// The reply never reveals whether the email is registered.
    #[tracing::instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<PasswordResetRequestedDto> {
        let user = match EmailAddress::parse(email) {
            Ok(email) => self.users.find_by_email(&email).await?,
            Err(_) => None,
        };

        let reset_token = user.map(|user| {
            tracing::info!(user_id = %user.id(), "password reset requested");
            self.issue(&user, TokenPurpose::PasswordReset)
        });

        Ok(PasswordResetRequestedDto {
            message: RESET_REQUESTED.to_string(),
            reset_token,
        })
    }

    #[tracing::instrument(skip_all)]
    pub async fn reset_password(&self, dto: ResetPasswordDto) -> Result<MessageDto> {
        if dto.password != dto.password_confirmation {
            return Err(ValidationError::PasswordMismatch.into());
        }
        ensure_strong(&dto.password)?;

        // Single use: a replayed link must not reset the password again.
        let claims = self
            .tokens
            .consume(&dto.token, TokenPurpose::PasswordReset)
            .ok_or_else(|| AppError::unauthorized("invalid or expired reset token"))?;
        let mut user = self.load(claims.user_id).await?;

        user.change_password_hash(self.hasher.hash(&dto.password)?, self.clock.now());
        self.users.update(&user).await?;

        tracing::info!(user_id = %user.id(), "password reset");
        Ok(MessageDto::new("Password reset successfully."))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_profile(&self, user_id: UserId) -> Result<UserDto> {
        let user = self.load(user_id).await?;
        Ok(UserDto::from(&user))
    }

    /// Soft-deletes the account. It disappears from every lookup.
    #[tracing::instrument(skip(self))]
    pub async fn delete_account(&self, user_id: UserId) -> Result<()> {
        let mut user = self.load(user_id).await?;
        user.soft_delete(self.clock.now());
        self.users.update(&user).await?;

        tracing::info!(%user_id, "account deleted");
        Ok(())
    }

    /// Drops expired tokens from the issuer.
    #[tracing::instrument(skip(self))]
    pub fn purge_expired_tokens(&self) -> usize {
        let purged = self.tokens.purge_expired();
        if purged > 0 {
            tracing::debug!(purged, "purged expired tokens");
        }
        purged
    }

    async fn load(&self, user_id: UserId) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", user_id))
    }

    fn sign_in(&self, user: &User) -> AuthTokensDto {
        AuthTokensDto {
            user: UserDto::from(user),
            access_token: self.issue(user, TokenPurpose::Access),
            refresh_token: self.issue(user, TokenPurpose::Refresh),
        }
    }

    fn issue(&self, user: &User, purpose: TokenPurpose) -> String {
        let ttl = match purpose {
            TokenPurpose::Access => self.policy.access_ttl,
            TokenPurpose::Refresh => self.policy.refresh_ttl,
            TokenPurpose::EmailVerification => self.policy.email_verification_ttl,
            TokenPurpose::PasswordReset => self.policy.password_reset_ttl,
        };
        let claims = TokenClaims {
            user_id: user.id(),
            role: user.role(),
            purpose,
        };
        self.tokens.issue(claims, ttl)
    }
}

fn ensure_strong(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::WeakPassword {
            min: MIN_PASSWORD_LEN,
        }
        .into());
    }
    Ok(())
}
