use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use chrono::Duration;
use models::user::{self, NewUser, Role};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};
use uuid::Uuid;

use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession, ChangePasswordInput};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::{self, Claims};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub password_algorithm: String,
    /// Registrations with this email receive the admin role.
    pub admin_email: Option<String>,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into(), token_ttl: Duration::hours(12), password_algorithm: "argon2".into(), admin_email: None }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let input = RegisterInput { email: "user@example.com".into(), username: "user1".into(), display_name: "Test".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        let role = match &self.cfg.admin_email {
            Some(admin) if admin.trim().eq_ignore_ascii_case(input.email.trim()) => Role::Admin,
            _ => Role::User,
        };
        self.create_user(input, role).await
    }

    /// Create a user with an explicit role (admin-initiated creation and registration).
    #[instrument(skip(self, input), fields(email = %input.email, username = %input.username, role = %role))]
    pub async fn create_user(&self, input: RegisterInput, role: Role) -> Result<AuthUser, AuthError> {
        user::validate_email(&input.email)?;
        user::validate_username(&input.username)?;
        user::validate_display_name(&input.display_name)?;
        validate_password(&input.password)?;

        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }
        if self.repo.find_user_by_username(&input.username).await?.is_some() {
            debug!("username taken: {}", input.username);
            return Err(AuthError::Conflict);
        }

        let hash = hash_password(&input.password)?;
        let new_user = NewUser { email: input.email, username: input.username, display_name: input.display_name, role };
        let user = self.repo.create_user_with_password(new_user, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::new("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), username: "u_e".into(), display_name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !verify_password(&input.password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }

        let token = token::issue_token(&user, &self.cfg.jwt_secret, self.cfg.token_ttl)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }

    /// Replace the password after checking the current one.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn change_password(&self, user_id: Uuid, input: ChangePasswordInput) -> Result<(), AuthError> {
        validate_password(&input.new_password)?;
        let cred = self.repo.get_credentials(user_id).await?.ok_or(AuthError::NotFound)?;
        if !verify_password(&input.current_password, &cred.password_hash)? {
            return Err(AuthError::Unauthorized);
        }
        let hash = hash_password(&input.new_password)?;
        self.repo.upsert_password(user_id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user_id, "password_changed");
        Ok(())
    }

    /// Decode a bearer token into its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        token::decode_token(token, &self.cfg.jwt_secret)
    }

    /// Load the current state of the user a token was issued to.
    pub async fn current_user(&self, claims: &Claims) -> Result<AuthUser, AuthError> {
        self.repo.find_user_by_id(claims.sub).await?.ok_or(AuthError::NotFound)
    }

    /// Verify `token` and refresh its claims from the stored user.
    ///
    /// The role and email of the returned claims come from the repository, so a
    /// demotion takes effect on the next request. Tokens of deleted users are
    /// rejected with [`AuthError::Unauthorized`].
    pub async fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut claims = self.verify_token(token)?;
        let user = self.repo.find_user_by_id(claims.sub).await?.ok_or(AuthError::Unauthorized)?;
        if user.role != claims.role {
            debug!(user_id = %user.id, token_role = %claims.role, role = %user.role, "token role is stale");
        }
        claims.role = user.role;
        claims.email = user.email;
        Ok(claims)
    }
}
