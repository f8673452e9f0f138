use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use uuid::Uuid;

use models::user::NewUser;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn repo_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Repository(e.to_string())
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(models::user::find_by_email(&self.db, email).await?.map(AuthUser::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(models::user::find_by_username(&self.db, username).await?.map(AuthUser::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find_by_id(id).one(&self.db).await.map_err(repo_err)?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user_with_password(&self, user: NewUser, password_hash: String, password_algorithm: String) -> Result<AuthUser, AuthError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        let created = models::user::create(&txn, &user).await?;
        models::user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(repo_err)?;
        Ok(AuthUser::from(created))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm).await?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }
}
