use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use hermes_core::identity::{IdentityError, NewUser, ProfileUpdate, User, UserCredentials};
use hermes_core::repository::UserRepository;
use hermes_core::{CoreError, CoreResult};

use crate::rows::{CredentialsRow, UserRow, USER_COLUMNS};
use crate::{db_err, is_unique_violation};

pub struct StoreUserRepository {
    pool: PgPool,
}

impl StoreUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for StoreUserRepository {
    async fn create_user(&self, user: NewUser) -> CoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, full_name, email, phone, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.full_name)
            .bind(user.email.expose())
            .bind(user.phone.expose())
            .bind(user.password_hash.expose())
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    CoreError::from(IdentityError::EmailTaken)
                } else {
                    db_err(e)
                }
            })?;
        row.try_into()
    }

    async fn find_credentials_by_email(&self, email: &str) -> CoreResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, full_name, email, role, password_hash, rating, reviews_count \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(UserCredentials::try_from).transpose()
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("User"))?
            .try_into()
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> CoreResult<User> {
        let sql = format!(
            "UPDATE users SET full_name = $1, phone = $2, car_brand = $3, car_model = $4, \
             car_year = $5, car_color = $6, car_number = $7, updated_at = NOW() \
             WHERE id = $8 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(&update.full_name)
            .bind(update.phone.expose())
            .bind(&update.car.car_brand)
            .bind(&update.car.car_model)
            .bind(update.car.car_year)
            .bind(&update.car.car_color)
            .bind(&update.car.car_number)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("User"))?
            .try_into()
    }
}
