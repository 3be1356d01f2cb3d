use std::sync::Arc;

use hermes_core::repository::{BookingRepository, ReviewRepository, TripRepository, UserRepository};
use hermes_store::{
    DbClient, InMemoryStore, StoreBookingRepository, StoreReviewRepository, StoreTripRepository,
    StoreUserRepository,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub bcrypt_cost: u32,
}

impl From<&hermes_store::app_config::AuthConfig> for AuthConfig {
    fn from(config: &hermes_store::app_config::AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration_seconds,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub trips: Arc<dyn TripRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn postgres(db: &DbClient, auth: AuthConfig) -> Self {
        Self {
            users: Arc::new(StoreUserRepository::new(db.pool.clone())),
            trips: Arc::new(StoreTripRepository::new(db.pool.clone())),
            bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
            reviews: Arc::new(StoreReviewRepository::new(db.pool.clone())),
            auth,
        }
    }

    /// Every repository backed by one shared in-memory store.
    pub fn in_memory(auth: AuthConfig) -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            trips: Arc::new(store.clone()),
            bookings: Arc::new(store.clone()),
            reviews: Arc::new(store),
            auth,
        }
    }
}
