use std::sync::Arc;

use adapter::{
    database::ConnectionPool,
    memory::InMemoryDatabase,
    repository::{
        booking::BookingRepositoryImpl, catalog::CatalogRepositoryImpl,
        health::HealthCheckRepositoryImpl,
    },
};
use kernel::{
    repository::health::HealthCheckRepository, service::coordinator::BookingCoordinator,
};
use shared::config::{AppConfig, BookingConfig};

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    booking_coordinator: Arc<BookingCoordinator>,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool, app_config: &AppConfig) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let catalog_repository = Arc::new(CatalogRepositoryImpl::new(pool.clone()));
        let booking_repository = Arc::new(BookingRepositoryImpl::new(pool.clone()));
        let booking_coordinator = Arc::new(BookingCoordinator::new(
            catalog_repository,
            booking_repository,
            &app_config.booking,
        ));
        Self {
            health_check_repository,
            booking_coordinator,
        }
    }

    // DB を使わずプロセス内のストアで組み立てる。結合テスト用
    pub fn in_memory(db: InMemoryDatabase, config: &BookingConfig) -> Self {
        let db = Arc::new(db);
        let booking_coordinator = Arc::new(BookingCoordinator::new(
            db.clone(),
            db.clone(),
            config,
        ));
        Self {
            health_check_repository: db,
            booking_coordinator,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn booking_coordinator(&self) -> Arc<BookingCoordinator> {
        self.booking_coordinator.clone()
    }
}
