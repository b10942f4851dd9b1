pub mod app_config;
pub mod database;
pub mod memory_repo;
pub mod user_repo;

pub use database::DbClient;
pub use memory_repo::InMemoryUserRepository;
pub use user_repo::PgUserRepository;
