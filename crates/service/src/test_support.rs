#![cfg(test)]
use chrono::{Duration, Utc};
use migration::MigratorTrait;
use models::db::{connect_with_config, sqlite_memory_config};
use models::{session, user};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::context::{ServiceContext, ServiceSettings};

/// Private in-memory database with the schema applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = connect_with_config(&sqlite_memory_config()).await.expect("connect sqlite memory db");
    migration::Migrator::up(&db, None).await.expect("migrate up");
    db
}

pub async fn seed_user(db: &DatabaseConnection, name: &str, pass: &str) -> user::Model {
    user::create(db, name, pass).await.expect("seed user")
}

pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        idle_timeout: Duration::minutes(15),
        request_timeout: std::time::Duration::from_secs(5),
    }
}

pub async fn test_context() -> (DatabaseConnection, ServiceContext) {
    let db = setup_test_db().await;
    let ctx = ServiceContext::new(db.clone(), test_settings());
    (db, ctx)
}

/// Pretend a session was last used `ago` in the past.
pub async fn age_session(db: &DatabaseConnection, id: &str, ago: Duration) {
    let row = session::Entity::find_by_id(id.to_owned())
        .one(db)
        .await
        .expect("load session")
        .expect("session exists");
    let mut am: session::ActiveModel = row.into();
    am.last_used = Set((Utc::now() - ago).into());
    am.update(db).await.expect("age session");
}
