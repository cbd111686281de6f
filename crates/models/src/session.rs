use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, PaginatorTrait, QuerySelect, Set};
use sea_orm::sea_query::Condition;

use crate::errors::ModelError;
use crate::user;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    pub valid: bool,
    /// Client address as reported by the transport; telemetry only.
    pub ip: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub user_agent: Option<String>,
    pub last_used: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::Username)
                .to(user::Column::Name)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields of a freshly minted session.
#[derive(Debug, Clone)]
pub struct NewSession<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub ip: &'a str,
    pub user_agent: Option<&'a str>,
    pub now: DateTime<Utc>,
}

pub async fn insert<C: ConnectionTrait>(db: &C, new: NewSession<'_>) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(new.id.to_string()),
        username: Set(new.username.to_string()),
        valid: Set(true),
        ip: Set(new.ip.to_string()),
        user_agent: Set(new.user_agent.map(str::to_string)),
        last_used: Set(new.now.into()),
    };
    Ok(am.insert(db).await?)
}

/// Mark every still-valid session of `username` invalid.
pub async fn invalidate_for_user<C: ConnectionTrait>(db: &C, username: &str) -> Result<u64, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Valid, Expr::value(false))
        .filter(Column::Username.eq(username))
        .filter(Column::Valid.eq(true))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn invalidate<C: ConnectionTrait>(db: &C, id: &str) -> Result<u64, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Valid, Expr::value(false))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn find<C: ConnectionTrait>(db: &C, id: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id.to_owned()).one(db).await?)
}

/// Read a session and lock its row for the rest of the transaction.
pub async fn find_for_update<C: ConnectionTrait>(db: &C, id: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id.to_owned()).lock_exclusive().one(db).await?)
}

/// Set `last_used = now` only while the row is valid and was used at or after
/// `cutoff`. Freshness and refresh are one statement, so a stale row can
/// never be revived by a racing touch.
pub async fn touch_if_fresh<C: ConnectionTrait>(
    db: &C,
    id: &str,
    now: DateTime<Utc>,
    cutoff: DateTime<Utc>,
) -> Result<bool, ModelError> {
    let now: DateTimeWithTimeZone = now.into();
    let cutoff: DateTimeWithTimeZone = cutoff.into();
    let res = Entity::update_many()
        .col_expr(Column::LastUsed, Expr::value(now))
        .filter(Column::Id.eq(id))
        .filter(Column::Valid.eq(true))
        .filter(Column::LastUsed.gte(cutoff))
        .exec(db)
        .await?;
    Ok(res.rows_affected == 1)
}

/// Delete sessions that can never authenticate again: invalidated ones and
/// those idle since before `cutoff`.
pub async fn purge_stale<C: ConnectionTrait>(db: &C, cutoff: DateTime<Utc>) -> Result<u64, ModelError> {
    let cutoff: DateTimeWithTimeZone = cutoff.into();
    let res = Entity::delete_many()
        .filter(
            Condition::any()
                .add(Column::Valid.eq(false))
                .add(Column::LastUsed.lt(cutoff)),
        )
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn count_valid_for_user<C: ConnectionTrait>(db: &C, username: &str) -> Result<u64, ModelError> {
    let n = Entity::find()
        .filter(Column::Username.eq(username))
        .filter(Column::Valid.eq(true))
        .count(db)
        .await?;
    Ok(n)
}
