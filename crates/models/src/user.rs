use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, QuerySelect, Set};

use crate::errors::ModelError;
use crate::session;

pub const MAX_NAME_LEN: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    /// Password hash, or legacy plaintext awaiting upgrade.
    pub pass: String,
    /// Minor units.
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Sessions,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Sessions => Entity::has_many(session::Entity).into() }
    }
}

impl Related<session::Entity> for Entity {
    fn to() -> RelationDef { Relation::Sessions.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("name required".into())); }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ModelError::Validation(format!("name longer than {MAX_NAME_LEN} characters")));
    }
    if name.chars().any(char::is_control) {
        return Err(ModelError::Validation("name contains control characters".into()));
    }
    Ok(())
}

pub async fn find<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(name.to_owned()).one(db).await?)
}

/// Read a user and hold an exclusive row lock until the surrounding
/// transaction ends (`SELECT ... FOR UPDATE`; SQLite serialises writers itself).
pub async fn find_for_update<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(name.to_owned()).lock_exclusive().one(db).await?)
}

pub async fn create<C: ConnectionTrait>(db: &C, name: &str, pass: &str) -> Result<Model, ModelError> {
    validate_name(name)?;
    if pass.is_empty() { return Err(ModelError::Validation("password material required".into())); }
    let am = ActiveModel {
        name: Set(name.to_string()),
        pass: Set(pass.to_string()),
        balance: Set(0),
    };
    Ok(am.insert(db).await?)
}

pub async fn update_password<C: ConnectionTrait>(db: &C, name: &str, pass: &str) -> Result<bool, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Pass, Expr::value(pass))
        .filter(Column::Name.eq(name))
        .exec(db)
        .await?;
    Ok(res.rows_affected == 1)
}

/// Set `balance = new` only if it still equals `expected`. Returns whether the
/// swap happened.
pub async fn compare_and_set_balance<C: ConnectionTrait>(
    db: &C,
    name: &str,
    expected: i64,
    new: i64,
) -> Result<bool, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Balance, Expr::value(new))
        .filter(Column::Name.eq(name))
        .filter(Column::Balance.eq(expected))
        .exec(db)
        .await?;
    Ok(res.rows_affected == 1)
}

pub async fn delete<C: ConnectionTrait>(db: &C, name: &str) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(name.to_owned()).exec(db).await?;
    Ok(res.rows_affected == 1)
}
