//! Generic SeaORM data access shared by every Postgres-backed domain.
//!
//! ```ignore
//! pub struct PgEventRepository {
//!     base: BaseRepository<entity::Entity>,
//! }
//!
//! let event = self.base.find_by_id(42).await?;
//! let hits = self.base.find_by_filters(&filters).await?;
//! ```

use std::collections::BTreeMap;
use std::marker::PhantomData;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    IdenStatic, IntoActiveModel, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, QueryFilter,
    QueryOrder, Select,
};

use crate::common::{DatabaseError, DatabaseResult};

/// Field name to search value. Ordered so generated SQL is stable.
pub type Filters = BTreeMap<String, String>;

/// Allow-list of columns that may be searched with [`BaseRepository::find_by_filters`].
pub trait FilterableEntity: EntityTrait {
    /// Column for an external field name, or `None` when the field is not searchable.
    fn filterable_column(field: &str) -> Option<Self::Column>;
}

/// Typed CRUD helpers for a single entity.
pub struct BaseRepository<E: EntityTrait> {
    db: DatabaseConnection,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Clone for BaseRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> BaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
{
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// `None` when no row has this primary key.
    pub async fn find_by_id<K>(&self, id: K) -> Result<Option<E::Model>, DbErr>
    where
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        E::find_by_id(id).one(&self.db).await
    }

    /// Every row, ordered by primary key.
    pub async fn find_all(&self) -> Result<Vec<E::Model>, DbErr> {
        Self::ordered(E::find()).all(&self.db).await
    }

    /// Insert in its own transaction and return the stored row with generated columns.
    pub async fn insert(&self, model: E::ActiveModel) -> Result<E::Model, DbErr> {
        model.insert(&self.db).await
    }

    fn ordered(select: Select<E>) -> Select<E> {
        E::PrimaryKey::iter().fold(select, |select, key| {
            select.order_by_asc(key.into_column())
        })
    }
}

impl<E> BaseRepository<E>
where
    E: FilterableEntity,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
{
    /// Case-insensitive substring match on every filter, combined with AND.
    ///
    /// Fails with [`DatabaseError::UnknownFilter`] before touching the database when a
    /// field is outside the entity's allow-list.
    pub async fn find_by_filters(&self, filters: &Filters) -> DatabaseResult<Vec<E::Model>> {
        self.find_by_filters_within(filters, Condition::all()).await
    }

    /// [`find_by_filters`](Self::find_by_filters) restricted to rows matching `scope`.
    pub async fn find_by_filters_within(
        &self,
        filters: &Filters,
        scope: Condition,
    ) -> DatabaseResult<Vec<E::Model>> {
        let condition = Self::filter_condition(filters)?.add(scope);
        let rows = Self::ordered(E::find().filter(condition))
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    pub fn filter_condition(filters: &Filters) -> DatabaseResult<Condition> {
        filters
            .iter()
            .try_fold(Condition::all(), |condition, (field, value)| {
                let column = E::filterable_column(field)
                    .ok_or_else(|| DatabaseError::UnknownFilter(field.clone()))?;
                // Columns come from the allow-list, never from the request.
                let sql = format!(r#"CAST("{}" AS TEXT) ILIKE ?"#, column.as_str());
                let pattern = format!("%{}%", escape_like(value));
                Ok(condition.add(Expr::cust_with_values(sql, [pattern])))
            })
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
