//! Query augmentation.
//!
//! [`Augmented`] wraps a statement builder for one entity. When the statement
//! is finalized it first rewrites the statement's column-selection clause
//! against the entity's [`Schema`], then delegates to the builder's own
//! `build`:
//!
//! - a read with no column-selection clause gets the entity's default columns;
//! - an explicit clause has each plain column name that refers to a
//!   type-mapped attribute replaced by the attribute's read expression.
//!
//! The rewrite happens at finalize time, so columns added by later chained
//! calls are covered. Filters, ordering and limits are never touched.

use std::future::IntoFuture;
use std::sync::Arc;

use futures::FutureExt;

use crate::delete::DeleteBuilder;
use crate::error::{Error, ModelFuture, Result};
use crate::filter::Filter;
use crate::insert::InsertBuilder;
use crate::query::Query;
use crate::schema::Schema;
use crate::select::{Column, Projection, SelectBuilder};
use crate::types::{Record, row_to_record};
use crate::update::UpdateBuilder;

/// Log target for SQL echoed by entities defined with `debug` on.
pub const SQL_TARGET: &str = "omnia_model::sql";

/// A statement builder whose finalize step can be augmented.
pub trait Statement: Sized {
    /// Whether a missing column-selection clause is filled with the entity's
    /// default columns. Only reads do this; writes return nothing unless asked.
    const READS: bool;

    /// The statement's column-selection (or `RETURNING`) clause.
    fn columns_mut(&mut self) -> &mut Projection;

    /// The un-augmented finalize step.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement cannot be rendered.
    fn finalize(self) -> anyhow::Result<Query>;
}

impl Statement for SelectBuilder {
    const READS: bool = true;

    fn columns_mut(&mut self) -> &mut Projection {
        self.projection_mut()
    }

    fn finalize(self) -> anyhow::Result<Query> {
        self.build()
    }
}

impl Statement for InsertBuilder {
    const READS: bool = false;

    fn columns_mut(&mut self) -> &mut Projection {
        self.projection_mut()
    }

    fn finalize(self) -> anyhow::Result<Query> {
        self.build()
    }
}

impl Statement for UpdateBuilder {
    const READS: bool = false;

    fn columns_mut(&mut self) -> &mut Projection {
        self.projection_mut()
    }

    fn finalize(self) -> anyhow::Result<Query> {
        self.build()
    }
}

impl Statement for DeleteBuilder {
    const READS: bool = false;

    fn columns_mut(&mut self) -> &mut Projection {
        self.projection_mut()
    }

    fn finalize(self) -> anyhow::Result<Query> {
        self.build()
    }
}

/// Rewrites `projection` for the entity described by `schema`.
pub fn augment(schema: &Schema, projection: &mut Projection, reads: bool) {
    match projection {
        Projection::Unspecified if reads => *projection = schema.default_columns().clone(),
        Projection::Unspecified | Projection::All => {}
        Projection::Columns(columns) => {
            for column in columns.iter_mut() {
                let Column::Name(name) = column else {
                    continue;
                };
                if let Some(read) = schema.read_column(name) {
                    *column = read;
                }
            }
        }
    }
}

/// A statement bound to an entity, augmented at finalize time.
///
/// Awaiting it runs the statement on the entity's connection.
#[derive(Debug, Clone)]
pub struct Augmented<S> {
    statement: S,
    schema: Arc<Schema>,
}

impl<S: Statement> Augmented<S> {
    pub(crate) const fn new(statement: S, schema: Arc<Schema>) -> Self {
        Self { statement, schema }
    }

    /// The wrapped builder, without augmentation.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.statement
    }

    /// Finalizes the statement into SQL and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Statement`] if the statement cannot be rendered.
    pub fn build(mut self) -> Result<Query> {
        augment(&self.schema, self.statement.columns_mut(), S::READS);
        let query = self.statement.finalize().map_err(Error::Statement)?;

        if self.schema.debug() {
            tracing::info!(target: SQL_TARGET, table = self.schema.table(), "{}", query.sql);
        }

        Ok(query)
    }

    /// Runs the statement and returns the rows it produces.
    pub fn fetch(self) -> ModelFuture<Vec<Record>> {
        let conn = Arc::clone(self.schema.connection());
        let query = self.build();

        async move {
            let Query { sql, params } = query?;
            tracing::debug!(sql = %sql, "running query");
            let rows = conn.query(sql, params).await?;
            Ok(rows.into_iter().map(row_to_record).collect())
        }
        .boxed()
    }

    /// Runs the statement and returns the number of rows affected.
    pub fn execute(self) -> ModelFuture<u32> {
        let conn = Arc::clone(self.schema.connection());
        let query = self.build();

        async move {
            let Query { sql, params } = query?;
            tracing::debug!(sql = %sql, "running statement");
            Ok(conn.exec(sql, params).await?)
        }
        .boxed()
    }

    fn map(self, f: impl FnOnce(S) -> S) -> Self {
        Self {
            statement: f(self.statement),
            schema: self.schema,
        }
    }
}

impl Augmented<SelectBuilder> {
    /// Adds columns to the column-selection clause.
    #[must_use]
    pub fn select<C: Into<Column>>(self, columns: impl IntoIterator<Item = C>) -> Self {
        self.map(|s| s.select(columns))
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(self, filter: Filter) -> Self {
        self.map(|s| s.r#where(filter))
    }

    /// Sets the maximum number of rows to return.
    #[must_use]
    pub fn limit(self, limit: u64) -> Self {
        self.map(|s| s.limit(limit))
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub fn offset(self, offset: u64) -> Self {
        self.map(|s| s.offset(offset))
    }

    /// Adds ascending ORDER BY clause.
    #[must_use]
    pub fn order_by(self, column: &str) -> Self {
        self.map(|s| s.order_by(column))
    }

    /// Adds descending ORDER BY clause.
    #[must_use]
    pub fn order_by_desc(self, column: &str) -> Self {
        self.map(|s| s.order_by_desc(column))
    }
}

impl Augmented<InsertBuilder> {
    /// Adds columns to return from inserted rows.
    #[must_use]
    pub fn returning<C: Into<Column>>(self, columns: impl IntoIterator<Item = C>) -> Self {
        self.map(|s| s.returning(columns))
    }
}

impl Augmented<UpdateBuilder> {
    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(self, filter: Filter) -> Self {
        self.map(|s| s.r#where(filter))
    }

    /// Adds columns to return from updated rows.
    #[must_use]
    pub fn returning<C: Into<Column>>(self, columns: impl IntoIterator<Item = C>) -> Self {
        self.map(|s| s.returning(columns))
    }
}

impl Augmented<DeleteBuilder> {
    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(self, filter: Filter) -> Self {
        self.map(|s| s.r#where(filter))
    }
}

impl IntoFuture for Augmented<SelectBuilder> {
    type IntoFuture = ModelFuture<Vec<Record>>;
    type Output = Result<Vec<Record>>;

    fn into_future(self) -> Self::IntoFuture {
        self.fetch()
    }
}

impl IntoFuture for Augmented<InsertBuilder> {
    type IntoFuture = ModelFuture<Vec<Record>>;
    type Output = Result<Vec<Record>>;

    fn into_future(self) -> Self::IntoFuture {
        self.fetch()
    }
}

impl IntoFuture for Augmented<UpdateBuilder> {
    type IntoFuture = ModelFuture<Vec<Record>>;
    type Output = Result<Vec<Record>>;

    fn into_future(self) -> Self::IntoFuture {
        self.fetch()
    }
}

impl IntoFuture for Augmented<DeleteBuilder> {
    type IntoFuture = ModelFuture<u32>;
    type Output = Result<u32>;

    fn into_future(self) -> Self::IntoFuture {
        self.execute()
    }
}

/// A single-row lookup. Awaiting it fails with [`Error::NotFound`] when no row
/// matches.
#[derive(Debug, Clone)]
pub struct FindOne(Augmented<SelectBuilder>);

impl FindOne {
    pub(crate) fn new(query: Augmented<SelectBuilder>) -> Self {
        Self(query.limit(1))
    }

    /// Adds columns to the column-selection clause.
    #[must_use]
    pub fn select<C: Into<Column>>(self, columns: impl IntoIterator<Item = C>) -> Self {
        Self(self.0.select(columns))
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(self, filter: Filter) -> Self {
        Self(self.0.r#where(filter))
    }

    /// Finalizes the lookup into SQL and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Statement`] if the statement cannot be rendered.
    pub fn build(self) -> Result<Query> {
        self.0.build()
    }
}

impl IntoFuture for FindOne {
    type IntoFuture = ModelFuture<Record>;
    type Output = Result<Record>;

    fn into_future(self) -> Self::IntoFuture {
        let table = self.0.schema.table().to_string();
        let rows = self.0.fetch();

        async move { rows.await?.into_iter().next().ok_or(Error::NotFound { table }) }.boxed()
    }
}
