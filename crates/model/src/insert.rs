use anyhow::{Result, bail};
use sea_query::{Alias, SimpleExpr};

use crate::query::{Query, QueryBuilder};
use crate::select::{Column, Projection};

/// Builder for constructing INSERT queries.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    values: Vec<(String, SimpleExpr)>,
    returning: Projection,
}

impl InsertBuilder {
    /// Creates a new INSERT query builder for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: Vec::new(),
            returning: Projection::Unspecified,
        }
    }

    /// Sets a column value for the insert.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SimpleExpr>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }

    /// Adds columns to return from inserted rows.
    #[must_use]
    pub fn returning<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.returning.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Replaces the `RETURNING` clause.
    #[must_use]
    pub fn returning_projection(mut self, projection: Projection) -> Self {
        self.returning = projection;
        self
    }

    pub(crate) const fn projection_mut(&mut self) -> &mut Projection {
        &mut self.returning
    }

    /// Build the INSERT query.
    ///
    /// # Errors
    ///
    /// Returns an error if no column is set or values cannot be converted to
    /// transport data types.
    pub fn build(self) -> Result<Query> {
        if self.values.is_empty() {
            bail!("insert into '{}' sets no columns", self.table);
        }

        let mut statement = sea_query::Query::insert();
        statement.into_table(Alias::new(&self.table));

        let (columns, row): (Vec<_>, Vec<_>) =
            self.values.into_iter().map(|(column, expr)| (Alias::new(column), expr)).unzip();
        statement.columns(columns);
        statement.values(row)?;

        if let Some(returning) = self.returning.into_returning() {
            statement.returning(returning);
        }

        Query::finish(&self.table, "InsertBuilder", statement.build(QueryBuilder))
    }
}
