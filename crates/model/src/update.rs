use anyhow::{Result, bail};
use sea_query::{Alias, SimpleExpr};

use crate::filter::Filter;
use crate::query::{Query, QueryBuilder};
use crate::select::{Column, Projection};

/// Builder for constructing UPDATE queries.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: String,
    set_clauses: Vec<(String, SimpleExpr)>,
    filters: Vec<SimpleExpr>,
    returning: Projection,
}

impl UpdateBuilder {
    /// Creates a new UPDATE query builder for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            set_clauses: Vec::new(),
            filters: Vec::new(),
            returning: Projection::Unspecified,
        }
    }

    /// Sets a column to a new value.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SimpleExpr>) -> Self {
        self.set_clauses.push((column.into(), value.into()));
        self
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filters.push(filter.into_expr());
        self
    }

    /// Adds columns to return from updated rows.
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

    /// Build the UPDATE query.
    ///
    /// # Errors
    ///
    /// Returns an error if no column is set or values cannot be converted to
    /// transport data types.
    pub fn build(self) -> Result<Query> {
        if self.set_clauses.is_empty() {
            bail!("update of '{}' sets no columns", self.table);
        }

        let mut statement = sea_query::Query::update();
        statement.table(Alias::new(&self.table));

        for (column, value) in self.set_clauses {
            statement.value(Alias::new(column), value);
        }

        for expr in self.filters {
            statement.and_where(expr);
        }

        if let Some(returning) = self.returning.into_returning() {
            statement.returning(returning);
        }

        Query::finish(&self.table, "UpdateBuilder", statement.build(QueryBuilder))
    }
}
