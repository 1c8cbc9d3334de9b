use anyhow::Result;
use sea_query::{Alias, SimpleExpr};

use crate::filter::Filter;
use crate::query::{Query, QueryBuilder};
use crate::select::{Column, Projection};

/// Builder for constructing DELETE queries.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: String,
    filters: Vec<SimpleExpr>,
    returning: Projection,
}

impl DeleteBuilder {
    /// Creates a new DELETE query builder for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            returning: Projection::Unspecified,
        }
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filters.push(filter.into_expr());
        self
    }

    /// Adds columns to return from deleted rows.
    #[must_use]
    pub fn returning<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.returning.extend(columns.into_iter().map(Into::into));
        self
    }

    pub(crate) const fn projection_mut(&mut self) -> &mut Projection {
        &mut self.returning
    }

    /// Build the DELETE query.
    ///
    /// # Errors
    ///
    /// Returns an error if any query values cannot be converted to transport data types.
    pub fn build(self) -> Result<Query> {
        let mut statement = sea_query::Query::delete();
        statement.from_table(Alias::new(&self.table));

        for filter in self.filters {
            statement.and_where(filter);
        }

        if let Some(returning) = self.returning.into_returning() {
            statement.returning(returning);
        }

        Query::finish(&self.table, "DeleteBuilder", statement.build(QueryBuilder))
    }
}
