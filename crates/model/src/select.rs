use anyhow::Result;
use sea_query::{
    Alias, Asterisk, ColumnRef, Expr, IntoIden, Order, ReturningClause, SimpleExpr,
};

use crate::filter::Filter;
use crate::query::{Query, QueryBuilder};

/// One entry of a column-selection (`SELECT`) or `RETURNING` clause.
#[derive(Debug, Clone)]
pub enum Column {
    /// A column name, optionally table-qualified (`"posts.title"`).
    Name(String),
    /// An expression, optionally aliased.
    Expr {
        /// Expression to select.
        expr: SimpleExpr,
        /// Name the expression is returned under.
        alias: Option<String>,
    },
}

impl Column {
    /// Creates an expression column returned under `alias`.
    #[must_use]
    pub fn aliased(expr: SimpleExpr, alias: impl Into<String>) -> Self {
        Self::Expr {
            expr,
            alias: Some(alias.into()),
        }
    }

    fn into_returning_expr(self) -> SimpleExpr {
        match self {
            Self::Name(name) => SimpleExpr::Column(column_ref(&name)),
            Self::Expr { expr, alias: None } => expr,
            Self::Expr {
                expr,
                alias: Some(alias),
            } => Expr::cust_with_expr(format!("$1 AS {}", QueryBuilder::quote_ident(&alias)), expr)
                .into(),
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<SimpleExpr> for Column {
    fn from(expr: SimpleExpr) -> Self {
        Self::Expr { expr, alias: None }
    }
}

/// The column-selection clause of a statement.
#[derive(Debug, Clone, Default)]
pub enum Projection {
    /// No clause was specified by the caller.
    #[default]
    Unspecified,
    /// Every column (`*`).
    All,
    /// An explicit, ordered list of columns.
    Columns(Vec<Column>),
}

impl Projection {
    /// Appends columns, turning the clause into an explicit list.
    pub fn extend(&mut self, columns: impl IntoIterator<Item = Column>) {
        match self {
            Self::Columns(existing) => existing.extend(columns),
            Self::Unspecified | Self::All => *self = Self::Columns(columns.into_iter().collect()),
        }
    }

    /// Converts the clause into a `RETURNING` clause, if any was specified.
    pub(crate) fn into_returning(self) -> Option<ReturningClause> {
        match self {
            Self::Unspecified => None,
            Self::All => Some(sea_query::Query::returning().all()),
            Self::Columns(columns) => Some(
                sea_query::Query::returning()
                    .exprs(columns.into_iter().map(Column::into_returning_expr)),
            ),
        }
    }
}

/// Builder for constructing SELECT queries.
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    projection: Projection,
    filters: Vec<SimpleExpr>,
    limit: Option<u64>,
    offset: Option<u64>,
    order: Vec<(ColumnRef, Order)>,
}

impl SelectBuilder {
    /// Creates a new SELECT query builder for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projection: Projection::Unspecified,
            filters: Vec::new(),
            limit: None,
            offset: None,
            order: Vec::new(),
        }
    }

    /// Adds columns to the column-selection clause.
    #[must_use]
    pub fn select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.projection.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Adds a WHERE clause filter.
    #[must_use]
    pub fn r#where(mut self, filter: Filter) -> Self {
        self.filters.push(filter.into_expr());
        self
    }

    /// Sets the maximum number of rows to return.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Adds ascending ORDER BY clause.
    #[must_use]
    pub fn order_by(mut self, column: &str) -> Self {
        self.order.push((column_ref(column), Order::Asc));
        self
    }

    /// Adds descending ORDER BY clause.
    #[must_use]
    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order.push((column_ref(column), Order::Desc));
        self
    }

    /// The table selected from.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The column-selection clause as currently specified.
    #[must_use]
    pub const fn projection(&self) -> &Projection {
        &self.projection
    }

    pub(crate) const fn projection_mut(&mut self) -> &mut Projection {
        &mut self.projection
    }

    /// Build the SELECT query. An unspecified column list selects `*`.
    ///
    /// # Errors
    ///
    /// Returns an error if query values cannot be converted to transport data types.
    pub fn build(self) -> Result<Query> {
        let mut statement = sea_query::Query::select();

        match self.projection {
            Projection::Unspecified | Projection::All => {
                statement.column(Asterisk);
            }
            Projection::Columns(columns) => {
                for column in columns {
                    match column {
                        Column::Name(name) => {
                            statement.column(column_ref(&name));
                        }
                        Column::Expr { expr, alias: None } => {
                            statement.expr(expr);
                        }
                        Column::Expr {
                            expr,
                            alias: Some(alias),
                        } => {
                            statement.expr_as(expr, Alias::new(alias));
                        }
                    }
                }
            }
        }

        statement.from(Alias::new(&self.table));

        for filter in self.filters {
            statement.and_where(filter);
        }

        if let Some(limit) = self.limit {
            statement.limit(limit);
        }

        if let Some(offset) = self.offset {
            statement.offset(offset);
        }

        for (column, order) in self.order {
            statement.order_by(column, order);
        }

        Query::finish(&self.table, "SelectBuilder", statement.build(QueryBuilder))
    }
}

/// Resolves a possibly table-qualified column name (`"table.column"`, `"*"`,
/// `"table.*"`) into a column reference.
pub fn column_ref(name: &str) -> ColumnRef {
    match name.split_once('.') {
        Some((table, "*")) => ColumnRef::TableAsterisk(Alias::new(table).into_iden()),
        Some((table, column)) => {
            ColumnRef::TableColumn(Alias::new(table).into_iden(), Alias::new(column).into_iden())
        }
        None if name == "*" => ColumnRef::Asterisk,
        None => ColumnRef::Column(Alias::new(name).into_iden()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_ref_forms() {
        assert!(matches!(column_ref("*"), ColumnRef::Asterisk));
        assert!(matches!(column_ref("posts.*"), ColumnRef::TableAsterisk(_)));
        assert!(matches!(column_ref("posts.title"), ColumnRef::TableColumn(_, _)));
        assert!(matches!(column_ref("title"), ColumnRef::Column(_)));
    }

    #[test]
    fn select_extends_projection() {
        let builder = SelectBuilder::new("posts").select(["title"]).select(["likes"]);
        let Projection::Columns(columns) = builder.projection() else {
            panic!("expected explicit columns");
        };
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn unspecified_projection_selects_all() {
        let query = SelectBuilder::new("posts").build().unwrap();
        assert_eq!(query.sql, r#"SELECT * FROM "posts""#);
        assert!(query.params.is_empty());
    }
}
