use sea_query::{Expr, ExprTrait, SimpleExpr, Value};

use crate::select::column_ref;

/// Filter represents the predicate of a `WHERE` clause.
///
/// Column names are used as given and may be table-qualified (`"posts.title"`).
/// Values are plain Rust types (i32, String, ``NaiveDate``) converted via `From`.
#[derive(Debug, Clone)]
pub enum Filter {
    /// column = value
    Eq(String, Value),
    /// column != value
    Ne(String, Value),
    /// column > value
    Gt(String, Value),
    /// column >= value
    Gte(String, Value),
    /// column < value
    Lt(String, Value),
    /// column <= value
    Lte(String, Value),
    /// column IN (values)
    In(String, Vec<Value>),
    /// column NOT IN (values)
    NotIn(String, Vec<Value>),
    /// column IS NULL
    IsNull(String),
    /// column IS NOT NULL
    IsNotNull(String),
    /// column LIKE pattern
    Like(String, String),
    /// column NOT LIKE pattern
    NotLike(String, String),
    /// column BETWEEN low AND high
    Between(String, Value, Value),
    /// Logical AND of multiple filters
    And(Vec<Self>),
    /// Logical OR of multiple filters
    Or(Vec<Self>),
    /// Logical NOT of a filter
    Not(Box<Self>),
}

impl Filter {
    fn column(col: &str) -> SimpleExpr {
        Expr::col(column_ref(col)).into()
    }

    /// Convert Filter to a ``SeaQuery`` ``SimpleExpr``.
    #[must_use]
    pub fn into_expr(self) -> SimpleExpr {
        match self {
            Self::Eq(col, val) => Self::column(&col).eq(val),
            Self::Ne(col, val) => Self::column(&col).ne(val),
            Self::Gt(col, val) => Self::column(&col).gt(val),
            Self::Gte(col, val) => Self::column(&col).gte(val),
            Self::Lt(col, val) => Self::column(&col).lt(val),
            Self::Lte(col, val) => Self::column(&col).lte(val),
            Self::In(col, vals) => Self::column(&col).is_in(vals),
            Self::NotIn(col, vals) => Self::column(&col).is_not_in(vals),
            Self::IsNull(col) => Self::column(&col).is_null(),
            Self::IsNotNull(col) => Self::column(&col).is_not_null(),
            Self::Like(col, pattern) => Self::column(&col).like(pattern),
            Self::NotLike(col, pattern) => Self::column(&col).not_like(pattern),
            Self::Between(col, low, high) => Self::column(&col).between(low, high),
            Self::And(filters) => {
                let mut exprs = filters.into_iter().map(Self::into_expr);
                exprs.next().map_or_else(
                    || Expr::value(true), // no filters, so all conditions satisfied, hence `true`
                    |first| exprs.fold(first, SimpleExpr::and),
                )
            }
            Self::Or(filters) => {
                let mut exprs = filters.into_iter().map(Self::into_expr);
                exprs.next().map_or_else(
                    || Expr::value(false), // no filters, so 0 conditions satisfied, hence `false`
                    |first| exprs.fold(first, SimpleExpr::or),
                )
            }
            Self::Not(filter) => Expr::expr(filter.into_expr()).not(),
        }
    }

    /// Creates a filter matching every `(column, value)` pair for equality.
    ///
    /// This is the search-object form accepted by `find`, `find_one` and `destroy`.
    #[must_use]
    pub fn matching<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut filters: Vec<Self> =
            pairs.into_iter().map(|(col, val)| Self::Eq(col.into(), val.into())).collect();
        if filters.len() == 1 { filters.remove(0) } else { Self::And(filters) }
    }

    /// Creates an equality filter (column = value).
    #[must_use]
    pub fn eq(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Eq(col.into(), val.into())
    }

    /// Creates an inequality filter (column != value).
    #[must_use]
    pub fn ne(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Ne(col.into(), val.into())
    }

    /// Creates a greater-than filter (column > value).
    #[must_use]
    pub fn gt(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Gt(col.into(), val.into())
    }

    /// Creates a greater-than-or-equal filter (column >= value).
    #[must_use]
    pub fn gte(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Gte(col.into(), val.into())
    }

    /// Creates a less-than filter (column < value).
    #[must_use]
    pub fn lt(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Lt(col.into(), val.into())
    }

    /// Creates a less-than-or-equal filter (column <= value).
    #[must_use]
    pub fn lte(col: impl Into<String>, val: impl Into<Value>) -> Self {
        Self::Lte(col.into(), val.into())
    }

    /// Creates an IN filter (column IN (values)).
    #[must_use]
    pub fn r#in(col: impl Into<String>, vals: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::In(col.into(), vals.into_iter().map(Into::into).collect())
    }

    /// Creates a NOT IN filter (column NOT IN (values)).
    #[must_use]
    pub fn not_in(col: impl Into<String>, vals: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self::NotIn(col.into(), vals.into_iter().map(Into::into).collect())
    }

    /// Creates an IS NULL filter.
    #[must_use]
    pub fn is_null(col: impl Into<String>) -> Self {
        Self::IsNull(col.into())
    }

    /// Creates an IS NOT NULL filter.
    #[must_use]
    pub fn is_not_null(col: impl Into<String>) -> Self {
        Self::IsNotNull(col.into())
    }

    /// Creates a LIKE filter with pattern matching.
    #[must_use]
    pub fn like(col: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like(col.into(), pattern.into())
    }

    /// Creates a NOT LIKE filter with pattern matching.
    #[must_use]
    pub fn not_like(col: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::NotLike(col.into(), pattern.into())
    }

    /// Creates a BETWEEN filter (column BETWEEN low AND high).
    #[must_use]
    pub fn between(col: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::Between(col.into(), low.into(), high.into())
    }
}
