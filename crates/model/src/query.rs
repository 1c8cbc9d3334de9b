use anyhow::Result;
use sea_query::backend::{
    EscapeBuilder, OperLeftAssocDecider, PrecedenceDecider, QuotedBuilder, TableRefBuilder,
};
use sea_query::prepare::SqlWriter;
use sea_query::{BinOper, Oper, Quote, SimpleExpr, SubQueryStatement, Value, Values};

use crate::types::{DataType, values_to_datatypes};

/// A finalized statement: SQL text plus the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// SQL text with `$n` placeholders.
    pub sql: String,
    /// Values for the placeholders, in order.
    pub params: Vec<DataType>,
}

impl Query {
    /// Converts a rendered ``SeaQuery`` statement into a [`Query`].
    pub(crate) fn finish(table: &str, kind: &str, (sql, values): (String, Values)) -> Result<Self> {
        let params = values_to_datatypes(values)?;

        tracing::debug!(table, sql = %sql, param_count = params.len(), "{kind} generated SQL");

        Ok(Self { sql, params })
    }
}

/// ``SeaQuery`` backend for PostgreSQL-compatible databases: double-quoted
/// identifiers and `$1, $2, ...` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder;

impl QueryBuilder {
    const QUOTE: u8 = b'"';

    /// Quotes an identifier the way this backend renders column names.
    ///
    /// Used where an alias has to be spelled inside a custom expression.
    #[must_use]
    pub fn quote_ident(name: &str) -> String {
        let quote = char::from(Self::QUOTE);
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }
}

impl QuotedBuilder for QueryBuilder {
    fn quote(&self) -> Quote {
        Quote::new(Self::QUOTE)
    }
}

impl EscapeBuilder for QueryBuilder {}

impl TableRefBuilder for QueryBuilder {}

impl OperLeftAssocDecider for QueryBuilder {
    fn well_known_left_associative(&self, op: &BinOper) -> bool {
        // same as sea-query 0.32.7 `common_well_known_left_associative`
        matches!(
            op,
            BinOper::And | BinOper::Or | BinOper::Add | BinOper::Sub | BinOper::Mul | BinOper::Mod
        )
    }
}

impl PrecedenceDecider for QueryBuilder {
    fn inner_expr_well_known_greater_precedence(
        &self, _inner: &SimpleExpr, _outer_oper: &Oper,
    ) -> bool {
        // always parenthesize
        false
    }
}

impl sea_query::backend::QueryBuilder for QueryBuilder {
    fn prepare_query_statement(&self, query: &SubQueryStatement, sql: &mut dyn SqlWriter) {
        match query {
            SubQueryStatement::SelectStatement(s) => self.prepare_select_statement(s, sql),
            SubQueryStatement::InsertStatement(s) => self.prepare_insert_statement(s, sql),
            SubQueryStatement::UpdateStatement(s) => self.prepare_update_statement(s, sql),
            SubQueryStatement::DeleteStatement(s) => self.prepare_delete_statement(s, sql),
            SubQueryStatement::WithStatement(s) => self.prepare_with_query(s, sql),
        }
    }

    fn prepare_value(&self, value: &Value, sql: &mut dyn SqlWriter) {
        sql.push_param(value.clone(), self);
    }

    fn placeholder(&self) -> (&str, bool) {
        ("$", true)
    }
}
