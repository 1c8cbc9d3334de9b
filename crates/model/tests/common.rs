//! Common test helpers shared across integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use futures::FutureExt;
use omnia_model::{AttributeDecl, Connection, DataType, Definition, FutureResult, Model, Row};
use parking_lot::Mutex;

/// A statement as received by [`MockConnection`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub sql: String,
    pub params: Vec<DataType>,
}

/// Connection double: records every statement and answers with scripted rows.
#[derive(Debug, Default)]
pub struct MockConnection {
    recorded: Mutex<Vec<Recorded>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    affected: Mutex<u32>,
}

impl MockConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues the rows returned by the next `query` call.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.rows.lock().push_back(rows);
    }

    /// Sets the count returned by `exec`.
    pub fn set_affected(&self, affected: u32) {
        *self.affected.lock() = affected;
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().clone()
    }

    pub fn last(&self) -> Recorded {
        self.recorded.lock().last().cloned().expect("no statement recorded")
    }
}

impl Connection for MockConnection {
    fn query(&self, query: String, params: Vec<DataType>) -> FutureResult<Vec<Row>> {
        self.recorded.lock().push(Recorded { sql: query, params });
        let rows = self.rows.lock().pop_front().unwrap_or_default();
        async move { Ok(rows) }.boxed()
    }

    fn exec(&self, query: String, params: Vec<DataType>) -> FutureResult<u32> {
        self.recorded.lock().push(Recorded { sql: query, params });
        let affected = *self.affected.lock();
        async move { Ok(affected) }.boxed()
    }
}

/// Connection that fails every statement.
#[derive(Debug)]
pub struct ClosedConnection;

impl Connection for ClosedConnection {
    fn query(&self, _query: String, _params: Vec<DataType>) -> FutureResult<Vec<Row>> {
        async { Err(anyhow::anyhow!("connection closed")) }.boxed()
    }

    fn exec(&self, _query: String, _params: Vec<DataType>) -> FutureResult<u32> {
        async { Err(anyhow::anyhow!("connection closed")) }.boxed()
    }
}

/// `posts(title text, content text, likes integer)`
pub fn posts_definition(conn: Arc<dyn Connection>) -> Definition {
    Definition::new("posts", conn)
        .attribute("title", "text")
        .attribute("content", "text")
        .attribute("likes", "integer")
}

pub fn posts(conn: Arc<dyn Connection>) -> Model {
    Model::define(posts_definition(conn)).expect("posts should define")
}

/// `points(id integer pk, name text, geom geometry(Point, 4326))`
pub fn points(conn: Arc<dyn Connection>) -> Model {
    Model::define(
        Definition::new("points", conn)
            .attribute("id", AttributeDecl::new("integer").primary_key())
            .attribute("name", "text")
            .attribute("geom", "geometry(Point, 4326)"),
    )
    .expect("points should define")
}

pub fn text(value: &str) -> DataType {
    DataType::Str(Some(value.to_string()))
}

/// Normalize SQL by collapsing whitespace.
fn normalize_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize SQL for comparison by removing identifier quotes and normalizing whitespace.
/// Preserves quotes inside string literals.
pub fn canonicalize_sql(sql: &str) -> String {
    let mut cleaned = String::with_capacity(sql.len());
    let mut in_single_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_single_quote = !in_single_quote;
                cleaned.push(ch);
            }
            '"' if !in_single_quote => {
                // Strip identifier quoting to avoid brittle comparisons.
            }
            _ => cleaned.push(ch),
        }
    }

    normalize_sql(&cleaned)
}

/// Assert that SQL contains all expected fragments in order.
///
/// This helper normalizes SQL to avoid brittle exact-string matching with ``SeaQuery`` output.
/// It strips identifier quotes, normalizes whitespace, and checks that fragments appear
/// sequentially in the generated SQL.
#[allow(clippy::missing_panics_doc)]
pub fn assert_sql_contains(actual: &str, fragments: &[&str]) {
    let actual_canonical = canonicalize_sql(actual);
    let mut search_start = 0usize;

    for fragment in fragments {
        let fragment_canonical = canonicalize_sql(fragment);
        if fragment_canonical.is_empty() {
            continue;
        }

        if let Some(pos) = actual_canonical[search_start..].find(&fragment_canonical) {
            search_start += pos + fragment_canonical.len();
        } else {
            use std::io::Write;
            let mut stderr = std::io::stderr();
            writeln!(stderr, "*** fragment-canonical: {fragment_canonical}").unwrap();
            writeln!(stderr, "*** actual-canonical-sql: {actual_canonical}").unwrap();
            stderr.flush().unwrap();

            panic!(
                "expected SQL fragment `{fragment_canonical}` not found in `{actual_canonical}`"
            );
        }
    }
}

/// Assert that SQL does not contain `fragment`.
pub fn assert_sql_lacks(actual: &str, fragment: &str) {
    let actual_canonical = canonicalize_sql(actual);
    let fragment_canonical = canonicalize_sql(fragment);
    assert!(
        !actual_canonical.contains(&fragment_canonical),
        "unexpected SQL fragment `{fragment_canonical}` in `{actual_canonical}`"
    );
}
