//! The database connection collaborator.

use std::fmt::Debug;

use anyhow::Result;
use futures::future::BoxFuture;
use sea_query::{Alias, Expr, Func, SimpleExpr};

use crate::types::{DataType, Row};

/// Result type for asynchronous connection operations.
pub type FutureResult<T> = BoxFuture<'static, Result<T>>;

/// SQL providers implement the [`Connection`] trait to run the statements
/// built for an entity.
///
/// The spatial expression builders default to their PostGIS forms and are only
/// used by geometry attributes.
pub trait Connection: Debug + Send + Sync + 'static {
    /// Execute a query and return the resulting rows.
    fn query(&self, query: String, params: Vec<DataType>) -> FutureResult<Vec<Row>>;

    /// Execute a statement that does not return rows (e.g., a `DELETE`).
    fn exec(&self, query: String, params: Vec<DataType>) -> FutureResult<u32>;

    /// Builds a geometry from its well-known-text representation.
    fn geom_from_text(&self, wkt: String, srid: Option<i32>) -> SimpleExpr {
        let func = Func::cust(Alias::new("ST_GeomFromText")).arg(Expr::val(wkt));
        match srid {
            Some(srid) => func.arg(Expr::val(srid)).into(),
            None => func.into(),
        }
    }

    /// Reads a geometry column back as extended well-known text.
    fn geom_as_text(&self, column: &str) -> SimpleExpr {
        Func::cust(Alias::new("ST_AsEWKT")).arg(Expr::col(Alias::new(column))).into()
    }
}
