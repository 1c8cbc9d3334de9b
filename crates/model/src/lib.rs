//! Schema-declared entity models over ``SeaQuery``.
//!
//! An entity is declared once: its table, its connection and a set of named,
//! typed attributes. Each attribute type is resolved against a registry of
//! type rules; most types are plain columns, while some (geometry) are stored
//! and read through a conversion expression. Every query built through the
//! entity is rewritten so that values read back are already in their logical
//! form.
//!
//! # Quick Start
//!
//! ## Define an Entity
//!
//! ```ignore
//! use omnia_model::{AttributeDecl, Definition, Model};
//!
//! let points = Model::define(
//!     Definition::new("points", conn)
//!         .attribute("id", AttributeDecl::new("integer").primary_key())
//!         .attribute("name", "text")
//!         .attribute("geom", "geometry(Point, 4326)"),
//! )?;
//! ```
//!
//! ## Queries
//!
//! ```ignore
//! use omnia_model::{Filter, Values};
//!
//! // SELECT name, ST_AsEWKT(geom) AS geom FROM points WHERE name = $1
//! let rows = points.find(Filter::eq("name", "p1")).await?;
//!
//! // explicit columns are rewritten too
//! let rows = points.query().select([points.col("geom")]).await?;
//!
//! // undeclared keys are dropped before the insert
//! let rows = points
//!     .insert(Values::new().set("name", "p2").set("geom", "POINT(1 2)"))
//!     .await?;
//! ```
//!
//! ## Instances
//!
//! ```ignore
//! let mut point = points.create(Values::new().set("name", "p3")).await?;
//! point.set("name", "renamed");
//! point.save().await?;
//! point.destroy().await?;
//! ```
//!
//! Awaiting a statement runs it. Call `build` instead to get the SQL and
//! parameters without touching the connection.

mod augment;
#[allow(missing_docs)]
mod config;
mod connection;
mod delete;
mod error;
mod filter;
mod insert;
mod instance;
mod model;
mod query;
mod registry;
mod schema;
mod select;
mod types;
mod update;
mod value;

pub use augment::{Augmented, FindOne, SQL_TARGET, Statement, augment};
pub use config::Options;
pub use connection::{Connection, FutureResult};
pub use delete::DeleteBuilder;
pub use error::{Error, ModelFuture, Result};
pub use filter::Filter;
pub use insert::InsertBuilder;
pub use instance::Instance;
pub use model::{AfterHook, Definition, Hook, Migrate, Model};
pub use query::{Query, QueryBuilder};
pub use registry::{
    Attribute, AttributeDecl, AttributeKind, Conversion, Declaration, Geometry, TypeRegistry,
    TypeRule,
};
pub use schema::Schema;
pub use select::{Column, Projection, SelectBuilder};
pub use types::{DataType, Field, Record, Row};
pub use update::UpdateBuilder;
pub use value::{FieldValue, Values};
