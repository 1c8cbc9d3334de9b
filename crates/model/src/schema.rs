//! Compiled, immutable per-entity schema.

use std::collections::HashMap;
use std::sync::Arc;

use sea_query::{Alias, Expr, SimpleExpr};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::registry::{Attribute, Declaration, TypeRegistry};
use crate::select::{Column, Projection};
use crate::value::Values;

/// The compiled schema of an entity.
///
/// Built once when the entity is defined and never mutated afterwards, so it
/// is shared freely between the entity's handle, its queries and instances.
#[derive(Debug)]
pub struct Schema {
    table: String,
    connection: Arc<dyn Connection>,
    attributes: Vec<Attribute>,
    index: HashMap<String, usize>,
    default_columns: Projection,
    primary_key: Option<String>,
    debug: bool,
}

impl Schema {
    /// Resolves every declared attribute through `registry` and derives the
    /// entity's default column list.
    ///
    /// The default list is `*` when every attribute is read as-is from a column
    /// of the same name; otherwise it names every attribute in declaration
    /// order, substituting the conversion expression or renamed column
    /// (aliased to the attribute name) where one exists.
    ///
    /// # Errors
    ///
    /// Fails on the first attribute whose type cannot be resolved, or when more
    /// than one attribute is marked as primary key.
    pub fn compile(
        table: impl Into<String>, connection: Arc<dyn Connection>,
        declarations: Vec<(String, Declaration)>, registry: &TypeRegistry, debug: bool,
    ) -> Result<Self> {
        let table = table.into();

        let mut attributes: Vec<Attribute> = Vec::with_capacity(declarations.len());
        let mut index = HashMap::with_capacity(declarations.len());
        for (name, declaration) in declarations {
            let attribute = registry.resolve(&name, declaration)?;
            // a repeated name replaces the earlier declaration in place
            if let Some(&position) = index.get(&name) {
                attributes[position] = attribute;
            } else {
                index.insert(name, attributes.len());
                attributes.push(attribute);
            }
        }

        let primary_keys: Vec<&Attribute> =
            attributes.iter().filter(|attribute| attribute.is_primary_key()).collect();
        if primary_keys.len() > 1 {
            return Err(Error::PrimaryKey {
                table,
                attributes: primary_keys.iter().map(|a| a.name().to_string()).collect(),
            });
        }
        let primary_key = primary_keys.first().map(|attribute| attribute.name().to_string());

        let default_columns = default_columns(&attributes, connection.as_ref());

        tracing::debug!(
            table = %table,
            attributes = attributes.len(),
            primary_key = primary_key.as_deref(),
            "compiled entity schema"
        );

        Ok(Self {
            table,
            connection,
            attributes,
            index,
            default_columns,
            primary_key,
            debug,
        })
    }

    /// The entity's table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The connection statements are run on.
    #[must_use]
    pub const fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Attributes in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.index.get(name).map(|&position| &self.attributes[position])
    }

    /// Declared attribute names, in declaration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(Attribute::name)
    }

    /// Columns read when a query does not select any explicitly, and returned
    /// by inserts and updates.
    #[must_use]
    pub const fn default_columns(&self) -> &Projection {
        &self.default_columns
    }

    /// Name of the primary-key attribute, if one is declared.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Whether finalized SQL is echoed to the `omnia_model::sql` log target.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// The read expression for an explicitly selected column, if the column is
    /// an attribute of this entity that is type-mapped or stored under another
    /// column name.
    ///
    /// A leading `<table>.` qualifier is ignored; unknown columns yield `None`.
    #[must_use]
    pub fn read_column(&self, column: &str) -> Option<Column> {
        let name = column
            .strip_prefix(self.table.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(column);
        let attribute = self.attribute(name)?;
        let expr = read_expr(attribute, self.connection.as_ref())?;
        Some(Column::aliased(expr, attribute.name()))
    }

    /// Keeps only declared attributes and converts each value for storage.
    ///
    /// Returns `(storage column, expression)` pairs in attribute-name order;
    /// undeclared keys are dropped.
    #[must_use]
    pub fn prepare(&self, values: Values) -> Vec<(String, SimpleExpr)> {
        values
            .into_iter()
            .filter_map(|(name, value)| {
                let attribute = self.attribute(&name)?;
                let expr = attribute.to_storage(self.connection.as_ref(), value);
                Some((attribute.field().to_string(), expr))
            })
            .collect()
    }
}

// Rows are keyed by attribute name, so a renamed column is aliased back.
fn read_expr(attribute: &Attribute, conn: &dyn Connection) -> Option<SimpleExpr> {
    attribute.from_storage(conn).or_else(|| {
        (attribute.field() != attribute.name())
            .then(|| Expr::col(Alias::new(attribute.field())).into())
    })
}

fn default_columns(attributes: &[Attribute], conn: &dyn Connection) -> Projection {
    let mut mapped = false;
    let columns = attributes
        .iter()
        .map(|attribute| match read_expr(attribute, conn) {
            Some(expr) => {
                mapped = true;
                Column::aliased(expr, attribute.name())
            }
            None => Column::Name(attribute.field().to_string()),
        })
        .collect();

    if mapped { Projection::Columns(columns) } else { Projection::All }
}
