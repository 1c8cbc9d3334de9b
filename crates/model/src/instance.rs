//! Entity instances.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::model::Model;
use crate::types::{Record, json_to_value};
use crate::value::Values;

/// One row of an entity, held as attribute values.
///
/// An instance is new until its primary-key attribute holds a value.
#[derive(Debug, Clone)]
pub struct Instance {
    model: Model,
    attrs: Record,
}

impl Instance {
    /// Wraps `attrs` as an instance of `model`.
    #[must_use]
    pub const fn new(model: Model, attrs: Record) -> Self {
        Self { model, attrs }
    }

    /// The entity this instance belongs to.
    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Current attribute values.
    #[must_use]
    pub const fn attrs(&self) -> &Record {
        &self.attrs
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Sets an attribute value locally. Call [`Instance::save`] to persist it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Whether the instance has not been persisted yet, i.e. its primary-key
    /// value is absent or null. Always `true` for entities without a primary key.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.primary_key_value().is_none()
    }

    /// Filter addressing this instance's row by primary key.
    #[must_use]
    pub fn pk_where(&self) -> Option<Filter> {
        let pk = self.model.schema().primary_key()?;
        let value = self.primary_key_value()?;
        let column = self.model.schema().attribute(pk).map_or(pk, |attribute| attribute.field());
        Some(Filter::eq(column, json_to_value(value.clone())))
    }

    /// Persists the instance: inserts it when new, otherwise updates its row
    /// by primary key. The returned row is merged back into the attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails to run.
    pub async fn save(&mut self) -> Result<()> {
        let mut values = Values::from(self.attrs.clone());
        // the key is never written: null on insert, the filter on update
        if let Some(pk) = self.model.primary_key_name() {
            values.remove(pk);
        }

        let rows = match self.pk_where() {
            None => self.model.insert(values).await?,
            Some(filter) => self.model.update(values).r#where(filter).await?,
        };

        if let Some(row) = rows.into_iter().next() {
            self.merge(row);
        }
        Ok(())
    }

    /// Deletes the instance's row, returning the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotPersisted`] if the instance has no primary-key
    /// value, or an error if the statement fails to run.
    pub async fn destroy(&self) -> Result<u32> {
        let filter = self.pk_where().ok_or_else(|| Error::NotPersisted {
            table: self.model.table_name().to_string(),
        })?;
        self.model.destroy(filter).await
    }

    /// Overlays `row` onto the current attributes.
    pub fn merge(&mut self, row: Record) {
        self.attrs.extend(row);
    }

    /// A detached copy of the current attributes.
    #[must_use]
    pub fn to_json(&self) -> Record {
        self.attrs.clone()
    }

    fn primary_key_value(&self) -> Option<&Value> {
        let pk = self.model.primary_key_name()?;
        self.attrs.get(pk).filter(|value| !value.is_null())
    }
}
