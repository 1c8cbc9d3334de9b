//! Entity definitions and their class-level operations.

use std::fmt::{self, Debug};
use std::sync::Arc;

use futures::FutureExt;

use crate::augment::{Augmented, FindOne};
use crate::config::Options;
use crate::connection::Connection;
use crate::delete::DeleteBuilder;
use crate::error::{Error, ModelFuture, Result};
use crate::filter::Filter;
use crate::insert::InsertBuilder;
use crate::instance::Instance;
use crate::registry::{Declaration, TypeRegistry};
use crate::schema::Schema;
use crate::select::SelectBuilder;
use crate::types::Record;
use crate::update::UpdateBuilder;
use crate::value::Values;

/// Hook run on the values passed to [`Model::create`] before they are inserted.
pub type Hook = Arc<dyn Fn(&mut Values) -> anyhow::Result<()> + Send + Sync>;

/// Hook run on the rows returned by the insert of [`Model::create`].
pub type AfterHook = Arc<dyn Fn(&[Record]) -> anyhow::Result<()> + Send + Sync>;

/// Schema migration mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Migrate {
    /// Leave the table as it is.
    #[default]
    Safe,
    /// Drop and recreate the table. Not supported: logged and ignored.
    Drop,
}

#[derive(Clone, Default)]
struct Hooks {
    before_validate: Option<Hook>,
    validate: Option<Hook>,
    after_validate: Option<Hook>,
    before_create: Option<Hook>,
    after_create: Option<AfterHook>,
}

impl Hooks {
    fn before_insert(&self, values: &mut Values) -> anyhow::Result<()> {
        let chain = [&self.before_validate, &self.validate, &self.after_validate, &self.before_create];
        for hook in chain.into_iter().flatten() {
            hook(values)?;
        }
        Ok(())
    }
}

impl Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_validate", &self.before_validate.is_some())
            .field("validate", &self.validate.is_some())
            .field("after_validate", &self.after_validate.is_some())
            .field("before_create", &self.before_create.is_some())
            .field("after_create", &self.after_create.is_some())
            .finish()
    }
}

/// Declaration of an entity: its table, connection, attributes and hooks.
///
/// ```ignore
/// let points = Model::define(
///     Definition::new("points", conn)
///         .attribute("id", AttributeDecl::new("integer").primary_key())
///         .attribute("name", "text")
///         .attribute("geom", "geometry(Point, 4326)"),
/// )?;
/// ```
#[derive(Debug)]
pub struct Definition {
    table: String,
    connection: Arc<dyn Connection>,
    attributes: Vec<(String, Declaration)>,
    hooks: Hooks,
    debug: Option<bool>,
    migrate: Migrate,
}

impl Definition {
    /// Starts a definition for `table` on `connection`.
    #[must_use]
    pub fn new(table: impl Into<String>, connection: Arc<dyn Connection>) -> Self {
        Self {
            table: table.into(),
            connection,
            attributes: Vec::new(),
            hooks: Hooks::default(),
            debug: None,
            migrate: Migrate::Safe,
        }
    }

    /// Declares an attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, declaration: impl Into<Declaration>) -> Self {
        self.attributes.push((name.into(), declaration.into()));
        self
    }

    /// Declares several attributes, in iteration order.
    #[must_use]
    pub fn attributes<N, D>(mut self, attributes: impl IntoIterator<Item = (N, D)>) -> Self
    where
        N: Into<String>,
        D: Into<Declaration>,
    {
        self.attributes.extend(attributes.into_iter().map(|(n, d)| (n.into(), d.into())));
        self
    }

    /// Echoes finalized SQL to the `omnia_model::sql` log target.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Applies environment options to settings not set explicitly.
    #[must_use]
    pub fn options(mut self, options: &Options) -> Self {
        self.debug = self.debug.or(Some(options.debug));
        self
    }

    /// Sets the migration mode.
    #[must_use]
    pub const fn migrate(mut self, migrate: Migrate) -> Self {
        self.migrate = migrate;
        self
    }

    /// Hook run first in [`Model::create`].
    #[must_use]
    pub fn before_validate(
        mut self, hook: impl Fn(&mut Values) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.before_validate = Some(Arc::new(hook));
        self
    }

    /// Validation hook; an error aborts [`Model::create`] before any write.
    #[must_use]
    pub fn validate(
        mut self, hook: impl Fn(&mut Values) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.validate = Some(Arc::new(hook));
        self
    }

    /// Hook run after validation succeeds.
    #[must_use]
    pub fn after_validate(
        mut self, hook: impl Fn(&mut Values) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.after_validate = Some(Arc::new(hook));
        self
    }

    /// Hook run immediately before the insert.
    #[must_use]
    pub fn before_create(
        mut self, hook: impl Fn(&mut Values) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.before_create = Some(Arc::new(hook));
        self
    }

    /// Hook run on the inserted rows.
    #[must_use]
    pub fn after_create(
        mut self, hook: impl Fn(&[Record]) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.after_create = Some(Arc::new(hook));
        self
    }
}

/// Handle to a defined entity: its compiled schema plus the class-level
/// operations.
///
/// Cloning is cheap; clones share the same schema.
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<Schema>,
    hooks: Arc<Hooks>,
}

impl Model {
    /// Defines an entity using the built-in type rules.
    ///
    /// # Errors
    ///
    /// Fails if any attribute's type cannot be resolved or the primary key is
    /// ambiguous.
    pub fn define(definition: Definition) -> Result<Self> {
        Self::define_with(definition, &TypeRegistry::standard()?)
    }

    /// Defines an entity using a custom type registry.
    ///
    /// # Errors
    ///
    /// Fails if any attribute's type cannot be resolved or the primary key is
    /// ambiguous.
    pub fn define_with(definition: Definition, registry: &TypeRegistry) -> Result<Self> {
        let Definition {
            table,
            connection,
            attributes,
            hooks,
            debug,
            migrate,
        } = definition;

        let schema =
            Schema::compile(table, connection, attributes, registry, debug.unwrap_or_default())?;

        if migrate == Migrate::Drop {
            tracing::warn!(table = schema.table(), "migrate drop not supported yet");
        }

        Ok(Self {
            schema: Arc::new(schema),
            hooks: Arc::new(hooks),
        })
    }

    /// The compiled schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The entity's table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.schema.table()
    }

    /// Name of the primary-key attribute, if one is declared.
    #[must_use]
    pub fn primary_key_name(&self) -> Option<&str> {
        self.schema.primary_key()
    }

    /// Table-qualified name of a column.
    #[must_use]
    pub fn col(&self, column: &str) -> String {
        format!("{}.{column}", self.schema.table())
    }

    /// Starts a SELECT on the entity's table.
    #[must_use]
    pub fn query(&self) -> Augmented<SelectBuilder> {
        Augmented::new(SelectBuilder::new(self.schema.table()), Arc::clone(&self.schema))
    }

    /// Selects rows, optionally filtered.
    #[must_use]
    pub fn find(&self, search: impl Into<Option<Filter>>) -> Augmented<SelectBuilder> {
        match search.into() {
            Some(filter) => self.query().r#where(filter),
            None => self.query(),
        }
    }

    /// Selects a single row, optionally filtered.
    #[must_use]
    pub fn find_one(&self, search: impl Into<Option<Filter>>) -> FindOne {
        FindOne::new(self.find(search))
    }

    /// Inserts declared attributes of `values`, returning the stored rows
    /// through the entity's default columns.
    #[must_use]
    pub fn insert(&self, values: Values) -> Augmented<InsertBuilder> {
        let mut builder = InsertBuilder::new(self.schema.table())
            .returning_projection(self.schema.default_columns().clone());
        for (column, expr) in self.schema.prepare(values) {
            builder = builder.set(column, expr);
        }
        Augmented::new(builder, Arc::clone(&self.schema))
    }

    /// Updates declared attributes of `values`, returning the updated rows
    /// through the entity's default columns. Chain `r#where` to narrow it.
    #[must_use]
    pub fn update(&self, values: Values) -> Augmented<UpdateBuilder> {
        let mut builder = UpdateBuilder::new(self.schema.table())
            .returning_projection(self.schema.default_columns().clone());
        for (column, expr) in self.schema.prepare(values) {
            builder = builder.set(column, expr);
        }
        Augmented::new(builder, Arc::clone(&self.schema))
    }

    /// Deletes rows, optionally filtered.
    #[must_use]
    pub fn destroy(&self, search: impl Into<Option<Filter>>) -> Augmented<DeleteBuilder> {
        let builder = DeleteBuilder::new(self.schema.table());
        let builder = match search.into() {
            Some(filter) => builder.r#where(filter),
            None => builder,
        };
        Augmented::new(builder, Arc::clone(&self.schema))
    }

    /// Runs the create hooks, inserts `values` and wraps the first returned row.
    ///
    /// Hooks run in order `before_validate`, `validate`, `after_validate`,
    /// `before_create`; the first error aborts before anything is written.
    /// `after_create` sees every returned row.
    pub fn create(&self, mut values: Values) -> ModelFuture<Instance> {
        let model = self.clone();

        async move {
            model.hooks.before_insert(&mut values).map_err(Error::Rejected)?;

            let rows = model.insert(values).await?;
            if let Some(after_create) = &model.hooks.after_create {
                after_create(&rows).map_err(Error::Rejected)?;
            }

            let row = rows.into_iter().next().ok_or_else(|| Error::NotFound {
                table: model.table_name().to_string(),
            })?;
            Ok(Instance::new(model, row))
        }
        .boxed()
    }

    /// Wraps attributes in a new, unsaved instance.
    #[must_use]
    pub fn instance(&self, attrs: Record) -> Instance {
        Instance::new(self.clone(), attrs)
    }
}
