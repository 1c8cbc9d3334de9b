//! Type registry: resolves attribute type declarations into [`Attribute`]s.
//!
//! A registry is an ordered list of [`TypeRule`]s. Each rule pairs a
//! case-insensitive pattern with a factory producing the attribute's
//! [`AttributeKind`]; the first rule whose pattern matches the declared type
//! wins, so overlapping patterns must be registered most specific first.

use std::fmt::{self, Debug};
use std::sync::Arc;

use regex::{Captures, Regex, RegexBuilder};
use sea_query::SimpleExpr;
use serde::Deserialize;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::value::FieldValue;

/// An attribute declaration: a bare type string (`"text"`) or a full object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Declaration {
    /// Bare type, e.g. `"geometry(Point, 4326)"`.
    Type(String),
    /// Type with storage options.
    Object(AttributeDecl),
}

/// Declaration object for an attribute.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDecl {
    /// Declared type, matched against the registry.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Storage column; defaults to the attribute name.
    #[serde(default)]
    pub field: Option<String>,
    /// Whether this attribute is the primary key.
    #[serde(default)]
    pub primary_key: bool,
}

impl AttributeDecl {
    /// Creates a declaration for the given type.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Stores the attribute in a differently named column.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Marks the attribute as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

impl From<&str> for Declaration {
    fn from(type_name: &str) -> Self {
        Self::Type(type_name.to_string())
    }
}

impl From<String> for Declaration {
    fn from(type_name: String) -> Self {
        Self::Type(type_name)
    }
}

impl From<AttributeDecl> for Declaration {
    fn from(decl: AttributeDecl) -> Self {
        Self::Object(decl)
    }
}

impl From<Declaration> for AttributeDecl {
    fn from(declaration: Declaration) -> Self {
        match declaration {
            Declaration::Type(type_name) => Self::new(type_name),
            Declaration::Object(decl) => decl,
        }
    }
}

/// Conversion hooks for a registered custom type.
///
/// Both hooks default to none: values are bound as-is and the column is read
/// by name.
pub trait Conversion: Debug + Send + Sync {
    /// Logical type name reported by attributes of this type.
    fn type_name(&self) -> &str;

    /// Converts an outgoing value into the expression written to storage.
    fn to_storage(
        &self, _conn: &dyn Connection, _attribute: &Attribute, value: FieldValue,
    ) -> SimpleExpr {
        value.into_expr()
    }

    /// Expression reading the stored column back into its in-memory form.
    fn from_storage(&self, _conn: &dyn Connection, _attribute: &Attribute) -> Option<SimpleExpr> {
        None
    }
}

/// Spatial options of a geometry attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Geometry {
    /// Geometry kind, e.g. `Point`.
    pub kind: Option<String>,
    /// Spatial reference id.
    pub srid: Option<i32>,
}

/// The logical type of an attribute.
#[derive(Debug, Clone)]
pub enum AttributeKind {
    /// `text` or `string`.
    Text,
    /// `integer`.
    Integer,
    /// `date`.
    Date,
    /// `geometry`, optionally with kind and SRID.
    Geometry(Geometry),
    /// A type registered by the caller.
    Custom(Arc<dyn Conversion>),
}

/// A normalized attribute definition.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    field: String,
    primary_key: bool,
    kind: AttributeKind,
}

impl Attribute {
    /// Attribute name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage column.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether this attribute is the primary key.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// The attribute's logical type.
    #[must_use]
    pub const fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Logical type name: `text`, `integer`, `date`, `geometry` or a custom name.
    #[must_use]
    pub fn logical_type(&self) -> &str {
        match &self.kind {
            AttributeKind::Text => "text",
            AttributeKind::Integer => "integer",
            AttributeKind::Date => "date",
            AttributeKind::Geometry(_) => "geometry",
            AttributeKind::Custom(conversion) => conversion.type_name(),
        }
    }

    /// Converts an outgoing value into the expression written to storage.
    ///
    /// Geometry given as text is wrapped in a geometry constructor using the
    /// attribute's SRID; anything else (including prepared expressions) is
    /// passed through.
    #[must_use]
    pub fn to_storage(&self, conn: &dyn Connection, value: FieldValue) -> SimpleExpr {
        match &self.kind {
            AttributeKind::Geometry(geometry) => match value {
                FieldValue::Json(serde_json::Value::String(wkt)) => {
                    conn.geom_from_text(wkt, geometry.srid)
                }
                other => other.into_expr(),
            },
            AttributeKind::Custom(conversion) => conversion.to_storage(conn, self, value),
            AttributeKind::Text | AttributeKind::Integer | AttributeKind::Date => {
                value.into_expr()
            }
        }
    }

    /// Expression reading the storage column back, for types whose stored and
    /// in-memory forms differ.
    #[must_use]
    pub fn from_storage(&self, conn: &dyn Connection) -> Option<SimpleExpr> {
        match &self.kind {
            AttributeKind::Geometry(_) => Some(conn.geom_as_text(&self.field)),
            AttributeKind::Custom(conversion) => conversion.from_storage(conn, self),
            AttributeKind::Text | AttributeKind::Integer | AttributeKind::Date => None,
        }
    }
}

type Factory = Arc<dyn Fn(&Captures<'_>) -> std::result::Result<AttributeKind, String> + Send + Sync>;

/// A (pattern, factory) pair. Patterns are matched case-insensitively.
#[derive(Clone)]
pub struct TypeRule {
    pattern: Regex,
    factory: Factory,
}

impl TypeRule {
    /// Creates a rule. The factory receives the pattern's captures and may
    /// reject the declaration with a reason.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new<F>(pattern: &str, factory: F) -> Result<Self>
    where
        F: Fn(&Captures<'_>) -> std::result::Result<AttributeKind, String> + Send + Sync + 'static,
    {
        Ok(Self {
            pattern: RegexBuilder::new(pattern).case_insensitive(true).build()?,
            factory: Arc::new(factory),
        })
    }

    /// A rule producing a fixed kind for every match.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn plain(pattern: &str, kind: AttributeKind) -> Result<Self> {
        Self::new(pattern, move |_| Ok(kind.clone()))
    }
}

impl Debug for TypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRule").field("pattern", &self.pattern.as_str()).finish_non_exhaustive()
    }
}

/// Ordered list of type rules.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    rules: Vec<TypeRule>,
}

impl TypeRegistry {
    /// A registry with no rules.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The built-in rules: geometry, text/string, integer and date.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn standard() -> Result<Self> {
        Ok(Self {
            rules: vec![
                TypeRule::new(r"^geometry(?:\((.*?),\s*(\d+)\s*\))?\s*$", geometry)?,
                TypeRule::plain(r"^(?:text|string)$", AttributeKind::Text)?,
                TypeRule::plain(r"^integer$", AttributeKind::Integer)?,
                TypeRule::plain(r"^date$", AttributeKind::Date)?,
            ],
        })
    }

    /// Appends a rule. It is tried after every rule already registered.
    #[must_use]
    pub fn with_rule(mut self, rule: TypeRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Resolves the declaration of attribute `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeResolution`] when no rule matches, or
    /// [`Error::InvalidDeclaration`] when the matching rule rejects it.
    pub fn resolve(&self, name: &str, declaration: impl Into<Declaration>) -> Result<Attribute> {
        let decl = AttributeDecl::from(declaration.into());

        for rule in &self.rules {
            let Some(captures) = rule.pattern.captures(&decl.type_name) else {
                continue;
            };
            let kind = (rule.factory)(&captures).map_err(|reason| Error::InvalidDeclaration {
                attribute: name.to_string(),
                reason,
            })?;

            return Ok(Attribute {
                name: name.to_string(),
                field: decl.field.unwrap_or_else(|| name.to_string()),
                primary_key: decl.primary_key,
                kind,
            });
        }

        Err(Error::TypeResolution {
            attribute: name.to_string(),
            declared: decl.type_name,
        })
    }
}

// SRID 0 means "unknown" and is treated as unset.
fn geometry(captures: &Captures<'_>) -> std::result::Result<AttributeKind, String> {
    let kind = captures.get(1).map(|m| m.as_str().trim().to_string());
    let srid = match captures.get(2) {
        Some(m) => {
            let srid: i32 =
                m.as_str().parse().map_err(|_e| format!("invalid SRID '{}'", m.as_str()))?;
            (srid != 0).then_some(srid)
        }
        None => None,
    };
    Ok(AttributeKind::Geometry(Geometry { kind, srid }))
}
