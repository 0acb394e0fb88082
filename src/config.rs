//! Generation configuration.
//!
//! Read from `ddlgen.toml`:
//!
//! ```toml
//! db_driver = "postgres"
//! table_prefix = "t_"
//! json_naming = "snake"
//! null_policy = "pointer"
//! extended_api = true
//! go_module = "github.com/acme/shop"
//!
//! [field_types]
//! price = "numeric(10,2)"
//!
//! [rewrite.decimal]
//! type = "decimal.Decimal"
//! module = "github.com/shopspring/decimal"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{GenError, GenResult};
use crate::mapper::{RewriteKind, TypeRewrite};

pub const CONFIG_FILE: &str = "ddlgen.toml";

/// JSON field naming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingConvention {
    Snake,
    #[default]
    Camel,
}

/// Representation of NULL-able columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullPolicy {
    /// Absent values are the type's zero value.
    #[default]
    Disabled,
    /// `sql.NullInt64` and friends.
    Wrapper,
    /// `*T`.
    Pointer,
}

/// One value-object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteTarget {
    #[serde(rename = "type")]
    pub type_name: String,
    pub module: String,
}

impl RewriteTarget {
    fn new(type_name: &str, module: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            module: module.to_string(),
        }
    }
}

/// Value objects used for rewritten native types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub decimal: RewriteTarget,
    pub json: RewriteTarget,
    pub bool: RewriteTarget,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        const SQLTYPES: &str = "example.com/app/pkg/sqltypes";
        Self {
            decimal: RewriteTarget::new("sqltypes.Decimal", SQLTYPES),
            json: RewriteTarget::new("sqltypes.JSON", SQLTYPES),
            bool: RewriteTarget::new("sqltypes.Bool", SQLTYPES),
        }
    }
}

impl RewriteConfig {
    pub fn resolve(&self, kind: RewriteKind) -> TypeRewrite {
        let target = match kind {
            RewriteKind::Decimal => &self.decimal,
            RewriteKind::Json => &self.json,
            RewriteKind::Bool => &self.bool,
        };
        TypeRewrite {
            kind,
            type_name: target.type_name.clone(),
            module: target.module.clone(),
        }
    }
}

/// Everything that shapes one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    pub db_driver: Dialect,

    /// Column name → native type, for dialects whose DDL is synthesised
    /// without real types.
    pub field_types: BTreeMap<String, String>,

    pub table_prefix: String,
    pub column_prefix: String,

    /// `None` means the default (camel).
    pub json_naming: Option<NamingConvention>,
    pub null_policy: NullPolicy,

    /// Embed the standard `id/created_at/updated_at/deleted_at` block.
    pub embed_standard_fields: bool,
    pub web_transport: bool,
    pub extended_api: bool,
    pub force_table_name: bool,

    /// Go module path generated imports are rooted at.
    pub go_module: String,

    pub rewrite: RewriteConfig,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            db_driver: Dialect::MySql,
            field_types: BTreeMap::new(),
            table_prefix: String::new(),
            column_prefix: String::new(),
            json_naming: None,
            null_policy: NullPolicy::Disabled,
            embed_standard_fields: false,
            web_transport: false,
            extended_api: false,
            force_table_name: false,
            go_module: "example.com/app".to_string(),
            rewrite: RewriteConfig::default(),
        }
    }
}

impl GenConfig {
    /// Create a new configuration builder
    pub fn builder() -> GenConfigBuilder {
        GenConfigBuilder::default()
    }

    pub fn from_toml_str(text: &str) -> GenResult<Self> {
        toml::from_str(text).map_err(|e| GenError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> GenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config");
        Self::from_toml_str(&text)
    }

    /// `./ddlgen.toml`, then `<config dir>/ddlgen/ddlgen.toml`.
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("ddlgen").join(CONFIG_FILE))
            .filter(|path| path.is_file())
    }

    /// Load the discovered file, or defaults when there is none.
    pub fn load_or_default() -> GenResult<Self> {
        match Self::discover() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn naming_convention(&self) -> NamingConvention {
        self.json_naming.unwrap_or_default()
    }

    /// The native type override configured for `column`.
    pub fn field_type(&self, column: &str) -> Option<&str> {
        self.field_types.get(column).map(String::as_str)
    }
}

/// Builder for GenConfig
#[derive(Debug, Default)]
pub struct GenConfigBuilder {
    config: GenConfig,
}

impl GenConfigBuilder {
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.db_driver = dialect;
        self
    }

    pub fn field_type(mut self, column: impl Into<String>, native: impl Into<String>) -> Self {
        self.config.field_types.insert(column.into(), native.into());
        self
    }

    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.table_prefix = prefix.into();
        self
    }

    pub fn column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.column_prefix = prefix.into();
        self
    }

    pub fn json_naming(mut self, convention: NamingConvention) -> Self {
        self.config.json_naming = Some(convention);
        self
    }

    pub fn null_policy(mut self, policy: NullPolicy) -> Self {
        self.config.null_policy = policy;
        self
    }

    pub fn embed_standard_fields(mut self, on: bool) -> Self {
        self.config.embed_standard_fields = on;
        self
    }

    pub fn web_transport(mut self, on: bool) -> Self {
        self.config.web_transport = on;
        self
    }

    pub fn extended_api(mut self, on: bool) -> Self {
        self.config.extended_api = on;
        self
    }

    pub fn force_table_name(mut self, on: bool) -> Self {
        self.config.force_table_name = on;
        self
    }

    pub fn go_module(mut self, module: impl Into<String>) -> Self {
        self.config.go_module = module.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> GenConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenConfig::default();
        assert_eq!(config.db_driver, Dialect::MySql);
        assert_eq!(config.naming_convention(), NamingConvention::Camel);
        assert_eq!(config.null_policy, NullPolicy::Disabled);
        assert_eq!(config.rewrite.decimal.type_name, "sqltypes.Decimal");
    }

    #[test]
    fn test_from_toml() {
        let config = GenConfig::from_toml_str(
            r#"
            db_driver = "postgresql"
            table_prefix = "t_"
            json_naming = "snake"
            null_policy = "pointer"
            extended_api = true

            [field_types]
            price = "numeric(10,2)"

            [rewrite.decimal]
            type = "decimal.Decimal"
            module = "github.com/shopspring/decimal"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_driver, Dialect::Postgres);
        assert_eq!(config.table_prefix, "t_");
        assert_eq!(config.json_naming, Some(NamingConvention::Snake));
        assert_eq!(config.null_policy, NullPolicy::Pointer);
        assert!(config.extended_api);
        assert_eq!(config.field_type("price"), Some("numeric(10,2)"));

        let decimal = config.rewrite.resolve(RewriteKind::Decimal);
        assert_eq!(decimal.type_name, "decimal.Decimal");
        assert_eq!(decimal.module, "github.com/shopspring/decimal");
        // Untouched entries keep their defaults.
        assert_eq!(config.rewrite.json.type_name, "sqltypes.JSON");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = GenConfig::from_toml_str("db_driver = \"oracle\"").unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = GenConfig::builder()
            .dialect(Dialect::MongoDb)
            .web_transport(true)
            .field_type("age", "int")
            .build();
        assert_eq!(config.db_driver, Dialect::MongoDb);
        assert!(config.web_transport);
        assert_eq!(config.field_types.len(), 1);
    }
}
