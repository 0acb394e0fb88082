//! The generation context shared by every table of a run.

use tracing::{debug, warn};

use crate::ast::CreateTable;
use crate::config::{GenConfig, NullPolicy};
use crate::dialect::Dialect;
use crate::emit::{self, ApiTier, GeneratedSet, ServiceVariant, Transport};
use crate::error::GenResult;
use crate::model::{Field, TableModel};
use crate::naming::Naming;
use crate::parser;

/// Configuration plus the naming tables, immutable once built.
///
/// A context is `Send + Sync`; tables can be generated from several threads
/// against one shared instance.
#[derive(Debug, Clone)]
pub struct GenContext {
    config: GenConfig,
    naming: &'static Naming,
}

impl GenContext {
    pub fn new(config: GenConfig) -> Self {
        warn_ignored_options(&config);
        Self {
            config,
            naming: Naming::shared(),
        }
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    pub fn naming(&self) -> &Naming {
        self.naming
    }

    pub fn dialect(&self) -> Dialect {
        self.config.db_driver
    }

    pub fn tier(&self) -> ApiTier {
        if self.config.extended_api {
            ApiTier::Extended
        } else {
            ApiTier::Basic
        }
    }

    pub fn transport(&self) -> Transport {
        if self.config.web_transport {
            Transport::Web
        } else {
            Transport::Rpc
        }
    }

    pub fn variant(&self) -> ServiceVariant {
        ServiceVariant {
            tier: self.tier(),
            transport: self.transport(),
        }
    }

    /// Whether entities embed the standard id/timestamp block.
    pub fn embeds_standard_fields(&self) -> bool {
        self.config.embed_standard_fields && !self.dialect().is_document_store()
    }

    pub fn build_model(&self, table: &CreateTable) -> GenResult<TableModel> {
        TableModel::build(table, &self.config, self.naming)
    }

    /// The field a `NOT NULL` column of type `native` becomes under this
    /// configuration, rewrites included.
    pub fn sample_field(&self, native: &str) -> GenResult<Field> {
        let table = parser::parse_create_table(&format!(
            "CREATE TABLE sample (value {native} NOT NULL)"
        ))?;
        let mut model = self.build_model(&table)?;
        Ok(model.fields.remove(0))
    }

    /// Model and every artifact for one parsed table.
    pub fn generate_table(&self, table: &CreateTable) -> GenResult<GeneratedSet> {
        let model = self.build_model(table)?;
        emit::emit_all(self, &model)
    }

    /// Parse one `CREATE TABLE` statement and generate it.
    pub fn generate(&self, ddl: &str) -> GenResult<GeneratedSet> {
        let table = parser::parse_create_table(ddl)?;
        self.generate_table(&table)
    }

    /// Generate every table of a script. Each table succeeds or fails on its own.
    pub fn generate_script(&self, sql: &str) -> Vec<GenResult<GeneratedSet>> {
        let results: Vec<_> = parser::parse_script(sql)
            .into_iter()
            .map(|parsed| parsed.and_then(|table| self.generate_table(&table)))
            .collect();
        debug!(
            tables = results.len(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "generated script"
        );
        results
    }
}

fn warn_ignored_options(config: &GenConfig) {
    let dialect = config.db_driver;
    if dialect.is_document_store() {
        if config.null_policy == NullPolicy::Wrapper {
            warn!(%dialect, "null_policy = wrapper has no effect, document stores have no wrapper types");
        }
        if config.embed_standard_fields {
            warn!(%dialect, "embed_standard_fields has no effect for document stores");
        }
        if config.json_naming.is_some() {
            warn!(%dialect, "json_naming is ignored, document fields keep their stored names");
        }
    }
    if !config.field_types.is_empty() && !dialect.takes_type_overrides() {
        warn!(
            %dialect,
            columns = config.field_types.len(),
            "field_types ignored, this dialect declares its own column types"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::ArtifactKind;
    use crate::mapper::WireType;

    #[test]
    fn test_context_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GenContext>();
    }

    #[test]
    fn test_variant_follows_config() {
        let ctx = GenContext::new(
            GenConfig::builder()
                .extended_api(true)
                .web_transport(true)
                .build(),
        );
        assert_eq!(ctx.tier(), ApiTier::Extended);
        assert_eq!(ctx.transport(), Transport::Web);
        assert_eq!(GenContext::new(GenConfig::default()).variant(), ServiceVariant::default());
    }

    #[test]
    fn test_sample_field_follows_rewrites() {
        let config: GenConfig = toml::from_str(
            "[rewrite.decimal]\ntype = \"decimal.Decimal\"\nmodule = \"github.com/shopspring/decimal\"\n",
        )
        .unwrap();
        let price = GenContext::new(config).sample_field("decimal(10,2)").unwrap();
        assert_eq!(price.go_type(), "decimal.Decimal");
        assert_eq!(price.imports(), ["github.com/shopspring/decimal"]);
        assert_eq!(price.wire_type(), Some(WireType::String));

        let ctx = GenContext::new(GenConfig::default());
        assert_eq!(ctx.sample_field("bigint unsigned").unwrap().go_type(), "uint64");
        assert!(ctx.sample_field("geometry").is_err());
    }

    #[test]
    fn test_embedding_is_off_for_document_stores() {
        let config = GenConfig::builder()
            .dialect(Dialect::MongoDb)
            .embed_standard_fields(true)
            .build();
        assert!(!GenContext::new(config).embeds_standard_fields());
    }

    #[test]
    fn test_generate_renders_every_artifact() {
        let ctx = GenContext::new(GenConfig::default());
        let set = ctx
            .generate("CREATE TABLE users (id BIGINT PRIMARY KEY, name TEXT)")
            .unwrap();
        assert_eq!(set.table, "users");
        assert_eq!(set.artifacts.keys().copied().collect::<Vec<_>>(), ArtifactKind::ALL);
        assert_eq!(set.artifacts[&ArtifactKind::MessageService].file_name, "users.proto");
    }

    #[test]
    fn test_script_failures_are_per_table() {
        let ctx = GenContext::new(GenConfig::default());
        let results = ctx.generate_script(
            "CREATE TABLE a (id INT PRIMARY KEY);\n\
             CREATE TABLE b (shape GEOMETRY);\n\
             CREATE TABLE c (id INT PRIMARY KEY);",
        );
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().table, "c");
    }
}
