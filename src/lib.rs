//! # ddlgen
//!
//! One `CREATE TABLE` in, a consistent set of Go and protobuf artifacts out.
//!
//! ## Quick Example
//!
//! ```rust
//! use ddlgen::prelude::*;
//!
//! let set = ddlgen::generate(
//!     "CREATE TABLE user (id BIGINT UNSIGNED PRIMARY KEY AUTO_INCREMENT, user_name VARCHAR(64))",
//!     &GenConfig::default(),
//! )
//! .unwrap();
//!
//! assert!(set.crud_info.is_standard_identifier);
//! assert!(set.text(ArtifactKind::Entity).unwrap().contains("UserName string"));
//! ```
//!
//! ## Pipeline
//!
//! | stage   | module            | output                         |
//! |---------|-------------------|--------------------------------|
//! | parse   | [`parser`]        | [`ast::CreateTable`]           |
//! | map     | [`mapper`]        | [`mapper::HostType`] + rewrite |
//! | model   | [`model`]         | [`model::TableModel`]          |
//! | resolve | [`crud`]          | [`crud::CrudInfo`]             |
//! | render  | [`emit`]          | [`emit::GeneratedSet`]         |

pub mod ast;
pub mod config;
pub mod context;
pub mod crud;
pub mod dialect;
pub mod emit;
pub mod error;
pub mod mapper;
pub mod model;
pub mod naming;
pub mod parser;

pub mod prelude {
    pub use crate::ast::{ColumnDef, CreateTable, NativeType};
    pub use crate::config::{GenConfig, NamingConvention, NullPolicy};
    pub use crate::context::GenContext;
    pub use crate::crud::CrudInfo;
    pub use crate::dialect::Dialect;
    pub use crate::emit::{ApiTier, ArtifactKind, GeneratedArtifact, GeneratedSet, Transport};
    pub use crate::error::*;
    pub use crate::mapper::{HostType, WireType};
    pub use crate::model::{Field, TableModel};
    pub use crate::parser::{parse_create_table, parse_script};
}

/// Generate every artifact for one `CREATE TABLE` statement.
///
/// Builds a throwaway [`context::GenContext`]; reuse one when generating many tables.
pub fn generate(ddl: &str, config: &config::GenConfig) -> error::GenResult<emit::GeneratedSet> {
    context::GenContext::new(config.clone()).generate(ddl)
}
