//! Artifact emitters.
//!
//! Five emitters render one [`TableModel`] each:
//!
//! | kind               | output                        |
//! |--------------------|-------------------------------|
//! | `entity`           | Go struct with storage tags   |
//! | `diff`             | sparse update map helper      |
//! | `request_response` | HTTP request/reply shapes     |
//! | `message_service`  | `.proto` messages and service |
//! | `exerciser`        | Go test calling every rpc     |
//!
//! All of them read names and types from the same model, so a field is spelled
//! identically in every artifact.

pub mod diff;
pub mod dto;
pub mod entity;
pub mod exerciser;
pub mod go;
pub mod proto;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::context::GenContext;
use crate::crud::{CrudInfo, KeyInfo, STANDARD_ID};
use crate::error::{GenError, GenResult};
use crate::mapper::{HostType, WireType};
use crate::model::{Field, TableModel};

/// Artifact discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Entity,
    Diff,
    RequestResponse,
    MessageService,
    Exerciser,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Entity,
        ArtifactKind::Diff,
        ArtifactKind::RequestResponse,
        ArtifactKind::MessageService,
        ArtifactKind::Exerciser,
    ];

    pub const fn key(&self) -> &'static str {
        match self {
            ArtifactKind::Entity => "entity",
            ArtifactKind::Diff => "diff",
            ArtifactKind::RequestResponse => "request_response",
            ArtifactKind::MessageService => "message_service",
            ArtifactKind::Exerciser => "exerciser",
        }
    }

    /// File the artifact is written to.
    pub fn file_name(&self, table: &TableModel) -> String {
        match self {
            ArtifactKind::Entity => "model.go".to_string(),
            ArtifactKind::Diff => "update_fields.go".to_string(),
            ArtifactKind::RequestResponse => "types.go".to_string(),
            ArtifactKind::MessageService => format!("{}.proto", table.snake_name),
            ArtifactKind::Exerciser => format!("{}_service_test.go", table.snake_name),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Operation set size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiTier {
    /// Five operations.
    #[default]
    Basic,
    /// Nine operations.
    Extended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Internal RPC only.
    #[default]
    Rpc,
    /// RPC plus HTTP route and binding annotations.
    Web,
}

/// Template variant a set was rendered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceVariant {
    pub tier: ApiTier,
    pub transport: Transport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedArtifact {
    pub kind: ArtifactKind,
    pub variant: ServiceVariant,
    pub file_name: String,
    pub text: String,
}

/// Everything generated for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSet {
    pub table: String,
    pub artifacts: BTreeMap<ArtifactKind, GeneratedArtifact>,
    pub crud_info: CrudInfo,
}

impl GeneratedSet {
    pub fn text(&self, kind: ArtifactKind) -> Option<&str> {
        self.artifacts.get(&kind).map(|a| a.text.as_str())
    }
}

/// Renders one artifact kind.
pub trait Emitter: Sync {
    fn kind(&self) -> ArtifactKind;

    fn render(&self, ctx: &GenContext, table: &TableModel) -> GenResult<String>;
}

/// The emitters in artifact order.
pub fn emitters() -> [&'static dyn Emitter; 5] {
    [
        &entity::EntityEmitter,
        &diff::DiffEmitter,
        &dto::DtoEmitter,
        &proto::ProtoEmitter,
        &exerciser::ExerciserEmitter,
    ]
}

/// Run every emitter over `table`. The first failure aborts the set.
pub fn emit_all(ctx: &GenContext, table: &TableModel) -> GenResult<GeneratedSet> {
    let variant = ctx.variant();
    let mut artifacts = BTreeMap::new();
    for emitter in emitters() {
        let kind = emitter.kind();
        let text = emitter.render(ctx, table)?;
        debug!(table = %table.raw_name, artifact = %kind, bytes = text.len(), "rendered");
        artifacts.insert(
            kind,
            GeneratedArtifact {
                kind,
                variant,
                file_name: kind.file_name(table),
                text,
            },
        );
    }
    Ok(GeneratedSet {
        table: table.raw_name.clone(),
        artifacts,
        crud_info: table.crud.clone(),
    })
}

/// Service operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    DeleteByKey,
    UpdateByKey,
    GetByKey,
    List,
    DeleteByKeys,
    GetByCondition,
    ListByKeys,
    ListByLastKey,
}

impl Operation {
    pub const BASIC: [Operation; 5] = [
        Operation::Create,
        Operation::DeleteByKey,
        Operation::UpdateByKey,
        Operation::GetByKey,
        Operation::List,
    ];

    pub const EXTENDED: [Operation; 9] = [
        Operation::Create,
        Operation::DeleteByKey,
        Operation::UpdateByKey,
        Operation::GetByKey,
        Operation::List,
        Operation::DeleteByKeys,
        Operation::GetByCondition,
        Operation::ListByKeys,
        Operation::ListByLastKey,
    ];

    pub fn for_tier(tier: ApiTier) -> &'static [Operation] {
        match tier {
            ApiTier::Basic => &Self::BASIC,
            ApiTier::Extended => &Self::EXTENDED,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::DeleteByKey | Operation::DeleteByKeys => "Delete",
            Operation::UpdateByKey => "Update",
            Operation::GetByKey | Operation::GetByCondition => "Get",
            Operation::List | Operation::ListByKeys | Operation::ListByLastKey => "List",
        }
    }

    fn suffix(&self, key: &KeyInfo) -> String {
        match self {
            Operation::Create | Operation::List => String::new(),
            Operation::DeleteByKey | Operation::UpdateByKey | Operation::GetByKey => {
                format!("By{}", key.word)
            }
            Operation::DeleteByKeys | Operation::ListByKeys => format!("By{}", key.word_plural),
            Operation::GetByCondition => "ByCondition".to_string(),
            Operation::ListByLastKey => format!("ByLast{}", key.word),
        }
    }

    /// `DeleteByID`, `ListByLastCouponCode`.
    pub fn rpc_name(&self, key: &KeyInfo) -> String {
        format!("{}{}", self.verb(), self.suffix(key))
    }

    /// `DeleteUserByIDRequest`.
    pub fn request_name(&self, table: &TableModel) -> String {
        format!("{}{}{}Request", self.verb(), table.name, self.suffix(&table.crud.key))
    }

    /// `DeleteUserByIDReply`.
    pub fn reply_name(&self, table: &TableModel) -> String {
        format!("{}{}{}Reply", self.verb(), table.name, self.suffix(&table.crud.key))
    }

    /// HTTP method and path below `/api/v1/<table>`.
    pub fn route(&self, key: &KeyInfo) -> (&'static str, String) {
        match self {
            Operation::Create => ("post", String::new()),
            Operation::DeleteByKey => ("delete", format!("/{{{}}}", key.lower)),
            Operation::UpdateByKey => ("put", format!("/{{{}}}", key.lower)),
            Operation::GetByKey => ("get", format!("/{{{}}}", key.lower)),
            Operation::List => ("post", "/list".to_string()),
            Operation::DeleteByKeys => ("post", format!("/delete/{}", key.lower_plural)),
            Operation::GetByCondition => ("post", "/condition".to_string()),
            Operation::ListByKeys => ("post", format!("/list/{}", key.lower_plural)),
            Operation::ListByLastKey => ("get", "/list".to_string()),
        }
    }

    /// One-line description, e.g. `get user by id`.
    pub fn summary(&self, table: &TableModel) -> String {
        let key = &table.crud.key;
        let t = &table.lower_name;
        match self {
            Operation::Create => format!("create {t}"),
            Operation::DeleteByKey => format!("delete {t} by {}", key.lower),
            Operation::UpdateByKey => format!("update {t} by {}", key.lower),
            Operation::GetByKey => format!("get {t} by {}", key.lower),
            Operation::List => format!("list of {t} by query parameters"),
            Operation::DeleteByKeys => format!("delete {t} by batch {}", key.lower),
            Operation::GetByCondition => format!("get {t} by condition"),
            Operation::ListByKeys => format!("list of {t} by batch {}", key.lower),
            Operation::ListByLastKey => format!("list {t} by last {}", key.lower),
        }
    }

    /// Whether the request carries a request body (vs. path/query only).
    pub fn has_body(&self) -> bool {
        !matches!(
            self,
            Operation::DeleteByKey | Operation::GetByKey | Operation::ListByLastKey
        )
    }
}

/// Fields a create request carries.
pub fn creatable_fields<'a>(ctx: &GenContext, table: &'a TableModel) -> Vec<&'a Field> {
    let key_index = table.crud.key.field_index;
    let embedded = ctx.embeds_standard_fields();
    table
        .fields
        .iter()
        .enumerate()
        .filter(|(i, f)| {
            let is_key = key_index == Some(*i);
            !(is_key && (f.auto_increment || !table.crud.is_common_type))
                && !(embedded && f.is_standard_field())
        })
        .map(|(_, f)| f)
        .collect()
}

/// Fields an update request carries besides the key.
pub fn updatable_fields<'a>(ctx: &GenContext, table: &'a TableModel) -> Vec<&'a Field> {
    let key_index = table.crud.key.field_index;
    let embedded = ctx.embeds_standard_fields();
    table
        .fields
        .iter()
        .enumerate()
        .filter(|(i, f)| key_index != Some(*i) && !(embedded && f.is_standard_field()))
        .map(|(_, f)| f)
        .collect()
}

/// Fields of the detail view. A synthetic key is added by the caller.
pub fn detail_fields<'a>(ctx: &GenContext, table: &'a TableModel) -> Vec<&'a Field> {
    let embedded = ctx.embeds_standard_fields();
    table
        .fields
        .iter()
        .filter(|f| !replaced_by_embedding(ctx, f) && !(embedded && f.raw_name == "deleted_at"))
        .collect()
}

/// A declared `id` column gives way to the embedded block's key.
pub fn replaced_by_embedding(ctx: &GenContext, field: &Field) -> bool {
    ctx.embeds_standard_fields() && field.raw_name == STANDARD_ID
}

/// Struct types the fields reference that no artifact declares.
pub fn external_structs(table: &TableModel) -> Vec<&str> {
    fn struct_name(host: &HostType) -> Option<&str> {
        match host {
            HostType::Slice(inner) => struct_name(inner),
            HostType::Object(name) if host.is_struct_object() => Some(name),
            _ => None,
        }
    }
    let mut names: Vec<&str> = table
        .fields
        .iter()
        .filter_map(|f| struct_name(&f.host_type))
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Go comment lines asking the caller to declare `external_structs`.
pub fn external_struct_note(table: &TableModel, package: &str) -> String {
    external_structs(table)
        .into_iter()
        .map(|name| format!("\n// {name} is not generated; declare it in package {package}.\n"))
        .collect()
}

/// Wire type of `field`, or a render error naming it.
pub fn require_wire(kind: ArtifactKind, field: &Field) -> GenResult<WireType> {
    field.wire_type().ok_or_else(|| {
        GenError::render(
            kind,
            &field.raw_name,
            format!("type {} has no message wire type", field.host_type),
        )
    })
}
