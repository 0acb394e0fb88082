use ddlgen::mapper::{HostType, WireType};
use ddlgen::prelude::*;
use pretty_assertions::assert_eq;

/// Synthetic DDL as produced from a sampled collection.
const PROFILE: &str = "CREATE TABLE user_profile (\
    _id primitive.ObjectID, \
    nick_name string, \
    scores []int64, \
    friends []primitive.ObjectID, \
    address *Address, \
    extra map[string]interface{}, \
    joined_at time.Time\
)";

fn mongo() -> GenConfig {
    GenConfig::builder().dialect(Dialect::MongoDb).build()
}

#[test]
fn test_identifier_is_object_id() {
    let ctx = GenContext::new(mongo());
    let model = ctx.build_model(&parse_create_table(PROFILE).unwrap()).unwrap();

    let id = model.key_field().unwrap();
    assert_eq!(id.raw_name, "_id");
    assert_eq!(id.host_type, HostType::ObjectId);
    assert_eq!(id.name, "ID");
    assert_eq!(id.json_name, "id");
    assert!(id.is_primary_key);

    assert!(!model.crud.is_common_type);
    assert_eq!(model.crud.key.word, "ID");
    assert_eq!(model.crud.primary_key_column_name, "_id");
}

#[test]
fn test_array_columns_project_to_repeated() {
    let ctx = GenContext::new(mongo());
    let model = ctx.build_model(&parse_create_table(PROFILE).unwrap()).unwrap();

    let scores = model.field("scores").unwrap();
    assert_eq!(scores.host_type, HostType::Slice(Box::new(HostType::Int64)));
    assert_eq!(
        scores.wire_type(),
        Some(WireType::Repeated(Box::new(WireType::Int64)))
    );

    let friends = model.field("friends").unwrap();
    assert_eq!(
        friends.wire_type(),
        Some(WireType::Repeated(Box::new(WireType::String)))
    );
}

#[test]
fn test_document_artifacts() {
    let set = ddlgen::generate(PROFILE, &mongo()).unwrap();

    let entity = set.text(ArtifactKind::Entity).unwrap();
    assert!(entity.contains("bson:\"_id\" json:\"id\""));
    assert!(entity.contains("*Address"));
    assert!(entity.contains("const UserProfileCollectionName = \"user_profile\""));
    assert!(!entity.contains("gorm"));

    let diff = set.text(ArtifactKind::Diff).unwrap();
    assert!(diff.contains("if table.Friends != nil && len(table.Friends) > 0 {"));
    assert!(diff.contains("if table.Address != nil {"));
    assert!(diff.contains("if table.JoinedAt != nil && !table.JoinedAt.IsZero() {"));

    let proto = set.text(ArtifactKind::MessageService).unwrap();
    assert!(proto.contains("  repeated int64 scores = 3;"));
    assert!(proto.contains("  repeated string friends = 4;"));
    assert!(proto.contains("  string address = 5;"));
    assert!(proto.contains("message GetUserProfileByIDRequest {\n  string id = 1 [(validate.rules).string.min_len = 1];\n}"));
}

#[test]
fn test_ignored_options_do_not_change_output() {
    let plain = ddlgen::generate(PROFILE, &mongo()).unwrap();
    let noisy = ddlgen::generate(
        PROFILE,
        &GenConfig::builder()
            .dialect(Dialect::MongoDb)
            .json_naming(NamingConvention::Snake)
            .null_policy(NullPolicy::Wrapper)
            .embed_standard_fields(true)
            .build(),
    )
    .unwrap();
    assert_eq!(plain.artifacts, noisy.artifacts);
}
