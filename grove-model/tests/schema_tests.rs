use grove_model::{
    DataModelType, Field, KeyHolder, Model, ModelError, RelationShip, RelationType, Schema, Side,
};
use pretty_assertions::assert_eq;

fn user() -> Model {
    Model::new("User")
        .with_field(Field::id())
        .with_field(Field::scalar("username", DataModelType::String).unique())
}

fn book() -> Model {
    Model::new("Book")
        .with_field(Field::id())
        .with_field(Field::scalar("name", DataModelType::String))
}

// ── Namings ──────────────────────────────────────────────────────

#[test]
fn namings_follow_model_name() {
    let m = Model::new("Category");
    assert_eq!(m.namings().singular, "category");
    assert_eq!(m.namings().plural, "categories");
    assert_eq!(m.namings().capital_singular, "Category");
    assert_eq!(m.namings().capital_plural, "Categories");
}

#[test]
fn storage_key_defaults_to_model_name() {
    assert_eq!(user().storage_key(), "User");
    assert_eq!(user().with_source_key("users").storage_key(), "users");
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn duplicate_model_rejected() {
    let err = Schema::new(vec![user(), user()]).unwrap_err();
    assert_eq!(err, ModelError::DuplicateModel("User".into()));
}

#[test]
fn model_without_unique_field_rejected() {
    let m = Model::new("Log").with_field(Field::scalar("line", DataModelType::String));
    let err = Schema::new(vec![m]).unwrap_err();
    assert_eq!(err, ModelError::NoUniqueField("Log".into()));
}

#[test]
fn object_type_model_needs_no_unique_field() {
    let m = Model::new("Settings")
        .object_type()
        .with_field(Field::scalar("theme", DataModelType::String));
    assert!(Schema::new(vec![m]).is_ok());
}

#[test]
fn unknown_relation_target_rejected() {
    let m = user().with_field(Field::relation("team", "Team", RelationType::UniOneToOne));
    let err = Schema::new(vec![m]).unwrap_err();
    assert_eq!(err, ModelError::UnknownModel("Team".into()));
}

#[test]
fn bidirectional_without_reciprocal_rejected() {
    let u = user().with_field(
        Field::relation("books", "Book", RelationType::BiOneToMany)
            .list()
            .relation_name("UserBooks"),
    );
    let err = Schema::new(vec![u, book()]).unwrap_err();
    assert!(matches!(err, ModelError::MissingReciprocal { .. }));
}

#[test]
fn many_to_many_requires_lists() {
    let u = user().with_field(
        Field::relation("books", "Book", RelationType::BiManyToMany).relation_name("Shelf"),
    );
    let b = book().with_field(
        Field::relation("readers", "User", RelationType::BiManyToMany)
            .list()
            .relation_name("Shelf"),
    );
    let err = Schema::new(vec![u, b]).unwrap_err();
    assert!(matches!(err, ModelError::InvalidRelation { .. }));
}

// ── Layout resolution ────────────────────────────────────────────

#[test]
fn uni_one_to_one_key_on_source() {
    let u = user().with_field(Field::relation("oneBook", "Book", RelationType::UniOneToOne));
    let schema = Schema::new(vec![u, book()]).unwrap();

    let rel = &schema.relations()[0];
    assert_eq!(rel.ship(), RelationShip::OneToOne);
    assert_eq!(rel.foreign_key, "oneBookId");
    assert_eq!(rel.key_holder, Side::Source);
    assert_eq!(rel.target_field, None);

    let field = schema.model("User").unwrap().field("oneBook").unwrap();
    let meta = field.as_relation().unwrap();
    assert_eq!(meta.foreign_key(), "oneBookId");
    assert_eq!(meta.holder(), KeyHolder::Local);
}

#[test]
fn uni_one_to_many_key_on_target() {
    let u = user().with_field(Field::relation("books", "Book", RelationType::UniOneToMany).list());
    let schema = Schema::new(vec![u, book()]).unwrap();

    let rel = &schema.relations()[0];
    assert_eq!(rel.ship(), RelationShip::OneToMany);
    assert_eq!(rel.foreign_key, "userBooksId");
    assert_eq!(rel.key_holder, Side::Target);
}

#[test]
fn bi_one_to_many_normalises_list_side_to_source() {
    // list side declared on the second model
    let u = user().with_field(
        Field::relation("books", "Book", RelationType::BiOneToMany)
            .list()
            .relation_name("Authorship"),
    );
    let b = book().with_field(
        Field::relation("author", "User", RelationType::BiOneToMany).relation_name("Authorship"),
    );
    let schema = Schema::new(vec![b, u]).unwrap();

    assert_eq!(schema.relations().len(), 1);
    let rel = &schema.relations()[0];
    assert_eq!(rel.source, "User");
    assert_eq!(rel.source_field, "books");
    assert_eq!(rel.target, "Book");
    assert_eq!(rel.target_field.as_deref(), Some("author"));
    assert_eq!(rel.foreign_key, "authorId");
    assert_eq!(rel.key_holder, Side::Target);

    let author = schema.model("Book").unwrap().field("author").unwrap();
    assert_eq!(author.as_relation().unwrap().holder(), KeyHolder::Local);
    let books = schema.model("User").unwrap().field("books").unwrap();
    assert_eq!(books.as_relation().unwrap().holder(), KeyHolder::Remote);
}

#[test]
fn bi_one_to_one_respects_owner_flag() {
    let u = user().with_field(
        Field::relation("profile", "Book", RelationType::BiOneToOne).relation_name("Pen"),
    );
    let b = book().with_field(
        Field::relation("writer", "User", RelationType::BiOneToOne)
            .relation_name("Pen")
            .owner(),
    );
    let schema = Schema::new(vec![u, b]).unwrap();

    let rel = &schema.relations()[0];
    assert_eq!(rel.source, "Book");
    assert_eq!(rel.foreign_key, "writerId");
    assert_eq!(schema.relation_for("User", "profile").unwrap().1, Side::Target);
    assert_eq!(schema.relation_for("Book", "writer").unwrap().1, Side::Source);
}

#[test]
fn bi_many_to_many_keeps_one_array_per_side() {
    let u = user().with_field(
        Field::relation("friends", "Friend", RelationType::BiManyToMany)
            .list()
            .relation_name("friends"),
    );
    let f = Model::new("Friend")
        .with_field(Field::id())
        .with_field(Field::scalar("username", DataModelType::String))
        .with_field(
            Field::relation("users", "User", RelationType::BiManyToMany)
                .list()
                .relation_name("friends"),
        );
    let schema = Schema::new(vec![u, f]).unwrap();

    let rel = &schema.relations()[0];
    assert_eq!(rel.ship(), RelationShip::ManyToMany);
    assert_eq!(rel.foreign_key, "friends");
    assert_eq!(rel.target_foreign_key.as_deref(), Some("users"));
}

#[test]
fn explicit_foreign_key_wins() {
    let u = user().with_field(
        Field::relation("team", "Book", RelationType::UniManyToOne).foreign_key("team_ref"),
    );
    let schema = Schema::new(vec![u, book()]).unwrap();
    assert_eq!(schema.relations()[0].foreign_key, "team_ref");
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn relation_type_serializes_screaming_snake() {
    let json = serde_json::to_string(&RelationType::BiManyToMany).unwrap();
    assert_eq!(json, "\"BI_MANY_TO_MANY\"");
}

#[test]
fn field_roundtrips_through_json() {
    let field = Field::relation("books", "Book", RelationType::UniOneToMany).list();
    let json = serde_json::to_value(&field).unwrap();
    assert_eq!(json["kind"]["kind"], "relation");
    assert_eq!(json["kind"]["relation_type"], "UNI_ONE_TO_MANY");
    let back: Field = serde_json::from_value(json).unwrap();
    assert_eq!(back, field);
}
