use grove_filter::{compile_unique_where, compile_where, FilterCompiler, FilterError};
use grove_model::{DataModelType, Field, KeyHolder, Model, RelationShip, RelationType, Schema};
use grove_storage::{
    Comparison, Condition, ElementFilter, ListQuantifier, ListReadable, MemoryStore, Operator,
    Record, RequestContext, Where,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

fn raw(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn schema() -> Schema {
    let user = Model::new("User")
        .with_field(Field::id())
        .with_field(Field::scalar("username", DataModelType::String).unique())
        .with_field(Field::scalar("age", DataModelType::Int))
        .with_field(Field::scalar("created_at", DataModelType::DateTime))
        .with_field(Field::scalar("tags", DataModelType::String).list())
        .with_field(
            Field::object(
                "notes",
                "Note",
                vec![
                    Field::scalar("language", DataModelType::String),
                    Field::scalar("score", DataModelType::Int),
                    Field::scalar("last_seen", DataModelType::DateTime),
                ],
            )
            .list(),
        )
        .with_field(Field::object(
            "profile",
            "Profile",
            vec![
                Field::scalar("city", DataModelType::String),
                Field::scalar("last_seen", DataModelType::DateTime),
            ],
        ))
        .with_field(Field::scalar("settings", DataModelType::Json))
        .with_field(
            Field::relation("friends", "Friend", RelationType::BiManyToMany)
                .list()
                .relation_name("friends"),
        )
        .with_field(
            Field::relation("books", "Book", RelationType::BiOneToMany)
                .list()
                .relation_name("Authorship"),
        );
    let friend = Model::new("Friend")
        .with_field(Field::id())
        .with_field(Field::scalar("username", DataModelType::String))
        .with_field(
            Field::relation("users", "User", RelationType::BiManyToMany)
                .list()
                .relation_name("friends"),
        );
    let book = Model::new("Book")
        .with_field(Field::id())
        .with_field(Field::scalar("name", DataModelType::String))
        .with_field(
            Field::relation("author", "User", RelationType::BiOneToMany).relation_name("Authorship"),
        );
    Schema::new(vec![user, friend, book]).unwrap()
}

fn compile(schema: &Schema, model: &str, input: Value) -> Result<Where, FilterError> {
    compile_where(&raw(input), schema.model(model).unwrap(), schema)
}

fn compare(op: Operator, value: Value) -> Condition {
    Condition::Compare(Comparison::new(op, value))
}

// ── Scalars ──────────────────────────────────────────────────────

#[test]
fn suffixes_become_operators() {
    let s = schema();
    let filter = compile(&s, "User", json!({"username": "ada", "age_gt": 30})).unwrap();
    assert_eq!(
        filter,
        Where::new()
            .eq("username", json!("ada"))
            .compare("age", Operator::Gt, json!(30))
    );
}

#[test]
fn underscored_field_names_resolve() {
    let s = schema();
    let filter = compile(&s, "User", json!({"created_at": "2024-01-01T00:00:00Z"})).unwrap();
    assert_eq!(filter.get("created_at"), Some(&compare(Operator::Eq, json!("2024-01-01T00:00:00Z"))));

    let filter = compile(&s, "User", json!({"created_at_lt": "2025"})).unwrap();
    assert_eq!(filter.get("created_at"), Some(&compare(Operator::Lt, json!("2025"))));
}

#[test]
fn between_is_the_range_input() {
    let s = schema();
    let filter = compile(&s, "User", json!({"age_between": {"from": 18, "to": 65}})).unwrap();
    assert_eq!(
        filter.get("age"),
        Some(&compare(Operator::Between, json!({"from": 18, "to": 65})))
    );
}

#[test]
fn unknown_operator_and_field_rejected() {
    let s = schema();
    let err = compile(&s, "User", json!({"age_approx": 3})).unwrap_err();
    assert!(matches!(err, FilterError::UnsupportedOperator { .. }));

    let err = compile(&s, "User", json!({"nickname": "x"})).unwrap_err();
    assert_eq!(
        err,
        FilterError::UnknownField {
            model: "User".into(),
            field: "nickname".into(),
        }
    );
}

#[test]
fn eq_and_suffix_on_same_field_is_duplicate() {
    let s = schema();
    let err = compile(&s, "User", json!({"age": 3, "age_neq": 4})).unwrap_err();
    assert_eq!(err, FilterError::DuplicateField { field: "age".into() });
}

proptest! {
    #[test]
    fn two_range_operators_on_one_field_rejected(
        field in prop::sample::select(vec!["age", "username", "created_at"]),
        ops in prop::sample::subsequence(vec!["gt", "gte", "lt", "lte"], 2),
        bound in 0i64..1000,
    ) {
        let s = schema();
        let mut input = Record::new();
        for op in &ops {
            input.insert(format!("{field}_{op}"), json!(bound));
        }
        let err = compile_where(&input, s.model("User").unwrap(), &s).unwrap_err();
        prop_assert_eq!(err, FilterError::DuplicateField { field: field.to_string() });
    }

    #[test]
    fn several_quantifiers_rejected(
        field in prop::sample::select(vec!["friends", "books"]),
        keys in prop::sample::subsequence(vec!["some", "none", "every"], 2..=3),
    ) {
        let s = schema();
        let mut nested = Record::new();
        for key in &keys {
            nested.insert((*key).to_string(), json!({}));
        }
        let mut input = Record::new();
        input.insert(field.to_string(), Value::Object(nested));
        let err = compile_where(&input, s.model("User").unwrap(), &s).unwrap_err();
        prop_assert_eq!(err, FilterError::MultipleQuantifiers { field: field.to_string() });
    }
}

// ── Composites ───────────────────────────────────────────────────

#[test]
fn and_or_kept_next_to_other_keys() {
    let s = schema();
    let filter = compile(
        &s,
        "User",
        json!({
            "age_gte": 18,
            "OR": [{"username": "ada"}, {"username_contains": "bo"}],
            "AND": [{"tags": {"has": ["ops"]}}]
        }),
    )
    .unwrap();
    assert_eq!(filter.get("age"), Some(&compare(Operator::Gte, json!(18))));
    assert_eq!(
        filter.or,
        vec![
            Where::new().eq("username", json!("ada")),
            Where::new().compare("username", Operator::Contains, json!("bo")),
        ]
    );
    assert_eq!(filter.and.len(), 1);
    assert_eq!(filter.and[0].get("tags"), Some(&compare(Operator::All, json!(["ops"]))));
}

#[test]
fn composite_value_must_be_a_list() {
    let s = schema();
    let err = compile(&s, "User", json!({"OR": 3})).unwrap_err();
    assert!(matches!(err, FilterError::InvalidValue { .. }));
}

// ── Scalar lists ─────────────────────────────────────────────────

#[test]
fn list_scalar_grammar() {
    let s = schema();
    let cases = [
        (json!({"has": ["a"]}), compare(Operator::All, json!(["a"]))),
        (json!({"hasNot": null}), compare(Operator::NotIn, json!([]))),
        (json!({"size": 2}), compare(Operator::Size, json!(2))),
        (json!({"lte": "m"}), compare(Operator::Lte, json!("m"))),
        (
            json!({"elementMatch": {"gt": "a", "lt": "c"}}),
            Condition::ElementMatch(ElementFilter::Scalar(vec![
                Comparison::new(Operator::Gt, json!("a")),
                Comparison::new(Operator::Lt, json!("c")),
            ])),
        ),
    ];
    for (input, expected) in cases {
        let filter = compile(&s, "User", json!({ "tags": input })).unwrap();
        assert_eq!(filter.get("tags"), Some(&expected));
    }
}

#[test]
fn list_scalar_takes_one_operator() {
    let s = schema();
    let err = compile(&s, "User", json!({"tags": {"has": ["a"], "size": 1}})).unwrap_err();
    assert_eq!(err, FilterError::MultipleListOperators { field: "tags".into() });

    let err = compile(&s, "User", json!({"tags": {"near": "a"}})).unwrap_err();
    assert!(matches!(err, FilterError::UnsupportedOperator { .. }));
}

// ── Objects ──────────────────────────────────────────────────────

#[test]
fn object_keys_flatten_to_dotted_paths() {
    let s = schema();
    let nested = compile(&s, "User", json!({"notes": {"score_gt": 3, "language": "ENG"}})).unwrap();
    let flat = compile(&s, "User", json!({"notes__score_gt": 3, "notes__language": "ENG"})).unwrap();
    let expected = Where::new()
        .compare("notes.score", Operator::Gt, json!(3))
        .eq("notes.language", json!("ENG"));
    assert_eq!(nested, expected);
    assert_eq!(flat, expected);
}

#[test]
fn flattened_duplicates_rejected() {
    let s = schema();
    let err = compile(&s, "User", json!({"notes__score_gt": 3, "notes__score_lt": 9})).unwrap_err();
    assert_eq!(err, FilterError::DuplicateField { field: "notes.score".into() });

    let err = compile(&s, "User", json!({"notes": {"pages": 2}})).unwrap_err();
    assert!(matches!(err, FilterError::UnknownField { .. }));
}

#[test]
fn underscored_sub_fields_resolve_by_exact_name() {
    let s = schema();
    let expected = Where::new().eq("notes.last_seen", json!("2024-01-01"));
    let nested = compile(&s, "User", json!({"notes": {"last_seen": "2024-01-01"}})).unwrap();
    let flat = compile(&s, "User", json!({"notes__last_seen": "2024-01-01"})).unwrap();
    assert_eq!(nested, expected);
    assert_eq!(flat, expected);

    let ranged = compile(&s, "User", json!({"profile__last_seen_gt": "2024-01-01"})).unwrap();
    assert_eq!(
        ranged,
        Where::new().compare("profile.last_seen", Operator::Gt, json!("2024-01-01"))
    );
}

#[test]
fn element_match_needs_a_list_of_objects() {
    let s = schema();
    let err = compile(&s, "User", json!({"profile": {"elementMatch": {"city": "Oslo"}}})).unwrap_err();
    assert!(matches!(err, FilterError::InvalidValue { ref key, .. } if key == "profile"));
}

#[test]
fn object_operator_keeps_the_partial_object() {
    let s = schema();
    let filter = compile(
        &s,
        "User",
        json!({"settings_object": {"theme": "dark"}, "profile_object": {"city": "Oslo"}}),
    )
    .unwrap();
    assert_eq!(
        filter,
        Where::new()
            .compare("settings", Operator::Object, json!({"theme": "dark"}))
            .compare("profile", Operator::Object, json!({"city": "Oslo"}))
    );
}

#[tokio::test]
async fn object_and_neq_evaluate_against_memory_store() {
    let s = schema();
    let store = MemoryStore::new();
    store
        .insert(
            "User",
            raw(json!({"id": "u1", "age": 30, "settings": {"theme": "dark", "font": {"size": 12}}})),
        )
        .await;
    store
        .insert("User", raw(json!({"id": "u2", "age": 41, "settings": {"theme": "light"}})))
        .await;
    store.insert("User", raw(json!({"id": "u3"}))).await;
    let users = store.collection("User");
    let ctx = RequestContext::new();
    let hit_ids = |records: Vec<Record>| -> Vec<String> {
        records
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    };

    let partial = compile(&s, "User", json!({"settings_object": {"font": {"size": 12}}})).unwrap();
    assert_eq!(hit_ids(users.find(&partial, None, &ctx).await.unwrap()), vec!["u1"]);

    let wrong_value = compile(&s, "User", json!({"settings_object": {"theme": "blue"}})).unwrap();
    assert!(users.find(&wrong_value, None, &ctx).await.unwrap().is_empty());

    let missing_key = compile(&s, "User", json!({"settings_object": {"lang": "en"}})).unwrap();
    assert!(users.find(&missing_key, None, &ctx).await.unwrap().is_empty());

    // an absent field is unequal to any value
    let neq = compile(&s, "User", json!({"age_neq": 30})).unwrap();
    assert_eq!(hit_ids(users.find(&neq, None, &ctx).await.unwrap()), vec!["u2", "u3"]);

    let present = compile(&s, "User", json!({"age_neq": null})).unwrap();
    assert_eq!(hit_ids(users.find(&present, None, &ctx).await.unwrap()), vec!["u1", "u2"]);
}

#[test]
fn element_match_compiles_against_sub_fields() {
    let s = schema();
    let filter = compile(
        &s,
        "User",
        json!({"notes": {"elementMatch": {"score_lte": 10, "language": "ENG"}}}),
    )
    .unwrap();
    let expected = Where::new()
        .eq("language", json!("ENG"))
        .compare("score", Operator::Lte, json!(10));
    assert_eq!(
        filter.get("notes"),
        Some(&Condition::ElementMatch(ElementFilter::Object(expected)))
    );
}

#[tokio::test]
async fn element_match_is_joint_per_element() {
    let s = schema();
    let store = MemoryStore::new();
    store
        .insert(
            "User",
            raw(json!({"id": "u1", "notes": [
                {"language": "ENG", "score": 5},
                {"language": "DEU", "score": 15}
            ]})),
        )
        .await;
    store
        .insert(
            "User",
            raw(json!({"id": "u2", "notes": [
                {"language": "DEU", "score": 5},
                {"language": "ENG", "score": 15}
            ]})),
        )
        .await;
    let users = store.collection("User");
    let ctx = RequestContext::new();

    let joint = compile(
        &s,
        "User",
        json!({"notes": {"elementMatch": {"score_lte": 10, "language": "ENG"}}}),
    )
    .unwrap();
    let hits = users.find(&joint, None, &ctx).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], json!("u1"));

    let split = compile(&s, "User", json!({"notes__score_lte": 10, "notes__language": "ENG"})).unwrap();
    let hits = users.find(&split, None, &ctx).await.unwrap();
    assert_eq!(hits.len(), 2);
}

// ── Relations ────────────────────────────────────────────────────

#[test]
fn list_relation_carries_join_layout() {
    let s = schema();
    let filter = compile(&s, "User", json!({"books": {"every": {"name_contains": "Rust"}}})).unwrap();
    let Some(Condition::Relation(node)) = filter.get("books") else {
        panic!("expected a relation node");
    };
    assert_eq!(
        node.filters,
        Where::new().compare("name", Operator::Contains, json!("Rust"))
    );
    assert_eq!(node.source_key, "User");
    assert_eq!(node.target_key, "Book");
    assert_eq!(node.relation.foreign_key, "authorId");
    assert_eq!(node.relation.holder, KeyHolder::Remote);
    assert_eq!(node.relation.quantifier, Some(ListQuantifier::Every));
    assert_eq!(node.relation.ship, RelationShip::OneToMany);
    assert!(node.relation.list);
}

#[test]
fn relation_keys_take_no_operator_suffix() {
    let s = schema();
    let err = compile(&s, "User", json!({"books_gt": {"name": "Rust"}})).unwrap_err();
    assert_eq!(
        err,
        FilterError::UnsupportedOperator {
            key: "books_gt".into(),
            operator: "gt".into(),
        }
    );
}

#[test]
fn to_one_relation_has_no_quantifier() {
    let s = schema();
    let filter = compile(&s, "Book", json!({"author": {"age_gt": 40}})).unwrap();
    let Some(Condition::Relation(node)) = filter.get("author") else {
        panic!("expected a relation node");
    };
    assert_eq!(node.relation.quantifier, None);
    assert_eq!(node.relation.holder, KeyHolder::Local);
    assert_eq!(node.relation.source, "Book");
    assert_eq!(node.relation.target, "User");
}

#[test]
fn unwrapped_list_relation_uses_default_quantifier() {
    let s = schema();
    let input = raw(json!({"friends": {"username": "x"}}));
    let user = s.model("User").unwrap();

    let filter = compile_where(&input, user, &s).unwrap();
    let Some(Condition::Relation(node)) = filter.get("friends") else {
        panic!("expected a relation node");
    };
    assert_eq!(node.relation.quantifier, Some(ListQuantifier::Some));
    assert_eq!(node.relation.foreign_key, "friends");
    assert_eq!(node.relation.holder, KeyHolder::Local);

    let filter = FilterCompiler::new(&s)
        .with_default_quantifier(ListQuantifier::None)
        .compile(&input, user)
        .unwrap();
    let Some(Condition::Relation(node)) = filter.get("friends") else {
        panic!("expected a relation node");
    };
    assert_eq!(node.relation.quantifier, Some(ListQuantifier::None));
}

#[tokio::test]
async fn relation_filter_runs_against_memory_store() {
    let s = schema();
    let store = MemoryStore::new();
    store.insert("User", raw(json!({"id": "u1", "age": 30}))).await;
    store.insert("User", raw(json!({"id": "u2", "age": 50}))).await;
    store
        .insert("Book", raw(json!({"id": "b1", "name": "Rust", "authorId": "u1"})))
        .await;
    store
        .insert("Book", raw(json!({"id": "b2", "name": "Go", "authorId": "u2"})))
        .await;

    let filter = compile(&s, "Book", json!({"author": {"age_gt": 40}})).unwrap();
    let hits = store
        .collection("Book")
        .find(&filter, None, &RequestContext::new())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], json!("b2"));
}

// ── Unique where ─────────────────────────────────────────────────

#[test]
fn unique_where_is_all_equalities() {
    let filter = compile_unique_where(&raw(json!({"username": "ada"}))).unwrap();
    assert_eq!(filter, Where::new().eq("username", json!("ada")));
}

#[test]
fn empty_unique_where_rejected() {
    assert_eq!(
        compile_unique_where(&Record::new()).unwrap_err(),
        FilterError::EmptyUniqueWhere
    );
    assert_eq!(
        compile_unique_where(&raw(json!({"id": null}))).unwrap_err(),
        FilterError::EmptyUniqueWhere
    );
}
