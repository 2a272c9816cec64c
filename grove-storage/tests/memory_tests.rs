use grove_model::{KeyHolder, RelationShip, RelationType};
use grove_storage::{
    Comparison, Condition, ElementFilter, ListMutable, ListQuantifier, ListReadable, MapMutable,
    MapReadable, MemoryStore, Mutation, Operator, Pagination, Record, RelationMutable,
    RelationWhere, RelationWhereConfig, RequestContext, StorageError, Where,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r["id"].as_str().unwrap()).collect()
}

async fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert(
            "User",
            record(json!({
                "id": "u1",
                "username": "ada",
                "age": 36,
                "tags": ["admin", "ops"],
                "notes": [
                    {"language": "ENG", "score": 5},
                    {"language": "DEU", "score": 15}
                ]
            })),
        )
        .await;
    store
        .insert(
            "User",
            record(json!({
                "id": "u2",
                "username": "bob",
                "age": 22,
                "tags": ["ops"],
                "notes": [
                    {"language": "DEU", "score": 5},
                    {"language": "ENG", "score": 15}
                ]
            })),
        )
        .await;
    store
        .insert(
            "User",
            record(json!({"id": "u3", "username": "cy", "age": 50, "tags": []})),
        )
        .await;
    store
}

async fn find(store: &MemoryStore, filter: Where) -> Vec<Record> {
    store
        .collection("User")
        .find(&filter, None, &RequestContext::new())
        .await
        .unwrap()
}

// ── Comparisons ──────────────────────────────────────────────────

#[tokio::test]
async fn eq_and_range_operators() {
    let store = seeded().await;
    let hits = find(&store, Where::new().eq("username", json!("bob"))).await;
    assert_eq!(ids(&hits), vec!["u2"]);

    let hits = find(&store, Where::new().compare("age", Operator::Gte, json!(36))).await;
    assert_eq!(ids(&hits), vec!["u1", "u3"]);

    let hits = find(&store, Where::new().compare("age", Operator::Lt, json!(30))).await;
    assert_eq!(ids(&hits), vec!["u2"]);
}

#[tokio::test]
async fn between_is_inclusive() {
    let store = seeded().await;
    let filter = Where::new().compare("age", Operator::Between, json!({"from": 22, "to": 36}));
    assert_eq!(ids(&find(&store, filter).await), vec!["u1", "u2"]);
}

#[tokio::test]
async fn in_and_not_in() {
    let store = seeded().await;
    let filter = Where::new().compare("username", Operator::In, json!(["ada", "cy"]));
    assert_eq!(ids(&find(&store, filter).await), vec!["u1", "u3"]);

    let filter = Where::new().compare("tags", Operator::NotIn, json!(["admin"]));
    assert_eq!(ids(&find(&store, filter).await), vec!["u2", "u3"]);
}

#[tokio::test]
async fn contains_matches_substrings_and_elements() {
    let store = seeded().await;
    let filter = Where::new().compare("username", Operator::Contains, json!("o"));
    assert_eq!(ids(&find(&store, filter).await), vec!["u2"]);

    let filter = Where::new().compare("tags", Operator::Contains, json!("admin"));
    assert_eq!(ids(&find(&store, filter).await), vec!["u1"]);

    let filter = Where::new().compare("tags", Operator::NotContains, json!("ops"));
    assert_eq!(ids(&find(&store, filter).await), vec!["u3"]);
}

#[tokio::test]
async fn array_operators_apply_to_the_whole_list() {
    let store = seeded().await;
    let filter = Where::new().compare("tags", Operator::All, json!(["ops", "admin"]));
    assert_eq!(ids(&find(&store, filter).await), vec!["u1"]);

    let filter = Where::new().compare("tags", Operator::Size, json!(0));
    assert_eq!(ids(&find(&store, filter).await), vec!["u3"]);
}

#[tokio::test]
async fn neq_treats_absent_fields_as_unequal() {
    let store = seeded().await;
    store.insert("User", record(json!({"id": "u4", "username": "dee"}))).await;

    let filter = Where::new().compare("age", Operator::Neq, json!(36));
    assert_eq!(ids(&find(&store, filter).await), vec!["u2", "u3", "u4"]);

    let filter = Where::new().compare("age", Operator::Neq, Value::Null);
    assert_eq!(ids(&find(&store, filter).await), vec!["u1", "u2", "u3"]);
}

#[tokio::test]
async fn object_operator_is_a_recursive_partial_match() {
    let store = MemoryStore::new();
    store
        .insert(
            "User",
            record(json!({"id": "u1", "settings": {"theme": "dark", "font": {"size": 12, "family": "mono"}}})),
        )
        .await;
    store
        .insert("User", record(json!({"id": "u2", "settings": {"theme": "dark"}})))
        .await;
    store.insert("User", record(json!({"id": "u3"}))).await;

    let filter = Where::new().compare("settings", Operator::Object, json!({"theme": "dark"}));
    assert_eq!(ids(&find(&store, filter).await), vec!["u1", "u2"]);

    let filter = Where::new().compare("settings", Operator::Object, json!({"font": {"size": 12}}));
    assert_eq!(ids(&find(&store, filter).await), vec!["u1"]);

    let filter = Where::new().compare("settings", Operator::Object, json!({"font": {"size": 14}}));
    assert!(find(&store, filter).await.is_empty());

    let filter = Where::new().compare("settings", Operator::Object, json!({"locale": "en"}));
    assert!(find(&store, filter).await.is_empty());
}

#[tokio::test]
async fn or_needs_one_branch_and_needs_all() {
    let store = seeded().await;
    let mut filter = Where::new();
    filter.or = vec![
        Where::new().eq("username", json!("ada")),
        Where::new().eq("username", json!("cy")),
    ];
    filter.and = vec![Where::new().compare("age", Operator::Gt, json!(40))];
    assert_eq!(ids(&find(&store, filter).await), vec!["u3"]);
}

// ── Element matching ─────────────────────────────────────────────

#[tokio::test]
async fn element_match_evaluates_one_element_jointly() {
    let store = seeded().await;
    let nested = Where::new()
        .compare("score", Operator::Lte, json!(10))
        .eq("language", json!("ENG"));
    let mut filter = Where::new();
    filter.conditions.insert(
        "notes".into(),
        Condition::ElementMatch(ElementFilter::Object(nested)),
    );
    assert_eq!(ids(&find(&store, filter).await), vec!["u1"]);

    // the same constraints on flattened paths can be met by different notes
    let split = Where::new()
        .compare("notes.score", Operator::Lte, json!(10))
        .eq("notes.language", json!("ENG"));
    assert_eq!(ids(&find(&store, split).await), vec!["u1", "u2"]);
}

#[tokio::test]
async fn scalar_element_match() {
    let store = MemoryStore::new();
    store
        .insert("Run", record(json!({"id": "r1", "laps": [3, 12]})))
        .await;
    store
        .insert("Run", record(json!({"id": "r2", "laps": [7]})))
        .await;

    let mut filter = Where::new();
    filter.conditions.insert(
        "laps".into(),
        Condition::ElementMatch(ElementFilter::Scalar(vec![
            Comparison::new(Operator::Gt, json!(5)),
            Comparison::new(Operator::Lt, json!(10)),
        ])),
    );
    let hits = store
        .collection("Run")
        .find(&filter, None, &RequestContext::new())
        .await
        .unwrap();
    assert_eq!(ids(&hits), vec!["r2"]);
}

// ── Relation filters ─────────────────────────────────────────────

fn book_filter(holder: KeyHolder, key: &str, quantifier: Option<ListQuantifier>) -> Where {
    let mut filter = Where::new();
    filter.conditions.insert(
        "books".into(),
        Condition::Relation(Box::new(RelationWhere {
            filters: Where::new().eq("genre", json!("sci-fi")),
            source_key: "User".into(),
            target_key: "Book".into(),
            relation: RelationWhereConfig {
                foreign_key: key.into(),
                holder,
                source: "User".into(),
                target: "Book".into(),
                list: quantifier.is_some(),
                quantifier,
                ship: RelationShip::OneToMany,
                relation_type: RelationType::BiOneToMany,
            },
        })),
    );
    filter
}

async fn library() -> MemoryStore {
    let store = seeded().await;
    for (id, genre, author) in [
        ("b1", "sci-fi", "u1"),
        ("b2", "poetry", "u1"),
        ("b3", "sci-fi", "u2"),
    ] {
        store
            .insert(
                "Book",
                record(json!({"id": id, "genre": genre, "authorId": author})),
            )
            .await;
    }
    store
}

#[tokio::test]
async fn remote_key_quantifiers() {
    let store = library().await;
    let some = book_filter(KeyHolder::Remote, "authorId", Some(ListQuantifier::Some));
    assert_eq!(ids(&find(&store, some).await), vec!["u1", "u2"]);

    let every = book_filter(KeyHolder::Remote, "authorId", Some(ListQuantifier::Every));
    assert_eq!(ids(&find(&store, every).await), vec!["u2", "u3"]);

    let none = book_filter(KeyHolder::Remote, "authorId", Some(ListQuantifier::None));
    assert_eq!(ids(&find(&store, none).await), vec!["u3"]);
}

#[tokio::test]
async fn local_key_array_join() {
    let store = library().await;
    store
        .insert(
            "User",
            record(json!({"id": "u4", "username": "dee", "shelf": ["b2", "b3"]})),
        )
        .await;
    let filter = book_filter(KeyHolder::Local, "shelf", Some(ListQuantifier::Some));
    assert_eq!(ids(&find(&store, filter).await), vec!["u4"]);
}

// ── Writes ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_assigns_an_id() {
    let store = MemoryStore::new();
    let created = store
        .collection("User")
        .create(
            &Mutation::new().set("username", json!("eve")),
            &RequestContext::new(),
        )
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(store.get("User", &id).await, Some(created));
}

#[tokio::test]
async fn update_and_delete_require_a_match() {
    let store = seeded().await;
    let users = store.collection("User");
    let ctx = RequestContext::new();

    let updated = users
        .update(
            &Where::by_id("u2"),
            &Mutation::new().set("age", json!(23)),
            &ctx,
        )
        .await
        .unwrap();
    assert_eq!(updated["age"], json!(23));

    let err = users
        .update(&Where::by_id("nope"), &Mutation::new(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));

    users.delete(&Where::by_id("u2"), &ctx).await.unwrap();
    assert_eq!(store.records("User").await.len(), 2);
    let err = users.delete(&Where::by_id("u2"), &ctx).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn references_push_and_pull() {
    let store = seeded().await;
    let users = store.collection("User");
    let ctx = RequestContext::new();

    users.add_reference("u3", "friends", "f1", &ctx).await.unwrap();
    users.add_reference("u3", "friends", "f1", &ctx).await.unwrap();
    let u3 = store.get("User", "u3").await.unwrap();
    assert_eq!(u3["friends"], json!(["f1", "f1"]));

    users.remove_reference("u3", "friends", "f1", &ctx).await.unwrap();
    let u3 = store.get("User", "u3").await.unwrap();
    assert_eq!(u3["friends"], json!([]));

    let err = users
        .add_reference("u3", "username", "x", &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));

    let err = users
        .add_reference("ghost", "friends", "f1", &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn object_type_collection_is_a_singleton() {
    let store = MemoryStore::new();
    let settings = store.collection("Settings");
    let ctx = RequestContext::new();

    assert_eq!(settings.get_map(&ctx).await.unwrap(), Record::new());
    settings
        .update_map(&Mutation::new().set("theme", json!("dark")), &ctx)
        .await
        .unwrap();
    settings
        .update_map(&Mutation::new().set("lang", json!("en")), &ctx)
        .await
        .unwrap();
    assert_eq!(
        settings.get_map(&ctx).await.unwrap(),
        record(json!({"theme": "dark", "lang": "en"}))
    );
    assert_eq!(store.records("Settings").await.len(), 1);
}

#[tokio::test]
async fn pagination_is_applied_by_the_driver() {
    let store = seeded().await;
    let page = Pagination {
        skip: Some(1),
        first: Some(1),
        ..Pagination::default()
    };
    let hits = store
        .collection("User")
        .find(&Where::new(), Some(&page), &RequestContext::new())
        .await
        .unwrap();
    assert_eq!(ids(&hits), vec!["u2"]);
}
