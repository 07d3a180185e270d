//! Integration tests for incoming foreign key classification.

use std::sync::Arc;

use relmeta::test_utils::{CountingCache, CountingCatalog, FixedDetector, StaticIdentity};
use relmeta::{Column, ColumnType, ForeignKey, Schema, SchemaAnalyzer, Table};

fn entity(name: &str) -> Table {
    Table::new(name)
        .with_column(Column::new("id", ColumnType::Integer).autoincrement())
        .with_primary_key(["id"])
}

fn fk(name: &str, local: &str, columns: &[&str], foreign: &str) -> ForeignKey {
    ForeignKey::new(name, local, columns.iter().copied(), foreign, ["id"])
}

fn analyzer(schema: Schema, detector: FixedDetector) -> SchemaAnalyzer {
    SchemaAnalyzer::new(
        Arc::new(StaticIdentity::new("localhost", "5432", "app", "postgres")),
        Arc::new(CountingCatalog::new(schema)),
        Arc::new(CountingCache::new()),
        Arc::new(detector),
    )
}

fn names(keys: &[ForeignKey]) -> Vec<&str> {
    keys.iter().map(|k| k.name.as_str()).collect()
}

#[tokio::test]
async fn test_excludes_inheritance_and_junction_keys() {
    let schema = Schema::new(vec![
        entity("parent"),
        Table::new("child")
            .with_column(Column::new("id", ColumnType::Integer))
            .with_primary_key(["id"])
            .with_foreign_key(fk("fk_child_parent", "child", &["id"], "parent")),
        entity("order")
            .with_column(Column::new("parent_id", ColumnType::Integer))
            .with_foreign_key(fk("fk_order_parent", "order", &["parent_id"], "parent")),
        entity("tag"),
        Table::new("parent_tag")
            .with_foreign_key(fk("fk_pt_parent", "parent_tag", &["parent_id"], "parent"))
            .with_foreign_key(fk("fk_pt_tag", "parent_tag", &["tag_id"], "tag")),
    ]);
    let detector = FixedDetector::new()
        .with_junction_table("parent_tag")
        .with_child_relationship("parent", fk("fk_child_parent", "child", &["id"], "parent"));

    let incoming = analyzer(schema, detector)
        .incoming_foreign_keys("parent")
        .await
        .unwrap();

    assert_eq!(names(&incoming), vec!["fk_order_parent"]);
}

#[tokio::test]
async fn test_duplicate_constraints_reported_once() {
    let schema = Schema::new(vec![
        entity("customer"),
        entity("invoice")
            .with_column(Column::new("customer_id", ColumnType::Integer))
            .with_foreign_key(fk(
                "fk_invoice_customer",
                "invoice",
                &["customer_id"],
                "customer",
            ))
            .with_foreign_key(fk(
                "invoice_customer_id_fkey",
                "invoice",
                &["customer_id"],
                "customer",
            )),
    ]);

    let incoming = analyzer(schema, FixedDetector::new())
        .incoming_foreign_keys("customer")
        .await
        .unwrap();

    assert_eq!(names(&incoming), vec!["fk_invoice_customer"]);
}

#[tokio::test]
async fn test_duplicate_pointing_elsewhere_shadows_later_key() {
    // The signature only covers the local side: the first key wins even
    // when a later duplicate targets the requested table.
    let schema = Schema::new(vec![
        entity("customer"),
        entity("legacy_customer"),
        entity("invoice")
            .with_foreign_key(fk(
                "fk_legacy",
                "invoice",
                &["customer_id"],
                "legacy_customer",
            ))
            .with_foreign_key(fk("fk_current", "invoice", &["customer_id"], "customer")),
    ]);

    let incoming = analyzer(schema, FixedDetector::new())
        .incoming_foreign_keys("customer")
        .await
        .unwrap();

    assert!(incoming.is_empty());
}

#[tokio::test]
async fn test_same_foreign_side_different_local_columns_are_kept() {
    let schema = Schema::new(vec![
        entity("user"),
        entity("message")
            .with_foreign_key(fk("fk_sender", "message", &["sender_id"], "user"))
            .with_foreign_key(fk("fk_recipient", "message", &["recipient_id"], "user")),
    ]);

    let incoming = analyzer(schema, FixedDetector::new())
        .incoming_foreign_keys("user")
        .await
        .unwrap();

    assert_eq!(names(&incoming), vec!["fk_sender", "fk_recipient"]);
}

#[tokio::test]
async fn test_self_reference_is_included() {
    let schema = Schema::new(vec![entity("category")
        .with_column(Column::new("parent_category_id", ColumnType::Integer))
        .with_foreign_key(fk(
            "fk_category_parent",
            "category",
            &["parent_category_id"],
            "category",
        ))]);

    let incoming = analyzer(schema, FixedDetector::new())
        .incoming_foreign_keys("category")
        .await
        .unwrap();

    assert_eq!(names(&incoming), vec!["fk_category_parent"]);
    assert_eq!(incoming[0].local_table, "category");
}

#[tokio::test]
async fn test_key_excluded_by_both_rules_is_excluded_once() {
    let schema = Schema::new(vec![
        entity("node"),
        Table::new("node_link")
            .with_primary_key(["node_id"])
            .with_foreign_key(fk("fk_link_node", "node_link", &["node_id"], "node"))
            .with_foreign_key(fk("fk_link_peer", "node_link", &["peer_id"], "node")),
    ]);
    let detector = FixedDetector::new()
        .with_junction_table("node_link")
        .with_child_relationship("node", fk("fk_link_node", "node_link", &["node_id"], "node"));

    let incoming = analyzer(schema, detector)
        .incoming_foreign_keys("node")
        .await
        .unwrap();

    assert!(incoming.is_empty());
}

#[tokio::test]
async fn test_order_follows_tables_then_keys() {
    let schema = Schema::new(vec![
        entity("author"),
        entity("post")
            .with_foreign_key(fk("fk_post_author", "post", &["author_id"], "author"))
            .with_foreign_key(fk("fk_post_editor", "post", &["editor_id"], "author")),
        entity("comment").with_foreign_key(fk(
            "fk_comment_author",
            "comment",
            &["author_id"],
            "author",
        )),
        entity("empty"),
    ]);

    let incoming = analyzer(schema, FixedDetector::new())
        .incoming_foreign_keys("author")
        .await
        .unwrap();

    assert_eq!(
        names(&incoming),
        vec!["fk_post_author", "fk_post_editor", "fk_comment_author"]
    );
}

#[tokio::test]
async fn test_unknown_table_has_no_incoming_keys() {
    let schema = Schema::new(vec![entity("a"), entity("b")]);

    let incoming = analyzer(schema, FixedDetector::new())
        .incoming_foreign_keys("missing")
        .await
        .unwrap();

    assert!(incoming.is_empty());
}
