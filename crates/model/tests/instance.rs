//! Integration tests for lifecycle operations and instances.

#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use anyhow::bail;
use common::{
    ClosedConnection, MockConnection, assert_sql_contains, assert_sql_lacks, points, posts, text,
};
use omnia_model::{AttributeDecl, DataType, Definition, Error, Filter, Model, Record, Row, Values};
use parking_lot::Mutex;
use serde_json::json;

fn point_row(id: i32, name: &str) -> Row {
    Row::new([
        ("id", DataType::Int32(Some(id))),
        ("name", text(name)),
        ("geom", text("SRID=4326;POINT(0 0)")),
    ])
}

fn record(value: serde_json::Value) -> Record {
    let serde_json::Value::Object(map) = value else {
        panic!("expected object");
    };
    map
}

#[tokio::test]
async fn create_runs_hooks_in_order() {
    let conn = MockConnection::new();
    conn.push_rows(vec![Row::new([("title", text("hello")), ("likes", DataType::Int32(Some(0)))])]);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let log = |name: &'static str| {
        let calls = Arc::clone(&calls);
        move |_: &mut Values| -> anyhow::Result<()> {
            calls.lock().push(name);
            Ok(())
        }
    };
    let after = Arc::clone(&calls);

    let model = Model::define(
        common::posts_definition(conn.clone())
            .before_validate(log("before_validate"))
            .validate(log("validate"))
            .after_validate(log("after_validate"))
            .before_create(|values: &mut Values| {
                values.insert("likes", 0);
                Ok(())
            })
            .after_create(move |rows: &[Record]| {
                after.lock().push("after_create");
                assert_eq!(rows.len(), 1);
                Ok(())
            }),
    )
    .unwrap();

    let post = model.create(Values::new().set("title", "hello")).await.unwrap();

    assert_eq!(*calls.lock(), ["before_validate", "validate", "after_validate", "after_create"]);
    assert_eq!(post.get("title"), Some(&json!("hello")));
    assert_eq!(post.get("likes"), Some(&json!(0)));

    let insert = conn.last();
    assert_sql_contains(&insert.sql, &["INSERT INTO posts (likes, title)", "RETURNING *"]);
}

#[tokio::test]
async fn rejected_validation_aborts_before_insert() {
    let conn = MockConnection::new();
    let later = Arc::new(Mutex::new(false));
    let ran = Arc::clone(&later);

    let model = Model::define(
        common::posts_definition(conn.clone())
            .validate(|values: &mut Values| {
                if values.get("title").is_none() {
                    bail!("title is required");
                }
                Ok(())
            })
            .before_create(move |_: &mut Values| {
                *ran.lock() = true;
                Ok(())
            }),
    )
    .unwrap();

    let err = model.create(Values::new().set("likes", 1)).await.unwrap_err();

    assert!(matches!(err, Error::Rejected(_)));
    assert_eq!(err.to_string(), "title is required");
    assert!(!*later.lock());
    assert!(conn.recorded().is_empty());
}

#[tokio::test]
async fn failing_after_create_still_inserted() {
    let conn = MockConnection::new();
    conn.push_rows(vec![Row::new([("title", text("t"))])]);

    let model = Model::define(
        common::posts_definition(conn.clone())
            .after_create(|_: &[Record]| bail!("notification failed")),
    )
    .unwrap();

    let err = model.create(Values::new().set("title", "t")).await.unwrap_err();
    assert!(matches!(err, Error::Rejected(_)));
    assert_eq!(conn.recorded().len(), 1);
}

#[tokio::test]
async fn create_without_returned_row_is_not_found() {
    let model = posts(MockConnection::new());
    let err = model.create(Values::new().set("title", "t")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn find_one_on_empty_result_is_not_found() {
    let model = posts(MockConnection::new());

    let err = model.find_one(Filter::matching([("title", "missing")])).await.unwrap_err();
    let Error::NotFound { table } = err else {
        panic!("expected not found");
    };
    assert_eq!(table, "posts");
}

#[tokio::test]
async fn find_one_returns_first_row() {
    let conn = MockConnection::new();
    conn.push_rows(vec![point_row(1, "p1")]);

    let row = points(conn.clone()).find_one(None).await.unwrap();

    assert_eq!(row.get("id"), Some(&json!(1)));
    assert_eq!(row.get("geom"), Some(&json!("SRID=4326;POINT(0 0)")));
    assert_sql_contains(&conn.last().sql, &["ST_AsEWKT(geom) AS geom", "LIMIT"]);
}

#[tokio::test]
async fn find_returns_records() {
    let conn = MockConnection::new();
    conn.push_rows(vec![
        Row::new([("title", text("a")), ("likes", DataType::Int64(None))]),
        Row::new([("title", text("b")), ("likes", DataType::Int64(Some(3)))]),
    ]);

    let rows = posts(conn).find(None).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("likes"), Some(&serde_json::Value::Null));
    assert_eq!(rows[1].get("likes"), Some(&json!(3)));
}

#[tokio::test]
async fn destroy_returns_affected_count() {
    let conn = MockConnection::new();
    conn.set_affected(2);

    let deleted = posts(conn.clone()).destroy(None).await.unwrap();

    assert_eq!(deleted, 2);
    assert_sql_contains(&conn.last().sql, &["DELETE FROM posts"]);
    assert_sql_lacks(&conn.last().sql, "WHERE");
}

#[tokio::test]
async fn connection_failure_propagates() {
    let model = posts(Arc::new(ClosedConnection));
    let err = model.find(None).await.unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(err.to_string(), "connection closed");
}

#[test]
fn new_instance_has_no_primary_key_filter() {
    let model = points(MockConnection::new());

    let fresh = model.instance(record(json!({"name": "p1"})));
    assert!(fresh.is_new());
    assert!(fresh.pk_where().is_none());

    let nulled = model.instance(record(json!({"id": null, "name": "p1"})));
    assert!(nulled.is_new());

    let stored = model.instance(record(json!({"id": 5, "name": "p1"})));
    assert!(!stored.is_new());
    assert!(matches!(stored.pk_where(), Some(Filter::Eq(column, _)) if column == "id"));
}

#[tokio::test]
async fn save_inserts_then_updates() {
    let conn = MockConnection::new();
    conn.push_rows(vec![point_row(7, "p1")]);
    conn.push_rows(vec![point_row(7, "renamed")]);

    let model = points(conn.clone());
    let mut point = model.instance(record(json!({"name": "p1", "geom": "POINT(0 0)"})));

    point.save().await.unwrap();
    assert!(!point.is_new());
    assert_eq!(point.get("id"), Some(&json!(7)));
    assert_sql_contains(&conn.last().sql, &["INSERT INTO points (geom, name)"]);

    point.set("name", "renamed");
    point.save().await.unwrap();

    let update = conn.last();
    assert_sql_contains(
        &update.sql,
        &["UPDATE points", "SET", "name = $", "WHERE (id) = ($", "RETURNING"],
    );
    assert_sql_lacks(&update.sql, "SET id");
    assert_sql_lacks(&update.sql, ", id =");
    assert_eq!(update.params.last(), Some(&DataType::Int64(Some(7))));
    assert_eq!(point.get("name"), Some(&json!("renamed")));
}

#[tokio::test]
async fn null_primary_key_is_not_inserted() {
    let conn = MockConnection::new();
    conn.push_rows(vec![point_row(3, "p1")]);

    let mut point = points(conn.clone()).instance(record(json!({"id": null, "name": "p1"})));
    point.save().await.unwrap();

    let insert = conn.last();
    assert_sql_contains(&insert.sql, &["INSERT INTO points (name)", "VALUES ($1)"]);
    assert_eq!(insert.params, vec![text("p1")]);
    assert_eq!(point.get("id"), Some(&json!(3)));
}

#[tokio::test]
async fn renamed_primary_key_updates_on_second_save() {
    let conn = MockConnection::new();
    conn.push_rows(vec![Row::new([("id", DataType::Int32(Some(7))), ("title", text("t"))])]);
    conn.push_rows(vec![Row::new([("id", DataType::Int32(Some(7))), ("title", text("u"))])]);

    let model = Model::define(
        Definition::new("posts", conn.clone())
            .attribute("id", AttributeDecl::new("integer").field("post_id").primary_key())
            .attribute("title", "text"),
    )
    .unwrap();
    let mut post = model.instance(record(json!({"title": "t"})));

    post.save().await.unwrap();
    assert_sql_contains(
        &conn.last().sql,
        &["INSERT INTO posts (title)", "RETURNING post_id AS id, title"],
    );
    assert!(!post.is_new());
    assert_eq!(post.get("id"), Some(&json!(7)));

    post.set("title", "u");
    post.save().await.unwrap();

    let update = conn.last();
    assert_sql_contains(
        &update.sql,
        &["UPDATE posts", "SET title = $1", "WHERE (post_id) = ($2)", "RETURNING post_id AS id"],
    );
    assert_eq!(update.params, vec![text("u"), DataType::Int64(Some(7))]);
    assert_eq!(conn.recorded().len(), 2);
    assert_eq!(post.get("title"), Some(&json!("u")));
}

#[tokio::test]
async fn destroy_instance_by_primary_key() {
    let conn = MockConnection::new();
    conn.set_affected(1);

    let model = points(conn.clone());
    let point = model.instance(record(json!({"id": 9, "name": "p1"})));

    assert_eq!(point.destroy().await.unwrap(), 1);

    let delete = conn.last();
    assert_sql_contains(&delete.sql, &["DELETE FROM points", "WHERE (id) = ($1)"]);
    assert_eq!(delete.params, vec![DataType::Int64(Some(9))]);
}

#[tokio::test]
async fn destroy_unsaved_instance_fails() {
    let conn = MockConnection::new();
    let point = points(conn.clone()).instance(record(json!({"name": "p1"})));

    let err = point.destroy().await.unwrap_err();
    assert!(matches!(err, Error::NotPersisted { .. }));
    assert!(conn.recorded().is_empty());
}

#[tokio::test]
async fn entity_without_primary_key_always_inserts() {
    let conn = MockConnection::new();
    conn.push_rows(vec![Row::new([("title", text("t"))])]);
    conn.push_rows(vec![Row::new([("title", text("t"))])]);

    let mut post = posts(conn.clone()).instance(record(json!({"title": "t"})));
    assert!(post.is_new());

    post.save().await.unwrap();
    post.save().await.unwrap();

    assert!(post.is_new());
    assert!(conn.recorded().iter().all(|statement| statement.sql.starts_with("INSERT")));
    assert!(matches!(post.destroy().await.unwrap_err(), Error::NotPersisted { .. }));
}

#[test]
fn to_json_is_detached() {
    let model = posts(MockConnection::new());
    let mut post = model.instance(record(json!({"title": "a"})));

    let mut snapshot = post.to_json();
    snapshot.insert("title".to_string(), json!("changed"));
    assert_eq!(post.get("title"), Some(&json!("a")));

    post.merge(record(json!({"likes": 2})));
    assert_eq!(post.get("title"), Some(&json!("a")));
    assert_eq!(post.get("likes"), Some(&json!(2)));
    assert!(!snapshot.contains_key("likes"));
}
