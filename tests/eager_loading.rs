//! End-to-end eager loading through a scripted row source.
//!
//! These tests verify:
//! - Nested fan-out folds back into one root with the right child counts
//! - Through associations in both directions share instances
//! - Includes with pagination issue exactly two statements
//! - Empty joins, duplicate rows and source failures
//! - Dropping the roots frees the whole graph, cycles included

mod common;

use std::sync::Arc;

use common::{RecordingSource, ids, person_row, schema};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use strata::query::{
    Condition, ErrorCode, FindMany, Includes, QueryError, QueryResult, Root, RowEnvelope, SortKey,
    Value,
};

fn photo_row(event: i64, photo: i64) -> RowEnvelope {
    RowEnvelope::new()
        .with("Person#id", 1)
        .with("Person#name", "Ann")
        .with("Person#event#Event#id", event)
        .with("Person#event#Event#title", format!("event {}", event))
        .with("Person#event#Event#date", "2024-05-01T00:00:00.000Z")
        .with("Person#event#Event#photo#Photo#id", photo)
        .with("Person#event#Event#photo#Photo#url", format!("/p/{}.jpg", photo))
}

#[tokio::test]
async fn test_events_with_photos_fan_out() {
    let rows = vec![
        photo_row(10, 100),
        photo_row(10, 101),
        photo_row(10, 102),
        photo_row(11, 103),
        photo_row(11, 104),
        photo_row(11, 105),
    ];
    let source = RecordingSource::rows(rows);
    let roots = FindMany::new(schema(), "Person")
        .include(Includes::nested("events", "photos"))
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(roots.len(), 1);
    let events = roots[0].many("events");
    assert_eq!(ids(&events), vec![Value::Int(10), Value::Int(11)]);
    for event in &events {
        assert_eq!(event.many("photos").len(), 3);
    }
    assert_eq!(
        ids(&events[1].many("photos")),
        vec![Value::Int(103), Value::Int(104), Value::Int(105)]
    );

    let statements = source.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].sql.matches("LEFT OUTER JOIN").count(), 2);
}

fn friend_row(root: i64, path: &str, other: i64) -> RowEnvelope {
    RowEnvelope::new()
        .with("Person#id", root)
        .with("Person#name", format!("person {}", root))
        .with(format!("Person#{}#Person#id", path), other)
        .with(format!("Person#{}#Person#name", path), format!("person {}", other))
}

#[tokio::test]
async fn test_friends_through_join_model() {
    // A (1) friends B (2) and C (3)
    let source =
        RecordingSource::rows(vec![friend_row(1, "friend", 2), friend_row(1, "friend", 3)]);
    let roots = FindMany::new(schema(), "Person")
        .include("friends")
        .r#where(Condition::eq("id", 1))
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(roots.len(), 1);
    let friends = roots[0].many("friends");
    assert_eq!(ids(&friends), vec![Value::Int(2), Value::Int(3)]);
    assert!(!Arc::ptr_eq(&friends[0], &friends[1]));

    let sql = &source.statements()[0].sql;
    assert!(sql.contains(
        "LEFT OUTER JOIN \"friendships\" \"Person#friend#Person#Friendship\" \
         ON (\"Person\".\"id\" = \"Person#friend#Person#Friendship\".\"frienderPersonId\")"
    ));
    assert!(sql.contains(
        "LEFT OUTER JOIN \"people\" \"Person#friend#Person\" \
         ON (\"Person#friend#Person#Friendship\".\"friendPersonId\" = \"Person#friend#Person\".\"id\")"
    ));
}

#[tokio::test]
async fn test_frienders_share_one_instance() {
    let source =
        RecordingSource::rows(vec![friend_row(2, "friender", 1), friend_row(3, "friender", 1)]);
    let roots = FindMany::new(schema(), "Person")
        .include("frienders")
        .r#where(Condition::in_list("id", vec![2, 3]))
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(ids(&roots), vec![Value::Int(2), Value::Int(3)]);
    let b = roots[0].many("frienders");
    let c = roots[1].many("frienders");
    assert_eq!(ids(&b), vec![Value::Int(1)]);
    assert_eq!(ids(&c), vec![Value::Int(1)]);
    assert!(Arc::ptr_eq(&b[0], &c[0]));
}

#[tokio::test]
async fn test_mutual_friends_are_freed_with_their_roots() {
    let source =
        RecordingSource::rows(vec![friend_row(1, "friend", 2), friend_row(2, "friend", 1)]);
    let roots = FindMany::new(schema(), "Person")
        .include("friends")
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(ids(&roots), vec![Value::Int(1), Value::Int(2)]);
    let a_friend = roots[0].many("friends").remove(0);
    let b_friend = roots[1].many("friends").remove(0);
    assert!(Arc::ptr_eq(&a_friend, roots[1].instance()));
    assert!(Arc::ptr_eq(&b_friend, roots[0].instance()));
    drop((a_friend, b_friend));

    let weak: Vec<_> = roots.iter().map(|root| Arc::downgrade(root.instance())).collect();
    drop(roots);
    let alive = weak.iter().filter(|w| w.upgrade().is_some()).count();
    assert_eq!(alive, 0);
}

#[tokio::test]
async fn test_has_one_attaches_first_child() {
    let passport_row = |id: i64, number: &str| {
        RowEnvelope::new()
            .with("Person#id", 1)
            .with("Person#name", "Ann")
            .with("Person#passport#Passport#id", id)
            .with("Person#passport#Passport#number", number)
    };
    let source = RecordingSource::rows(vec![passport_row(7, "X-7"), passport_row(8, "X-8")]);
    let roots = FindMany::new(schema(), "Person")
        .include("passport")
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(roots.len(), 1);
    let passport = roots[0].one("passport").unwrap();
    assert_eq!(passport.id(), &Value::Int(7));
    assert_eq!(passport.get("number"), Some(&Value::from("X-7")));
    assert!(roots[0].many("passport").is_empty());

    let sql = &source.statements()[0].sql;
    assert!(sql.contains(
        "LEFT OUTER JOIN \"passports\" \"Person#passport#Passport\" \
         ON (\"Person\".\"id\" = \"Person#passport#Passport\".\"holderPersonId\")"
    ));
}

#[tokio::test]
async fn test_stray_rows_do_not_touch_emitted_roots() {
    let source = RecordingSource::rows(vec![
        person_row(1, Some(10)),
        person_row(2, Some(20)),
        person_row(1, Some(12)),
    ]);
    let mut stream = FindMany::new(schema(), "Person")
        .include("events")
        .stream(&source)
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(ids(&first.many("events")), vec![Value::Int(10)]);
    let rest: Vec<QueryResult<Root>> = stream.collect().await;

    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].as_ref().unwrap().id(), &Value::Int(2));
    assert_eq!(ids(&first.many("events")), vec![Value::Int(10)]);
}

#[tokio::test]
async fn test_limit_with_includes_runs_two_statements() {
    let id_rows = vec![Ok(RowEnvelope::new().with("Person#id", 1))];
    let joined = vec![Ok(person_row(1, Some(10))), Ok(person_row(1, Some(11)))];
    let source = RecordingSource::new(vec![id_rows, joined]);

    let roots = FindMany::new(schema(), "Person")
        .include("events")
        .order_by(SortKey::desc("name"))
        .skip(0)
        .take(1)
        .exec(&source)
        .await
        .unwrap();

    let statements = source.statements();
    assert_eq!(statements.len(), 2);
    assert!(!statements[0].sql.contains("JOIN"));
    assert!(statements[0].sql.ends_with("LIMIT 1 OFFSET 0"));
    assert!(statements[1].sql.contains("LEFT OUTER JOIN"));
    assert!(!statements[1].sql.contains("LIMIT"));
    assert_eq!(statements[1].params, vec![Value::Int(1)]);

    assert_eq!(ids(&roots), vec![Value::Int(1)]);
    assert_eq!(roots[0].many("events").len(), 2);
}

#[tokio::test]
async fn test_limit_without_includes_is_one_statement() {
    let source = RecordingSource::rows(vec![person_row(1, None)]);
    FindMany::new(schema(), "Person")
        .take(1)
        .exec(&source)
        .await
        .unwrap();

    let statements = source.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].sql.ends_with("LIMIT 1"));
}

#[tokio::test]
async fn test_empty_left_join_gives_empty_list() {
    let source = RecordingSource::rows(vec![person_row(1, None), person_row(2, Some(20))]);
    let roots = FindMany::new(schema(), "Person")
        .include("events")
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(roots.len(), 2);
    assert!(roots[0].many("events").is_empty());
    assert!(roots[0].relation("events").is_some());
    assert_eq!(ids(&roots[1].many("events")), vec![Value::Int(20)]);
}

#[tokio::test]
async fn test_duplicate_rows_are_idempotent() {
    let source = RecordingSource::rows(vec![
        person_row(1, Some(10)),
        person_row(1, Some(10)),
        person_row(1, Some(11)),
        person_row(1, Some(11)),
    ]);
    let roots = FindMany::new(schema(), "Person")
        .include("events")
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(roots.len(), 1);
    assert_eq!(ids(&roots[0].many("events")), vec![Value::Int(10), Value::Int(11)]);
}

#[tokio::test]
async fn test_one_instance_per_distinct_root() {
    let rows: Vec<RowEnvelope> = (1..=5)
        .flat_map(|p| (0..p).map(move |e| person_row(p, Some(p * 100 + e))))
        .collect();
    let source = RecordingSource::rows(rows);
    let roots = FindMany::new(schema(), "Person")
        .include("events")
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(roots.len(), 5);
    for (i, root) in roots.iter().enumerate() {
        assert_eq!(root.many("events").len(), i + 1);
    }
}

#[tokio::test]
async fn test_streaming_yields_before_source_ends() {
    let source = RecordingSource::new(vec![vec![
        Ok(person_row(1, Some(10))),
        Ok(person_row(2, Some(20))),
        Err(QueryError::row_source("connection reset")),
    ]]);
    let query = FindMany::new(schema(), "Person").include("events");
    let results: Vec<QueryResult<Root>> = query.stream(&source).await.unwrap().collect().await;

    // root 1 completes when root 2 starts; root 2 is still buffered at the failure
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().id(), &Value::Int(1));
    assert_eq!(results[1].as_ref().unwrap_err().code, ErrorCode::RowSource);
}

#[tokio::test]
async fn test_compile_errors_issue_no_sql() {
    let source = RecordingSource::default();
    let err = FindMany::new(schema(), "Person")
        .include(Includes::nested("events", "guests"))
        .exec(&source)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::UnknownAssociation);
    assert!(source.statements().is_empty());
}

#[tokio::test]
async fn test_to_json_graph() {
    let source = RecordingSource::rows(vec![person_row(1, Some(10))]);
    let roots = FindMany::new(schema(), "Person")
        .include("events")
        .exec(&source)
        .await
        .unwrap();

    assert_eq!(
        roots[0].to_json(),
        serde_json::json!({
            "id": 1,
            "name": "person 1",
            "events": [{"id": 10, "title": "party", "date": null}]
        })
    );
}
