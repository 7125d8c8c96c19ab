//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::ops::Deref;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use parking_lot::Mutex;
use strata::query::{Instance, QueryResult, RowEnvelope, RowSource, Statement, Value};
use strata::schema::{AssociationDef, DataType, ModelDef, Schema};

/// People with events, photos, venues, passports and friendships.
pub fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .model(ModelDef::new("Person", "people").property("name", DataType::String))
            .model(
                ModelDef::new("Event", "events")
                    .property("title", DataType::String)
                    .property("date", DataType::DateTime),
            )
            .model(ModelDef::new("Photo", "photos").property("url", DataType::String))
            .model(ModelDef::new("Venue", "venues").property("city", DataType::String))
            .model(ModelDef::new("Friendship", "friendships"))
            .model(ModelDef::new("Passport", "passports").property("number", DataType::String))
            .association("Person", AssociationDef::has_many("events", "Event"))
            .association("Event", AssociationDef::belongs_to("owner", "Person"))
            .association("Event", AssociationDef::has_many("photos", "Photo"))
            .association("Photo", AssociationDef::belongs_to("event", "Event"))
            .association("Event", AssociationDef::belongs_to("venue", "Venue"))
            .association(
                "Person",
                AssociationDef::has_many("friends", "Person").through("Friendship"),
            )
            .association(
                "Person",
                AssociationDef::has_many("frienders", "Person").through("Friendship"),
            )
            .association("Person", AssociationDef::has_one("passport", "Passport"))
            .association("Passport", AssociationDef::belongs_to("holder", "Person"))
            .build()
            .expect("fixture schema"),
    )
}

/// Replays scripted row batches, one per fetch, and records every statement.
#[derive(Default)]
pub struct RecordingSource {
    batches: Mutex<Vec<Vec<QueryResult<RowEnvelope>>>>,
    statements: Mutex<Vec<Statement>>,
}

impl RecordingSource {
    pub fn new(batches: Vec<Vec<QueryResult<RowEnvelope>>>) -> Self {
        let mut batches = batches;
        batches.reverse();
        Self {
            batches: Mutex::new(batches),
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn rows(rows: Vec<RowEnvelope>) -> Self {
        Self::new(vec![rows.into_iter().map(Ok).collect()])
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().clone()
    }
}

impl RowSource for RecordingSource {
    fn fetch(&self, stmt: &Statement) -> BoxStream<'static, QueryResult<RowEnvelope>> {
        self.statements.lock().push(stmt.clone());
        let batch = self.batches.lock().pop().unwrap_or_default();
        stream::iter(batch).boxed()
    }
}

/// A person row, optionally joined to one event.
pub fn person_row(person: i64, event: Option<i64>) -> RowEnvelope {
    let event_id = event.map(Value::Int).unwrap_or(Value::Null);
    RowEnvelope::new()
        .with("Person#id", person)
        .with("Person#name", format!("person {}", person))
        .with("Person#event#Event#id", event_id.clone())
        .with(
            "Person#event#Event#title",
            if event_id.is_null() { Value::Null } else { Value::from("party") },
        )
        .with("Person#event#Event#date", Value::Null)
}

/// Ids of a list of instances or roots.
pub fn ids<I: Deref<Target = Instance>>(instances: &[I]) -> Vec<Value> {
    instances.iter().map(|i| i.id().clone()).collect()
}
