#![allow(clippy::type_complexity)]
//! Benchmarks for planning and row reification.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use strata::query::{
    DependencyNode, FindMany, FlattenedDependencies, Includes, Reifier, RowEnvelope, SortKey,
};
use strata::schema::{AssociationDef, DataType, ModelDef, Schema};

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .model(ModelDef::new("Person", "people").property("name", DataType::String))
            .model(ModelDef::new("Event", "events").property("title", DataType::String))
            .model(ModelDef::new("Photo", "photos").property("url", DataType::String))
            .model(ModelDef::new("Friendship", "friendships"))
            .association("Person", AssociationDef::has_many("events", "Event"))
            .association("Event", AssociationDef::belongs_to("owner", "Person"))
            .association("Event", AssociationDef::has_many("photos", "Photo"))
            .association(
                "Person",
                AssociationDef::has_many("friends", "Person").through("Friendship"),
            )
            .association(
                "Person",
                AssociationDef::has_many("frienders", "Person").through("Friendship"),
            )
            .build()
            .expect("bench schema"),
    )
}

/// `roots` people, each with `events` events of `photos` photos.
fn rows(roots: i64, events: i64, photos: i64) -> Vec<RowEnvelope> {
    let mut rows = Vec::with_capacity((roots * events * photos) as usize);
    for p in 0..roots {
        for e in 0..events {
            for ph in 0..photos {
                let event = p * events + e;
                rows.push(
                    RowEnvelope::new()
                        .with("Person#id", p)
                        .with("Person#name", "someone")
                        .with("Person#event#Event#id", event)
                        .with("Person#event#Event#title", "party")
                        .with("Person#event#Event#photo#Photo#id", event * photos + ph)
                        .with("Person#event#Event#photo#Photo#url", "/p.jpg"),
                );
            }
        }
    }
    rows
}

/// Benchmark reification of fanned-out rows.
fn bench_reify(c: &mut Criterion) {
    let schema = schema();
    let tree = DependencyNode::build(&schema, "Person", &Includes::nested("events", "photos"), 8)
        .expect("bench includes");
    let deps = Arc::new(FlattenedDependencies::from_tree(&tree));

    let mut group = c.benchmark_group("reify");
    for roots in [10i64, 100, 1000] {
        let input = rows(roots, 4, 5);
        group.throughput(Throughput::Elements(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("events_photos", roots), &input, |b, input| {
            b.iter(|| {
                let mut reifier = Reifier::pass_through(deps.clone());
                let mut emitted = 0usize;
                for row in input.iter().cloned() {
                    if reifier.push(row).expect("row").is_some() {
                        emitted += 1;
                    }
                }
                emitted += reifier.finish().into_iter().count();
                black_box(emitted)
            })
        });
    }
    group.finish();
}

/// Benchmark query compilation.
fn bench_compile(c: &mut Criterion) {
    let schema = schema();
    let mut group = c.benchmark_group("compile");

    group.bench_function("root_only", |b| {
        b.iter(|| black_box(FindMany::new(schema.clone(), "Person").compile().expect("compile")))
    });

    group.bench_function("nested_with_pagination", |b| {
        b.iter(|| {
            black_box(
                FindMany::new(schema.clone(), "Person")
                    .include(Includes::nested("events", "photos"))
                    .include("friends")
                    .order_by(SortKey::desc("events.title"))
                    .take(20)
                    .compile()
                    .expect("compile"),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_reify, bench_compile);
criterion_main!(benches);
