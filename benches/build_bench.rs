use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fixtura::prelude::*;
use fixtura::TypeInfo;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub age: u8,
    pub active: bool,
    pub address: Option<Address>,
    pub tags: Vec<String>,
    pub scores: HashMap<String, i32>,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Node {
    pub value: i64,
    pub next: Option<Box<Node>>,
}

#[derive(Debug, Default, Serialize, Deserialize, Entity)]
pub struct Order {
    #[fixture(unique)]
    pub id: u64,
    #[fixture(one_of("new", "paid", "shipped"))]
    pub status: String,
}

fn engine() -> std::sync::Arc<Engine> {
    Engine::builder(EngineConfig::default().with_seed(42))
        .without_inventory()
        .build()
        .unwrap()
}

fn bench_flat(c: &mut Criterion) {
    let engine = engine();
    c.bench_function("build_default_customer", |b| {
        b.iter(|| black_box(engine.build_default::<Customer>().unwrap()))
    });
    c.bench_function("build_random_customer", |b| {
        b.iter(|| black_box(engine.build_random::<Customer>().unwrap()))
    });
    c.bench_function("build_random_customer_filled", |b| {
        b.iter(|| {
            black_box(
                engine
                    .dynamic::<Customer>()
                    .with_random_props()
                    .with_filled_collections()
                    .build()
                    .unwrap(),
            )
        })
    });
}

fn bench_nested(c: &mut Criterion) {
    let engine = engine();
    c.bench_function("build_random_chain_depth_10", |b| {
        b.iter(|| black_box(engine.build_random::<Node>().unwrap()))
    });
    engine.set_max_depth(3);
    c.bench_function("build_random_chain_depth_3", |b| {
        b.iter(|| black_box(engine.build_random::<Node>().unwrap()))
    });
}

fn bench_overrides(c: &mut Criterion) {
    let engine = engine();
    c.bench_function("build_random_unique_order", |b| {
        b.iter(|| black_box(engine.build_random::<Order>().unwrap()))
    });
}

fn bench_values(c: &mut Criterion) {
    let engine = engine();
    let info = <Vec<HashMap<String, u32>>>::type_info();
    c.bench_function("random_value_nested_collection", |b| {
        b.iter(|| black_box(engine.random_value(black_box(&info)).unwrap()))
    });
    let info: TypeInfo = Customer::type_info();
    c.bench_function("random_value_customer", |b| {
        b.iter(|| black_box(engine.random_value(black_box(&info)).unwrap()))
    });
}

criterion_group!(benches, bench_flat, bench_nested, bench_overrides, bench_values);
criterion_main!(benches);
