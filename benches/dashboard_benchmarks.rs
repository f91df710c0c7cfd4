//! Benchmarks for the dashboard aggregation and in-memory filtering paths

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use processos_api::dashboard::{parse_amount, summarize};
use processos_api::models::{MonetaryValue, Process};
use processos_api::pagination::PageRequest;
use processos_api::query::{ListParams, ProcessFilter};
use processos_api::store::{InMemoryProcessStore, ProcessStore};
use std::hint::black_box;
use tokio::runtime::Runtime;

fn sample_processes(count: usize) -> Vec<Process> {
    (0..count)
        .map(|i| Process {
            nup: Some(format!("NUP-{i:06}")),
            numero_processo: Some(format!("2024/{i:06}")),
            credenciado: Some(format!("Credenciado {}", i % 97)),
            responsavel: Some(format!("Responsavel {}", i % 25)),
            tratamento: Some(if i % 3 == 0 { "ODONTOLOGIA" } else { "CLINICA" }.to_string()),
            valor_capa: Some(if i % 2 == 0 {
                MonetaryValue::Text(format!("{}.{:03},{:02}", i % 50, i % 1000, i % 100))
            } else {
                MonetaryValue::Number((i % 5000) as f64)
            }),
            data_importacao: Some(format!("2024-01-{:02}", i % 28 + 1)),
            ..Default::default()
        })
        .collect()
}

fn bench_parse_amount(c: &mut Criterion) {
    c.bench_function("parse_amount", |b| {
        b.iter(|| {
            black_box(parse_amount(black_box("1.234.567,89")));
            black_box(parse_amount(black_box("100,50")));
            black_box(parse_amount(black_box("abc")));
        })
    });
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");

    for size in [100, 1_000, 10_000] {
        let processes = sample_processes(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &processes, |b, processes| {
            b.iter_batched(
                || processes.clone(),
                |input| black_box(summarize(input)),
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_memory_store_page(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let store = InMemoryProcessStore::with_processes(sample_processes(10_000));
    let filter = ProcessFilter::for_listing(&ListParams {
        search: Some("credenciado 1".to_string()),
        tratamento: Some("odonto".to_string()),
        ..Default::default()
    });
    let page = PageRequest { page: 2, limit: 20 };

    c.bench_function("memory_store_find_page", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(store.find_page(&filter, &page).await.unwrap()) })
    });
}

criterion_group!(
    benches,
    bench_parse_amount,
    bench_summarize,
    bench_memory_store_page
);
criterion_main!(benches);
