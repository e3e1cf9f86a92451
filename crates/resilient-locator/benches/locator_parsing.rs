// Benchmarks for locator parsing
//
// Every engine operation parses each candidate in its fallback chain before
// talking to the driver, so parsing sits on the hot path of table scans.

use criterion::{Criterion, criterion_group, criterion_main};
use resilient_locator::{Selector, locator};

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator_parse");

    group.bench_function("bare_css", |b| {
        b.iter(|| {
            let parsed = locator::parse(std::hint::black_box("#orders tbody tr:nth-child(3)"));
            std::hint::black_box(parsed)
        });
    });

    group.bench_function("xpath", |b| {
        b.iter(|| {
            let parsed = locator::parse(std::hint::black_box("xpath=//table[@id='orders']//tr[3]"));
            std::hint::black_box(parsed)
        });
    });

    group.bench_function("role_with_attributes", |b| {
        b.iter(|| {
            let parsed = locator::parse(std::hint::black_box(
                "role=button[name='Save, then close',pressed='false']",
            ));
            std::hint::black_box(parsed)
        });
    });

    group.bench_function("extended_placeholder", |b| {
        b.iter(|| {
            let parsed = locator::parse_extended(std::hint::black_box("placeholder=Search orders"));
            std::hint::black_box(parsed)
        });
    });

    group.bench_function("unknown_prefix_fallback", |b| {
        b.iter(|| {
            let parsed = locator::parse(std::hint::black_box("data-qa=submit"));
            std::hint::black_box(parsed)
        });
    });

    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("selector_render");

    let role = locator::parse("role=row[name='A-1001']").unwrap();
    group.bench_function("role", |b| {
        b.iter(|| {
            let rendered = Selector::from_locator(std::hint::black_box(&role)).to_string();
            std::hint::black_box(rendered)
        });
    });

    let table = Selector::css("#orders");
    group.bench_function("table_cell_chain", |b| {
        b.iter(|| {
            let cell = table
                .child("tbody tr")
                .nth(41)
                .child(":scope > :is(td, th)")
                .nth(2)
                .to_string();
            std::hint::black_box(cell)
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_render);
criterion_main!(benches);
