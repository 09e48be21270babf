//! Benchmarks for the gap buffer and line index under editing workloads.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use styledtext::TextStore;

fn sample_document(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("line {i}: the quick brown fox jumps over the lazy dog\n"))
        .collect()
}

fn bench_sequential_typing(c: &mut Criterion) {
    c.bench_function("store_sequential_typing", |b| {
        b.iter(|| {
            let mut store = TextStore::new();
            for i in 0..500 {
                store.replace_text_range(i, 0, "x").unwrap();
            }
            black_box(store.char_count())
        });
    });
}

fn bench_random_replace(c: &mut Criterion) {
    let text = sample_document(200);
    c.bench_function("store_random_replace", |b| {
        b.iter(|| {
            let mut store = TextStore::with_text(&text);
            // Deterministic pseudo-random walk over the document.
            let mut position = 7usize;
            for _ in 0..200 {
                position = (position * 31 + 17) % (store.char_count() - 1);
                store.replace_text_range(position, 1, "y").unwrap();
            }
            black_box(store.char_count())
        });
    });
}

fn bench_line_queries(c: &mut Criterion) {
    let store = TextStore::with_text(&sample_document(2000));
    c.bench_function("store_line_at_offset", |b| {
        b.iter(|| {
            let mut total = 0;
            for offset in (0..store.char_count()).step_by(997) {
                total += store.line_at_offset(black_box(offset)).unwrap();
            }
            black_box(total)
        });
    });
    c.bench_function("store_line_text", |b| {
        b.iter(|| {
            let mut total = 0;
            for line in (0..store.line_count()).step_by(37) {
                total += store.line(black_box(line)).unwrap().len();
            }
            black_box(total)
        });
    });
}

fn bench_newline_heavy_edits(c: &mut Criterion) {
    c.bench_function("store_newline_edits", |b| {
        b.iter(|| {
            let mut store = TextStore::with_text(&sample_document(100));
            for i in 0..100 {
                let offset = (i * 53) % store.char_count();
                store.replace_text_range(offset, 0, "\n").unwrap();
            }
            black_box(store.line_count())
        });
    });
}

criterion_group!(
    benches,
    bench_sequential_typing,
    bench_random_replace,
    bench_line_queries,
    bench_newline_heavy_edits
);
criterion_main!(benches);
