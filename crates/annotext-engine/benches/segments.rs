use annotext_engine::{Document, build_segments};
use criterion::{Criterion, criterion_group, criterion_main};
mod common;

fn bench_build_segments(c: &mut Criterion) {
    let mut group = c.benchmark_group("segments");

    for paragraphs in [1, 10, 100] {
        let doc = Document::new("bench", &common::generate_passage(paragraphs));
        let annotations = common::generate_annotations(&doc, 40);

        group.bench_function(format!("build_{paragraphs}"), |b| {
            b.iter(|| {
                let segments =
                    build_segments(std::hint::black_box(&doc), std::hint::black_box(&annotations));
                std::hint::black_box(segments);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build_segments);
criterion_main!(benches);
