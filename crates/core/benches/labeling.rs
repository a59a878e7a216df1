use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rolemark_core::{LabelConfig, LabelEngine, LabelRewriter, StartTag, label_html, label_html_with_config};

fn bench_label_document(c: &mut Criterion) {
    let small = std::fs::read_to_string("../../tests/fixtures/news_page.html").unwrap();
    let large = small.repeat(50);

    let mut group = c.benchmark_group("label_document");

    group.bench_with_input(BenchmarkId::new("small", "2KB"), &small, |b, html| {
        b.iter(|| label_html(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("large", "100KB"), &large, |b, html| {
        b.iter(|| label_html(black_box(html)))
    });

    group.finish();
}

fn bench_verbose(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/news_page.html").unwrap();
    let config = LabelConfig::builder().verbose(true).build();

    c.bench_function("label_verbose", |b| {
        b.iter(|| label_html_with_config(black_box(&html), &config))
    });
}

fn bench_chunked_with_flushes(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/news_page.html").unwrap().repeat(20);

    c.bench_function("chunked_with_flushes", |b| {
        b.iter(|| {
            let engine = LabelEngine::without_stats(LabelConfig::default());
            let mut rewriter = LabelRewriter::new(engine, Vec::new());
            for chunk in html.as_bytes().chunks(4096) {
                rewriter.write(black_box(chunk)).unwrap();
                rewriter.flush().unwrap();
            }
            rewriter.end().unwrap()
        })
    });
}

fn bench_engine_events(c: &mut Criterion) {
    c.bench_function("engine_events", |b| {
        b.iter(|| {
            let mut engine = LabelEngine::without_stats(LabelConfig::default());
            engine.open_tag(StartTag::new("body"));
            for _ in 0..200 {
                engine.open_tag(StartTag::new("div").attr("class", "topnav"));
                for _ in 0..4 {
                    engine.open_tag(StartTag::new("a").attr("href", "/"));
                    engine.text("Link");
                    engine.close_tag("a");
                }
                engine.close_tag("div");
            }
            engine.close_tag("body");
            black_box(engine.finish())
        })
    });
}

criterion_group!(
    benches,
    bench_label_document,
    bench_verbose,
    bench_chunked_with_flushes,
    bench_engine_events
);
criterion_main!(benches);
