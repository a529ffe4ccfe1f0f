use criterion::{Criterion, criterion_group, criterion_main};
use safe_html_validator::{Preset, SafeHtmlConfig, SafeHtmlValidator, Safelist, load_fragment};
use std::hint::black_box;

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(blocks: usize) -> String {
    let block = r#"<p class="x"><a href="https://example.com/" rel="nofollow">link</a> <b>bold</b> text</p>"#;
    let mut input = String::with_capacity(block.len() * blocks);
    for _ in 0..blocks {
        input.push_str(block);
    }
    input
}

fn make_deep_nesting(depth: usize) -> String {
    let mut input = String::with_capacity(depth * 7);
    for _ in 0..depth {
        input.push_str("<b>");
    }
    input.push('x');
    for _ in 0..depth {
        input.push_str("</b>");
    }
    input
}

fn bench_validate_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    let validator = SafeHtmlValidator::new(&SafeHtmlConfig::new(Preset::Relaxed));
    c.bench_function("bench_validate_small", |b| {
        b.iter(|| black_box(validator.is_valid(Some(black_box(&input)))));
    });
}

fn bench_validate_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let validator = SafeHtmlValidator::new(&SafeHtmlConfig::new(Preset::Relaxed));
    c.bench_function("bench_validate_large", |b| {
        b.iter(|| black_box(validator.is_valid(Some(black_box(&input)))));
    });
}

fn bench_load_fragment_deep(c: &mut Criterion) {
    let input = make_deep_nesting(10_000);
    c.bench_function("bench_load_fragment_deep", |b| {
        b.iter(|| black_box(load_fragment(black_box(&input), "").node_count()));
    });
}

fn bench_safelist_build(c: &mut Criterion) {
    c.bench_function("bench_safelist_build", |b| {
        b.iter(|| black_box(Safelist::from_preset(black_box(Preset::Relaxed))));
    });
}

criterion_group!(
    benches,
    bench_validate_small,
    bench_validate_large,
    bench_load_fragment_deep,
    bench_safelist_build
);
criterion_main!(benches);
