use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schemasm::assembly::router::{build_path, simplify_path};
use schemasm::{GridPoint, Point};

/// Zig-zag of diagonal hops with periodic revisits
fn zigzag(len: usize) -> Vec<GridPoint> {
    (0..len as i64)
        .map(|i| GridPoint::new((i % 40) * 15, (i % 7) * 20 - (i % 3) * 5))
        .collect()
}

fn bench_simplify_path(c: &mut Criterion) {
    let short = zigzag(16);
    let long = zigzag(1_000);

    c.bench_function("simplify_path_16", |b| {
        b.iter(|| simplify_path(black_box(&short)))
    });
    c.bench_function("simplify_path_1000", |b| {
        b.iter(|| simplify_path(black_box(&long)))
    });
}

fn bench_build_path(c: &mut Criterion) {
    let bends: Vec<Point> = (0..32)
        .map(|i| Point::new(i as f64 * 12.3 + 1.7, (i % 5) as f64 * -9.1))
        .collect();

    c.bench_function("build_path_32_bends", |b| {
        b.iter(|| {
            build_path(
                black_box(Point::new(0.0, 0.0)),
                black_box(&bends),
                black_box(Point::new(400.0, -40.0)),
            )
        })
    });
}

criterion_group!(benches, bench_simplify_path, bench_build_path);
criterion_main!(benches);
