use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use itertools::izip;
use rand::prelude::*;
use triwalk::{PivotWalk, SWalk, StraightWalk, Triangulation, VisibilityWalk, Walker};

fn bench_walks(c: &mut Criterion) {
    // Discretization parameter
    let ns: Vec<_> = (5..=105).step_by(20).collect();

    let (xmin, xmax) = (0., 10.);
    let (ymin, ymax) = (0., 10.);

    let grids: Vec<Triangulation> = ns
        .iter()
        .map(|&n| Triangulation::grid(xmin, xmax, ymin, ymax, n, n).unwrap())
        .collect();

    // Random number generator
    let mut rng = rand::thread_rng();

    let mut group = c.benchmark_group("Walk strategies on a regular grid");
    for (n, tri) in izip!(ns, &grids) {
        let query: Vec<_> = (0..420)
            .map(|_| [rng.gen::<f64>() * xmax, rng.gen::<f64>() * ymax])
            .collect();
        let straight = StraightWalk::new(tri);
        let visibility = VisibilityWalk::new(tri);
        let pivot = PivotWalk::new(tri);
        let swalk = SWalk::new(tri);
        group.bench_with_input(BenchmarkId::new("StraightWalk", n), &query, |b, q| {
            b.iter(|| straight.locate_many(q).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("VisibilityWalk", n), &query, |b, q| {
            b.iter(|| visibility.locate_many(q).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("PivotWalk", n), &query, |b, q| {
            b.iter(|| pivot.locate_many(q).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("SWalk", n), &query, |b, q| {
            b.iter(|| swalk.locate_many(q).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_walks);
criterion_main!(benches);
