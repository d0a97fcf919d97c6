use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pickplace_core::{mask_overlap, Contour, RasterParams};
use pickplace_match::{AlignmentRefiner, RefinerParams};

fn bracket() -> Contour {
    Contour::from_xy(&[
        [0.0, 0.0],
        [180.0, 0.0],
        [180.0, 40.0],
        [120.0, 40.0],
        [120.0, 95.0],
        [60.0, 95.0],
        [60.0, 40.0],
        [0.0, 40.0],
    ])
}

fn bench_overlap(c: &mut Criterion) {
    let a = bracket();
    let b = a.rotated(12.0, a.centroid());
    for resolution_px in [200usize, 400, 800] {
        let params = RasterParams {
            resolution_px,
            ..RasterParams::default()
        };
        c.bench_function(&format!("mask_overlap_{resolution_px}px"), |bench| {
            bench.iter(|| mask_overlap(black_box(&a), black_box(&b), &params))
        });
    }
}

fn bench_refine(c: &mut Criterion) {
    let template = bracket();
    let target = template.rotated(-133.0, template.centroid());
    let refiner = AlignmentRefiner::new(RefinerParams::default());
    c.bench_function("refine_bracket_default", |bench| {
        bench.iter(|| refiner.refine(black_box(&template), black_box(&target)))
    });
}

criterion_group!(refine, bench_overlap, bench_refine);
criterion_main!(refine);
