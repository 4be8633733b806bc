use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use align_core::{Image, OrbConfig};
use align_fast::{CornerDetector, DetectorBuilder, FastDetector, ImagePyramid, KeypointRefinement, ScaleLevel};

/// Create benchmark image with realistic corner patterns
fn create_benchmark_image(width: usize, height: usize, complexity: &str) -> Image {
    let mut img = vec![128; width * height];

    match complexity {
        "blocks" => {
            for y in 0..height {
                for x in 0..width {
                    if ((x / 16) + (y / 16)) % 2 == 0 && (x / 16) % 3 != 2 {
                        img[y * width + x] = 210;
                    } else {
                        img[y * width + x] = 45;
                    }
                }
            }
        }
        "realistic" => {
            // Gradient with noise plus scattered square structures
            for y in 0..height {
                for x in 0..width {
                    let gradient = ((x as f32 / width as f32) * 50.0) as u8;
                    let noise = ((x * 7 + y * 13) % 11) as u8;
                    img[y * width + x] = 90 + gradient + noise;
                }
            }
            for i in 0..40 {
                let cx = (i * 37 * width / 40 + 20) % (width - 12);
                let cy = (i * 53 * height / 40 + 20) % (height - 12);
                let value = if i % 2 == 0 { 230 } else { 30 };
                for y in cy..cy + 10 {
                    for x in cx..cx + 10 {
                        img[y * width + x] = value;
                    }
                }
            }
        }
        _ => {}
    }

    img
}

fn create_test_config() -> OrbConfig {
    OrbConfig {
        n_threads: 1, // Single-threaded for consistent benchmarks
        ..OrbConfig::default()
    }
}

/// Benchmark full detection pipeline
fn bench_full_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_detection");

    let sizes = vec![(128, 128), (320, 240), (640, 480)];
    let complexities = vec!["blocks", "realistic"];

    for &(width, height) in &sizes {
        for complexity in &complexities {
            let detector = FastDetector::new(create_test_config(), width, height).unwrap();
            let img = create_benchmark_image(width, height, complexity);

            group.bench_with_input(
                BenchmarkId::new(format!("{}x{}", width, height), complexity),
                &(detector, img),
                |b, (detector, img)| b.iter(|| black_box(detector.detect(black_box(img)).unwrap())),
            );
        }
    }

    group.finish();
}

/// Benchmark individual pipeline stages
fn bench_pipeline_stages(c: &mut Criterion) {
    let (width, height) = (320, 240);
    let img = create_benchmark_image(width, height, "realistic");
    let level = ScaleLevel { level: 0, scale: 1.0, width, height };

    let mut group = c.benchmark_group("pipeline_stages");

    let levels = ImagePyramid::generate_scale_levels(width, height, &create_test_config(), 31);
    group.bench_function("build_image_pyramid", |b| {
        b.iter(|| black_box(ImagePyramid::build_image_pyramid(black_box(&img), width, height, &levels)))
    });

    group.bench_function("fast_segment_test", |b| {
        b.iter(|| black_box(CornerDetector::detect_keypoints_at_scale(black_box(&img), &level, 20, 31)))
    });

    let scored = CornerDetector::detect_keypoints_at_scale(&img, &level, 20, 31);
    group.bench_function("non_maximum_suppression", |b| {
        b.iter(|| black_box(KeypointRefinement::non_maximum_suppression(black_box(&scored), 3.0)))
    });

    group.bench_function("harris_100_points", |b| {
        b.iter(|| {
            for i in 0..100 {
                let (x, y) = (40 + (i % 10) * 20, 40 + (i / 10) * 15);
                black_box(CornerDetector::compute_harris_response(black_box(&img), width, height, x, y));
            }
        })
    });

    group.bench_function("orientation_100_points", |b| {
        b.iter(|| {
            for i in 0..100 {
                let (x, y) = (40.0 + (i % 10) as f32 * 20.0, 40.0 + (i / 10) as f32 * 15.0);
                black_box(KeypointRefinement::compute_orientation(black_box(&img), width, height, x, y, 31));
            }
        })
    });

    group.finish();
}

/// Benchmark the effect of the feature budget
fn bench_feature_budget(c: &mut Criterion) {
    let (width, height) = (640, 480);
    let img = create_benchmark_image(width, height, "realistic");
    let mut group = c.benchmark_group("feature_budget");

    for max_features in [500, 2000, 5000] {
        let detector = DetectorBuilder::new(width, height)
            .max_features(max_features)
            .threads(1)
            .build()
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(max_features), &detector, |b, detector| {
            b.iter(|| black_box(detector.detect_keypoints(black_box(&img)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_detection, bench_pipeline_stages, bench_feature_budget);
criterion_main!(benches);
