//! Criterion benchmarks for posepaint critical paths
//!
//! Benchmarks the core performance-critical operations:
//! - Region map parsing
//! - Bounding box indexing
//! - Block transfer (sampling and average modes)
//! - Silhouette erosion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{Rgba, RgbaImage};
use posepaint::bbox::BoundsIndex;
use posepaint::mapping::{CanonicalMapper, Rounding};
use posepaint::silhouette::{InsideMask, KeepRule};
use posepaint::transfer::{transfer_blocks, TransferJob};
use posepaint::average::transfer_average;
use posepaint::RegionMap;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Region map text of a `size`x`size` pose: a one-pixel background border and
/// 4x4 blocks of body parts inside, shifted by `offset` columns.
fn make_map_text(size: u32, offset: u32) -> String {
    (0..size)
        .map(|y| {
            (0..size)
                .map(|x| {
                    if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
                        "0".to_string()
                    } else {
                        (((x + offset) / 4) % 8 + 1 + (y / 4) % 4 * 8).to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn make_raster(size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| Rgba([(x * 3) as u8, (y * 5) as u8, (x ^ y) as u8, 255]))
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_region_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_map");

    for size in [32u32, 128, 256].iter() {
        let text = make_map_text(*size, 0);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", size), &text, |b, text| {
            b.iter(|| RegionMap::parse(black_box(text)))
        });

        let map = RegionMap::parse(&text).expect("bench map parses");
        group.bench_with_input(BenchmarkId::new("bounds_index", size), &map, |b, map| {
            b.iter(|| BoundsIndex::build(black_box(map)))
        });
    }

    group.finish();
}

fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer");

    for size in [64u32, 256].iter() {
        let source_map = RegionMap::parse(&make_map_text(*size, 0)).expect("bench map parses");
        let target_map = RegionMap::parse(&make_map_text(*size, 2)).expect("bench map parses");
        let source = make_raster(*size);
        let base = RgbaImage::from_pixel(*size, *size, Rgba([20, 20, 20, 255]));
        let job = TransferJob::new(&source, &source_map, &target_map, &base);

        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(BenchmarkId::new("sample", size), &job, |b, job| {
            let mapper = CanonicalMapper::new(Rounding::Round);
            b.iter(|| transfer_blocks(black_box(job), &mapper))
        });
        group.bench_with_input(BenchmarkId::new("average", size), &job, |b, job| {
            b.iter(|| transfer_average(black_box(job)))
        });
    }

    group.finish();
}

fn bench_erosion(c: &mut Criterion) {
    let mut group = c.benchmark_group("silhouette");

    for size in [64u32, 256].iter() {
        let map = RegionMap::parse(&make_map_text(*size, 0)).expect("bench map parses");
        let mask = InsideMask::from_map(&map, &KeepRule::Positive);
        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(BenchmarkId::new("erode_3", size), &mask, |b, mask| {
            b.iter(|| black_box(mask.clone()).erode(3))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_region_map, bench_transfer, bench_erosion);
criterion_main!(benches);
