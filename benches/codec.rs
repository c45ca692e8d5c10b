use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fruvox::transform::convert;
use fruvox::voxel::{rle, DenseVoxels, RleVoxels};

use glam::Vec3;

fn test_grid(dim: usize) -> DenseVoxels {
    let mut grid = DenseVoxels::filled((dim, dim, dim), false);
    let r = dim as f32 * 0.4;
    let c = dim as f32 * 0.5;
    for x in 0..dim {
        for y in 0..dim {
            for z in 0..dim {
                let d = (x as f32 - c).powi(2) + (y as f32 - c).powi(2) + (z as f32 - c).powi(2);
                if d < r * r {
                    grid.set(x, y, z, true);
                }
            }
        }
    }
    grid
}

fn bench_rle_encode_64(c: &mut Criterion) {
    let grid = test_grid(64);

    c.bench_function("rle_encode_64", |b| {
        b.iter(|| rle::encode(black_box(grid.cells())));
    });
}

fn bench_rle_decode_64(c: &mut Criterion) {
    let grid = test_grid(64);
    let encoded = grid.rle_data();
    let n_cells = grid.len();

    c.bench_function("rle_decode_64", |b| {
        b.iter(|| rle::decode(black_box(&encoded), n_cells).unwrap());
    });
}

fn bench_convert_32_to_32(c: &mut Criterion) {
    let vox = RleVoxels::from_dense(&test_grid(32));
    let eye = Vec3::new(0.8, 0.5, 0.4);

    c.bench_function("convert_32_to_32", |b| {
        b.iter(|| convert(black_box(&vox), eye, (32, 32, 32)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_rle_encode_64,
    bench_rle_decode_64,
    bench_convert_32_to_32
);
criterion_main!(benches);
