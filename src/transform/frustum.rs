//! Dense-voxel-to-frustum resampling

use crate::core::types::{Mat3, Result, Vec3};
use crate::voxel::{DenseVoxels, RleVoxels};

use super::nonhom::eye_to_world_transform;

/// Field-of-view scale matching the rendering camera setup.
pub const FOV_SCALE: f32 = 32.0 / 35.0;

/// Resample a dense occupancy grid into camera frustum coordinates.
///
/// Output axes are (ray-depth, ray-u, ray-v). Cell `(k, u, v)` samples the
/// camera-space point at depth `z_e` linear in `[z_near, z_far]` and
/// image-plane coordinates in `[-1, 1]`, all at cell centers; the visible
/// half-width at depth `z_e` is `z_e / f`. The sample is mapped to world
/// space via `R * p + t` and looked up in the source grid, which spans the
/// unit cube `[-0.5, 0.5]^3`.
///
/// Returns the sampled occupancy together with an `inside` mask flagging
/// cells whose sample point fell within the source volume; cells outside are
/// left unoccupied.
pub fn voxel_values_to_frustum(
    dense: &DenseVoxels,
    r: Mat3,
    t: Vec3,
    f: f32,
    z_near: f32,
    z_far: f32,
    ray_shape: (usize, usize, usize),
) -> (DenseVoxels, Vec<bool>) {
    let (nd, nu, nv) = ray_shape;
    let (sx, sy, sz) = dense.dims();
    let (fx, fy, fz) = (sx as f32, sy as f32, sz as f32);

    let mut values = vec![false; nd * nu * nv];
    let mut inside = vec![false; nd * nu * nv];

    let mut idx = 0;
    for k in 0..nd {
        let z_e = z_near + (z_far - z_near) * ((k as f32 + 0.5) / nd as f32);
        let half_width = z_e / f;
        for u in 0..nu {
            let a = ((u as f32 + 0.5) / nu as f32) * 2.0 - 1.0;
            for v in 0..nv {
                let b = ((v as f32 + 0.5) / nv as f32) * 2.0 - 1.0;
                let p_cam = Vec3::new(a * half_width, b * half_width, -z_e);
                let p = r * p_cam + t;

                let gx = (p.x + 0.5) * fx;
                let gy = (p.y + 0.5) * fy;
                let gz = (p.z + 0.5) * fz;
                if gx >= 0.0 && gx < fx && gy >= 0.0 && gy < fy && gz >= 0.0 && gz < fz {
                    inside[idx] = true;
                    values[idx] = dense.get(gx as usize, gy as usize, gz as usize);
                }
                idx += 1;
            }
        }
    }

    (DenseVoxels::new(ray_shape, values), inside)
}

/// Convert a world-aligned voxel grid into a frustum-space voxel grid for the
/// camera at `eye`.
///
/// Pure and deterministic: identical inputs always produce identical output.
pub fn convert(vox: &RleVoxels, eye: Vec3, ray_shape: (usize, usize, usize)) -> Result<DenseVoxels> {
    let dense = vox.dense()?.flip_y();

    let n = eye.length();
    let (r, t) = eye_to_world_transform(eye);
    // Fixed 1-unit-deep viewing slab centered roughly on the origin; shapes
    // are unit scale.
    let z_near = n - 0.5;
    let z_far = z_near + 1.0;

    let (mut frust, inside) = voxel_values_to_frustum(
        &dense, r, t, FOV_SCALE, z_near, z_far, ray_shape,
    );
    for (cell, ok) in frust.cells_mut().iter_mut().zip(&inside) {
        if !ok {
            *cell = false;
        }
    }
    Ok(frust.flip_y())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_grid(dim: usize) -> RleVoxels {
        RleVoxels::from_dense(&DenseVoxels::filled((dim, dim, dim), true))
    }

    #[test]
    fn test_convert_output_shape() {
        let out = convert(&full_grid(4), Vec3::new(1.0, 0.5, 0.8), (8, 8, 8)).unwrap();
        assert_eq!(out.dims(), (8, 8, 8));
    }

    #[test]
    fn test_convert_is_deterministic() {
        let vox = full_grid(4);
        let eye = Vec3::new(0.9, -0.4, 0.6);
        let a = convert(&vox, eye, (6, 6, 6)).unwrap();
        let b = convert(&vox, eye, (6, 6, 6)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_grid_stays_empty() {
        let vox = RleVoxels::from_dense(&DenseVoxels::filled((4, 4, 4), false));
        let out = convert(&vox, Vec3::new(1.0, 1.0, 0.5), (6, 6, 6)).unwrap();
        assert_eq!(out.occupied(), 0);
    }

    #[test]
    fn test_full_grid_center_ray_occupied() {
        // The camera looks at the origin from ~unit distance, so the slab
        // center along the central ray lands inside the source cube.
        let eye = Vec3::new(1.0, 0.2, 0.3);
        let out = convert(&full_grid(8), eye, (9, 9, 9)).unwrap();
        assert!(out.get(4, 4, 4));
    }

    #[test]
    fn test_far_eye_leaves_frustum_empty() {
        // With the eye 100 units out, the 1-unit slab sits far outside the
        // unit cube and every sample misses the source volume.
        let out = convert(&full_grid(4), Vec3::new(100.0, 0.0, 0.0), (6, 6, 6)).unwrap();
        assert_eq!(out.occupied(), 0);
    }

    #[test]
    fn test_inside_mask_matches_bounds() {
        let dense = DenseVoxels::filled((4, 4, 4), true);
        let eye = Vec3::new(1.0, 0.0, 0.1);
        let (r, t) = eye_to_world_transform(eye);
        let n = eye.length();
        let (frust, inside) = voxel_values_to_frustum(
            &dense, r, t, FOV_SCALE, n - 0.5, n + 0.5, (6, 6, 6),
        );
        // Occupied cells only where the sample was inside the volume.
        for (cell, ok) in frust.cells().iter().zip(&inside) {
            assert!(!cell | ok);
        }
        // The slab straddles the cube boundary, so both cases occur.
        assert!(inside.iter().any(|&b| b));
        assert!(inside.iter().any(|&b| !b));
    }
}
