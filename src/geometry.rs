use ndarray::{s, Array3};
use nifti::NiftiHeader;

/// Physical placement of the voxel grid.
///
/// Each volume dimension follows one world axis (`world_axis`), advancing
/// `step` mm per voxel from `origin`. `spacing` is the unsigned step, used
/// for on-screen aspect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Voxel spacings in mm, one per volume dimension
    pub spacing: [f32; 3],
    /// Signed world mm per voxel along each volume dimension
    pub step: [f32; 3],
    /// World axis (0 = R, 1 = A, 2 = S) each volume dimension runs along
    pub world_axis: [usize; 3],
    /// World coordinate (mm) of voxel 0 along each dimension's world axis
    pub origin: [f32; 3],
}

impl Default for Geometry {
    fn default() -> Self {
        Self::axis_aligned([1.0; 3], [0.0; 3])
    }
}

impl Geometry {
    /// Grid whose dimensions run along +R, +A, +S in that order.
    pub fn axis_aligned(spacing: [f32; 3], origin: [f32; 3]) -> Self {
        Self {
            spacing,
            step: spacing,
            world_axis: [0, 1, 2],
            origin,
        }
    }

    /// Geometry of the volume in its stored orientation.
    ///
    /// The readout follows the signed header affine, so a flipped or
    /// permuted storage order still reports true world positions.
    pub fn from_header(hdr: &NiftiHeader) -> Self {
        let spacing = [
            sanitize_spacing(hdr.pixdim[1]),
            sanitize_spacing(hdr.pixdim[2]),
            sanitize_spacing(hdr.pixdim[3]),
        ];
        let translation = get_translation(hdr);
        let affine = get_affine_3x3(hdr);
        let Some((voxel_to_world, _)) = dominant_world_axes(&affine) else {
            return Self::axis_aligned(spacing, translation);
        };

        let mut step = [0.0f32; 3];
        let mut origin = [0.0f32; 3];
        for dim in 0..3 {
            let world = voxel_to_world[dim];
            step[dim] = affine[world][dim];
            origin[dim] = translation[world];
        }
        Self {
            spacing,
            step,
            world_axis: voxel_to_world,
            origin,
        }
    }

    /// World axis letter ('X', 'Y' or 'Z') a volume dimension runs along.
    pub fn coordinate(&self, dim: usize) -> char {
        ['X', 'Y', 'Z'][self.world_axis[dim]]
    }

    /// Convert a voxel index to display mm along the given volume dimension.
    /// World R and A are negated to match LPS display convention
    /// (L = −R, P = −A, S = S).
    pub fn voxel_to_mm(&self, dim: usize, idx: usize) -> f32 {
        let ras = self.origin[dim] + idx as f32 * self.step[dim];
        if self.world_axis[dim] < 2 {
            -ras
        } else {
            ras
        }
    }

    /// Convert a display mm value back to the nearest voxel index in `0..len`.
    pub fn mm_to_voxel(&self, dim: usize, mm: f32, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let ras_mm = if self.world_axis[dim] < 2 { -mm } else { mm };
        let idx = ((ras_mm - self.origin[dim]) / self.step[dim]).round() as isize;
        idx.clamp(0, (len - 1) as isize) as usize
    }

    /// Display mm range `(min, max)` covered by a dimension of length `len`.
    pub fn mm_range(&self, dim: usize, len: usize) -> (f32, f32) {
        let a = self.voxel_to_mm(dim, 0);
        let b = self.voxel_to_mm(dim, len.saturating_sub(1));
        (a.min(b), a.max(b))
    }
}

fn sanitize_spacing(v: f32) -> f32 {
    let v = v.abs();
    if v.is_finite() && v > 0.0 {
        v
    } else {
        1.0
    }
}

/// Build the 3x3 direction part of the affine from sform, qform, or pixdims.
fn get_affine_3x3(hdr: &NiftiHeader) -> [[f32; 3]; 3] {
    if hdr.sform_code > 0 {
        [
            [hdr.srow_x[0], hdr.srow_x[1], hdr.srow_x[2]],
            [hdr.srow_y[0], hdr.srow_y[1], hdr.srow_y[2]],
            [hdr.srow_z[0], hdr.srow_z[1], hdr.srow_z[2]],
        ]
    } else if hdr.qform_code > 0 {
        let b = hdr.quatern_b as f64;
        let c = hdr.quatern_c as f64;
        let d = hdr.quatern_d as f64;
        let a = (1.0 - b * b - c * c - d * d).max(0.0).sqrt();
        let r = [
            [
                (a * a + b * b - c * c - d * d) as f32,
                (2.0 * (b * c - a * d)) as f32,
                (2.0 * (b * d + a * c)) as f32,
            ],
            [
                (2.0 * (b * c + a * d)) as f32,
                (a * a + c * c - b * b - d * d) as f32,
                (2.0 * (c * d - a * b)) as f32,
            ],
            [
                (2.0 * (b * d - a * c)) as f32,
                (2.0 * (c * d + a * b)) as f32,
                (a * a + d * d - b * b - c * c) as f32,
            ],
        ];
        let qfac: f32 = if hdr.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let (px, py, pz) = (hdr.pixdim[1], hdr.pixdim[2], hdr.pixdim[3] * qfac);
        [
            [r[0][0] * px, r[0][1] * py, r[0][2] * pz],
            [r[1][0] * px, r[1][1] * py, r[1][2] * pz],
            [r[2][0] * px, r[2][1] * py, r[2][2] * pz],
        ]
    } else {
        [
            [hdr.pixdim[1], 0.0, 0.0],
            [0.0, hdr.pixdim[2], 0.0],
            [0.0, 0.0, hdr.pixdim[3]],
        ]
    }
}

fn get_translation(hdr: &NiftiHeader) -> [f32; 3] {
    if hdr.sform_code > 0 {
        [hdr.srow_x[3], hdr.srow_y[3], hdr.srow_z[3]]
    } else if hdr.qform_code > 0 {
        [hdr.quatern_x, hdr.quatern_y, hdr.quatern_z]
    } else {
        [0.0, 0.0, 0.0]
    }
}

/// For each voxel axis, the dominant world axis and whether it runs backwards.
/// `None` when the affine does not map voxel axes onto distinct world axes.
fn dominant_world_axes(affine: &[[f32; 3]; 3]) -> Option<([usize; 3], [bool; 3])> {
    let mut voxel_to_world = [0usize; 3];
    let mut voxel_flip = [false; 3];
    let mut taken = [false; 3];
    for col in 0..3 {
        let mut best_row = None;
        let mut best_val = 0.0f32;
        for (row, affine_row) in affine.iter().enumerate() {
            let v = affine_row[col].abs();
            if v > best_val {
                best_val = v;
                best_row = Some(row);
            }
        }
        let row = best_row?;
        if taken[row] {
            return None;
        }
        taken[row] = true;
        voxel_to_world[col] = row;
        voxel_flip[col] = affine[row][col] < 0.0;
    }
    Some((voxel_to_world, voxel_flip))
}

/// Reorient a volume to RAS (Right–Anterior–Superior) using the header affine.
///
/// Returns the reoriented volume and its geometry in RAS order. A header whose
/// affine is degenerate leaves the volume in storage order.
pub fn reorient_to_ras(volume: Array3<f32>, hdr: &NiftiHeader) -> (Array3<f32>, Geometry) {
    let affine = get_affine_3x3(hdr);
    let translation = get_translation(hdr);
    let orig_shape = [volume.shape()[0], volume.shape()[1], volume.shape()[2]];

    let Some((voxel_to_world, voxel_flip)) = dominant_world_axes(&affine) else {
        log::warn!("degenerate header affine, keeping storage orientation");
        return (volume, Geometry::from_header(hdr));
    };

    // world_to_voxel[world_axis] = voxel_axis
    let mut world_to_voxel = [0usize; 3];
    for col in 0..3 {
        world_to_voxel[voxel_to_world[col]] = col;
    }

    let orig_spacing = [hdr.pixdim[1], hdr.pixdim[2], hdr.pixdim[3]];
    let ras_spacing = [
        sanitize_spacing(orig_spacing[world_to_voxel[0]]),
        sanitize_spacing(orig_spacing[world_to_voxel[1]]),
        sanitize_spacing(orig_spacing[world_to_voxel[2]]),
    ];

    let vol = volume.permuted_axes(world_to_voxel);

    let needs_flip = [
        voxel_flip[world_to_voxel[0]],
        voxel_flip[world_to_voxel[1]],
        voxel_flip[world_to_voxel[2]],
    ];
    let vol = if needs_flip[0] {
        vol.slice_move(s![..;-1, .., ..])
    } else {
        vol
    };
    let vol = if needs_flip[1] {
        vol.slice_move(s![.., ..;-1, ..])
    } else {
        vol
    };
    let vol = if needs_flip[2] {
        vol.slice_move(s![.., .., ..;-1])
    } else {
        vol
    };
    // Standard layout so later axis iteration stays cache friendly.
    let vol = vol.as_standard_layout().into_owned();

    // New voxel 0 along axis a came from original axis world_to_voxel[a]
    // at index (shape-1 if flipped, 0 otherwise).
    let mut orig_ijk = [0.0f32; 3];
    for a in 0..3 {
        let v = world_to_voxel[a];
        orig_ijk[v] = if needs_flip[a] {
            (orig_shape[v] - 1) as f32
        } else {
            0.0
        };
    }
    let mut ras_origin = [0.0f32; 3];
    for (row, origin) in ras_origin.iter_mut().enumerate() {
        *origin = affine[row][0] * orig_ijk[0]
            + affine[row][1] * orig_ijk[1]
            + affine[row][2] * orig_ijk[2]
            + translation[row];
    }

    (vol, Geometry::axis_aligned(ras_spacing, ras_origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn header_with_srow(srow_x: [f32; 4], srow_y: [f32; 4], srow_z: [f32; 4]) -> NiftiHeader {
        NiftiHeader {
            pixdim: [1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0],
            sform_code: 1,
            srow_x,
            srow_y,
            srow_z,
            ..NiftiHeader::default()
        }
    }

    #[test]
    fn zero_pixdim_falls_back_to_unit_spacing() {
        let hdr = NiftiHeader::default();
        let geometry = Geometry::from_header(&hdr);
        assert_eq!(geometry, Geometry::default());
    }

    #[test]
    fn degenerate_affine_keeps_storage_order() {
        let volume = Array3::from_shape_fn((2, 3, 4), |(i, j, k)| (i * 100 + j * 10 + k) as f32);
        let (out, geometry) = reorient_to_ras(volume.clone(), &NiftiHeader::default());
        assert_eq!(out, volume);
        assert_eq!(geometry.spacing, [1.0; 3]);
    }

    #[test]
    fn flipped_x_axis_is_reversed() {
        let hdr = header_with_srow(
            [-2.0, 0.0, 0.0, 10.0],
            [0.0, 3.0, 0.0, 0.0],
            [0.0, 0.0, 4.0, 0.0],
        );
        let volume = Array3::from_shape_fn((3, 2, 2), |(i, _, _)| i as f32);
        let (out, geometry) = reorient_to_ras(volume, &hdr);
        assert_eq!(out.shape(), &[3, 2, 2]);
        assert_eq!(out[[0, 0, 0]], 2.0);
        assert_eq!(out[[2, 0, 0]], 0.0);
        assert_eq!(geometry.spacing, [2.0, 3.0, 4.0]);
        // voxel 2 along x sits at -2*2 + 10 = 6
        assert_relative_eq!(geometry.origin[0], 6.0);
    }

    #[test]
    fn swapped_axes_are_permuted() {
        let hdr = header_with_srow(
            [0.0, 3.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 4.0, 0.0],
        );
        let volume = Array3::from_shape_fn((2, 5, 3), |(i, j, k)| (i * 100 + j * 10 + k) as f32);
        let (out, geometry) = reorient_to_ras(volume, &hdr);
        assert_eq!(out.shape(), &[5, 2, 3]);
        assert_eq!(out[[4, 1, 2]], 142.0);
        assert_eq!(geometry.spacing, [3.0, 2.0, 4.0]);
    }

    #[test]
    fn mm_round_trips_through_voxel_index() {
        let geometry = Geometry::axis_aligned([2.0, 2.0, 0.5], [-10.0, 4.0, 1.0]);
        for dim in 0..3 {
            for idx in [0, 3, 9] {
                let mm = geometry.voxel_to_mm(dim, idx);
                assert_eq!(geometry.mm_to_voxel(dim, mm, 10), idx);
            }
        }
        assert_relative_eq!(geometry.voxel_to_mm(0, 1), 8.0);
        assert_relative_eq!(geometry.voxel_to_mm(2, 4), 3.0);
        assert_eq!(geometry.mm_to_voxel(2, 1000.0, 10), 9);
        let (lo, hi) = geometry.mm_range(0, 10);
        assert!(lo < hi);
    }

    #[test]
    fn storage_order_readout_follows_signed_affine() {
        let hdr = NiftiHeader {
            pixdim: [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            ..header_with_srow(
                [-1.0, 0.0, 0.0, 10.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            )
        };
        let geometry = Geometry::from_header(&hdr);
        assert_eq!(geometry.spacing, [1.0; 3]);
        // voxel i sits at R = 10 - i, shown as L = i - 10
        assert_relative_eq!(geometry.voxel_to_mm(0, 0), -10.0);
        assert_relative_eq!(geometry.voxel_to_mm(0, 1), -9.0);
        assert_relative_eq!(geometry.voxel_to_mm(0, 2), -8.0);
        assert_eq!(geometry.mm_to_voxel(0, -8.0, 5), 2);
        assert_eq!(geometry.mm_range(0, 5), (-10.0, -6.0));
    }

    #[test]
    fn storage_order_readout_tracks_permuted_axes() {
        let hdr = header_with_srow(
            [0.0, 3.0, 0.0, 1.0],
            [2.0, 0.0, 0.0, 5.0],
            [0.0, 0.0, 4.0, 7.0],
        );
        let geometry = Geometry::from_header(&hdr);
        assert_eq!(geometry.world_axis, [1, 0, 2]);
        assert_eq!(geometry.coordinate(0), 'Y');
        assert_eq!(geometry.coordinate(1), 'X');
        // dim 0 runs along A from 5 in 2 mm steps, shown as P
        assert_relative_eq!(geometry.voxel_to_mm(0, 3), -11.0);
        // dim 2 runs along S from 7 in 4 mm steps
        assert_relative_eq!(geometry.voxel_to_mm(2, 1), 11.0);
    }
}
