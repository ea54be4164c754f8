use std::collections::BTreeSet;

use ndarray::{Array3, ArrayView2, Axis};

use crate::axis::ViewAxis;
use crate::error::{ModelError, Result};
use crate::geometry::Geometry;

/// A loaded label volume together with its label inventory.
///
/// The voxel data is never mutated after construction; a new file produces a
/// new `LabelVolume`.
#[derive(Debug)]
pub struct LabelVolume {
    data: Array3<f32>,
    geometry: Geometry,
    labels: Vec<i32>,
}

impl LabelVolume {
    pub fn new(data: Array3<f32>, geometry: Geometry) -> Result<Self> {
        if data.is_empty() {
            return Err(ModelError::UnreadableFormat(format!(
                "volume has an empty dimension: {:?}",
                data.shape()
            )));
        }
        let labels = label_inventory(&data);
        Ok(Self {
            data,
            geometry,
            labels,
        })
    }

    /// Shape `[nx, ny, nz]`.
    pub fn shape(&self) -> [usize; 3] {
        let (nx, ny, nz) = self.data.dim();
        [nx, ny, nz]
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Distinct positive integer labels, ascending.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Number of slices along a view axis.
    pub fn len_along(&self, axis: ViewAxis) -> usize {
        self.data.len_of(Axis(axis.dim()))
    }

    pub fn clamp_index(&self, axis: ViewAxis, index: isize) -> usize {
        let last = self.len_along(axis).saturating_sub(1);
        index.clamp(0, last as isize) as usize
    }

    /// The plane perpendicular to `axis`; `index` must already be in range.
    pub fn slice(&self, axis: ViewAxis, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(axis.dim()), index)
    }

    /// OR of `voxel == label` over the two in-plane dimensions, one entry per slice.
    pub fn label_projection(&self, axis: ViewAxis, label: i32) -> Vec<bool> {
        if label <= 0 {
            return vec![false; self.len_along(axis)];
        }
        let target = label as f32;
        self.data
            .axis_iter(Axis(axis.dim()))
            .map(|plane| plane.iter().any(|&v| v == target))
            .collect()
    }

    /// The slice at position `count / 2` among the slices containing `label`
    /// (the upper of the two middle hits for an even count), or the geometric
    /// middle of the axis when none do.
    pub fn optimal_slice(&self, axis: ViewAxis, label: i32) -> usize {
        let hits: Vec<usize> = self
            .label_projection(axis, label)
            .into_iter()
            .enumerate()
            .filter_map(|(idx, hit)| hit.then_some(idx))
            .collect();
        match hits.get(hits.len() / 2) {
            Some(&idx) => idx,
            None => self.len_along(axis) / 2,
        }
    }
}

/// Voxel value as a label, if it is a positive integer that fits in `i32`.
pub fn as_label(value: f32) -> Option<i32> {
    // i32::MAX rounds up to 2^31 as f32, which is already out of range
    if value > 0.0 && value.fract() == 0.0 && value < i32::MAX as f32 {
        Some(value as i32)
    } else {
        None
    }
}

fn label_inventory(data: &Array3<f32>) -> Vec<i32> {
    let mut skipped = 0usize;
    let labels: BTreeSet<i32> = data
        .iter()
        .filter_map(|&v| {
            let label = as_label(v);
            if label.is_none() && v > 0.0 {
                skipped += 1;
            }
            label
        })
        .collect();
    if skipped > 0 {
        log::debug!("{skipped} positive voxels are not integer labels in i32 range");
    }
    labels.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn volume(data: Array3<f32>) -> LabelVolume {
        LabelVolume::new(data, Geometry::default()).unwrap()
    }

    #[test]
    fn inventory_skips_background_and_negatives() {
        let data = Array3::from_shape_vec((5, 1, 1), vec![-1.0, 0.0, 1.0, 1.0, 3.0]).unwrap();
        assert_eq!(volume(data).labels(), &[1, 3]);
    }

    #[test]
    fn inventory_skips_fractional_and_nan() {
        let data =
            Array3::from_shape_vec((2, 2, 1), vec![2.5, f32::NAN, 7.0, 2.0]).unwrap();
        assert_eq!(volume(data).labels(), &[2, 7]);
    }

    #[test]
    fn inventory_skips_values_beyond_i32() {
        let data = Array3::from_shape_vec(
            (3, 1, 1),
            vec![2_147_483_648.0, 4_294_967_296.0, 3.0],
        )
        .unwrap();
        assert_eq!(volume(data).labels(), &[3]);
        assert_eq!(as_label(2_147_483_520.0), Some(2_147_483_520));
        assert_eq!(as_label(2_147_483_648.0), None);
    }

    #[test]
    fn empty_volume_is_rejected() {
        let err = LabelVolume::new(Array3::zeros((0, 3, 3)), Geometry::default()).unwrap_err();
        assert!(matches!(err, ModelError::UnreadableFormat(_)));
    }

    #[test]
    fn clamps_indices() {
        let v = volume(Array3::zeros((3, 4, 5)));
        assert_eq!(v.clamp_index(ViewAxis::Axial, -5), 0);
        assert_eq!(v.clamp_index(ViewAxis::Axial, 105), 4);
        assert_eq!(v.clamp_index(ViewAxis::Sagittal, 2), 2);
        assert_eq!(v.clamp_index(ViewAxis::Coronal, 9), 3);
    }

    #[test]
    fn projection_marks_slices_containing_label() {
        let mut data = Array3::zeros((4, 4, 4));
        data[[1, 2, 3]] = 6.0;
        let v = volume(data);
        assert_eq!(
            v.label_projection(ViewAxis::Sagittal, 6),
            vec![false, true, false, false]
        );
        assert_eq!(
            v.label_projection(ViewAxis::Coronal, 6),
            vec![false, false, true, false]
        );
        assert_eq!(
            v.label_projection(ViewAxis::Axial, 6),
            vec![false, false, false, true]
        );
    }

    #[test]
    fn optimal_slice_takes_hit_at_half_count() {
        let mut data = Array3::zeros((2, 2, 9));
        for z in [1, 2, 6, 8] {
            data[[0, 0, z]] = 4.0;
        }
        let v = volume(data);
        // hits [1, 2, 6, 8] -> position 2
        assert_eq!(v.optimal_slice(ViewAxis::Axial, 4), 6);
        assert_eq!(v.optimal_slice(ViewAxis::Axial, 9), 4);
        assert_eq!(v.optimal_slice(ViewAxis::Axial, 0), 4);
    }
}
