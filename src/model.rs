use std::path::Path;

use ndarray::{Array2, Array3};

use crate::axis::{PerAxis, ViewAxis};
use crate::classify::{classify, label_mask, DisplayClass};
use crate::error::{ModelError, Result};
use crate::geometry::Geometry;
use crate::loader::{self, LoadOptions};
use crate::volume::LabelVolume;

/// Current label focus and per-view slice positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// 0 means no label is focused
    pub current_label: i32,
    pub current_slice: PerAxis<usize>,
}

/// A 2-D cut through the volume and the cells matching the current label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelSlice {
    pub axis: ViewAxis,
    /// Index actually used, after clamping
    pub index: usize,
    pub data: Array2<f32>,
    pub mask: Array2<bool>,
}

/// Owns the loaded label volume and the viewer's selection.
///
/// All operations other than loading fail with [`ModelError::NoDataLoaded`]
/// until a volume has been loaded successfully.
#[derive(Debug, Default)]
pub struct VolumeLabelModel {
    volume: Option<LabelVolume>,
    selection: SelectionState,
    options: LoadOptions,
}

impl VolumeLabelModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        self.options
    }

    /// Options used by subsequent loads; the current volume is untouched.
    pub fn set_load_options(&mut self, options: LoadOptions) {
        self.options = options;
    }

    /// Load a NIfTI file, replacing the current volume only on success.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&[i32]> {
        let path = path.as_ref();
        let loaded = loader::load_path(path, &self.options)
            .and_then(|loaded| LabelVolume::new(loaded.data, loaded.geometry));
        match loaded {
            Ok(volume) => {
                log::info!(
                    "loaded {} with shape {:?} and {} labels",
                    path.display(),
                    volume.shape(),
                    volume.labels().len()
                );
                Ok(self.install(volume))
            }
            Err(e) => {
                log::warn!("failed to load {}: {e}", path.display());
                Err(e)
            }
        }
    }

    /// Load an in-memory `.nii` or `.nii.gz` image.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<&[i32]> {
        let loaded = loader::load_bytes(bytes, &self.options)
            .and_then(|loaded| LabelVolume::new(loaded.data, loaded.geometry));
        match loaded {
            Ok(volume) => {
                log::info!(
                    "loaded {} bytes with shape {:?} and {} labels",
                    bytes.len(),
                    volume.shape(),
                    volume.labels().len()
                );
                Ok(self.install(volume))
            }
            Err(e) => {
                log::warn!("failed to load in-memory volume: {e}");
                Err(e)
            }
        }
    }

    /// Install an already decoded volume.
    pub fn load_array(&mut self, data: Array3<f32>, geometry: Geometry) -> Result<&[i32]> {
        let volume = LabelVolume::new(data, geometry)?;
        Ok(self.install(volume))
    }

    fn install(&mut self, volume: LabelVolume) -> &[i32] {
        for axis in ViewAxis::ALL {
            let index = self.selection.current_slice[axis] as isize;
            self.selection.current_slice[axis] = volume.clamp_index(axis, index);
        }
        self.volume.insert(volume).labels()
    }

    fn loaded(&self) -> Result<&LabelVolume> {
        self.volume.as_ref().ok_or(ModelError::NoDataLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.volume.is_some()
    }

    pub fn volume(&self) -> Option<&LabelVolume> {
        self.volume.as_ref()
    }

    pub fn shape(&self) -> Result<[usize; 3]> {
        Ok(self.loaded()?.shape())
    }

    pub fn geometry(&self) -> Result<&Geometry> {
        Ok(self.loaded()?.geometry())
    }

    pub fn label_inventory(&self) -> Result<&[i32]> {
        Ok(self.loaded()?.labels())
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn current_label(&self) -> i32 {
        self.selection.current_label
    }

    pub fn current_slice(&self, axis: ViewAxis) -> usize {
        self.selection.current_slice[axis]
    }

    /// Focus a label and move every view to its optimal slice.
    pub fn set_current_label(&mut self, label: i32) -> Result<PerAxis<usize>> {
        let volume = self.loaded()?;
        let slices = PerAxis::from_fn(|axis| volume.optimal_slice(axis, label));
        log::debug!("label {label} selected, optimal slices {slices:?}");
        self.selection.current_label = label;
        self.selection.current_slice = slices;
        Ok(slices)
    }

    /// Store a slice position, clamped into the axis bounds. Returns the stored index.
    pub fn set_current_slice(&mut self, axis: ViewAxis, index: isize) -> Result<usize> {
        let clamped = self.loaded()?.clamp_index(axis, index);
        self.selection.current_slice[axis] = clamped;
        Ok(clamped)
    }

    /// Like [`set_current_slice`](Self::set_current_slice) for a view given by name.
    pub fn set_current_slice_named(&mut self, view: &str, index: isize) -> Result<usize> {
        let axis = view.parse::<ViewAxis>()?;
        self.set_current_slice(axis, index)
    }

    pub fn get_slice(&self, axis: ViewAxis, index: isize) -> Result<LabelSlice> {
        let volume = self.loaded()?;
        let index = volume.clamp_index(axis, index);
        let data = volume.slice(axis, index);
        let mask = label_mask(data, self.selection.current_label);
        Ok(LabelSlice {
            axis,
            index,
            data: data.to_owned(),
            mask,
        })
    }

    pub fn compute_display_classes(
        &self,
        axis: ViewAxis,
        index: isize,
    ) -> Result<Array2<DisplayClass>> {
        let slice = self.get_slice(axis, index)?;
        Ok(classify(slice.data.view(), slice.mask.view()))
    }

    /// Best slice per axis for the current label; does not move the views.
    pub fn compute_optimal_slices(&self) -> Result<PerAxis<usize>> {
        let volume = self.loaded()?;
        let label = self.selection.current_label;
        Ok(PerAxis::from_fn(|axis| volume.optimal_slice(axis, label)))
    }
}
