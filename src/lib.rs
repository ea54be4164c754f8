//! # NIfTI label viewer
//!
//! Core model behind a three-view (axial, coronal, sagittal) browser for
//! segmentation volumes. A [`VolumeLabelModel`] loads a NIfTI label file,
//! lists the labels it contains, and hands out slices with a mask of the
//! currently selected label. Selecting a label moves each view to the slice
//! that best shows it: the hit at position `count / 2` among the slices
//! along that axis that contain the label at all.
//!
//! ```no_run
//! # use nifti_label_viewer::{VolumeLabelModel, ViewAxis};
//! let mut model = VolumeLabelModel::new();
//! let labels = model.load("labels.nii.gz").expect("should load").to_vec();
//! model.set_current_label(labels[0]).expect("volume is loaded");
//! let index = model.current_slice(ViewAxis::Axial) as isize;
//! let classes = model
//!     .compute_display_classes(ViewAxis::Axial, index)
//!     .expect("volume is loaded");
//! ```

pub mod axis;
pub mod classify;
pub mod config;
pub mod error;
pub mod geometry;
pub mod loader;
pub mod model;
pub mod render;
pub mod volume;

pub use axis::{PerAxis, ViewAxis};
pub use classify::DisplayClass;
pub use config::ViewerConfig;
pub use error::{ModelError, Result};
pub use geometry::Geometry;
pub use loader::LoadOptions;
pub use model::{LabelSlice, SelectionState, VolumeLabelModel};
pub use render::{Palette, RenderMode};
pub use volume::LabelVolume;
