//! Reading NIfTI label volumes from disk or memory.

use std::io::{Cursor, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::{InMemNiftiVolume, IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::error::{ModelError, Result};
use crate::geometry::{reorient_to_ras, Geometry};

/// Options applied while turning a file into a volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Permute and flip the voxel grid into RAS order using the header affine.
    pub reorient_to_ras: bool,
}

/// Voxel data plus the geometry it was read with.
#[derive(Debug)]
pub struct LoadedVolume {
    pub data: Array3<f32>,
    pub geometry: Geometry,
}

fn unreadable(err: impl std::fmt::Display) -> ModelError {
    ModelError::UnreadableFormat(err.to_string())
}

pub fn load_path(path: &Path, options: &LoadOptions) -> Result<LoadedVolume> {
    if !path.is_file() {
        return Err(ModelError::FileNotFound(path.to_path_buf()));
    }
    let obj = ReaderOptions::new().read_file(path).map_err(unreadable)?;
    let header = obj.header().clone();
    let volume = obj.into_volume().into_ndarray::<f32>().map_err(unreadable)?;
    finish(volume, &header, options)
}

/// Load from an in-memory `.nii` or `.nii.gz` image; gzip is detected from the magic bytes.
pub fn load_bytes(bytes: &[u8], options: &LoadOptions) -> Result<LoadedVolume> {
    let is_gz = bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b;
    let cursor = Cursor::new(bytes);
    if is_gz {
        load_reader(GzDecoder::new(cursor), options)
    } else {
        load_reader(cursor, options)
    }
}

fn load_reader<R: Read>(mut reader: R, options: &LoadOptions) -> Result<LoadedVolume> {
    let header = NiftiHeader::from_reader(&mut reader).map_err(unreadable)?;
    let vox_offset = header.vox_offset.max(348.0) as usize;
    let skip = vox_offset.saturating_sub(348);
    if skip > 0 {
        let mut discard = vec![0u8; skip];
        reader.read_exact(&mut discard).map_err(unreadable)?;
    }
    let volume = InMemNiftiVolume::from_reader(reader, &header).map_err(unreadable)?;
    let volume = volume.into_ndarray::<f32>().map_err(unreadable)?;
    finish(volume, &header, options)
}

fn finish(volume: ArrayD<f32>, header: &NiftiHeader, options: &LoadOptions) -> Result<LoadedVolume> {
    let data = squeeze_to_3d(volume)?;
    let (data, geometry) = if options.reorient_to_ras {
        reorient_to_ras(data, header)
    } else {
        (data, Geometry::from_header(header))
    };
    Ok(LoadedVolume { data, geometry })
}

/// Drop trailing singleton dimensions (e.g. a single-frame 4-D file) down to 3-D.
fn squeeze_to_3d(mut volume: ArrayD<f32>) -> Result<Array3<f32>> {
    while volume.ndim() > 3 && volume.shape()[volume.ndim() - 1] == 1 {
        let last = volume.ndim() - 1;
        volume = volume.index_axis_move(Axis(last), 0);
    }
    let shape = volume.shape().to_vec();
    if shape.len() != 3 {
        return Err(ModelError::UnreadableFormat(format!(
            "expected a 3-D volume, found shape {shape:?}"
        )));
    }
    volume.into_dimensionality::<Ix3>().map_err(unreadable)
}
