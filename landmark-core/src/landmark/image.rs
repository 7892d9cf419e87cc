use crate::error::LandmarkError;
use anyhow::Result;
use std::path::Path;

const NIFTI_EXTENSIONS: [&str; 4] = [".nii", ".nii.gz", ".img", ".hdr"];

/// `true` if the file name looks like a NIfTI or Analyze image.
pub fn is_nifti(filename: &str) -> bool {
    NIFTI_EXTENSIONS.iter().any(|ext| filename.contains(ext))
}

/// Fails with [`LandmarkError::UnknownImageFormat`] unless [`is_nifti`].
pub fn check_image_format(path: &Path) -> Result<()> {
    let filename = path.to_string_lossy();
    if is_nifti(&filename) {
        Ok(())
    } else {
        Err(LandmarkError::UnknownImageFormat(filename.into_owned()).into())
    }
}

/// A decoded 3D scan.
pub trait VolumeImage {
    /// Size of a voxel along each axis.
    fn spacing(&self) -> [f64; 3];

    /// Maps a point in physical space to continuous index space.
    fn physical_to_index(&self, point: [f64; 3]) -> [f64; 3];
}

/// Reads scans from files.
pub trait ImageDecoder {
    /// Decoded scan.
    type Image: VolumeImage;

    /// Decodes the scan at `path`.
    fn decode(&self, path: &Path) -> Result<Self::Image>;
}
