//! Landmark annotations and the lists of scans used for training.
//!
//! Landmarks are read from plain text files, one or more comma-separated
//! points per line, or from 3D Slicer fiducial files (`.fcsv`) whose
//! coordinates are in physical RAS space. Decoding of the scans themselves is
//! left to an [`ImageDecoder`] backed by an imaging toolkit.
mod files_list;
mod image;
mod reader;
pub use files_list::{FilesList, ImageRecord, SampleCircular};
pub use image::{check_image_format, is_nifti, ImageDecoder, VolumeImage};
pub use reader::{read_fcsv_landmarks, read_landmarks, read_txt_landmarks};
