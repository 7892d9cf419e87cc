use crate::error::LandmarkError;
use anyhow::Result;
use std::{fs, path::Path};

fn malformed(path: &Path, msg: impl std::fmt::Display) -> LandmarkError {
    LandmarkError::MalformedLandmarks(format!("{}: {}", path.display(), msg))
}

fn parse_coord(path: &Path, s: &str) -> Result<f64, LandmarkError> {
    s.trim()
        .parse::<f64>()
        .map_err(|e| malformed(path, format!("{:?} {}", s, e)))
}

/// Reads landmarks from a text file of comma-separated coordinates.
///
/// All values of the file are taken in order and grouped into points of
/// three, so a line may hold any number of whole points.
pub fn read_txt_landmarks(path: impl AsRef<Path>) -> Result<Vec<[f64; 3]>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let values = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .flat_map(|line| line.split(','))
        .map(|s| parse_coord(path, s))
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() % 3 != 0 {
        return Err(malformed(path, format!("{} values are not 3D points", values.len())).into());
    }

    Ok(values.chunks(3).map(|c| [c[0], c[1], c[2]]).collect())
}

/// Reads landmarks from a 3D Slicer fiducial file.
///
/// Rows are `label,x,y,z,...` with `#` comment lines. Slicer stores points in
/// RAS coordinates; x and y are negated to give LPS coordinates as used by
/// DICOM and ITK.
pub fn read_fcsv_landmarks(path: impl AsRef<Path>) -> Result<Vec<[f64; 3]>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_path(path)?;

    let mut landmarks = vec![];
    for record in rdr.records() {
        let record = record?;
        let coord = |i: usize| match record.get(i) {
            Some(s) => parse_coord(path, s),
            None => Err(malformed(path, format!("missing column {}", i))),
        };
        landmarks.push([-coord(1)?, -coord(2)?, coord(3)?]);
    }

    Ok(landmarks)
}

/// Reads landmarks with the reader matching the file name.
///
/// The second value is `true` for fiducial files, whose points are in
/// physical space rather than index space.
pub fn read_landmarks(path: impl AsRef<Path>) -> Result<(Vec<[f64; 3]>, bool)> {
    let path = path.as_ref();
    if path.to_string_lossy().contains(".fcsv") {
        Ok((read_fcsv_landmarks(path)?, true))
    } else {
        Ok((read_txt_landmarks(path)?, false))
    }
}
