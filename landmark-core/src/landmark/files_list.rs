use super::{check_image_format, read_landmarks, ImageDecoder, VolumeImage};
use crate::error::LandmarkError;
use anyhow::Result;
use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A decoded scan with its landmark.
pub struct ImageRecord<I> {
    /// Decoded scan.
    pub image: I,

    /// Landmark in voxel indices, `None` if landmarks are not read.
    pub landmark: Option<[i64; 3]>,

    /// Path of the scan.
    pub filename: String,

    /// Voxel spacing of the scan.
    pub spacing: [f64; 3],
}

/// Lists of scans and their landmark files.
pub struct FilesList {
    image_files: Vec<PathBuf>,
    landmark_files: Option<Vec<PathBuf>>,
    fiducial: usize,
    seed: u64,
}

fn read_list(path: &Path) -> Result<Vec<PathBuf>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

impl FilesList {
    /// Creates a list from scan paths and, for training and evaluation, the
    /// paths of the corresponding landmark files.
    pub fn new(image_files: Vec<PathBuf>, landmark_files: Option<Vec<PathBuf>>) -> Result<Self> {
        if let Some(landmark_files) = &landmark_files {
            if landmark_files.len() != image_files.len() {
                return Err(LandmarkError::FileListMismatch {
                    images: image_files.len(),
                    landmarks: landmark_files.len(),
                }
                .into());
            }
        }

        Ok(Self {
            image_files,
            landmark_files,
            fiducial: 0,
            seed: 42,
        })
    }

    /// Creates a list from text files holding one path per line.
    pub fn from_list_files(image_list: &Path, landmark_list: Option<&Path>) -> Result<Self> {
        let image_files = read_list(image_list)?;
        let landmark_files = landmark_list.map(read_list).transpose()?;
        Self::new(image_files, landmark_files)
    }

    /// Sets the index of the landmark taken from each landmark file.
    pub fn fiducial(mut self, fiducial: usize) -> Self {
        self.fiducial = fiducial;
        self
    }

    /// Sets the seed of the shuffling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of scans.
    pub fn num_files(&self) -> usize {
        self.image_files.len()
    }

    /// Returns an endless iterator over the decoded scans.
    ///
    /// With `shuffle`, every pass over the list visits the scans in a new
    /// random order.
    pub fn sample_circular<'a, D: ImageDecoder>(
        &'a self,
        decoder: &'a D,
        shuffle: bool,
    ) -> SampleCircular<'a, D> {
        SampleCircular {
            list: self,
            decoder,
            order: (0..self.num_files()).collect(),
            pos: 0,
            shuffle,
            rng: StdRng::seed_from_u64(self.seed),
        }
    }

    fn landmark<I: VolumeImage>(&self, ix: usize, image: &I) -> Result<Option<[i64; 3]>> {
        let landmark_file = match &self.landmark_files {
            Some(files) => &files[ix],
            None => return Ok(None),
        };

        let (landmarks, physical) = read_landmarks(landmark_file)?;
        let point = landmarks.get(self.fiducial).copied().ok_or_else(|| {
            LandmarkError::MalformedLandmarks(format!(
                "{}: no landmark at index {}",
                landmark_file.display(),
                self.fiducial
            ))
        })?;
        let point = if physical {
            image.physical_to_index(point)
        } else {
            point
        };

        Ok(Some(point.map(|v| v.round() as i64)))
    }

    fn record<D: ImageDecoder>(&self, ix: usize, decoder: &D) -> Result<ImageRecord<D::Image>> {
        let path = &self.image_files[ix];
        check_image_format(path)?;
        debug!("Decode {}", path.display());
        let image = decoder.decode(path)?;
        let landmark = self.landmark(ix, &image)?;
        let spacing = image.spacing();

        Ok(ImageRecord {
            image,
            landmark,
            filename: path.to_string_lossy().into_owned(),
            spacing,
        })
    }
}

/// Iterator returned by [`FilesList::sample_circular`].
pub struct SampleCircular<'a, D> {
    list: &'a FilesList,
    decoder: &'a D,
    order: Vec<usize>,
    pos: usize,
    shuffle: bool,
    rng: StdRng,
}

impl<'a, D: ImageDecoder> Iterator for SampleCircular<'a, D> {
    type Item = Result<ImageRecord<D::Image>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.order.is_empty() {
            return None;
        }

        if self.pos % self.order.len() == 0 {
            self.pos = 0;
            if self.shuffle {
                self.order.shuffle(&mut self.rng);
            }
        }

        let ix = self.order[self.pos];
        self.pos += 1;
        Some(self.list.record(ix, self.decoder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, fs::File, io::Write};
    use tempdir::TempDir;

    /// Scan whose physical space is index space scaled by 2.
    struct ScaledImage;

    impl VolumeImage for ScaledImage {
        fn spacing(&self) -> [f64; 3] {
            [2.0, 2.0, 2.0]
        }

        fn physical_to_index(&self, point: [f64; 3]) -> [f64; 3] {
            point.map(|v| v / 2.0)
        }
    }

    struct ScaledDecoder;

    impl ImageDecoder for ScaledDecoder {
        type Image = ScaledImage;

        fn decode(&self, _path: &Path) -> Result<ScaledImage> {
            Ok(ScaledImage)
        }
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> Result<PathBuf> {
        let path = dir.path().join(name);
        File::create(&path)?.write_all(content.as_bytes())?;
        Ok(path)
    }

    #[test]
    fn test_mismatched_lists() {
        let images = vec![PathBuf::from("a.nii.gz"), PathBuf::from("b.nii.gz")];
        let landmarks = vec![PathBuf::from("a.txt")];
        assert!(FilesList::new(images, Some(landmarks)).is_err());
    }

    #[test]
    fn test_from_list_files() -> Result<()> {
        let dir = TempDir::new("files_list")?;
        let images = write(&dir, "images.txt", "a.nii.gz\nb.nii.gz\n\n")?;
        let landmarks = write(&dir, "landmarks.txt", "a.txt\nb.txt\n")?;
        let list = FilesList::from_list_files(&images, Some(&landmarks))?;
        assert_eq!(list.num_files(), 2);

        let list = FilesList::from_list_files(&images, None)?;
        assert_eq!(list.num_files(), 2);
        Ok(())
    }

    #[test]
    fn test_sample_circular() -> Result<()> {
        let dir = TempDir::new("files_list")?;
        let txt = write(&dir, "a.txt", "1.4,2.6,3\n10,20,30\n")?;
        let fcsv = write(&dir, "b.fcsv", "# header\nac,-4,-6,8.8,1,1\n")?;
        let images = vec![PathBuf::from("a.nii.gz"), PathBuf::from("b.nii.gz")];
        let list = FilesList::new(images, Some(vec![txt, fcsv]))?;

        let decoder = ScaledDecoder;
        let records = list
            .sample_circular(&decoder, false)
            .take(4)
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(records[0].filename, "a.nii.gz");
        assert_eq!(records[0].landmark, Some([1, 3, 3]));
        assert_eq!(records[1].filename, "b.nii.gz");
        // RAS (-4, -6, 8.8) is LPS (4, 6, 8.8), halved to index space
        assert_eq!(records[1].landmark, Some([2, 3, 4]));
        assert_eq!(records[1].spacing, [2.0, 2.0, 2.0]);
        assert_eq!(records[2].filename, "a.nii.gz");
        assert_eq!(records[3].filename, "b.nii.gz");
        Ok(())
    }

    #[test]
    fn test_sample_circular_fiducial() -> Result<()> {
        let dir = TempDir::new("files_list")?;
        let txt = write(&dir, "a.txt", "1,2,3\n10,20,30\n")?;
        let list = FilesList::new(vec![PathBuf::from("a.nii")], Some(vec![txt]))?.fiducial(1);
        let record = list.sample_circular(&ScaledDecoder, false).next().unwrap()?;
        assert_eq!(record.landmark, Some([10, 20, 30]));

        let list = list.fiducial(2);
        assert!(list.sample_circular(&ScaledDecoder, false).next().unwrap().is_err());
        Ok(())
    }

    #[test]
    fn test_sample_circular_shuffle_visits_every_scan() -> Result<()> {
        let images = (0..5)
            .map(|i| PathBuf::from(format!("case_{}.nii.gz", i)))
            .collect::<Vec<_>>();
        let list = FilesList::new(images, None)?.seed(7);
        let names = list
            .sample_circular(&ScaledDecoder, true)
            .take(10)
            .map(|r| r.map(|r| r.filename))
            .collect::<Result<Vec<_>>>()?;

        for pass in names.chunks(5) {
            let unique = pass.iter().collect::<HashSet<_>>();
            assert_eq!(unique.len(), 5);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_image_format() -> Result<()> {
        let list = FilesList::new(vec![PathBuf::from("scan.dcm")], None)?;
        let record = list.sample_circular(&ScaledDecoder, false).next().unwrap();
        assert!(record.is_err());
        Ok(())
    }
}
