use image::ImageReader;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::models::Frame;

/// Numbered image sequence on disk.
///
/// File names are assembled as `<base>/<prefix><zero-padded index><suffix>`.
/// Frames are decoded lazily and converted to grayscale.
#[derive(Debug, Clone)]
pub struct FrameSource {
    base: PathBuf,
    prefix: String,
    suffix: String,
    fill_width: usize,
    start: usize,
    end: usize,
}

impl FrameSource {
    pub fn new(
        base: impl Into<PathBuf>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        fill_width: usize,
        indices: RangeInclusive<usize>,
    ) -> Self {
        Self {
            base: base.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
            fill_width,
            start: *indices.start(),
            end: *indices.end(),
        }
    }

    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(
            &config.data_path,
            &config.img_prefix,
            &config.img_file_type,
            config.img_fill_width,
            config.img_start_index..=config.img_end_index,
        )
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// File indices covered by this source
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start).saturating_add(1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the file holding the given file index
    pub fn path_for(&self, file_index: usize) -> PathBuf {
        let number = format!("{:0width$}", file_index, width = self.fill_width);
        self.base
            .join(format!("{}{}{}", self.prefix, number, self.suffix))
    }

    /// Decode the frame at position `index` of the run (0 is the first file)
    pub fn load(&self, index: usize) -> Result<Frame> {
        let file_index = self.start + index;
        let path = self.path_for(file_index);
        let image = ImageReader::open(&path)
            .map_err(|e| BenchError::FrameLoad {
                path: path.clone(),
                source: image::ImageError::IoError(e),
            })?
            .decode()
            .map_err(|e| BenchError::FrameLoad {
                path: path.clone(),
                source: e,
            })?;

        log::debug!("Loaded {} ({}x{})", path.display(), image.width(), image.height());
        Ok(Frame::new(image.to_luma8(), index, file_index))
    }

    /// A fresh pass over the whole sequence, in ascending index order.
    ///
    /// Each call starts again from the first file.
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            source: self,
            next: 0,
        }
    }
}

/// Lazy iterator over the frames of a [`FrameSource`]
pub struct Frames<'a> {
    source: &'a FrameSource,
    next: usize,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.source.len() {
            return None;
        }
        let frame = self.source.load(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.source.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}
