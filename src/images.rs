use std::fmt;
use std::path::Path;

use glob::glob;
use image::{DynamicImage, GenericImageView};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::PrepareError;

const IMAGE_PATTERNS: [&str; 2] = ["*.jpg", "*.png"];

/// Pixel region cut out of every source image, PIL-style: right and bottom are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    fn fits(&self, width: u32, height: u32) -> bool {
        self.right > self.left && self.bottom > self.top && self.right <= width && self.bottom <= height
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.left, self.top, self.right, self.bottom)
    }
}

/// Lists the image file names in `dir`, then shuffles them once.
pub fn discover_images<R: Rng + ?Sized>(dir: &Path, rng: &mut R) -> Result<Vec<String>, PrepareError> {
    if !dir.is_dir() {
        return Err(PrepareError::MissingDir(dir.to_path_buf()));
    }
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let mut names = vec![];
    for pat in IMAGE_PATTERNS.iter() {
        let globpat = Path::new(&escaped).join(pat).to_string_lossy().to_string();
        for entry in glob(&globpat)? {
            if let Ok(p) = entry {
                if !p.is_file() {
                    continue;
                }
                match p.file_name().and_then(|n| n.to_str()) {
                    Some(name) => names.push(name.to_owned()),
                    None => log::warn!("Skipping image with a non UTF-8 name: {}", p.display()),
                }
            }
        }
    }
    if names.is_empty() {
        return Err(PrepareError::NoImages(dir.to_path_buf()));
    }
    // sorted first so a seeded rng gives a reproducible order
    names.sort();
    names.dedup();
    names.shuffle(rng);
    Ok(names)
}

/// Cuts `rect` out of `image`. No scaling is applied.
pub fn prepare_image(image: &DynamicImage, rect: CropRect) -> Result<DynamicImage, PrepareError> {
    let (width, height) = image.dimensions();
    if !rect.fits(width, height) {
        return Err(PrepareError::CropOutOfBounds { rect, width, height });
    }
    Ok(image.crop_imm(rect.left, rect.top, rect.width(), rect.height()))
}

pub fn load_prepared(path: &Path, rect: CropRect) -> Result<DynamicImage, PrepareError> {
    let decoded = image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| PrepareError::Decode { path: path.to_path_buf(), source })?;
    prepare_image(&decoded, rect)
}
