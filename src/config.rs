use std::path::PathBuf;

use crate::images::CropRect;

pub const DEFAULT_IMAGE_DIR: &str = "actions";
pub const DEFAULT_TABLE_PATH: &str = "doors/doors.csv";
pub const DEFAULT_LABELS: [&str; 2] = ["open", "closed"];
pub const DEFAULT_GROUP_ID: i64 = 1;
/// Region of the camera frame that shows the door.
pub const DEFAULT_CROP: CropRect = CropRect::new(1020, 510, 1300, 1350);
pub const SIDEBAR_WIDTH: f32 = 200.0;

#[derive(Clone, Debug)]
pub struct Config {
    pub image_dir: PathBuf,
    pub table_path: PathBuf,
    pub labels: Vec<String>,
    pub group_id: i64,
    pub crop: CropRect,
}

impl Config {
    pub fn new(image_dir: PathBuf, table_path: PathBuf) -> Self {
        Self {
            image_dir,
            table_path,
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
            group_id: DEFAULT_GROUP_ID,
            crop: DEFAULT_CROP,
        }
    }

    /// Initial window size: the crop plus the label sidebar.
    pub fn window_size(&self) -> [f32; 2] {
        [self.crop.width() as f32 + SIDEBAR_WIDTH, self.crop.height() as f32]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from(DEFAULT_IMAGE_DIR), PathBuf::from(DEFAULT_TABLE_PATH))
    }
}
