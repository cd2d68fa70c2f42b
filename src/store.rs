//! The label table: one row per image, persisted as CSV.
//!
//! Columns other than `image`, `label` and `door_id` are carried through
//! untouched so a table edited by other tools survives a save.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use tempfile::Builder;

use crate::error::StoreError;

pub const IMAGE_COLUMN: &str = "image";
pub const LABEL_COLUMN: &str = "label";
pub const GROUP_COLUMN: &str = "door_id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelRow {
    pub image: String,
    pub label: String,
    pub group_id: i64,
    /// Values of unknown columns, keyed by header name.
    pub extra: HashMap<String, String>,
}

#[derive(Debug)]
pub struct LabelStore {
    columns: Vec<String>,
    rows: BTreeMap<String, LabelRow>,
}

impl Default for LabelStore {
    fn default() -> Self {
        Self {
            columns: vec![IMAGE_COLUMN.to_owned(), LABEL_COLUMN.to_owned(), GROUP_COLUMN.to_owned()],
            rows: BTreeMap::new(),
        }
    }
}

impl LabelStore {
    /// Reads the table at `path`, or starts empty if there is no file yet.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut reader = csv::ReaderBuilder::new().from_path(path)?;
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let position = |name: &'static str| {
            columns.iter().position(|c| c == name).ok_or(StoreError::MissingColumn(name))
        };
        let image_idx = position(IMAGE_COLUMN)?;
        let label_idx = position(LABEL_COLUMN)?;
        let group_idx = position(GROUP_COLUMN)?;

        let mut rows = BTreeMap::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or_default();
            let raw_group = field(group_idx);
            let group_id = raw_group.trim().parse::<i64>().map_err(|_| StoreError::InvalidGroupId {
                row: i + 1,
                value: raw_group.to_owned(),
            })?;
            let extra = columns
                .iter()
                .enumerate()
                .filter(|(idx, _)| ![image_idx, label_idx, group_idx].contains(idx))
                .map(|(idx, name)| (name.clone(), field(idx).to_owned()))
                .collect();
            let row = LabelRow {
                image: field(image_idx).to_owned(),
                label: field(label_idx).to_owned(),
                group_id,
                extra,
            };
            // a repeated image keeps its last row
            rows.insert(row.image.clone(), row);
        }
        Ok(Self { columns, rows })
    }

    /// Sets the label for `image`. An existing row keeps its group id and
    /// extra columns; `group_id` only applies to new rows.
    pub fn upsert(&mut self, image: &str, label: &str, group_id: i64) {
        match self.rows.get_mut(image) {
            Some(row) => row.label = label.to_owned(),
            None => {
                self.rows.insert(
                    image.to_owned(),
                    LabelRow {
                        image: image.to_owned(),
                        label: label.to_owned(),
                        group_id,
                        extra: HashMap::new(),
                    },
                );
            }
        }
    }

    /// Rewrites the whole table. The new content is written next to `path`
    /// and renamed over it, so readers never see a half-written file.
    /// An existing table keeps its permissions.
    pub fn flush(&self, path: &Path) -> Result<(), StoreError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let existing = fs::metadata(path).ok().map(|m| m.permissions());
        let mut builder = Builder::new();
        if existing.is_none() {
            if let Some(perms) = new_file_permissions() {
                builder.permissions(perms);
            }
        }
        let mut tmp = builder.tempfile_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(&self.columns)?;
            for row in self.rows.values() {
                let group_id = row.group_id.to_string();
                let record = self.columns.iter().map(|c| match c.as_str() {
                    IMAGE_COLUMN => row.image.as_str(),
                    LABEL_COLUMN => row.label.as_str(),
                    GROUP_COLUMN => group_id.as_str(),
                    other => row.extra.get(other).map(String::as_str).unwrap_or_default(),
                });
                writer.write_record(record)?;
            }
            writer.flush()?;
        }
        if let Some(perms) = existing {
            tmp.as_file().set_permissions(perms)?;
        }
        tmp.persist(path)?;
        log::debug!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    pub fn get(&self, image: &str) -> Option<&LabelRow> {
        self.rows.get(image)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// Same mode a plain create would get; the umask still applies.
#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LabelStore::load(&dir.path().join("labels.csv")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.columns, ["image", "label", "door_id"]);
    }

    #[test]
    fn test_upsert_flush_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");

        let mut store = LabelStore::default();
        store.upsert("a.jpg", "open", 1);
        store.flush(&path).unwrap();

        let reloaded = LabelStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        let row = reloaded.get("a.jpg").unwrap();
        assert_eq!(row.label, "open");
        assert_eq!(row.group_id, 1);
    }

    #[test]
    fn test_upsert_overwrites() {
        let mut store = LabelStore::default();
        store.upsert("a.jpg", "open", 1);
        store.upsert("a.jpg", "closed", 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a.jpg").unwrap().label, "closed");
    }

    #[test]
    fn test_flush_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        let mut store = LabelStore::default();
        store.upsert("b.jpg", "closed", 3);
        store.upsert("a.jpg", "open", 3);
        store.flush(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "image,label,door_id\na.jpg,open,3\nb.jpg,closed,3\n");
    }

    #[test]
    fn test_flush_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doors").join("doors.csv");
        let mut store = LabelStore::default();
        store.upsert("a.jpg", "open", 1);
        store.flush(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_existing_row_overwritten_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "image,label,door_id\na.jpg,open,1\nb.jpg,open,1\n").unwrap();

        let mut store = LabelStore::load(&path).unwrap();
        store.upsert("a.jpg", "closed", 1);
        store.flush(&path).unwrap();

        let reloaded = LabelStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("a.jpg").unwrap().label, "closed");
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("a.jpg").count(), 1);
    }

    #[test]
    fn test_relabel_keeps_group_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "image,label,door_id\na.jpg,open,2\n").unwrap();

        let mut store = LabelStore::load(&path).unwrap();
        store.upsert("a.jpg", "closed", 1);
        store.upsert("b.jpg", "open", 1);
        store.flush(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "image,label,door_id\na.jpg,closed,2\nb.jpg,open,1\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_flush_keeps_table_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "image,label,door_id\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let mut store = LabelStore::load(&path).unwrap();
        store.upsert("a.jpg", "open", 1);
        store.flush(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert_eq!(store.get("a.jpg").unwrap().label, "open");
    }

    #[test]
    fn test_extra_columns_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "note,image,label,door_id\n\"dark, blurry\",a.jpg,open,2\n").unwrap();

        let mut store = LabelStore::load(&path).unwrap();
        assert_eq!(store.get("a.jpg").unwrap().extra["note"], "dark, blurry");
        store.upsert("a.jpg", "closed", 2);
        store.upsert("b.jpg", "open", 2);
        store.flush(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "note,image,label,door_id\n\"dark, blurry\",a.jpg,closed,2\n,b.jpg,open,2\n");
    }

    #[test]
    fn test_duplicate_rows_in_file_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "image,label,door_id\na.jpg,open,1\na.jpg,closed,1\n").unwrap();
        let store = LabelStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a.jpg").unwrap().label, "closed");
    }

    #[test]
    fn test_load_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "image,label\na.jpg,open\n").unwrap();
        let err = LabelStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::MissingColumn("door_id")));
    }

    #[test]
    fn test_load_bad_group_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "image,label,door_id\na.jpg,open,front\n").unwrap();
        let err = LabelStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::InvalidGroupId { row: 1, .. }));
    }

    #[test]
    fn test_load_ragged_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "image,label,door_id\na.jpg,open\n").unwrap();
        assert!(matches!(LabelStore::load(&path).unwrap_err(), StoreError::Csv(_)));
    }
}
