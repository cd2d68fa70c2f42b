use crate::error::NavigationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Ordered, non-empty set of allowed labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Result<Self, NavigationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = vec![];
        for label in labels {
            let label = label.into();
            if out.contains(&label) {
                return Err(NavigationError::DuplicateLabel(label));
            }
            out.push(label);
        }
        if out.is_empty() {
            return Err(NavigationError::EmptyLabelSet);
        }
        Ok(Self(out))
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn step(idx: usize, len: usize, dir: Direction) -> usize {
    match dir {
        Direction::Forward => (idx + 1) % len,
        Direction::Backward if idx == 0 => len - 1,
        Direction::Backward => idx - 1,
    }
}

/// Cursor over the image sequence and the label set.
///
/// Only positions live here; the identifiers they index are owned by
/// [`Session`]. Both lengths are non-zero, so every index stays valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Navigation {
    image_len: usize,
    image_idx: usize,
    label_len: usize,
    label_idx: usize,
    label_selected: bool,
}

impl Navigation {
    pub fn new(image_len: usize, label_len: usize) -> Result<Self, NavigationError> {
        if image_len == 0 {
            return Err(NavigationError::EmptyImageSet);
        }
        if label_len == 0 {
            return Err(NavigationError::EmptyLabelSet);
        }
        Ok(Self { image_len, image_idx: 0, label_len, label_idx: 0, label_selected: false })
    }

    pub fn advance(&mut self, dir: Direction) {
        self.image_idx = step(self.image_idx, self.image_len, dir);
    }

    pub fn cycle_label(&mut self, dir: Direction) {
        self.label_idx = step(self.label_idx, self.label_len, dir);
        self.label_selected = true;
    }

    /// Returns false and leaves the state alone if `idx` is out of range.
    pub fn select_label(&mut self, idx: usize) -> bool {
        if idx >= self.label_len {
            return false;
        }
        self.label_idx = idx;
        self.label_selected = true;
        true
    }

    pub fn image_index(&self) -> usize {
        self.image_idx
    }

    pub fn image_count(&self) -> usize {
        self.image_len
    }

    /// The selected label index, or `None` before the user has picked one.
    pub fn label_index(&self) -> Option<usize> {
        self.label_selected.then_some(self.label_idx)
    }
}

/// Shuffled image identifiers and the label set, plus the cursor over them.
#[derive(Debug)]
pub struct Session {
    images: Vec<String>,
    labels: LabelSet,
    pub nav: Navigation,
}

impl Session {
    pub fn new(images: Vec<String>, labels: LabelSet) -> Result<Self, NavigationError> {
        let nav = Navigation::new(images.len(), labels.len())?;
        Ok(Self { images, labels, nav })
    }

    pub fn current_image(&self) -> &str {
        &self.images[self.nav.image_index()]
    }

    pub fn current_label(&self) -> Option<&str> {
        self.nav.label_index().and_then(|i| self.labels.get(i))
    }

    pub fn image(&self, idx: usize) -> Option<&str> {
        self.images.get(idx).map(String::as_str)
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }
}
