use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::navigation::{Direction, Navigation, Session};
use crate::store::LabelStore;

/// One user action, whatever key or button produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    /// Move on without saving a label for the current image.
    Skip,
    CycleLabel(Direction),
    PickLabel(usize),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Store `label` (a label-set index) for `image` (a sequence index) and write the table.
    Persist { image: usize, label: usize },
    /// The current image changed.
    Render,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue { reload: bool },
    Quit,
}

/// Computes the next navigation state and the effects a command produces.
/// Saving happens before the move, so `Persist` always names the image that was on screen.
pub fn transition(nav: Navigation, cmd: Command) -> (Navigation, Vec<Effect>) {
    let mut next = nav;
    let mut effects = vec![];
    let persist = |effects: &mut Vec<Effect>| {
        if let Some(label) = nav.label_index() {
            effects.push(Effect::Persist { image: nav.image_index(), label });
        }
    };
    match cmd {
        Command::Next => {
            persist(&mut effects);
            next.advance(Direction::Forward);
            effects.push(Effect::Render);
        }
        Command::Previous => {
            persist(&mut effects);
            next.advance(Direction::Backward);
            effects.push(Effect::Render);
        }
        Command::Skip => {
            next.advance(Direction::Forward);
            effects.push(Effect::Render);
        }
        Command::CycleLabel(dir) => next.cycle_label(dir),
        Command::PickLabel(idx) => {
            next.select_label(idx);
        }
        Command::Quit => effects.push(Effect::Quit),
    }
    (next, effects)
}

pub struct ReviewController {
    session: Session,
    store: LabelStore,
    image_dir: PathBuf,
    table_path: PathBuf,
    group_id: i64,
}

impl ReviewController {
    pub fn new(session: Session, store: LabelStore, image_dir: PathBuf, table_path: PathBuf, group_id: i64) -> Self {
        Self { session, store, image_dir, table_path, group_id }
    }

    pub fn handle(&mut self, cmd: Command) -> Result<Flow, StoreError> {
        let (next, effects) = transition(self.session.nav, cmd);
        log::debug!("{:?}: {:?}", cmd, effects);
        let mut flow = Flow::Continue { reload: false };
        for effect in effects {
            match effect {
                Effect::Persist { image, label } => self.persist(image, label)?,
                Effect::Render => flow = Flow::Continue { reload: true },
                Effect::Quit => flow = Flow::Quit,
            }
        }
        self.session.nav = next;
        Ok(flow)
    }

    fn persist(&mut self, image: usize, label: usize) -> Result<(), StoreError> {
        let (Some(image), Some(label)) = (self.session.image(image), self.session.labels().get(label)) else {
            return Ok(());
        };
        self.store.upsert(image, label, self.group_id);
        self.store.flush(&self.table_path)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    pub fn current_image_path(&self) -> PathBuf {
        self.image_dir.join(self.session.current_image())
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }
}
