use eframe::egui;
use egui::{Key, Vec2};
use image::GenericImageView;

use crate::config::SIDEBAR_WIDTH;
use crate::controller::{Command, Flow, ReviewController};
use crate::error::PrepareError;
use crate::images::{self, CropRect};
use crate::navigation::Direction;

// One command per key; letters are case-insensitive in egui.
const KEY_BINDINGS: [(Key, Command); 8] = [
    (Key::ArrowLeft, Command::Previous),
    (Key::ArrowRight, Command::Next),
    (Key::ArrowUp, Command::CycleLabel(Direction::Backward)),
    (Key::ArrowDown, Command::CycleLabel(Direction::Forward)),
    (Key::N, Command::Next),
    (Key::S, Command::Skip),
    (Key::Q, Command::Quit),
    (Key::Escape, Command::Quit),
];

const BUTTONS: [(&str, Command); 4] = [
    ("Previous", Command::Previous),
    ("Next", Command::Next),
    ("Skip", Command::Skip),
    ("Quit", Command::Quit),
];

pub fn command_for_key(key: Key) -> Option<Command> {
    KEY_BINDINGS.iter().find(|(k, _)| *k == key).map(|(_, cmd)| *cmd)
}

fn fatal(err: impl std::fmt::Display) -> ! {
    log::error!("{err}");
    std::process::exit(1);
}

pub struct LabelerApp {
    controller: ReviewController,
    crop: CropRect,
    texture: Option<egui::TextureHandle>,
    original_size: (u32, u32),
    needs_reload: bool,
}

impl LabelerApp {
    pub fn new(controller: ReviewController, crop: CropRect) -> Self {
        Self {
            controller,
            crop,
            texture: None,
            original_size: (0, 0),
            needs_reload: true,
        }
    }

    fn load_current_image_texture(&mut self, ctx: &egui::Context) -> Result<(), PrepareError> {
        // drop the previous texture before decoding the next one
        self.texture = None;
        let p = self.controller.current_image_path();
        let prepared = images::load_prepared(&p, self.crop)?;
        let (w, h) = prepared.dimensions();
        self.original_size = (w, h);
        let rgba = prepared.to_rgba8();
        let image = egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], rgba.as_raw());
        self.texture = Some(ctx.load_texture(p.to_string_lossy(), image, egui::TextureOptions::LINEAR));
        Ok(())
    }

    /// Returns false once the session is over.
    fn dispatch(&mut self, ctx: &egui::Context, cmd: Command) -> bool {
        match self.controller.handle(cmd) {
            Ok(Flow::Continue { reload }) => {
                self.needs_reload |= reload;
                true
            }
            Ok(Flow::Quit) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                false
            }
            Err(e) => fatal(format!("Failed to save {}: {e}", self.controller.table_path().display())),
        }
    }
}

impl eframe::App for LabelerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut commands: Vec<Command> = ctx.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key { key, pressed: true, .. } => command_for_key(*key),
                    _ => None,
                })
                .collect()
        });

        if self.needs_reload {
            if let Err(e) = self.load_current_image_texture(ctx) {
                fatal(e);
            }
            self.needs_reload = false;
        }

        let session = self.controller.session();

        egui::TopBottomPanel::top("status_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "Image {}/{}: {}",
                    session.nav.image_index() + 1,
                    session.nav.image_count(),
                    session.current_image()
                ));
                ui.separator();
                ui.label(format!("Label: {}", session.current_label().unwrap_or("-")));
                ui.separator();
                let store = self.controller.store();
                if let Some(row) = store.get(session.current_image()) {
                    ui.label(format!("Saved: {}", row.label));
                    ui.separator();
                }
                ui.label(format!("{} labeled", store.len()));
            });
        });

        egui::SidePanel::right("label_panel")
            .exact_width(SIDEBAR_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Labels");
                let selected = session.nav.label_index();
                for (i, label) in session.labels().iter().enumerate() {
                    if ui.selectable_label(selected == Some(i), label).clicked() {
                        commands.push(Command::PickLabel(i));
                    }
                }
                ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                    ui.horizontal_wrapped(|ui| {
                        for (text, cmd) in BUTTONS {
                            if ui.button(text).clicked() {
                                commands.push(cmd);
                            }
                        }
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(tex) = &self.texture {
                let available = ui.available_size();
                let (ow, oh) = self.original_size;
                let ow = ow as f32;
                let oh = oh as f32;
                let mut dw = available.x;
                let mut dh = available.y;
                let aspect = ow / oh;
                if dw / dh > aspect { dw = dh * aspect; } else { dh = dw / aspect; }
                ui.add(egui::Image::new(tex).fit_to_exact_size(Vec2::new(dw, dh)));
            }
        });

        for cmd in commands {
            if !self.dispatch(ctx, cmd) {
                break;
            }
        }
    }
}
