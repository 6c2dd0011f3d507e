//! Starfall - music-reactive galaxy visualizer
//! eframe shell wiring the audio sources, the scene and the trail surface

mod analyzer;
mod audio;
mod bands;
mod config;
mod frame;
mod palette;
mod scene;
mod stars;

use std::time::Instant;

use clap::Parser;
use eframe::egui;

use audio::AudioSystem;
use bands::BandLevels;
use config::Options;
use frame::FrameBuffer;
use scene::{Scene, SceneEvent};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = Options::parse();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([options.width, options.height])
            .with_title("Starfall"),
        ..Default::default()
    };

    eframe::run_native(
        "Starfall",
        native_options,
        Box::new(move |cc| Ok(Box::new(StarfallApp::new(cc, options)))),
    )
}

struct StarfallApp {
    audio: AudioSystem,
    scene: Scene,
    surface: FrameBuffer,
    texture: Option<egui::TextureHandle>,
    command_text: String,
    notice: Option<String>,
    started: Instant,
}

impl StarfallApp {
    fn new(_cc: &eframe::CreationContext<'_>, options: Options) -> Self {
        let mut rng = rand::thread_rng();
        let mut audio = AudioSystem::new();
        let mut notice = None;
        if let Some(path) = &options.audio {
            if let Err(err) = audio.play_file(path) {
                log::error!("failed to open {}: {err}", path.display());
                notice = Some(err.to_string());
            }
        }
        Self {
            audio,
            scene: Scene::new(options.width, options.height, options.stars, &mut rng),
            surface: FrameBuffer::new(options.width as usize, options.height as usize),
            texture: None,
            command_text: String::new(),
            notice,
            started: Instant::now(),
        }
    }

    fn top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("✨ Starfall");
                ui.separator();

                if ui.button("📂 Open audio").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Audio", &["mp3", "wav", "ogg", "flac", "m4a"])
                        .pick_file()
                    {
                        if let Err(err) = self.audio.play_file(&path) {
                            log::error!("failed to open {}: {err}", path.display());
                            self.notice = Some(err.to_string());
                        }
                    }
                }

                if ui.button("🎤 Microphone").clicked() {
                    if let Err(err) = self.audio.start_mic() {
                        log::error!("microphone unavailable: {err}");
                        self.notice = Some(err.to_string());
                    }
                }

                if ui
                    .add_enabled(self.audio.is_active(), egui::Button::new("⏹ Stop"))
                    .clicked()
                {
                    self.audio.stop();
                }

                ui.separator();

                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.command_text)
                        .hint_text("command (try: upgrade)")
                        .desired_width(220.0),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    let command = std::mem::take(&mut self.command_text);
                    let mut rng = rand::thread_rng();
                    self.scene.handle_event(SceneEvent::Command(command), &mut rng);
                    response.request_focus();
                }
            });
        });
    }

    fn notice_window(&mut self, ctx: &egui::Context) {
        let Some(message) = self.notice.clone() else {
            return;
        };
        egui::Window::new("Audio unavailable")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.notice = None;
                }
            });
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let width = (rect.width().round() as usize).max(1);
                let height = (rect.height().round() as usize).max(1);
                if width != self.surface.width() || height != self.surface.height() {
                    self.surface.resize(width, height);
                    let mut rng = rand::thread_rng();
                    self.scene.handle_event(
                        SceneEvent::Resized(width as f32, height as f32),
                        &mut rng,
                    );
                }

                let bands = match self.audio.spectrum() {
                    Some(snapshot) => BandLevels::from_snapshot(snapshot),
                    None => BandLevels::default(),
                };
                let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
                let mut rng = rand::thread_rng();
                self.scene
                    .advance(&mut self.surface, &bands, elapsed_ms, &mut rng);

                let image = self.surface.to_color_image();
                let texture = self.texture.get_or_insert_with(|| {
                    ctx.load_texture("starfield", image.clone(), egui::TextureOptions::LINEAR)
                });
                texture.set(image, egui::TextureOptions::LINEAR);

                let painter = ui.painter_at(rect);
                painter.image(
                    texture.id(),
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            });
    }
}

impl eframe::App for StarfallApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.top_bar(ctx);
        self.notice_window(ctx);
        self.canvas(ctx);
        // the field keeps animating whether or not audio is attached
        ctx.request_repaint();
    }
}
