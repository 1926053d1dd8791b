#[cfg(feature = "gui")]
use eframe::egui;

#[cfg(feature = "gui")]
use intervals::{
    GridConfig, HoneycombLayout, MidiVoice, OscillatorVoice, Point, RouterEvent, TouchRouter,
    Voice,
};

#[cfg(feature = "gui")]
const HEX_SIZE: f32 = 75.0;
#[cfg(feature = "gui")]
const SPACING: f32 = 5.0;
#[cfg(feature = "gui")]
const SCALE: f32 = 0.7;

#[cfg(feature = "gui")]
fn main() -> Result<(), eframe::Error> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 520.0])
            .with_title("Intervals"),
        ..Default::default()
    };

    eframe::run_native(
        "Intervals",
        options,
        Box::new(|_cc| Ok(Box::new(InstrumentApp::new()))),
    )
}

#[cfg(not(feature = "gui"))]
fn main() {
    eprintln!("This binary requires the 'gui' feature to be enabled");
    std::process::exit(1);
}

#[cfg(feature = "gui")]
#[derive(Debug, Clone, Copy, PartialEq)]
enum Output {
    Audio,
    Midi(usize),
}

#[cfg(feature = "gui")]
struct InstrumentApp {
    router: TouchRouter,
    layout: HoneycombLayout,
    voice: Box<dyn Voice>,
    output: Output,

    // UI state
    available_midi_ports: Vec<String>,
    gesture_active: bool,
    ignore_until_release: bool,
    pressed: Option<usize>,
    selected_label: Option<String>,
    voice_error: Option<String>,
}

#[cfg(feature = "gui")]
impl InstrumentApp {
    fn new() -> Self {
        let config = GridConfig::default();
        let router = TouchRouter::new(config).unwrap_or_default();

        Self {
            layout: HoneycombLayout::new(&config, HEX_SIZE, SPACING).with_scale(SCALE),
            router,
            voice: Box::new(OscillatorVoice::default()),
            output: Output::Audio,
            available_midi_ports: MidiVoice::available_ports(),
            gesture_active: false,
            ignore_until_release: false,
            pressed: None,
            selected_label: None,
            voice_error: None,
        }
    }

    fn switch_output(&mut self, output: Output) {
        if output == self.output {
            return;
        }
        // The old voice is told to fall silent before it is dropped
        let stopped = self.cancel_gestures();
        if let Err(e) = &stopped {
            tracing::warn!("previous output did not stop cleanly: {}", e);
        }

        let voice: Box<dyn Voice> = match output {
            Output::Audio => Box::new(OscillatorVoice::default()),
            Output::Midi(port) => {
                let mut midi = MidiVoice::new();
                if let Err(e) = midi.connect(port) {
                    tracing::warn!("MIDI output unavailable: {}", e);
                    self.voice_error = Some(e.to_string());
                    return;
                }
                Box::new(midi)
            }
        };

        self.voice = voice;
        self.output = output;
        self.report(stopped);
    }

    fn cancel_gestures(&mut self) -> intervals::Result<()> {
        self.ignore_until_release = self.gesture_active;
        self.gesture_active = false;
        self.pressed = None;
        self.router.cancel(&mut self.voice)
    }

    fn handle_pointer(&mut self, response: &egui::Response) {
        let down = response.is_pointer_button_down_on();
        if self.ignore_until_release {
            // A cancelled contact stays dead until the finger lifts
            self.ignore_until_release = down;
            return;
        }

        if down {
            let Some(pos) = response.interact_pointer_pos() else {
                return;
            };
            let point = Point::new(pos.x, pos.y);
            let hit = self.router.update_highlight(point);

            // The pad under the first contact owns the press until release
            if !self.gesture_active {
                self.gesture_active = true;
                if let Some(cell) = hit {
                    self.pressed = Some(cell);
                    let result = self.router.press(cell, &mut self.voice);
                    self.report(result);
                }
            }
        } else if self.gesture_active {
            self.gesture_active = false;
            self.router.end_drag();
            if let Some(cell) = self.pressed.take() {
                let result = self.router.release(cell, &mut self.voice);
                self.report(result);
            }
        }
    }

    fn report(&mut self, result: intervals::Result<()>) {
        match result {
            Ok(()) => self.voice_error = None,
            Err(e) => self.voice_error = Some(e.to_string()),
        }
    }

    fn handle_router_events(&mut self) {
        for event in self.router.poll_events() {
            if let RouterEvent::Selected(cell) = event {
                self.selected_label = self.router.pitches().note_name(cell).ok();
            }
        }
    }

    fn draw_grid(&self, painter: &egui::Painter, layout: &HoneycombLayout) {
        let pad_fill = egui::Color32::from_rgba_unmultiplied(128, 128, 128, 102);
        let pressed_fill = egui::Color32::from_rgba_unmultiplied(0, 90, 255, 180);
        let highlight_stroke = egui::Stroke::new(3.0, egui::Color32::from_rgb(255, 165, 0));

        for note in self.router.pitches().notes() {
            let Some(region) = layout.region(note.index) else {
                continue;
            };
            let corners = layout
                .hexagon(&region)
                .iter()
                .map(|p| egui::pos2(p.x, p.y))
                .collect();

            let fill = if self.router.active() == Some(note.index) {
                pressed_fill
            } else {
                pad_fill
            };
            let stroke = if self.router.highlighted() == Some(note.index) {
                highlight_stroke
            } else {
                egui::Stroke::NONE
            };
            painter.add(egui::Shape::convex_polygon(corners, fill, stroke));

            if let Ok(name) = self.router.pitches().note_name(note.index) {
                let center = region.center();
                painter.text(
                    egui::pos2(center.x, center.y),
                    egui::Align2::CENTER_CENTER,
                    name,
                    egui::FontId::proportional(11.0),
                    egui::Color32::LIGHT_GRAY,
                );
            }
        }
    }
}

#[cfg(feature = "gui")]
impl eframe::App for InstrumentApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (escape, focused) = ctx.input(|i| (i.key_pressed(egui::Key::Escape), i.focused));
        if (escape || !focused) && (self.gesture_active || self.router.active().is_some()) {
            let result = self.cancel_gestures();
            self.report(result);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Intervals");
            ui.add_space(10.0);

            // Output selection
            let mut output_changed = None;
            ui.horizontal(|ui| {
                ui.label("Output:");
                let current = match self.output {
                    Output::Audio => "Audio".to_string(),
                    Output::Midi(i) => self
                        .available_midi_ports
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| "MIDI".to_string()),
                };
                egui::ComboBox::from_label("")
                    .selected_text(current)
                    .show_ui(ui, |ui| {
                        if ui
                            .selectable_label(self.output == Output::Audio, "Audio")
                            .clicked()
                        {
                            output_changed = Some(Output::Audio);
                        }
                        for (i, port_name) in self.available_midi_ports.iter().enumerate() {
                            if ui
                                .selectable_label(self.output == Output::Midi(i), port_name)
                                .clicked()
                            {
                                output_changed = Some(Output::Midi(i));
                            }
                        }
                    });

                ui.add_space(20.0);
                match &self.selected_label {
                    Some(name) => ui.label(format!("Selected: {}", name)),
                    None => ui.label("Selected: -"),
                };
            });

            if let Some(output) = output_changed {
                self.switch_output(output);
            }

            ui.add_space(10.0);

            let (width, height) = self.layout.total_size();
            let (response, painter) =
                ui.allocate_painter(egui::vec2(width, height), egui::Sense::click_and_drag());

            // Regions follow the painter rect, which moves on resize
            let origin = response.rect.min;
            let layout = self.layout.with_origin(Point::new(origin.x, origin.y));
            if let Err(e) = self.router.apply_layout(&layout) {
                tracing::error!("layout does not fit the grid: {}", e);
            }

            self.handle_pointer(&response);
            self.handle_router_events();
            self.draw_grid(&painter, &layout);

            if let Some(err) = &self.voice_error {
                ui.colored_label(egui::Color32::YELLOW, format!("⚠ {}", err));
            }
        });
    }
}
