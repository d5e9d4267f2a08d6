// SPDX-License-Identifier: GPL-3.0-only

//! Terminal photo booth
//!
//! Runs the wizard in the terminal, rendering images with Unicode half-block
//! characters for improved vertical resolution.

use crate::app::{Message, Step, Wizard, WizardRuntime};
use crate::app::{CaptureMessage, Control, SeparationMessage};
use crate::backends::camera::StillImageCamera;
use crate::backends::separation::BorderKeySeparator;
use crate::config::Config;
use crate::storage;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

/// Run the terminal wizard, using `input` as the camera feed
pub fn run(config: Config, input: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    let camera = Arc::new(StillImageCamera::from_path(input));
    let separator = Arc::new(BorderKeySeparator::new(config.separation));
    // Fail before touching the terminal if the camera cannot be opened
    let wizard = Wizard::new(config, camera, separator)?;
    let mut runtime = WizardRuntime::new(wizard, rt.handle().clone());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut runtime, &rt);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Decoded images, keyed by artifact id so they are decoded once
#[derive(Default)]
struct ImageCache {
    frame: Option<(Uuid, RgbaImage)>,
    cutout: Option<(Uuid, RgbaImage)>,
}

impl ImageCache {
    fn frame(&mut self, frame: &crate::backends::camera::CapturedFrame) -> Option<&RgbaImage> {
        if self.frame.as_ref().map(|(id, _)| *id) != Some(frame.id) {
            self.frame = frame.decode().ok().map(|image| (frame.id, image));
        }
        self.frame.as_ref().map(|(_, image)| image)
    }

    fn cutout(&mut self, cutout: &crate::backends::separation::CutoutImage) -> Option<&RgbaImage> {
        if self.cutout.as_ref().map(|(id, _)| *id) != Some(cutout.id) {
            self.cutout = cutout.decode().ok().map(|image| (cutout.id, image));
        }
        self.cutout.as_ref().map(|(_, image)| image)
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &mut WizardRuntime,
    rt: &tokio::runtime::Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cache = ImageCache::default();
    let mut notice: Option<String> = None;
    let mut saved = false;

    loop {
        // Apply finished ticks and separation outcomes
        runtime.pump()?;

        if runtime.wizard().finished() && !saved {
            saved = true;
            notice = Some(save_finished(runtime.wizard(), rt));
        }

        let screen = build_screen(runtime.wizard_mut(), &mut cache, notice.as_deref());

        terminal.draw(|f| {
            let area = f.area();
            f.render_widget(&screen, area);
        })?;

        // Handle input with timeout so countdown updates keep rendering
        if event::poll(Duration::from_millis(33))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            if key.code == KeyCode::Char('q') {
                break;
            }

            let step = runtime.wizard().step();
            if let Some(message) = key_message(step, key.code) {
                if let Err(e) = runtime.dispatch(message) {
                    error!("Wizard update failed: {}", e);
                    notice = Some(format!("Error: {}", e));
                }
                saved = saved && runtime.wizard().finished();
            }
        }
    }

    Ok(())
}

/// Map a key press to a wizard message for the active step
fn key_message(step: Step, code: KeyCode) -> Option<Message> {
    let message = match (step, code) {
        (Step::Capture, KeyCode::Char(' ')) => Message::Capture(CaptureMessage::TriggerCapture),
        (Step::Capture, KeyCode::Char('r')) => Message::Capture(CaptureMessage::Retake),
        (Step::Capture, KeyCode::Enter) => Message::Capture(CaptureMessage::Confirm),
        (Step::RemoveBackground, KeyCode::Char('x')) => {
            Message::Separation(SeparationMessage::RemoveBackground)
        }
        (Step::RemoveBackground, KeyCode::Enter) => {
            Message::Separation(SeparationMessage::Confirm)
        }
        (Step::RemoveBackground, KeyCode::Char('b')) => {
            Message::Separation(SeparationMessage::Back)
        }
        _ => return None,
    };
    Some(message)
}

fn save_finished(wizard: &Wizard, rt: &tokio::runtime::Runtime) -> String {
    let Some(frame) = wizard.frame() else {
        return String::new();
    };
    let output_dir = wizard.config().output_directory();
    match rt.block_on(storage::save_session(frame, wizard.cutout(), &output_dir)) {
        Ok(saved) => {
            info!(path = %saved.photo.display(), "Session saved");
            format!("Saved to {}", output_dir.display())
        }
        Err(e) => {
            error!("Failed to save session: {}", e);
            format!("Error: {}", e)
        }
    }
}

/// Everything one frame of the UI shows
struct Screen {
    title: &'static str,
    tip: &'static str,
    panels: Vec<Panel>,
    countdown: Option<u32>,
    controls: Vec<(&'static str, Control)>,
    error: Option<String>,
}

struct Panel {
    caption: &'static str,
    image: Option<RgbaImage>,
    checkerboard: bool,
    placeholder: &'static str,
}

fn build_screen(wizard: &mut Wizard, cache: &mut ImageCache, notice: Option<&str>) -> Screen {
    let step = wizard.step();
    let mut screen = Screen {
        title: step.title(),
        tip: step.tip(),
        panels: Vec::new(),
        countdown: None,
        controls: Vec::new(),
        error: notice.map(str::to_string),
    };

    if let Some(capture) = wizard.capture_mut() {
        let controls = capture.controls();
        screen.countdown = capture.countdown_display();
        // Preview and frame are mutually exclusive
        let image = match capture.frame().cloned() {
            Some(frame) => cache.frame(&frame).cloned(),
            None => capture.preview(),
        };
        screen.panels.push(Panel {
            caption: "",
            image,
            checkerboard: false,
            placeholder: "Waiting for camera...",
        });
        push_control(&mut screen.controls, "Space", controls.capture);
        push_control(&mut screen.controls, "r", controls.retake);
        push_control(&mut screen.controls, "Enter", controls.confirm);
    } else if let Some(separation) = wizard.separation() {
        let controls = separation.controls();
        screen.panels.push(Panel {
            caption: "Original",
            image: cache.frame(separation.frame()).cloned(),
            checkerboard: false,
            placeholder: "",
        });
        screen.panels.push(Panel {
            caption: "Cutout",
            image: separation
                .cutout()
                .and_then(|cutout| cache.cutout(cutout).cloned()),
            checkerboard: true,
            placeholder: separation.status_text(),
        });
        if let Some(message) = separation.error() {
            screen.error = Some(message.to_string());
        }
        push_control(&mut screen.controls, "b", Some(controls.back));
        push_control(&mut screen.controls, "x", controls.remove_background);
        push_control(&mut screen.controls, "Enter", controls.confirm);
    }

    screen
}

fn push_control(
    controls: &mut Vec<(&'static str, Control)>,
    key: &'static str,
    control: Option<Control>,
) {
    if let Some(control) = control {
        controls.push((key, control));
    }
}

impl Widget for &Screen {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 4 {
            return;
        }

        buf.set_string(
            area.x,
            area.y,
            self.title,
            Style::default().fg(Color::White),
        );
        buf.set_string(
            area.x,
            area.y + 1,
            self.tip,
            Style::default().fg(Color::Gray),
        );

        // Two lines of header, error line and status bar at the bottom
        let body = Rect {
            x: area.x,
            y: area.y + 2,
            width: area.width,
            height: area.height.saturating_sub(4),
        };
        let count = self.panels.len().max(1) as u16;
        let panel_width = body.width / count;
        for (index, panel) in self.panels.iter().enumerate() {
            let panel_area = Rect {
                x: body.x + panel_width * index as u16,
                y: body.y,
                width: panel_width,
                height: body.height,
            };
            render_panel(panel, panel_area, buf);
        }

        if let Some(remaining) = self.countdown {
            let text = format!(" {} ", remaining);
            let x = body.x + body.width.saturating_sub(text.len() as u16) / 2;
            let y = body.y + body.height / 2;
            buf.set_string(
                x,
                y,
                &text,
                Style::default().fg(Color::Black).bg(Color::Yellow),
            );
        }

        if let Some(error) = &self.error {
            buf.set_string(
                area.x,
                area.y + area.height - 2,
                truncate(error, area.width),
                Style::default().fg(Color::Red),
            );
        }

        let message = status_message(&self.controls);
        let status = StatusBar { message: &message };
        status.render(
            Rect {
                x: area.x,
                y: area.y + area.height - 1,
                width: area.width,
                height: 1,
            },
            buf,
        );
    }
}

fn render_panel(panel: &Panel, area: Rect, buf: &mut Buffer) {
    if area.height < 2 || area.width < 2 {
        return;
    }
    let image_area = if panel.caption.is_empty() {
        area
    } else {
        buf.set_string(area.x, area.y, panel.caption, Style::default().fg(Color::Gray));
        Rect {
            y: area.y + 1,
            height: area.height - 1,
            ..area
        }
    };

    match &panel.image {
        Some(image) => FrameWidget {
            image,
            checkerboard: panel.checkerboard,
        }
        .render(image_area, buf),
        None => {
            let msg = truncate(panel.placeholder, image_area.width);
            let x = image_area.x + (image_area.width.saturating_sub(msg.chars().count() as u16)) / 2;
            let y = image_area.y + image_area.height / 2;
            buf.set_string(x, y, msg, Style::default());
        }
    }
}

fn status_message(controls: &[(&'static str, Control)]) -> String {
    let mut parts: Vec<String> = controls
        .iter()
        .map(|(key, control)| {
            if control.enabled {
                format!("'{}' {}", key, control.label)
            } else {
                format!("({})", control.label)
            }
        })
        .collect();
    parts.push("'q' quit".to_string());
    parts.join(" | ")
}

fn truncate(text: &str, width: u16) -> &str {
    match text.char_indices().nth(width as usize) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Widget that renders an image using half-block characters
struct FrameWidget<'a> {
    image: &'a RgbaImage,
    /// Blend transparent pixels over a checkerboard
    checkerboard: bool,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top = self.sample(src_x, src_y_top, tx, ty * 2);
                let bottom = self.sample(src_x, src_y_bottom, tx, ty * 2 + 1);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

impl FrameWidget<'_> {
    /// Colour of image pixel (x, y) shown at display position (dx, dy)
    fn sample(&self, x: u32, y: u32, dx: u16, dy: u16) -> Color {
        let x = x.min(self.image.width() - 1);
        let y = y.min(self.image.height() - 1);
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        if !self.checkerboard || a == 255 {
            return Color::Rgb(r, g, b);
        }

        let backdrop = if (dx / 2 + dy / 2) % 2 == 0 { 200.0 } else { 150.0 };
        let alpha = a as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + backdrop * (1.0 - alpha)) as u8;
        Color::Rgb(blend(r), blend(g), blend(b))
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_string(
            area.x,
            area.y,
            truncate(self.message, area.width),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
