//! Control surface
//!
//! Holds the state of the on-screen controls (per-channel pitch fields, wave
//! shape selector, filter and gain sliders) and turns key presses into
//! [`SignalGraph`] calls.
//!
//! Keys:
//! - `Up`/`Down`, `Tab`/`BackTab`: move between controls
//! - pitch fields: type, `Backspace` to edit, `Enter` to apply
//! - sliders and the shape selector: `Left`/`Right`, `PageUp`/`PageDown` for big steps
//! - `F5` or `Ctrl+P` play, `F6` or `Ctrl+S` stop
//! - `Esc` or `Ctrl+C` quit

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, warn};

use crate::config::{slider_to_cutoff_hz, slider_to_gain, ToneConfig};
use crate::engine::SignalGraph;
use crate::error::Error;
use crate::pitch;
use crate::synth::{Waveform, MAX_RESONANCE, MIN_RESONANCE};

/// Resonance change per step
pub const RESONANCE_STEP: f64 = 0.5;

/// A focusable control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pitch(usize),
    Shape,
    Cutoff,
    Resonance,
    Gain,
}

/// What the caller should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Severity of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
}

/// Message shown under the controls
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

/// Control state bound to a signal graph
pub struct ControlSurface {
    pitch_text: Vec<String>,
    shape: Waveform,
    cutoff: u8,
    resonance: f64,
    gain: u8,
    focus: usize,
    status: Option<Status>,
}

impl ControlSurface {
    /// Mirror the initial control values of a configuration
    pub fn new(config: &ToneConfig) -> Self {
        Self {
            pitch_text: config.channels.clone(),
            shape: config.master.waveform,
            cutoff: config.filter.cutoff.min(100),
            resonance: config.filter.resonance,
            gain: config.master.gain.min(100),
            focus: 0,
            status: None,
        }
    }

    /// All controls in focus order
    pub fn fields(&self) -> Vec<Field> {
        (0..self.pitch_text.len())
            .map(Field::Pitch)
            .chain([Field::Shape, Field::Cutoff, Field::Resonance, Field::Gain])
            .collect()
    }

    pub fn focused(&self) -> Field {
        self.fields()[self.focus]
    }

    pub fn pitch_text(&self, id: usize) -> Option<&str> {
        self.pitch_text.get(id).map(String::as_str)
    }

    pub fn shape(&self) -> Waveform {
        self.shape
    }

    pub fn cutoff_slider(&self) -> u8 {
        self.cutoff
    }

    pub fn resonance(&self) -> f64 {
        self.resonance
    }

    pub fn gain_slider(&self) -> u8 {
        self.gain
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Move focus forward or backward, wrapping around
    pub fn move_focus(&mut self, forward: bool) {
        let count = self.fields().len();
        self.focus = if forward {
            (self.focus + 1) % count
        } else {
            (self.focus + count - 1) % count
        };
    }

    /// Resolve channel `id`'s text and retune it; a bad entry only affects that channel
    pub fn commit_pitch(&mut self, id: usize, graph: &mut SignalGraph) {
        let Some(text) = self.pitch_text.get(id) else {
            return;
        };

        if !pitch::is_strict(text) {
            debug!(channel = id, input = %text, "pitch text does not start with a note letter");
        }

        let result = pitch::resolve(text)
            .map_err(Error::from)
            .and_then(|hz| graph.set_channel_frequency(id, hz).map(|_| hz));

        match result {
            Ok(hz) => self.set_status(StatusLevel::Info, format!("channel {}: {:.2} Hz", id + 1, hz)),
            Err(err) => {
                warn!(channel = id, "{}", err);
                self.set_status(StatusLevel::Warning, format!("channel {}: {}", id + 1, err));
            }
        }
    }

    pub fn set_shape(&mut self, shape: Waveform, graph: &mut SignalGraph) {
        self.shape = shape;
        graph.set_wave_shape(shape);
    }

    /// Move the cutoff slider (0-100, 20 Hz per step)
    pub fn set_cutoff_slider(&mut self, position: u8, graph: &mut SignalGraph) {
        self.cutoff = position.min(100);
        self.report(graph.set_filter_cutoff(slider_to_cutoff_hz(self.cutoff)));
    }

    pub fn set_resonance(&mut self, q: f64, graph: &mut SignalGraph) {
        self.resonance = q.clamp(MIN_RESONANCE, MAX_RESONANCE);
        self.report(graph.set_filter_resonance(self.resonance));
    }

    /// Move the gain slider (0-100 maps to 0.0-1.0)
    pub fn set_gain_slider(&mut self, position: u8, graph: &mut SignalGraph) {
        self.gain = position.min(100);
        self.report(graph.set_master_gain(slider_to_gain(self.gain)));
    }

    pub fn play(&mut self, graph: &mut SignalGraph) {
        graph.play();
        self.set_status(StatusLevel::Info, "playing".to_string());
    }

    pub fn stop(&mut self, graph: &mut SignalGraph) {
        graph.stop();
        self.set_status(StatusLevel::Info, "stopped".to_string());
    }

    /// Apply one key event
    pub fn handle_key(&mut self, key: KeyEvent, graph: &mut SignalGraph) -> Action {
        if key.kind == KeyEventKind::Release {
            return Action::Continue;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::Char('c') if ctrl => return Action::Quit,
            KeyCode::F(5) => self.play(graph),
            KeyCode::Char('p') if ctrl => self.play(graph),
            KeyCode::F(6) => self.stop(graph),
            KeyCode::Char('s') if ctrl => self.stop(graph),
            KeyCode::Down | KeyCode::Tab => self.move_focus(true),
            KeyCode::Up | KeyCode::BackTab => self.move_focus(false),
            code => self.edit_focused(code, graph),
        }

        Action::Continue
    }

    fn edit_focused(&mut self, code: KeyCode, graph: &mut SignalGraph) {
        match (self.focused(), code) {
            (Field::Pitch(id), KeyCode::Enter) => self.commit_pitch(id, graph),
            (Field::Pitch(id), KeyCode::Backspace) => {
                if let Some(text) = self.pitch_text.get_mut(id) {
                    text.pop();
                }
            }
            (Field::Pitch(id), KeyCode::Char(c)) => {
                if let Some(text) = self.pitch_text.get_mut(id) {
                    text.push(c);
                }
            }
            (Field::Shape, KeyCode::Right) => self.set_shape(self.shape.next(), graph),
            (Field::Shape, KeyCode::Left) => self.set_shape(self.shape.prev(), graph),
            (Field::Cutoff, code) => {
                if let Some(delta) = slider_delta(code) {
                    self.set_cutoff_slider(step(self.cutoff, delta), graph);
                }
            }
            (Field::Gain, code) => {
                if let Some(delta) = slider_delta(code) {
                    self.set_gain_slider(step(self.gain, delta), graph);
                }
            }
            (Field::Resonance, code) => {
                if let Some(delta) = slider_delta(code) {
                    let q = self.resonance + f64::from(delta) * RESONANCE_STEP;
                    self.set_resonance(q, graph);
                }
            }
            _ => {}
        }
    }

    fn report(&mut self, result: crate::error::Result<()>) {
        if let Err(err) = result {
            warn!("{}", err);
            self.set_status(StatusLevel::Warning, err.to_string());
        }
    }

    fn set_status(&mut self, level: StatusLevel, text: String) {
        self.status = Some(Status { level, text });
    }
}

fn slider_delta(code: KeyCode) -> Option<i16> {
    match code {
        KeyCode::Right => Some(1),
        KeyCode::Left => Some(-1),
        KeyCode::PageUp => Some(10),
        KeyCode::PageDown => Some(-10),
        _ => None,
    }
}

fn step(position: u8, delta: i16) -> u8 {
    (i16::from(position) + delta).clamp(0, 100) as u8
}
