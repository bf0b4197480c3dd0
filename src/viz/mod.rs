//! Terminal UI for tonescope
//!
//! Provides a TUI showing:
//! - Oscilloscope trace of the mixed output
//! - Channel pitch fields, shape selector and sliders
//! - Status line with playback state and the last message

mod plot;
mod scope;

pub use plot::ScopePlot;
pub use scope::{Frames, ScopeFrame, ScopeSampler};

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tracing::info;

use crate::config::{slider_to_cutoff_hz, slider_to_gain};
use crate::control::{Action, ControlSurface, Field, StatusLevel};
use crate::engine::SignalGraph;

/// Run the TUI until the user quits
///
/// The terminal is restored even when drawing or input handling fails.
pub fn run_viz(graph: &mut SignalGraph, surface: &mut ControlSurface, fps: u32) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }

    let result = Terminal::new(CrosstermBackend::new(stdout))
        .map_err(anyhow::Error::from)
        .and_then(|mut terminal| {
            let result = event_loop(&mut terminal, graph, surface, fps);
            let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
            let _ = terminal.show_cursor();
            result
        });

    disable_raw_mode()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    graph: &mut SignalGraph,
    surface: &mut ControlSurface,
    fps: u32,
) -> Result<()> {
    let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    let mut sampler = ScopeSampler::new(graph.analysis(), 1.0, 1.0);
    info!("Display running at {} fps", fps);

    loop {
        let tick = Instant::now();
        terminal.draw(|f| draw_ui(f, graph, surface, &mut sampler))?;

        // Handle input until the next frame is due
        while let Some(remaining) = interval.checked_sub(tick.elapsed()) {
            if !event::poll(remaining)? {
                break;
            }
            if let Event::Key(key) = event::read()? {
                if surface.handle_key(key, graph) == Action::Quit {
                    return Ok(());
                }
            }
        }
    }
}

/// Draw one frame of the UI
pub fn draw_ui(f: &mut Frame, graph: &SignalGraph, surface: &ControlSurface, sampler: &mut ScopeSampler) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),    // Scope
            Constraint::Length(controls_height(surface)),
            Constraint::Length(3), // Status
        ])
        .split(area);

    draw_scope(f, chunks[0], sampler);
    draw_controls(f, chunks[1], graph, surface);
    draw_status(f, chunks[2], graph, surface);
}

fn controls_height(surface: &ControlSurface) -> u16 {
    surface.fields().len() as u16 + 2
}

fn draw_scope(f: &mut Frame, area: Rect, sampler: &mut ScopeSampler) {
    let block = Block::default().borders(Borders::ALL).title(" Scope ");
    let inner = block.inner(area);

    // One abstract unit per braille dot
    sampler.resize(f64::from(inner.width) * 2.0, f64::from(inner.height) * 4.0);
    let frame = sampler.next_frame();

    let plot = ScopePlot::new(&frame).color(Color::Cyan).block(block);
    f.render_widget(plot, area);
}

fn draw_controls(f: &mut Frame, area: Rect, graph: &SignalGraph, surface: &ControlSurface) {
    let focused = surface.focused();
    let lines: Vec<Line> = surface
        .fields()
        .into_iter()
        .map(|field| control_line(field, field == focused, graph, surface))
        .collect();

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Controls "));
    f.render_widget(paragraph, area);
}

fn control_line<'a>(field: Field, focused: bool, graph: &SignalGraph, surface: &'a ControlSurface) -> Line<'a> {
    let (label, value) = match field {
        Field::Pitch(id) => {
            let hz = graph
                .channel(id)
                .map(|c| format!("  ({:.2} Hz)", c.frequency_hz))
                .unwrap_or_default();
            (
                format!("Channel {}", id + 1),
                format!("{}{}{}", surface.pitch_text(id).unwrap_or(""), if focused { "_" } else { "" }, hz),
            )
        }
        Field::Shape => ("Shape".to_string(), format!("< {} >", surface.shape())),
        Field::Cutoff => (
            "Cutoff".to_string(),
            format!("{} {:.0} Hz", slider_bar(surface.cutoff_slider()), slider_to_cutoff_hz(surface.cutoff_slider())),
        ),
        Field::Resonance => ("Resonance".to_string(), format!("{:.1}", surface.resonance())),
        Field::Gain => (
            "Gain".to_string(),
            format!("{} {:.2}", slider_bar(surface.gain_slider()), slider_to_gain(surface.gain_slider())),
        ),
    };

    let style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let marker = if focused { "> " } else { "  " };

    Line::from(vec![
        Span::styled(format!("{}{:<11}", marker, label), style),
        Span::raw(value),
    ])
}

/// 20-character bar for a 0-100 slider
fn slider_bar(position: u8) -> String {
    let filled = usize::from(position.min(100)) / 5;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled))
}

fn draw_status(f: &mut Frame, area: Rect, graph: &SignalGraph, surface: &ControlSurface) {
    let (state, state_color) = if graph.is_playing() {
        ("PLAYING", Color::Green)
    } else {
        ("STOPPED", Color::Yellow)
    };

    let mut spans = vec![
        Span::raw("  "),
        Span::styled(state, Style::default().fg(state_color)),
        Span::raw("  |  F5: play  F6: stop  Enter: apply  Esc: quit"),
    ];

    if let Some(status) = surface.status() {
        let color = match status.level {
            StatusLevel::Info => Color::Gray,
            StatusLevel::Warning => Color::Red,
        };
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(status.text.clone(), Style::default().fg(color)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToneConfig;
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_slider_bar() {
        assert_eq!(slider_bar(0), format!("[{}]", "-".repeat(20)));
        assert_eq!(slider_bar(50), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
        assert_eq!(slider_bar(100), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn test_draw_ui() {
        let config = ToneConfig::default();
        let graph = SignalGraph::new(44100.0, &config);
        let surface = ControlSurface::new(&config);
        let mut sampler = ScopeSampler::new(graph.analysis(), 1.0, 1.0);

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, &graph, &surface, &mut sampler)).unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Scope"));
        assert!(text.contains("Channel 1"));
        assert!(text.contains("1000 Hz"));
        assert!(text.contains("STOPPED"));
    }

    #[test]
    fn test_draw_reflects_playing() {
        let config = ToneConfig::default();
        let mut graph = SignalGraph::new(44100.0, &config);
        let surface = ControlSurface::new(&config);
        let mut sampler = ScopeSampler::new(graph.analysis(), 1.0, 1.0);
        graph.play();

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, &graph, &surface, &mut sampler)).unwrap();
        assert!(screen_text(&terminal).contains("PLAYING"));
    }
}
