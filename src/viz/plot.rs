//! Scope plot widget for ratatui

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Line},
        Block, Widget,
    },
};

use super::ScopeFrame;

/// A widget that draws a scope frame as a connected line
pub struct ScopePlot<'a> {
    frame: &'a ScopeFrame,
    color: Color,
    block: Option<Block<'a>>,
}

impl<'a> ScopePlot<'a> {
    pub fn new(frame: &'a ScopeFrame) -> Self {
        Self {
            frame,
            color: Color::Reset,
            block: None,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for ScopePlot<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = self.frame;
        let color = self.color;
        let height = frame.height();

        // Frame y grows downward, canvas y grows upward
        let mut canvas = Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, frame.width()])
            .y_bounds([0.0, height])
            .paint(move |ctx| {
                for ((x1, y1), (x2, y2)) in frame.segments() {
                    ctx.draw(&Line::new(x1, height - y1, x2, height - y2, color));
                }
            });

        if let Some(block) = self.block {
            canvas = canvas.block(block);
        }

        canvas.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SILENCE;

    fn drawn_cells(buf: &Buffer) -> usize {
        buf.content().iter().filter(|cell| cell.symbol() != " ").count()
    }

    #[test]
    fn test_plot_flat_line() {
        let frame = ScopeFrame::from_bytes(&[SILENCE; 32], 20.0, 10.0);
        let area = Rect::new(0, 0, 20, 10);
        let mut buf = Buffer::empty(area);
        ScopePlot::new(&frame).render(area, &mut buf);

        assert!(drawn_cells(&buf) > 0);
    }

    #[test]
    fn test_plot_with_block() {
        let bytes: Vec<u8> = (0..64).map(|i| (i * 4) as u8).collect();
        let frame = ScopeFrame::from_bytes(&bytes, 40.0, 12.0);
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);
        ScopePlot::new(&frame)
            .block(Block::bordered().title("Scope"))
            .color(Color::Cyan)
            .render(area, &mut buf);

        assert!(drawn_cells(&buf) > 0);
    }

    #[test]
    fn test_plot_empty_area() {
        let frame = ScopeFrame::from_bytes(&[SILENCE; 8], 10.0, 10.0);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        ScopePlot::new(&frame).render(area, &mut buf);
        // Should not panic
    }
}
