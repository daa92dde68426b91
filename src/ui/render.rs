//! Render functions for the TUI.
//!
//! This module handles rendering dispatch: view selection, the terminal
//! size guard, and the overlay stack (detail modal, then toasts on top).

use crate::app::{App, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    widgets::Paragraph,
    Frame,
};

use super::{board, detail, map, posturas, status, toasts};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

const SPINNER_GLYPHS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Number of frames in the loading spinner animation.
pub(super) const SPINNER_FRAMES: usize = SPINNER_GLYPHS.len();

pub(super) fn spinner_char(frame: usize) -> char {
    SPINNER_GLYPHS[frame % SPINNER_FRAMES]
}

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Muy pequeño")
        } else {
            Paragraph::new(format!(
                "Terminal demasiado pequeño\n\nMínimo: {}x{}\nActual: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.view {
        View::Board => board::render(f, app, chunks[0]),
        View::Map => map::render(f, app, chunks[0]),
        View::Posturas => posturas::render(f, app, chunks[0]),
    }
    status::render(f, app, chunks[1]);

    // Overlays, bottom to top: modal first, toasts above everything
    if app.detail.is_open() {
        detail::render(f, app);
    }
    toasts::render(f, app);
}
