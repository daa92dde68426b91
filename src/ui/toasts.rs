//! Update-notification toasts, stacked in the top-right corner.
//!
//! Toasts render above every view and overlay, newest at the top of the
//! stack. They expire on the periodic tick or on manual dismissal.

use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const TOAST_WIDTH: u16 = 40;
const TOAST_HEIGHT: u16 = 4;

pub(super) fn render(f: &mut Frame, app: &App) {
    if app.toasts.is_empty() {
        return;
    }
    let area = f.area();
    if area.width < TOAST_WIDTH + 2 {
        return;
    }
    let x = area.x + area.width - TOAST_WIDTH - 1;

    // Newest first, stacked downward, as many as fit
    for (i, toast) in app.toasts.iter().rev().enumerate() {
        let y = area.y + 1 + (i as u16) * TOAST_HEIGHT;
        if y + TOAST_HEIGHT > area.y + area.height.saturating_sub(1) {
            break;
        }
        let toast_area = Rect::new(x, y, TOAST_WIDTH, TOAST_HEIGHT);
        f.render_widget(Clear, toast_area);

        let title_line = Line::from(vec![
            Span::styled(
                toast.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", toast.time),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let paragraph = Paragraph::new(vec![title_line, Line::from(toast.body.clone())])
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" [d] descartar "),
            );
        f.render_widget(paragraph, toast_area);
    }
}
