use crate::app::{App, View};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    // Use Cow to avoid allocations for static strings and borrowed status messages
    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.detail.is_open() {
        Cow::Borrowed("[Esc] cerrar [o] abrir enlace [r] reintentar")
    } else {
        match app.view {
            View::Board => Cow::Borrowed(
                "[Tab] categoría [ [ ] ] subcategoría [1/2/3] periodo [j/k] evento [h/l] artículo [Enter] detalle [m]apa [p]osturas [q] salir",
            ),
            View::Map => Cow::Borrowed(
                "[h/l] punto [Enter] detalle [1/2/3] periodo [r] recargar [b] volver [q] salir",
            ),
            View::Posturas => Cow::Borrowed(
                "[j/k] evento [h/l] artículo [Enter] detalle [r] recargar [b] volver [q] salir",
            ),
        }
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
