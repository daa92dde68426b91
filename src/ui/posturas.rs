//! Posturas view: opposing stance groupings per event.
//!
//! Each event shows its two opinion sets side by side, with the article
//! ids of each set rendered as selectable chips.

use crate::app::{App, PosturasState};
use crate::api::PosturaEvent;
use crate::util::{format_short_date, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

const FALLBACK_OPINION: &str = "No opinion available";

pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    match &app.posturas {
        PosturasState::Loading => {
            let spinner = super::render::spinner_char(app.spinner_frame);
            let paragraph = Paragraph::new(format!("{} Cargando posturas...", spinner))
                .alignment(Alignment::Center);
            f.render_widget(paragraph, area);
        }
        PosturasState::Failed { error } => {
            let paragraph = Paragraph::new(format!(
                "No se pudieron cargar las posturas.\n\n{}\n\n[r] Reintentar  [b] Volver",
                error
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Red));
            f.render_widget(paragraph, area);
        }
        PosturasState::Ready { eventos, .. } if eventos.is_empty() => {
            let paragraph = Paragraph::new(
                "No hay posturas contrastadas para esta selección.\n\n[b] Volver",
            )
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
            f.render_widget(paragraph, area);
        }
        PosturasState::Ready {
            eventos,
            selected,
            selected_chip,
        } => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
                .split(area);
            render_event_list(f, eventos, *selected, chunks[0]);
            if let Some(evento) = eventos.get(*selected) {
                render_event_detail(f, evento, *selected_chip, chunks[1]);
            }
        }
    }
}

fn render_event_list(f: &mut Frame, eventos: &[PosturaEvent], selected: usize, area: Rect) {
    let items: Vec<ListItem> = eventos
        .iter()
        .enumerate()
        .map(|(i, evento)| {
            let titulo = evento.titulo.as_deref().unwrap_or("(sin título)");
            let marker = if i == selected { "▶ " } else { "  " };
            let style = if i == selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(Line::from(Span::styled(
                format!(
                    "{}{}",
                    marker,
                    truncate_to_width(titulo, area.width.saturating_sub(4) as usize)
                ),
                style,
            )))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Eventos "),
    );
    f.render_widget(list, area);
}

fn render_event_detail(f: &mut Frame, evento: &PosturaEvent, selected_chip: usize, area: Rect) {
    let header_height = 4u16.min(area.height);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(header_height), Constraint::Min(0)])
        .split(area);

    // Event header: title, scope, date
    let mut header_lines = vec![Line::from(Span::styled(
        evento.titulo.clone().unwrap_or_else(|| "(sin título)".to_string()),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    let mut scope_parts: Vec<String> = Vec::new();
    if let Some(categoria) = &evento.categoria_nombre {
        scope_parts.push(categoria.clone());
    }
    if let Some(subcategoria) = &evento.subcategoria_nombre {
        scope_parts.push(subcategoria.clone());
    }
    if let Some(fecha) = &evento.fecha {
        scope_parts.push(format_short_date(fecha));
    }
    if !scope_parts.is_empty() {
        header_lines.push(Line::from(Span::styled(
            scope_parts.join(" · "),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(descripcion) = &evento.descripcion {
        header_lines.push(Line::from(Span::styled(
            descripcion.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    f.render_widget(
        Paragraph::new(header_lines).wrap(Wrap { trim: true }),
        chunks[0],
    );

    // Two opposing columns per postura, green vs red
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    // Chips are numbered across both sets, set 1 first, matching the
    // keyboard traversal order
    let mut chip_index = 0usize;
    render_stance_column(
        f,
        evento,
        |p| (p.opinion_conjunto_1.as_deref(), &p.articulos_ids_conjunto_1),
        " Perspectiva 1 ",
        Color::Green,
        selected_chip,
        &mut chip_index,
        columns[0],
    );
    render_stance_column(
        f,
        evento,
        |p| (p.opinion_conjunto_2.as_deref(), &p.articulos_ids_conjunto_2),
        " Perspectiva 2 ",
        Color::Red,
        selected_chip,
        &mut chip_index,
        columns[1],
    );
}

#[allow(clippy::too_many_arguments)]
fn render_stance_column<'a, F>(
    f: &mut Frame,
    evento: &'a PosturaEvent,
    extract: F,
    title: &str,
    color: Color,
    selected_chip: usize,
    chip_index: &mut usize,
    area: Rect,
) where
    F: Fn(&'a crate::api::Postura) -> (Option<&'a str>, &'a Vec<i64>),
{
    let mut lines: Vec<Line> = Vec::new();
    for postura in &evento.posturas {
        let (opinion, ids) = extract(postura);
        lines.push(Line::from(opinion.unwrap_or(FALLBACK_OPINION).to_string()));
        if !ids.is_empty() {
            let mut spans: Vec<Span> = vec![Span::raw("  ")];
            for id in ids {
                let selected = *chip_index == selected_chip;
                spans.push(Span::styled(
                    format!(" {} ", id),
                    if selected {
                        Style::default().fg(Color::Black).bg(Color::White)
                    } else {
                        Style::default().fg(Color::Black).bg(color)
                    },
                ));
                spans.push(Span::raw(" "));
                *chip_index += 1;
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::default());
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title),
    );
    f.render_widget(paragraph, area);
}
