//! Board view: category tab strip, subcategory bar, and event lanes
//! with horizontally scrolling article cards.

use crate::app::{App, BoardState};
use crate::util::truncate_to_width;
use crate::view::EventLane;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Width of one article card in terminal cells, gap included.
pub(super) const CARD_WIDTH: usize = 32;

/// Height of one event lane: header line plus the card boxes.
const LANE_HEIGHT: u16 = 6;

/// Card box height inside a lane.
const CARD_HEIGHT: u16 = 5;

pub(super) fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let has_subcategory_bar = app
        .visible_board()
        .is_some_and(|board| board.subcategories.is_some());

    let constraints = if has_subcategory_bar {
        vec![
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ]
    } else {
        vec![Constraint::Length(1), Constraint::Min(0)]
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_tab_strip(f, app, chunks[0]);
    if has_subcategory_bar {
        render_subcategory_bar(f, app, chunks[1]);
        render_content(f, app, chunks[2]);
    } else {
        render_content(f, app, chunks[1]);
    }
}

/// Category tabs: "Todas" plus one tab per category, horizontally
/// scrollable with chevrons past the fold.
fn render_tab_strip(f: &mut Frame, app: &mut App, area: Rect) {
    let (labels, active_index) = match app.visible_board() {
        Some(board) => {
            let mut labels: Vec<(String, bool)> = vec![(
                "Todas".to_string(),
                app.selection.category_id.is_none(),
            )];
            for tab in &board.tabs {
                labels.push((
                    format!("{} ({})", tab.nombre, tab.article_count),
                    app.selection.category_id == Some(tab.id),
                ));
            }
            let active = labels.iter().position(|(_, a)| *a).unwrap_or(0);
            (labels, active)
        }
        None => (vec![("Todas".to_string(), true)], 0),
    };

    // Total strip width and the extent of the active tab, for
    // scroll-into-view before applying the offset.
    let mut spans: Vec<Span> = Vec::new();
    let mut cursor = 0usize;
    let mut active_extent = (0usize, 0usize);
    for (i, (label, active)) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
            cursor += 3;
        }
        let width = label.width();
        if i == active_index {
            active_extent = (cursor, width);
        }
        let style = if *active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(label.clone(), style));
        cursor += width;
    }

    // One cell reserved on each side for the chevrons
    let viewport = area.width.saturating_sub(2) as usize;
    app.tab_strip.reattach(viewport, cursor);
    app.tab_strip.scroll_into_view(active_extent.0, active_extent.1);

    let strip_area = Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), 1);
    let paragraph =
        Paragraph::new(Line::from(spans)).scroll((0, app.tab_strip.offset as u16));
    f.render_widget(paragraph, strip_area);

    let chevron_style = Style::default().fg(Color::Cyan);
    if app.tab_strip.left_chevron() {
        f.render_widget(
            Paragraph::new(Span::styled("‹", chevron_style)),
            Rect::new(area.x, area.y, 1, 1),
        );
    }
    if app.tab_strip.right_chevron() {
        f.render_widget(
            Paragraph::new(Span::styled("›", chevron_style)),
            Rect::new(area.x + area.width - 1, area.y, 1, 1),
        );
    }
}

fn render_subcategory_bar(f: &mut Frame, app: &App, area: Rect) {
    let board = match app.visible_board() {
        Some(board) => board,
        None => return,
    };
    let subs = match &board.subcategories {
        Some(subs) => subs,
        None => return,
    };

    let mut spans: Vec<Span> = vec![Span::styled(
        "  Subcategorías: ",
        Style::default().fg(Color::DarkGray),
    )];
    let todas_active = app.selection.subcategory_id.is_none();
    spans.push(Span::styled(
        "Todas",
        if todas_active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Gray)
        },
    ));
    for sub in subs {
        spans.push(Span::raw("  "));
        let active = app.selection.subcategory_id == Some(sub.id);
        spans.push(Span::styled(
            format!("{} ({})", sub.nombre, sub.article_count),
            if active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::Gray)
            },
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_content(f: &mut Frame, app: &mut App, area: Rect) {
    if let BoardState::Failed { error } = &app.board {
        let paragraph = Paragraph::new(format!(
            "No se pudieron cargar los artículos.\n\n{}\n\n[r] Reintentar",
            error
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Red));
        f.render_widget(paragraph, area);
        return;
    }

    // During a reload the retained board keeps rendering, so switching
    // categories never flashes an empty content area
    let board_empty = match app.visible_board() {
        Some(board) => board.is_empty(),
        None => {
            let spinner = super::render::spinner_char(app.spinner_frame);
            let paragraph = Paragraph::new(format!("{} Cargando artículos...", spinner))
                .alignment(Alignment::Center);
            f.render_widget(paragraph, centered_line(area));
            return;
        }
    };

    if board_empty {
        let paragraph = Paragraph::new(
            "No hay artículos para esta selección.\n\nPrueba otro periodo con [1] [2] [3].",
        )
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        f.render_widget(paragraph, area);
    } else {
        render_lanes(f, app, area);
    }
}

fn render_lanes(f: &mut Frame, app: &mut App, area: Rect) {
    let lane_count = match app.visible_board() {
        Some(board) => board.lanes.len(),
        None => return,
    };
    let visible = (area.height / LANE_HEIGHT).max(1) as usize;

    // Keep the focused lane on screen
    let start = if app.focused_lane >= visible {
        app.focused_lane + 1 - visible
    } else {
        0
    };
    let end = (start + visible).min(lane_count);

    for (slot, lane_index) in (start..end).enumerate() {
        let lane_area = Rect::new(
            area.x,
            area.y + (slot as u16) * LANE_HEIGHT,
            area.width,
            LANE_HEIGHT.min(area.height - (slot as u16) * LANE_HEIGHT),
        );
        render_lane(f, app, lane_index, lane_area);
    }
}

fn render_lane(f: &mut Frame, app: &mut App, lane_index: usize, area: Rect) {
    let (lane, focused) = {
        let board = match app.visible_board() {
            Some(board) => board,
            None => return,
        };
        let lane = match board.lanes.get(lane_index) {
            Some(lane) => lane.clone(),
            None => return,
        };
        (lane, lane_index == app.focused_lane)
    };

    render_lane_header(f, &lane, focused, Rect::new(area.x, area.y, area.width, 1));
    if area.height <= 1 {
        return;
    }
    let body = Rect::new(area.x, area.y + 1, area.width, area.height - 1);

    if app.expanded_events.contains(&lane.event_id) {
        let text = if lane.descripcion.is_empty() {
            "Sin descripción.".to_string()
        } else {
            lane.descripcion.clone()
        };
        let paragraph = Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Gray));
        f.render_widget(paragraph, body);
        return;
    }

    render_cards(f, app, &lane, focused, body);
}

fn render_lane_header(f: &mut Frame, lane: &EventLane, focused: bool, area: Rect) {
    let marker = if focused { "▶ " } else { "  " };
    let mut spans = vec![
        Span::styled(
            marker,
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            lane.titulo.clone(),
            if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            },
        ),
        Span::styled(
            format!("  ({} artículos)", lane.article_count),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if !lane.fecha.is_empty() {
        spans.push(Span::styled(
            format!("  {}", lane.fecha),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_cards(f: &mut Frame, app: &mut App, lane: &EventLane, focused: bool, area: Rect) {
    // One cell each side for the chevrons
    let viewport = area.width.saturating_sub(2) as usize;
    let carousel = app.carousels.entry(lane.event_id).or_default();
    carousel.reattach(viewport, lane.cards.len(), CARD_WIDTH);
    let metrics = carousel.metrics;
    let selected = carousel.selected;

    for (i, card) in lane.cards.iter().enumerate() {
        let card_start = i * CARD_WIDTH;
        // Only fully visible cards are drawn; scroll_into_view keeps the
        // selected one among them
        if card_start < metrics.offset || card_start + CARD_WIDTH > metrics.offset + viewport {
            continue;
        }
        let x = area.x + 1 + (card_start - metrics.offset) as u16;
        let card_area = Rect::new(x, area.y, (CARD_WIDTH - 1) as u16, CARD_HEIGHT.min(area.height));
        render_card(f, card, focused && i == selected, card_area);
    }

    let chevron_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    if metrics.left_chevron() {
        f.render_widget(
            Paragraph::new(Span::styled("‹", chevron_style)),
            Rect::new(area.x, area.y + area.height / 2, 1, 1),
        );
    }
    if metrics.right_chevron() {
        f.render_widget(
            Paragraph::new(Span::styled("›", chevron_style)),
            Rect::new(area.x + area.width - 1, area.y + area.height / 2, 1, 1),
        );
    }
}

fn render_card(f: &mut Frame, card: &crate::view::CardView, selected: bool, area: Rect) {
    if area.width < 4 || area.height < 3 {
        return;
    }
    let border_style = if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let inner_width = area.width.saturating_sub(2) as usize;

    let mut title = truncate_to_width(&card.periodico, inner_width.saturating_sub(2));
    if card.paywall {
        // Padlock marks paywalled sources on the card itself
        title = truncate_to_width(
            &format!("🔒 {}", card.periodico),
            inner_width.saturating_sub(2),
        );
    }

    let mut lines = vec![Line::from(truncate_to_width(&card.titular, inner_width))];
    if !card.fecha.is_empty() {
        lines.push(Line::from(Span::styled(
            truncate_to_width(&card.fecha, inner_width),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    f.render_widget(paragraph, area);
}

fn centered_line(area: Rect) -> Rect {
    Rect::new(area.x, area.y + area.height / 2, area.width, 1)
}
