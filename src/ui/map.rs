//! 2-D similarity map view.
//!
//! Articles are plotted as a scatter chart in their projected
//! coordinates, colored per newspaper, with the keyboard-selected point
//! drawn on top. A sidebar shows the selected article, the cluster
//! keywords, and the visualized-article count.

use crate::app::{App, MapState};
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};
use std::collections::BTreeMap;

/// Palette cycled across newspapers.
const SERIES_COLORS: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::Blue,
    Color::Red,
    Color::LightCyan,
    Color::LightGreen,
];

pub(super) fn render(f: &mut Frame, app: &App, area: Rect) {
    match &app.map {
        MapState::Loading => {
            let spinner = super::render::spinner_char(app.spinner_frame);
            let paragraph = Paragraph::new(format!("{} Generando mapa de similitud...", spinner))
                .alignment(Alignment::Center);
            f.render_widget(paragraph, area);
        }
        MapState::Empty { message } => {
            let paragraph = Paragraph::new(format!("{}\n\n[r] Reintentar  [b] Volver", message))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(paragraph, area);
        }
        MapState::Failed { error } => {
            let paragraph = Paragraph::new(format!(
                "No se pudo generar el mapa.\n\n{}\n\n[r] Reintentar  [b] Volver",
                error
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Red));
            f.render_widget(paragraph, area);
        }
        MapState::Ready { data, selected } => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(area);
            render_chart(f, data, *selected, chunks[0]);
            render_sidebar(f, data, *selected, chunks[1]);
        }
    }
}

fn render_chart(f: &mut Frame, data: &crate::api::MapData, selected: usize, area: Rect) {
    // Stable per-newspaper grouping so colors don't shuffle on reload
    let mut series: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for point in &data.points {
        let key = point
            .periodico
            .clone()
            .unwrap_or_else(|| "Desconocido".to_string());
        series.entry(key).or_default().push(point.coordinates);
    }

    let (x_bounds, y_bounds) = axis_bounds(&data.points);

    let mut datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, (name, points))| {
            Dataset::default()
                .name(name.as_str())
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(points)
        })
        .collect();

    // The selected point rides on top with a heavier marker
    let selected_data = data
        .points
        .get(selected)
        .map(|p| vec![p.coordinates])
        .unwrap_or_default();
    datasets.push(
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .data(&selected_data),
    );

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Mapa de similitud "),
        )
        .x_axis(Axis::default().bounds([x_bounds.0, x_bounds.1]))
        .y_axis(Axis::default().bounds([y_bounds.0, y_bounds.1]));
    f.render_widget(chart, area);
}

fn render_sidebar(f: &mut Frame, data: &crate::api::MapData, selected: usize, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        format!("Artículos visualizados: {}", data.points.len()),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::default());

    if let Some(point) = data.points.get(selected) {
        lines.push(Line::from(Span::styled(
            truncate_to_width(&point.titular, inner_width),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        if let Some(periodico) = &point.periodico {
            lines.push(Line::from(Span::styled(
                truncate_to_width(periodico, inner_width),
                Style::default().fg(Color::Gray),
            )));
        }
        if let Some(categoria) = &point.categoria {
            let scope = match &point.subcategoria {
                Some(sub) => format!("{} · {}", categoria, sub),
                None => categoria.clone(),
            };
            lines.push(Line::from(Span::styled(
                truncate_to_width(&scope, inner_width),
                Style::default().fg(Color::DarkGray),
            )));
        }
        if let Some(resumen) = &point.resumen {
            lines.push(Line::default());
            lines.push(Line::from(resumen.clone()));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "[Enter] Abrir artículo",
            Style::default().fg(Color::Cyan),
        )));
    }

    if !data.clusters.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Temas",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for cluster in &data.clusters {
            lines.push(Line::from(format!(
                "· {}",
                truncate_to_width(&cluster.keyword, inner_width.saturating_sub(2))
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Detalle "));
    f.render_widget(paragraph, area);
}

/// Axis bounds with a small margin so edge points stay visible.
fn axis_bounds(points: &[crate::api::MapPoint]) -> ((f64, f64), (f64, f64)) {
    let mut x = (f64::MAX, f64::MIN);
    let mut y = (f64::MAX, f64::MIN);
    for point in points {
        let (px, py) = point.coordinates;
        x = (x.0.min(px), x.1.max(px));
        y = (y.0.min(py), y.1.max(py));
    }
    if points.is_empty() {
        return ((0.0, 1.0), (0.0, 1.0));
    }
    let x_margin = ((x.1 - x.0) * 0.05).max(0.5);
    let y_margin = ((y.1 - y.0) * 0.05).max(0.5);
    ((x.0 - x_margin, x.1 + x_margin), (y.0 - y_margin, y.1 + y_margin))
}
