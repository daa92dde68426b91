//! Article detail modal.
//!
//! A centered overlay above the current view. Every metadata field has a
//! fixed fallback so the layout never jumps between articles, matching
//! the card grid's placeholder behavior.

use crate::app::{App, DetailState};
use crate::util::{format_short_date, split_keywords, truncate_to_width};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const FALLBACK_SUMMARY: &str = "No summary available";
const FALLBACK_OPINION: &str = "No opinion available";
const FALLBACK_KEYWORDS: &str = "No keywords available";

pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    let width = 78u16.min(area.width.saturating_sub(4));
    let height = (area.height * 4 / 5).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay = Rect::new(x, y, width, height);

    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);

    match &app.detail {
        DetailState::Closed => {}
        DetailState::Loading { article_id } => {
            let spinner = super::render::spinner_char(app.spinner_frame);
            let paragraph = Paragraph::new(format!("{} Cargando artículo {}...", spinner, article_id))
                .alignment(Alignment::Center)
                .block(modal_block(" Artículo "));
            f.render_widget(paragraph, overlay);
        }
        DetailState::Failed { error, .. } => {
            let paragraph = Paragraph::new(format!(
                "No se pudo cargar el artículo.\n\n{}\n\n[r] Reintentar  [Esc] Cerrar",
                error
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Red))
            .block(modal_block(" Artículo "));
            f.render_widget(paragraph, overlay);
        }
        DetailState::Loaded { article } => {
            let inner_width = overlay.width.saturating_sub(4) as usize;
            let mut lines: Vec<Line> = Vec::new();

            // Paywall banner sits above everything else
            if article.paywall {
                lines.push(Line::from(Span::styled(
                    " Contenido de pago — puede requerir suscripción ",
                    Style::default().fg(Color::Black).bg(Color::Yellow),
                )));
                lines.push(Line::default());
            }

            lines.push(Line::from(Span::styled(
                article.titular.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            if let Some(subtitular) = &article.subtitular {
                lines.push(Line::from(Span::styled(
                    subtitular.clone(),
                    Style::default().fg(Color::Gray),
                )));
            }
            lines.push(Line::default());

            let periodico = article
                .periodico_nombre
                .as_deref()
                .unwrap_or("Periódico desconocido");
            let fecha = article
                .fecha_publicacion
                .as_deref()
                .map(format_short_date)
                .unwrap_or_default();
            let mut byline = format!("{}  {}", periodico, fecha);
            if let Some(periodista) = &article.periodista {
                byline.push_str(&format!("  ·  {}", periodista));
            }
            if let Some(agencia) = &article.agencia {
                byline.push_str(&format!("  ({})", agencia));
            }
            lines.push(Line::from(Span::styled(
                truncate_to_width(&byline, inner_width),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::default());

            lines.push(section_header("Resumen"));
            lines.push(Line::from(
                article
                    .gpt_resumen
                    .clone()
                    .unwrap_or_else(|| FALLBACK_SUMMARY.to_string()),
            ));
            lines.push(Line::default());

            lines.push(section_header("Opinión"));
            lines.push(Line::from(
                article
                    .gpt_opinion
                    .clone()
                    .unwrap_or_else(|| FALLBACK_OPINION.to_string()),
            ));
            lines.push(Line::default());

            lines.push(section_header("Palabras clave"));
            let keywords = article
                .gpt_palabras_clave
                .as_deref()
                .map(split_keywords)
                .unwrap_or_default();
            if keywords.is_empty() {
                lines.push(Line::from(FALLBACK_KEYWORDS));
            } else {
                let mut spans: Vec<Span> = Vec::new();
                for (i, keyword) in keywords.iter().enumerate() {
                    if i > 0 {
                        spans.push(Span::raw(" "));
                    }
                    spans.push(Span::styled(
                        format!(" {} ", keyword),
                        Style::default().fg(Color::Black).bg(Color::Cyan),
                    ));
                }
                lines.push(Line::from(spans));
            }
            lines.push(Line::default());

            let fuentes = article.gpt_cantidad_fuentes_citadas.unwrap_or(0);
            lines.push(Line::from(Span::styled(
                format!("{} fuentes citadas", fuentes),
                Style::default().fg(Color::DarkGray),
            )));

            // URL row hidden entirely when the article has no link
            if let Some(url) = &article.url {
                lines.push(Line::default());
                lines.push(Line::from(vec![
                    Span::styled("[o] Abrir: ", Style::default().fg(Color::Cyan)),
                    Span::styled(
                        truncate_to_width(url, inner_width.saturating_sub(11)),
                        Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                    ),
                ]));
            }

            let paragraph = Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(modal_block(" Artículo  [Esc] Cerrar "));
            f.render_widget(paragraph, overlay);
        }
    }
}

fn modal_block(title: &str) -> Block {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title.to_string())
}

fn section_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}
