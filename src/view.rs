//! Pure view-model construction for the board.
//!
//! [`Board::build`] is the single code path that turns a fetched payload
//! into what the content area shows. It is total and idempotent: the same
//! payload always yields the same board, every tie in the sort order is
//! broken by id, and every missing optional field gets a defined
//! placeholder here rather than at render time. The ratatui layer only
//! draws what this module produced; it never re-derives ordering or
//! fallbacks on its own.

use crate::api::{ArticleRef, CategoryNode, CategoryTree, EventNode, Subcategory, SubcategoryNode};
use crate::selection::Selection;
use crate::util::{date_sort_key, format_short_date, strip_control_chars};
use std::cmp::Reverse;

/// Placeholder shown for cards without a newspaper name.
const UNKNOWN_PERIODICO: &str = "Periódico desconocido";

/// One category tab in the top strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTab {
    pub id: i64,
    pub nombre: String,
    pub article_count: u64,
}

/// One subcategory tab in the secondary strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcategoryTab {
    pub id: i64,
    pub nombre: String,
    pub article_count: u64,
}

/// A horizontal strip of article cards for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLane {
    pub event_id: i64,
    pub titulo: String,
    pub descripcion: String,
    /// Pre-formatted display date, empty when the event has none.
    pub fecha: String,
    pub article_count: u64,
    pub cards: Vec<CardView>,
}

/// One article card inside an event lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub article_id: i64,
    pub titular: String,
    pub periodico: String,
    pub fecha: String,
    pub paywall: bool,
}

/// The complete, deterministically ordered content of the board view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Category tabs, descending by article count.
    pub tabs: Vec<CategoryTab>,
    /// Subcategory tab bar; `None` hides the bar entirely (no category
    /// selected, or the subcategories fetch failed and degraded).
    pub subcategories: Option<Vec<SubcategoryTab>>,
    /// Event lanes of the active scope, flattened across subcategories.
    pub lanes: Vec<EventLane>,
}

impl Board {
    /// Build the board from a fetched payload and the current selection.
    ///
    /// `subcategory_bar` is the joined `/api/subcategories` response for
    /// the active category; `None` degrades the bar to hidden without
    /// affecting the lanes.
    pub fn build(
        tree: &CategoryTree,
        subcategory_bar: Option<&[Subcategory]>,
        selection: &Selection,
    ) -> Board {
        let mut tabs: Vec<CategoryTab> = tree
            .categories
            .iter()
            .map(|category| CategoryTab {
                id: category.categoria_id,
                nombre: strip_control_chars(&category.nombre),
                article_count: category_count(category),
            })
            .collect();
        tabs.sort_by_key(|tab| (Reverse(tab.article_count), tab.id));

        let subcategories = subcategory_bar.map(|subs| {
            let mut bar: Vec<SubcategoryTab> = subs
                .iter()
                .map(|sub| SubcategoryTab {
                    id: sub.id,
                    nombre: strip_control_chars(&sub.nombre),
                    article_count: sub.article_count,
                })
                .collect();
            bar.sort_by_key(|tab| (Reverse(tab.article_count), tab.id));
            bar
        });

        // Lanes follow the tab order, so the flattening itself is
        // deterministic regardless of payload order.
        let mut ordered_categories: Vec<&CategoryNode> = tree.categories.iter().collect();
        ordered_categories
            .sort_by_key(|category| (Reverse(category_count(category)), category.categoria_id));

        let mut lanes = Vec::new();
        for category in ordered_categories {
            if let Some(selected) = selection.category_id {
                if category.categoria_id != selected {
                    continue;
                }
            }
            let mut subcats: Vec<&SubcategoryNode> = category
                .subcategories
                .iter()
                .filter(|sub| match (selection.subcategory_id, sub.subcategoria_id) {
                    // Payload ids may be absent; the server already
                    // applied the filter then, so keep the node.
                    (Some(selected), Some(id)) => id == selected,
                    _ => true,
                })
                .collect();
            subcats.sort_by_key(|sub| {
                (
                    Reverse(subcategory_count(sub)),
                    sub.subcategoria_id.unwrap_or(i64::MAX),
                )
            });

            for sub in subcats {
                let mut events: Vec<&EventNode> = sub.events.iter().collect();
                events.sort_by(|a, b| {
                    event_count(b)
                        .cmp(&event_count(a))
                        .then_with(|| {
                            date_sort_key(b.fecha_evento.as_deref())
                                .cmp(&date_sort_key(a.fecha_evento.as_deref()))
                        })
                        .then_with(|| a.evento_id.cmp(&b.evento_id))
                });
                for event in events {
                    lanes.push(build_lane(event));
                }
            }
        }

        Board {
            tabs,
            subcategories,
            lanes,
        }
    }

    /// Whether the content area should show the explicit empty state.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

fn build_lane(event: &EventNode) -> EventLane {
    // Newest first; ties broken by id for deterministic rebuilds
    let mut articles: Vec<&ArticleRef> = event.articles.iter().collect();
    articles.sort_by(|a, b| {
        date_sort_key(b.fecha_publicacion.as_deref())
            .cmp(&date_sort_key(a.fecha_publicacion.as_deref()))
            .then_with(|| a.id.cmp(&b.id))
    });

    let cards: Vec<CardView> = articles
        .into_iter()
        .map(|article| CardView {
            article_id: article.id,
            titular: strip_control_chars(&article.titular),
            periodico: article
                .periodico_nombre
                .as_deref()
                .map(strip_control_chars)
                .unwrap_or_else(|| UNKNOWN_PERIODICO.to_string()),
            fecha: article
                .fecha_publicacion
                .as_deref()
                .map(format_short_date)
                .unwrap_or_default(),
            paywall: article.paywall,
        })
        .collect();

    EventLane {
        event_id: event.evento_id,
        titulo: strip_control_chars(&event.titulo),
        descripcion: event
            .descripcion
            .as_deref()
            .map(strip_control_chars)
            .unwrap_or_default(),
        fecha: event
            .fecha_evento
            .as_deref()
            .map(format_short_date)
            .unwrap_or_default(),
        article_count: event_count(event),
        cards,
    }
}

/// Category article count: the payload value, or the sum of its nested
/// subcategory counts when absent.
fn category_count(category: &CategoryNode) -> u64 {
    category.article_count.unwrap_or_else(|| {
        category
            .subcategories
            .iter()
            .map(subcategory_count)
            .sum()
    })
}

fn subcategory_count(sub: &SubcategoryNode) -> u64 {
    sub.article_count
        .unwrap_or_else(|| sub.events.iter().map(event_count).sum())
}

fn event_count(event: &EventNode) -> u64 {
    event
        .article_count
        .unwrap_or_else(|| event.articles.len() as u64)
}
