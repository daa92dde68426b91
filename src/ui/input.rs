//! Keyboard and mouse input handling.
//!
//! Keys are dispatched by view, with the detail modal intercepting
//! everything while open. Mouse input only drives the card carousels:
//! press-drag-release gestures page the focused lane, with vertical
//! drags handed back to lane scrolling.

use crate::api::TimeFilter;
use crate::app::{App, AppEvent, DetailState, MapState, PosturasState, View};
use crate::ui::carousel::{DragTracker, SwipeOutcome, TAB_STRIP_STEP};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use super::board::CARD_WIDTH;
use super::helpers::{
    open_article_url, spawn_board_reload, spawn_detail_load, spawn_map_load, spawn_posturas_load,
};
use super::loop_runner::Action;

/// Handle a key press. Returns `Action::Quit` to end the event loop.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    // Ctrl+C always quits, regardless of view or modal state
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(Action::Quit);
    }

    // The modal owns the keyboard while open
    if app.detail.is_open() {
        handle_detail_input(app, code, event_tx);
        return Ok(Action::Continue);
    }

    if code == KeyCode::Char('q') {
        return Ok(Action::Quit);
    }

    // Toast dismissal works from any view
    if code == KeyCode::Char('d') && app.dismiss_newest_toast() {
        return Ok(Action::Continue);
    }

    match app.view {
        View::Board => handle_board_input(app, code, event_tx),
        View::Map => handle_map_input(app, code, event_tx),
        View::Posturas => handle_posturas_input(app, code, event_tx),
    }
    Ok(Action::Continue)
}

fn handle_detail_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('q') => app.close_detail(),
        KeyCode::Char('o') => {
            let url = match &app.detail {
                DetailState::Loaded { article } => article.url.clone(),
                _ => return,
            };
            match url {
                Some(url) => open_article_url(app, &url),
                None => app.set_status("Este artículo no tiene enlace."),
            }
        }
        KeyCode::Char('r') => {
            // Retry only makes sense from the failed state
            if let DetailState::Failed { article_id, .. } = app.detail {
                spawn_detail_load(app, article_id, event_tx);
            }
        }
        _ => {}
    }
}

fn handle_board_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Tab => cycle_category(app, true, event_tx),
        KeyCode::BackTab => cycle_category(app, false, event_tx),
        KeyCode::Char('a') => {
            if app.selection.set_category(None) {
                spawn_board_reload(app, event_tx);
            }
        }
        KeyCode::Char(']') => cycle_subcategory(app, true, event_tx),
        KeyCode::Char('[') => cycle_subcategory(app, false, event_tx),

        KeyCode::Char('1') => apply_time_filter(app, TimeFilter::H24, event_tx),
        KeyCode::Char('2') => apply_time_filter(app, TimeFilter::H48, event_tx),
        KeyCode::Char('3') => apply_time_filter(app, TimeFilter::H72, event_tx),

        KeyCode::Char('j') | KeyCode::Down => focus_lane(app, 1),
        KeyCode::Char('k') | KeyCode::Up => focus_lane(app, -1),

        KeyCode::Char('l') | KeyCode::Right => select_card(app, 1),
        KeyCode::Char('h') | KeyCode::Left => select_card(app, -1),
        KeyCode::PageDown => page_focused_carousel(app, true),
        KeyCode::PageUp => page_focused_carousel(app, false),

        // Tab strip paging (the category bar has its own chevrons)
        KeyCode::Char('.') => {
            app.tab_strip.step_right(TAB_STRIP_STEP);
            app.needs_redraw = true;
        }
        KeyCode::Char(',') => {
            app.tab_strip.step_left(TAB_STRIP_STEP);
            app.needs_redraw = true;
        }

        KeyCode::Enter => {
            if let Some(article_id) = app.selected_article_id() {
                spawn_detail_load(app, article_id, event_tx);
            }
        }
        KeyCode::Char(' ') => {
            // Toggle the event description reveal for the focused lane
            if let Some(event_id) = app.focused_event_id() {
                if !app.expanded_events.remove(&event_id) {
                    app.expanded_events.insert(event_id);
                }
                app.needs_redraw = true;
            }
        }
        KeyCode::Char('r') => spawn_board_reload(app, event_tx),
        KeyCode::Char('m') => {
            app.view = View::Map;
            spawn_map_load(app, event_tx);
        }
        KeyCode::Char('p') => {
            app.view = View::Posturas;
            spawn_posturas_load(app, event_tx);
        }
        _ => {}
    }
}

fn handle_map_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc | KeyCode::Char('b') => app.view = View::Board,
        KeyCode::Char('r') => spawn_map_load(app, event_tx),
        KeyCode::Char('1') => apply_time_filter(app, TimeFilter::H24, event_tx),
        KeyCode::Char('2') => apply_time_filter(app, TimeFilter::H48, event_tx),
        KeyCode::Char('3') => apply_time_filter(app, TimeFilter::H72, event_tx),
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Char('j') | KeyCode::Down => {
            move_map_selection(app, 1)
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('k') | KeyCode::Up => {
            move_map_selection(app, -1)
        }
        KeyCode::Enter => {
            let article_id = match &app.map {
                MapState::Ready { data, selected } => data.points.get(*selected).map(|p| p.id),
                _ => None,
            };
            if let Some(article_id) = article_id {
                spawn_detail_load(app, article_id, event_tx);
            }
        }
        _ => {}
    }
}

fn handle_posturas_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    match code {
        KeyCode::Esc | KeyCode::Char('b') => app.view = View::Board,
        KeyCode::Char('r') => spawn_posturas_load(app, event_tx),
        KeyCode::Char('j') | KeyCode::Down => move_postura_event(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_postura_event(app, -1),
        KeyCode::Char('l') | KeyCode::Right => move_postura_chip(app, 1),
        KeyCode::Char('h') | KeyCode::Left => move_postura_chip(app, -1),
        KeyCode::Enter => {
            if let Some(article_id) = selected_chip_article(app) {
                spawn_detail_load(app, article_id, event_tx);
            }
        }
        _ => {}
    }
}

/// Handle a mouse event. Only drag gestures and horizontal wheel
/// scrolling are meaningful; everything else is ignored.
pub(super) fn handle_mouse(app: &mut App, event: MouseEvent) {
    if app.view != View::Board || app.detail.is_open() {
        return;
    }
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.drag = Some(DragTracker::begin(
                i32::from(event.column),
                i32::from(event.row),
            ));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(drag) = app.drag.as_mut() {
                drag.update(i32::from(event.column), i32::from(event.row));
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if let Some(drag) = app.drag.take() {
                match drag.release() {
                    SwipeOutcome::Next => page_focused_carousel(app, true),
                    SwipeOutcome::Prev => page_focused_carousel(app, false),
                    SwipeOutcome::None => {}
                }
            }
        }
        MouseEventKind::ScrollRight => step_focused_carousel(app, true),
        MouseEventKind::ScrollLeft => step_focused_carousel(app, false),
        _ => {}
    }
}

// ----------------------------------------------------------------------
// Navigation helpers
// ----------------------------------------------------------------------

/// Cycle through None ("Todas") and the category tabs in display order.
fn cycle_category(app: &mut App, forward: bool, event_tx: &mpsc::Sender<AppEvent>) {
    let tabs: Vec<i64> = match app.visible_board() {
        Some(board) => board.tabs.iter().map(|tab| tab.id).collect(),
        None => return,
    };
    if tabs.is_empty() {
        return;
    }

    // Position 0 is "all categories", then the tabs in order
    let current = match app.selection.category_id {
        None => 0,
        Some(id) => tabs.iter().position(|t| *t == id).map_or(0, |i| i + 1),
    };
    let count = tabs.len() + 1;
    let next = if forward {
        (current + 1) % count
    } else {
        (current + count - 1) % count
    };
    let target = if next == 0 { None } else { Some(tabs[next - 1]) };

    if app.selection.set_category(target) {
        spawn_board_reload(app, event_tx);
    }
}

/// Cycle through None and the subcategory tabs of the active category.
fn cycle_subcategory(app: &mut App, forward: bool, event_tx: &mpsc::Sender<AppEvent>) {
    let subs: Vec<i64> = match app.visible_board().and_then(|b| b.subcategories.as_ref()) {
        Some(subs) => subs.iter().map(|sub| sub.id).collect(),
        None => return,
    };
    if subs.is_empty() {
        return;
    }

    let current = match app.selection.subcategory_id {
        None => 0,
        Some(id) => subs.iter().position(|s| *s == id).map_or(0, |i| i + 1),
    };
    let count = subs.len() + 1;
    let next = if forward {
        (current + 1) % count
    } else {
        (current + count - 1) % count
    };
    let target = if next == 0 { None } else { Some(subs[next - 1]) };

    if app.selection.set_subcategory(target) {
        spawn_board_reload(app, event_tx);
    }
}

/// Change the time window. The board always reloads; an active map or
/// posturas view reloads too so every visible surface agrees.
fn apply_time_filter(app: &mut App, time_filter: TimeFilter, event_tx: &mpsc::Sender<AppEvent>) {
    if !app.selection.set_time_filter(time_filter) {
        return;
    }
    spawn_board_reload(app, event_tx);
    match app.view {
        View::Map => spawn_map_load(app, event_tx),
        View::Posturas => spawn_posturas_load(app, event_tx),
        View::Board => {}
    }
}

fn focus_lane(app: &mut App, delta: i64) {
    let lane_count = match app.visible_board() {
        Some(board) => board.lanes.len(),
        None => return,
    };
    if lane_count == 0 {
        return;
    }
    let current = app.focused_lane as i64;
    app.focused_lane = (current + delta).clamp(0, lane_count as i64 - 1) as usize;
    app.needs_redraw = true;
}

fn select_card(app: &mut App, delta: i64) {
    let (event_id, card_count) = match focused_lane_info(app) {
        Some(info) => info,
        None => return,
    };
    let carousel = app.carousels.entry(event_id).or_default();
    if delta > 0 {
        carousel.select_next(card_count, CARD_WIDTH);
    } else {
        carousel.select_prev(CARD_WIDTH);
    }
    app.needs_redraw = true;
}

fn page_focused_carousel(app: &mut App, forward: bool) {
    let (event_id, _) = match focused_lane_info(app) {
        Some(info) => info,
        None => return,
    };
    let carousel = app.carousels.entry(event_id).or_default();
    if forward {
        carousel.metrics.page_right();
    } else {
        carousel.metrics.page_left();
    }
    app.needs_redraw = true;
}

fn step_focused_carousel(app: &mut App, forward: bool) {
    let (event_id, _) = match focused_lane_info(app) {
        Some(info) => info,
        None => return,
    };
    let carousel = app.carousels.entry(event_id).or_default();
    if forward {
        carousel.metrics.step_right(CARD_WIDTH);
    } else {
        carousel.metrics.step_left(CARD_WIDTH);
    }
    app.needs_redraw = true;
}

fn focused_lane_info(app: &App) -> Option<(i64, usize)> {
    app.visible_board()
        .and_then(|board| board.lanes.get(app.focused_lane))
        .map(|lane| (lane.event_id, lane.cards.len()))
}

fn move_map_selection(app: &mut App, delta: i64) {
    if let MapState::Ready { data, selected } = &mut app.map {
        let count = data.points.len() as i64;
        if count == 0 {
            return;
        }
        *selected = (*selected as i64 + delta).clamp(0, count - 1) as usize;
        app.needs_redraw = true;
    }
}

fn move_postura_event(app: &mut App, delta: i64) {
    if let PosturasState::Ready {
        eventos,
        selected,
        selected_chip,
    } = &mut app.posturas
    {
        let count = eventos.len() as i64;
        if count == 0 {
            return;
        }
        *selected = (*selected as i64 + delta).clamp(0, count - 1) as usize;
        *selected_chip = 0;
        app.needs_redraw = true;
    }
}

fn move_postura_chip(app: &mut App, delta: i64) {
    let chip_count = chip_ids(app).len() as i64;
    if chip_count == 0 {
        return;
    }
    if let PosturasState::Ready { selected_chip, .. } = &mut app.posturas {
        *selected_chip = (*selected_chip as i64 + delta).clamp(0, chip_count - 1) as usize;
        app.needs_redraw = true;
    }
}

fn selected_chip_article(app: &App) -> Option<i64> {
    let chips = chip_ids(app);
    if let PosturasState::Ready { selected_chip, .. } = &app.posturas {
        chips.get(*selected_chip).copied()
    } else {
        None
    }
}

/// Article-id chips of the selected posturas event, in render order:
/// every set-1 chip (left column, top to bottom), then every set-2 chip.
fn chip_ids(app: &App) -> Vec<i64> {
    if let PosturasState::Ready {
        eventos, selected, ..
    } = &app.posturas
    {
        if let Some(evento) = eventos.get(*selected) {
            let set_one = evento
                .posturas
                .iter()
                .flat_map(|p| p.articulos_ids_conjunto_1.iter().copied());
            let set_two = evento
                .posturas
                .iter()
                .flat_map(|p| p.articulos_ids_conjunto_2.iter().copied());
            return set_one.chain(set_two).collect();
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, RetryPolicy};
    use crate::app::BoardState;
    use crate::selection::Selection;
    use url::Url;

    fn test_app() -> App {
        let client = ApiClient::new(
            Url::parse("http://localhost:5000").unwrap(),
            reqwest::Client::new(),
            RetryPolicy::default(),
        );
        App::new(client, Selection::default())
    }

    fn board_with_tabs(app: &mut App, ids: &[i64]) {
        let categories: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({ "categoria_id": id, "nombre": format!("Cat {}", id), "article_count": 100 - id }))
            .collect();
        let tree: crate::api::CategoryTree =
            serde_json::from_value(serde_json::json!({ "categories": categories })).unwrap();
        let board = crate::view::Board::build(&tree, None, &app.selection);
        app.apply_board(board);
    }

    #[tokio::test]
    async fn tab_cycles_through_all_and_categories() {
        let mut app = test_app();
        board_with_tabs(&mut app, &[1, 2]);
        let (tx, _rx) = mpsc::channel(8);

        assert_eq!(app.selection.category_id, None);
        cycle_category(&mut app, true, &tx);
        assert_eq!(app.selection.category_id, Some(1));
        cycle_category(&mut app, true, &tx);
        assert_eq!(app.selection.category_id, Some(2));
        cycle_category(&mut app, true, &tx);
        assert_eq!(app.selection.category_id, None); // wraps back to "all"
    }

    #[tokio::test]
    async fn backtab_cycles_in_reverse() {
        let mut app = test_app();
        board_with_tabs(&mut app, &[1, 2]);
        let (tx, _rx) = mpsc::channel(8);

        cycle_category(&mut app, false, &tx);
        assert_eq!(app.selection.category_id, Some(2));
    }

    #[tokio::test]
    async fn time_filter_change_reloads_board() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        apply_time_filter(&mut app, TimeFilter::H24, &tx);
        assert!(matches!(app.board, BoardState::Loading { .. }));

        // Re-applying the same filter is a no-op
        let before = matches!(app.board, BoardState::Loading { .. });
        apply_time_filter(&mut app, TimeFilter::H24, &tx);
        assert_eq!(before, matches!(app.board, BoardState::Loading { .. }));
    }

    #[tokio::test]
    async fn tab_cycling_keeps_working_while_a_reload_is_in_flight() {
        let mut app = test_app();
        board_with_tabs(&mut app, &[1, 2]);
        let (tx, _rx) = mpsc::channel(8);

        cycle_category(&mut app, true, &tx);
        assert_eq!(app.selection.category_id, Some(1));
        assert!(matches!(app.board, BoardState::Loading { .. }));

        // The first reload has not resolved; the retained board still
        // backs the tab strip, so the next press advances the cycle
        cycle_category(&mut app, true, &tx);
        assert_eq!(app.selection.category_id, Some(2));
        assert!(app.visible_board().is_some());
    }

    #[tokio::test]
    async fn quit_key_ends_loop() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(8);
        let action = handle_input(&mut app, KeyCode::Char('q'), KeyModifiers::NONE, &tx).unwrap();
        assert!(matches!(action, Action::Quit));
    }

    #[tokio::test]
    async fn modal_swallows_navigation_keys() {
        let mut app = test_app();
        board_with_tabs(&mut app, &[1, 2]);
        app.detail = DetailState::Loading { article_id: 1 };
        let (tx, _rx) = mpsc::channel(8);

        handle_input(&mut app, KeyCode::Tab, KeyModifiers::NONE, &tx).unwrap();
        assert_eq!(app.selection.category_id, None); // unchanged

        handle_input(&mut app, KeyCode::Esc, KeyModifiers::NONE, &tx).unwrap();
        assert!(!app.detail.is_open());
    }

    #[tokio::test]
    async fn vertical_drag_never_pages() {
        let mut app = test_app();
        let mut drag = DragTracker::begin(10, 10);
        drag.update(12, 40);
        drag.update(12, 80);
        app.drag = Some(drag);

        let release = MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: 12,
            row: 80,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut app, release);
        assert!(app.drag.is_none());
    }
}
