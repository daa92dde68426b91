//! Central application state and the background-task event protocol.
//!
//! Mirrors the flow of the whole client: user input mutates
//! [`crate::selection::Selection`], spawn helpers issue fetches tagged
//! with a generation from the matching [`RequestToken`], and
//! [`AppEvent`]s carry results back to the single-threaded event loop,
//! which drops anything stale before touching state.

use crate::api::{ApiClient, ArticleDetail, ArticleUpdate, MapData, PosturaEvent, Subcategory};
use crate::selection::{RequestToken, Selection};
use crate::ui::carousel::{CarouselState, DragTracker, ScrollMetrics};
use crate::util::{format_clock_time, strip_control_chars};
use crate::view::Board;
use lru::LruCache;
use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long a status-bar message stays visible.
pub const STATUS_DURATION_MS: u64 = 4000;

/// How long a toast stays before auto-dismissal.
pub const TOAST_DURATION_MS: u64 = 5000;

/// Recently viewed article details kept in memory (transient only).
const DETAIL_CACHE_SIZE: usize = 64;

/// Resize recomputation debounce window.
pub const RESIZE_DEBOUNCE_MS: u64 = 100;

// ============================================================================
// Views and Sub-States
// ============================================================================

/// Which full-screen view is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Category tabs, subcategory bar, event lanes.
    Board,
    /// 2-D similarity map.
    Map,
    /// Stance groupings per event.
    Posturas,
}

/// Loading state of the board content area.
pub enum BoardState {
    /// Reload in flight. The outgoing board is retained so the tab strip
    /// and lanes stay on screen and navigable until the new one lands.
    Loading { previous: Option<Board> },
    Ready(Board),
    /// Articles fetch failed; retry re-issues the exact same selection.
    Failed { error: String },
}

/// Detail modal lifecycle: closed → loading → loaded | failed → closed.
///
/// Closing drops all fields, so stale content can never flash on the
/// next open.
pub enum DetailState {
    Closed,
    Loading { article_id: i64 },
    Loaded { article: Box<ArticleDetail> },
    Failed { article_id: i64, error: String },
}

impl DetailState {
    pub fn is_open(&self) -> bool {
        !matches!(self, DetailState::Closed)
    }
}

pub enum MapState {
    Loading,
    Ready { data: MapData, selected: usize },
    /// Backend reported `no_articles` (or zero points): a message with a
    /// retry affordance, not an error.
    Empty { message: String },
    Failed { error: String },
}

pub enum PosturasState {
    Loading,
    Ready {
        eventos: Vec<PosturaEvent>,
        selected: usize,
        /// Index into the flattened article-id chips of the selected event.
        selected_chip: usize,
    },
    Failed { error: String },
}

// ============================================================================
// Toasts
// ============================================================================

/// One stacked update notification.
pub struct Toast {
    pub id: u64,
    pub title: String,
    pub body: String,
    /// Localized `HH:MM` from the update payload.
    pub time: String,
    pub shown_at: Instant,
}

// ============================================================================
// Background Task Events
// ============================================================================

/// Outcome of the joined board reload (articles + subcategories).
pub struct BoardPayload {
    /// The article tree, or the error for the inline retry state.
    pub tree: Result<crate::api::CategoryTree, String>,
    /// `None` when no category is active *or* the subcategories fetch
    /// failed; the bar degrades to hidden either way.
    pub subcategories: Option<Vec<Subcategory>>,
}

/// Events from background tasks.
pub enum AppEvent {
    /// Joined board reload resolved. Carries both halves so the
    /// subcategory bar and the lanes update atomically.
    BoardLoaded {
        generation: u64,
        payload: BoardPayload,
    },
    /// Article detail resolved for the modal.
    DetailLoaded {
        article_id: i64,
        generation: u64,
        result: Result<Box<ArticleDetail>, String>,
    },
    /// Similarity map resolved.
    MapLoaded {
        generation: u64,
        result: Result<crate::api::MapLoad, String>,
    },
    /// Posturas list resolved.
    PosturasLoaded {
        generation: u64,
        result: Result<Vec<PosturaEvent>, String>,
    },
    /// Poller found article updates; one toast per item.
    UpdatesPolled { updates: Vec<ArticleUpdate> },
    /// A background task panicked.
    TaskPanicked { task: &'static str, error: String },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state, owned by the event loop.
pub struct App {
    pub client: ApiClient,
    pub selection: Selection,
    pub view: View,

    // Board
    pub board: BoardState,
    pub board_token: RequestToken,
    /// Focused event lane (vertical position in the board).
    pub focused_lane: usize,
    /// Per-event scroll/selection state, keyed by event id so offsets
    /// survive a re-render of the same events and are pruned otherwise.
    pub carousels: HashMap<i64, CarouselState>,
    /// Compact category tab strip, paged by a fixed step.
    pub tab_strip: ScrollMetrics,
    /// Events currently showing their description instead of the cards.
    pub expanded_events: HashSet<i64>,

    // Detail modal
    pub detail: DetailState,
    pub detail_token: RequestToken,
    /// Abort handle for the in-flight detail fetch, if any.
    pub detail_handle: Option<JoinHandle<()>>,
    pub detail_cache: LruCache<i64, ArticleDetail>,

    // Map
    pub map: MapState,
    pub map_token: RequestToken,

    // Posturas
    pub posturas: PosturasState,
    pub posturas_token: RequestToken,

    // Toasts
    pub toasts: Vec<Toast>,
    next_toast_id: u64,

    // Status bar message with expiry; Cow avoids allocating for literals
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    pub needs_redraw: bool,
    pub spinner_frame: usize,
    /// Active drag gesture, if the mouse button is down.
    pub drag: Option<DragTracker>,
    /// Set on terminal resize; consumed by the debounced tick handler.
    pub pending_resize: Option<Instant>,
}

impl App {
    pub fn new(client: ApiClient, selection: Selection) -> Self {
        App {
            client,
            selection,
            view: View::Board,
            board: BoardState::Loading { previous: None },
            board_token: RequestToken::default(),
            focused_lane: 0,
            carousels: HashMap::new(),
            tab_strip: ScrollMetrics::default(),
            expanded_events: HashSet::new(),
            detail: DetailState::Closed,
            detail_token: RequestToken::default(),
            detail_handle: None,
            detail_cache: LruCache::new(
                NonZeroUsize::new(DETAIL_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
            map: MapState::Loading,
            map_token: RequestToken::default(),
            posturas: PosturasState::Loading,
            posturas_token: RequestToken::default(),
            toasts: Vec::new(),
            next_toast_id: 0,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            drag: None,
            pending_resize: None,
        }
    }

    // ------------------------------------------------------------------
    // Board accessors
    // ------------------------------------------------------------------

    pub fn board_ready(&self) -> Option<&Board> {
        match &self.board {
            BoardState::Ready(board) => Some(board),
            _ => None,
        }
    }

    /// The board to render and navigate: the ready one, or the retained
    /// previous board while a reload is in flight.
    pub fn visible_board(&self) -> Option<&Board> {
        match &self.board {
            BoardState::Ready(board) => Some(board),
            BoardState::Loading { previous } => previous.as_ref(),
            BoardState::Failed { .. } => None,
        }
    }

    /// Enter the loading state, carrying the current board over so the
    /// view does not collapse while the reload is in flight.
    pub fn begin_board_reload(&mut self) {
        let previous = match std::mem::replace(
            &mut self.board,
            BoardState::Loading { previous: None },
        ) {
            BoardState::Ready(board) => Some(board),
            BoardState::Loading { previous } => previous,
            BoardState::Failed { .. } => None,
        };
        self.board = BoardState::Loading { previous };
    }

    /// Install a freshly built board, pruning carousel state for events
    /// that no longer exist and clamping what survives.
    pub fn apply_board(&mut self, board: Board) {
        let lane_ids: HashSet<i64> = board.lanes.iter().map(|lane| lane.event_id).collect();
        self.carousels.retain(|event_id, _| lane_ids.contains(event_id));
        self.expanded_events
            .retain(|event_id| lane_ids.contains(event_id));
        if self.focused_lane >= board.lanes.len() {
            self.focused_lane = board.lanes.len().saturating_sub(1);
        }
        self.board = BoardState::Ready(board);
    }

    /// Event id of the focused lane, if a board is visible and non-empty.
    pub fn focused_event_id(&self) -> Option<i64> {
        self.visible_board()
            .and_then(|board| board.lanes.get(self.focused_lane))
            .map(|lane| lane.event_id)
    }

    /// Article id of the selected card in the focused lane.
    pub fn selected_article_id(&self) -> Option<i64> {
        let board = self.visible_board()?;
        let lane = board.lanes.get(self.focused_lane)?;
        let carousel = self.carousels.get(&lane.event_id).copied().unwrap_or_default();
        lane.cards
            .get(carousel.selected)
            .map(|card| card.article_id)
    }

    // ------------------------------------------------------------------
    // Status and toasts
    // ------------------------------------------------------------------

    pub fn set_status(&mut self, message: impl Into<Cow<'static, str>>) {
        self.status_message = Some((message.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Drop an expired status message. Returns true when one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, shown_at)) = &self.status_message {
            if shown_at.elapsed().as_millis() as u64 >= STATUS_DURATION_MS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Stack one toast per update item.
    pub fn push_update_toasts(&mut self, updates: &[ArticleUpdate]) {
        for update in updates {
            let id = self.next_toast_id;
            self.next_toast_id = self.next_toast_id.wrapping_add(1);
            self.toasts.push(Toast {
                id,
                title: "Artículo actualizado".to_string(),
                body: format!(
                    "\"{}\" ha sido actualizado.",
                    strip_control_chars(&update.titular)
                ),
                time: format_clock_time(update.updated_on.as_deref()),
                shown_at: Instant::now(),
            });
        }
        if !updates.is_empty() {
            self.needs_redraw = true;
        }
    }

    /// Auto-dismiss toasts past their lifetime. Returns true when any
    /// were removed.
    pub fn expire_toasts(&mut self) -> bool {
        let before = self.toasts.len();
        self.toasts
            .retain(|toast| (toast.shown_at.elapsed().as_millis() as u64) < TOAST_DURATION_MS);
        before != self.toasts.len()
    }

    /// Manually dismiss the newest toast. Returns true when one existed.
    pub fn dismiss_newest_toast(&mut self) -> bool {
        self.toasts.pop().is_some()
    }

    // ------------------------------------------------------------------
    // Detail modal
    // ------------------------------------------------------------------

    /// Close the modal and abort any in-flight fetch, resetting every
    /// field to its empty default.
    pub fn close_detail(&mut self) {
        if let Some(handle) = self.detail_handle.take() {
            handle.abort();
        }
        // Invalidate any response still in the channel
        self.detail_token.issue();
        self.detail = DetailState::Closed;
        self.needs_redraw = true;
    }
}
