//! Helper functions for UI operations.
//!
//! This module contains the spawn helpers that launch background fetches
//! and the panic-catching wrapper they all go through. Every helper
//! issues a fresh generation from the owning [`RequestToken`] before
//! spawning, so the event handler can discard late results from a
//! superseded fetch.

use crate::api::{ApiClient, ApiError};
use crate::app::{App, AppEvent, BoardPayload, DetailState, MapState, PosturasState};
use crate::selection::Selection;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::mpsc;

/// Extra attempts the detail fetch makes on transport-level failures
/// (the client already retries 429/5xx internally).
const DETAIL_TRANSPORT_RETRIES: u32 = 1;

/// Wraps a future to catch panics and convert them to errors.
///
/// Instead of a panicking background task silently disappearing (caught
/// by Tokio's runtime but never surfaced), panics are converted to
/// `Err(String)` containing the panic message and reported through
/// [`AppEvent::TaskPanicked`].
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Reload the board for the current selection.
///
/// Articles and subcategories are fetched concurrently and delivered in
/// a single [`AppEvent::BoardLoaded`], so the lane area and the
/// subcategory bar always change together. A failed subcategories fetch
/// degrades the bar to hidden instead of failing the whole reload.
pub(super) fn spawn_board_reload(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.board_token.issue();
    app.begin_board_reload();
    app.needs_redraw = true;

    let client = app.client.clone();
    let selection: Selection = app.selection;
    let tx = event_tx.clone();

    tracing::debug!(
        category_id = ?selection.category_id,
        subcategory_id = ?selection.subcategory_id,
        time_filter = %selection.time_filter,
        generation,
        "Spawning board reload"
    );

    tokio::spawn(async move {
        let outcome = catch_task_panic(async {
            let articles = client.fetch_articles(
                selection.category_id,
                selection.subcategory_id,
                selection.time_filter,
            );
            match selection.category_id {
                Some(category_id) => {
                    let subcategories =
                        client.fetch_subcategories(category_id, selection.time_filter);
                    let (tree, subs) = tokio::join!(articles, subcategories);
                    let subcategories = match subs {
                        Ok(subs) => Some(subs),
                        Err(e) => {
                            tracing::warn!(error = %e, "Subcategories fetch failed, hiding bar");
                            None
                        }
                    };
                    BoardPayload {
                        tree: tree.map_err(|e| e.to_string()),
                        subcategories,
                    }
                }
                None => BoardPayload {
                    tree: articles.await.map_err(|e| e.to_string()),
                    subcategories: None,
                },
            }
        })
        .await;

        let event = match outcome {
            Ok(payload) => AppEvent::BoardLoaded {
                generation,
                payload,
            },
            Err(error) => AppEvent::TaskPanicked {
                task: "board reload",
                error,
            },
        };
        if tx.send(event).await.is_err() {
            tracing::warn!("Failed to send board payload (receiver dropped)");
        }
    });
}

/// Open the detail modal for an article, fetching unless cached.
pub(super) fn spawn_detail_load(app: &mut App, article_id: i64, event_tx: &mpsc::Sender<AppEvent>) {
    // Cache hit: open instantly, no network. The previous fetch still
    // holds the current generation, so it must be aborted and the token
    // reissued or its late result would replace the cached article.
    if let Some(article) = app.detail_cache.get(&article_id) {
        tracing::debug!(article_id, "Detail served from cache");
        if let Some(handle) = app.detail_handle.take() {
            handle.abort();
        }
        app.detail_token.issue();
        app.detail = DetailState::Loaded {
            article: Box::new(article.clone()),
        };
        app.needs_redraw = true;
        return;
    }

    // Abort any previous in-flight detail fetch
    if let Some(handle) = app.detail_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous detail fetch");
    }

    let generation = app.detail_token.issue();
    app.detail = DetailState::Loading { article_id };
    app.needs_redraw = true;

    let client = app.client.clone();
    let tx = event_tx.clone();

    app.detail_handle = Some(tokio::spawn(async move {
        let outcome = catch_task_panic(fetch_detail_with_retry(client, article_id)).await;
        let event = match outcome {
            Ok(result) => AppEvent::DetailLoaded {
                article_id,
                generation,
                result: result.map(Box::new).map_err(|e| e.to_string()),
            },
            Err(error) => AppEvent::TaskPanicked {
                task: "detail fetch",
                error,
            },
        };
        if tx.send(event).await.is_err() {
            tracing::warn!("Failed to send article detail (receiver dropped)");
        }
    }));
}

/// One bounded retry on transport failures; everything else is final.
async fn fetch_detail_with_retry(
    client: ApiClient,
    article_id: i64,
) -> Result<crate::api::ArticleDetail, ApiError> {
    let mut attempt = 0;
    loop {
        match client.fetch_article(article_id).await {
            Ok(article) => return Ok(article),
            Err(e @ (ApiError::Network(_) | ApiError::Timeout))
                if attempt < DETAIL_TRANSPORT_RETRIES =>
            {
                attempt += 1;
                tracing::warn!(article_id, error = %e, attempt, "Detail fetch failed, retrying");
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Load the similarity map for the current time filter.
pub(super) fn spawn_map_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.map_token.issue();
    app.map = MapState::Loading;
    app.needs_redraw = true;

    let client = app.client.clone();
    let time_filter = app.selection.time_filter;
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let outcome = catch_task_panic(client.fetch_map_data(time_filter)).await;
        let event = match outcome {
            Ok(result) => AppEvent::MapLoaded {
                generation,
                result: result.map_err(|e| e.to_string()),
            },
            Err(error) => AppEvent::TaskPanicked {
                task: "map load",
                error,
            },
        };
        if tx.send(event).await.is_err() {
            tracing::warn!("Failed to send map data (receiver dropped)");
        }
    });
}

/// Load the stance groupings for the current selection.
pub(super) fn spawn_posturas_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let generation = app.posturas_token.issue();
    app.posturas = PosturasState::Loading;
    app.needs_redraw = true;

    let client = app.client.clone();
    let selection = app.selection;
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let outcome = catch_task_panic(client.fetch_posturas(
            selection.category_id,
            selection.subcategory_id,
            selection.time_filter,
        ))
        .await;
        let event = match outcome {
            Ok(result) => AppEvent::PosturasLoaded {
                generation,
                result: result.map_err(|e| e.to_string()),
            },
            Err(error) => AppEvent::TaskPanicked {
                task: "posturas load",
                error,
            },
        };
        if tx.send(event).await.is_err() {
            tracing::warn!("Failed to send posturas (receiver dropped)");
        }
    });
}

/// Open the source article in the system browser.
pub(super) fn open_article_url(app: &mut App, url: &str) {
    match open::that(url) {
        Ok(()) => {
            tracing::info!(url = %url, "Opened article in browser");
            app.set_status("Abriendo en el navegador...");
        }
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Failed to open browser");
            app.set_status(format!("No se pudo abrir el navegador: {}", e));
        }
    }
}
