//! Background task event processing.
//!
//! Every event carries the generation it was spawned under; results from
//! a superseded generation are logged and dropped, never applied. That
//! single rule makes rapid tab-switching and repeated opens safe: the
//! newest request always wins regardless of network ordering.

use crate::api::MapLoad;
use crate::app::{App, AppEvent, BoardState, DetailState, MapState, PosturasState};
use crate::view::Board;

pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::BoardLoaded {
            generation,
            payload,
        } => {
            if !app.board_token.is_current(generation) {
                tracing::debug!(generation, "Discarding stale board payload");
                return;
            }
            match payload.tree {
                Ok(tree) => {
                    let board =
                        Board::build(&tree, payload.subcategories.as_deref(), &app.selection);
                    tracing::debug!(
                        tabs = board.tabs.len(),
                        lanes = board.lanes.len(),
                        "Board loaded"
                    );
                    app.apply_board(board);
                }
                Err(error) => {
                    tracing::error!(error = %error, "Board reload failed");
                    app.board = BoardState::Failed { error };
                }
            }
        }

        AppEvent::DetailLoaded {
            article_id,
            generation,
            result,
        } => {
            if !app.detail_token.is_current(generation) {
                tracing::debug!(article_id, generation, "Discarding stale article detail");
                return;
            }
            // The modal may have been closed while the fetch was in flight
            if !app.detail.is_open() {
                tracing::debug!(article_id, "Detail arrived after close, discarding");
                return;
            }
            app.detail_handle = None;
            match result {
                Ok(article) => {
                    app.detail_cache.put(article_id, (*article).clone());
                    app.detail = DetailState::Loaded { article };
                }
                Err(error) => {
                    tracing::error!(article_id, error = %error, "Detail fetch failed");
                    app.detail = DetailState::Failed { article_id, error };
                }
            }
        }

        AppEvent::MapLoaded { generation, result } => {
            if !app.map_token.is_current(generation) {
                tracing::debug!(generation, "Discarding stale map data");
                return;
            }
            app.map = match result {
                Ok(MapLoad::Data(data)) if data.points.is_empty() => MapState::Empty {
                    message: "No hay artículos en este periodo.".to_string(),
                },
                Ok(MapLoad::Data(data)) => MapState::Ready { data, selected: 0 },
                Ok(MapLoad::Empty { message }) => MapState::Empty { message },
                Err(error) => {
                    tracing::error!(error = %error, "Map load failed");
                    MapState::Failed { error }
                }
            };
        }

        AppEvent::PosturasLoaded { generation, result } => {
            if !app.posturas_token.is_current(generation) {
                tracing::debug!(generation, "Discarding stale posturas");
                return;
            }
            app.posturas = match result {
                Ok(eventos) => PosturasState::Ready {
                    eventos,
                    selected: 0,
                    selected_chip: 0,
                },
                Err(error) => {
                    tracing::error!(error = %error, "Posturas load failed");
                    PosturasState::Failed { error }
                }
            };
        }

        AppEvent::UpdatesPolled { updates } => {
            tracing::info!(count = updates.len(), "Showing update notifications");
            app.push_update_toasts(&updates);
        }

        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.set_status(format!("Error interno en {}: {}", task, error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, CategoryTree, RetryPolicy};
    use crate::app::BoardPayload;
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

    fn tree_with_category(id: i64, nombre: &str) -> CategoryTree {
        serde_json::from_value(serde_json::json!({
            "categories": [{ "categoria_id": id, "nombre": nombre }]
        }))
        .unwrap()
    }

    #[test]
    fn stale_board_payload_is_discarded() {
        let mut app = test_app();
        let stale = app.board_token.issue();
        let current = app.board_token.issue();

        // The newer reload resolves first
        handle_app_event(
            &mut app,
            AppEvent::BoardLoaded {
                generation: current,
                payload: BoardPayload {
                    tree: Ok(tree_with_category(2, "Economía")),
                    subcategories: None,
                },
            },
        );
        // Then the stale one lands; it must not overwrite
        handle_app_event(
            &mut app,
            AppEvent::BoardLoaded {
                generation: stale,
                payload: BoardPayload {
                    tree: Ok(tree_with_category(1, "Política")),
                    subcategories: None,
                },
            },
        );

        let board = app.board_ready().expect("board should be ready");
        assert_eq!(board.tabs.len(), 1);
        assert_eq!(board.tabs[0].nombre, "Economía");
    }

    #[test]
    fn board_error_becomes_failed_state() {
        let mut app = test_app();
        let generation = app.board_token.issue();
        handle_app_event(
            &mut app,
            AppEvent::BoardLoaded {
                generation,
                payload: BoardPayload {
                    tree: Err("HTTP error: status 500".to_string()),
                    subcategories: None,
                },
            },
        );
        assert!(matches!(app.board, BoardState::Failed { .. }));
    }

    #[test]
    fn detail_after_close_is_discarded() {
        let mut app = test_app();
        let generation = app.detail_token.issue();
        app.detail = DetailState::Loading { article_id: 7 };
        app.close_detail();

        let article: crate::api::ArticleDetail =
            serde_json::from_value(serde_json::json!({ "id": 7, "titular": "Titular" })).unwrap();
        handle_app_event(
            &mut app,
            AppEvent::DetailLoaded {
                article_id: 7,
                generation,
                result: Ok(Box::new(article)),
            },
        );
        assert!(!app.detail.is_open());
    }

    #[test]
    fn stale_detail_never_overwrites_newer_request() {
        let mut app = test_app();
        // Open article 5, then article 7 before 5 resolves
        let gen_five = app.detail_token.issue();
        let gen_seven = app.detail_token.issue();
        app.detail = DetailState::Loading { article_id: 7 };

        let five: crate::api::ArticleDetail =
            serde_json::from_value(serde_json::json!({ "id": 5, "titular": "Viejo" })).unwrap();
        handle_app_event(
            &mut app,
            AppEvent::DetailLoaded {
                article_id: 5,
                generation: gen_five,
                result: Ok(Box::new(five)),
            },
        );
        // Still loading article 7, the stale payload changed nothing
        assert!(matches!(
            app.detail,
            DetailState::Loading { article_id: 7 }
        ));

        let seven: crate::api::ArticleDetail =
            serde_json::from_value(serde_json::json!({ "id": 7, "titular": "Nuevo" })).unwrap();
        handle_app_event(
            &mut app,
            AppEvent::DetailLoaded {
                article_id: 7,
                generation: gen_seven,
                result: Ok(Box::new(seven)),
            },
        );
        match &app.detail {
            DetailState::Loaded { article } => assert_eq!(article.id, 7),
            _ => panic!("Expected loaded detail for article 7"),
        }
    }

    #[tokio::test]
    async fn cached_open_invalidates_in_flight_fetch() {
        let mut app = test_app();
        let (tx, _rx) = tokio::sync::mpsc::channel(8);

        // Article 5 is still fetching when the user opens cached article 7
        let gen_five = app.detail_token.issue();
        app.detail = DetailState::Loading { article_id: 5 };
        let seven: crate::api::ArticleDetail =
            serde_json::from_value(serde_json::json!({ "id": 7, "titular": "Nuevo" })).unwrap();
        app.detail_cache.put(7, seven);

        crate::ui::helpers::spawn_detail_load(&mut app, 7, &tx);
        match &app.detail {
            DetailState::Loaded { article } => assert_eq!(article.id, 7),
            _ => panic!("Expected cached detail for article 7"),
        }

        // The fetch for article 5 resolves late; the cache open already
        // superseded its generation, so it changes nothing
        let five: crate::api::ArticleDetail =
            serde_json::from_value(serde_json::json!({ "id": 5, "titular": "Viejo" })).unwrap();
        handle_app_event(
            &mut app,
            AppEvent::DetailLoaded {
                article_id: 5,
                generation: gen_five,
                result: Ok(Box::new(five)),
            },
        );
        match &app.detail {
            DetailState::Loaded { article } => assert_eq!(article.id, 7),
            _ => panic!("Stale fetch must not replace the displayed article"),
        }
    }

    #[test]
    fn successful_detail_is_cached() {
        let mut app = test_app();
        let generation = app.detail_token.issue();
        app.detail = DetailState::Loading { article_id: 3 };

        let article: crate::api::ArticleDetail =
            serde_json::from_value(serde_json::json!({ "id": 3, "titular": "Titular" })).unwrap();
        handle_app_event(
            &mut app,
            AppEvent::DetailLoaded {
                article_id: 3,
                generation,
                result: Ok(Box::new(article)),
            },
        );
        assert!(app.detail_cache.get(&3).is_some());
    }

    #[test]
    fn empty_map_data_shows_empty_state() {
        let mut app = test_app();
        let generation = app.map_token.issue();
        handle_app_event(
            &mut app,
            AppEvent::MapLoaded {
                generation,
                result: Ok(MapLoad::Data(crate::api::MapData {
                    points: vec![],
                    clusters: vec![],
                })),
            },
        );
        assert!(matches!(app.map, MapState::Empty { .. }));
    }

    #[test]
    fn updates_become_toasts() {
        let mut app = test_app();
        let updates: Vec<crate::api::ArticleUpdate> = serde_json::from_value(serde_json::json!([
            { "titular": "Uno", "updated_on": "2025-03-01 10:00:00" },
            { "titular": "Dos" }
        ]))
        .unwrap();
        handle_app_event(&mut app, AppEvent::UpdatesPolled { updates });
        assert_eq!(app.toasts.len(), 2);
        assert!(app.toasts[0].body.contains("Uno"));
    }
}
