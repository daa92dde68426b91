//! Main event loop for the TUI.
//!
//! This module contains the core event loop that multiplexes terminal
//! input (keys, mouse, resize), background task events, and periodic
//! ticks.

use crate::app::{App, AppEvent, BoardState, DetailState, RESIZE_DEBOUNCE_MS};
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use super::events::handle_app_event;
use super::helpers::spawn_board_reload;
use super::input::{handle_input, handle_mouse};
use super::render::{render, SPINNER_FRAMES};

/// Result of handling a key press event.
pub enum Action {
    /// Continue the event loop and process more events.
    Continue,
    /// Exit the application and restore the terminal.
    Quit,
}

/// Runs the TUI application event loop.
///
/// Uses `tokio::select!` to multiplex three event sources:
/// - **Terminal input**: key, mouse, and resize events from crossterm's
///   async event stream
/// - **Background tasks**: board/detail/map/posturas fetches and the
///   update poller via the `AppEvent` channel
/// - **Periodic tick**: 250ms timer for status and toast expiry, spinner
///   animation, and the debounced resize recompute
///
/// # Panic Safety
///
/// Installs a panic hook that restores terminal state before unwinding,
/// ensuring the terminal is not left in raw mode on panic.
pub async fn run(
    app: &mut App,
    event_tx: mpsc::Sender<AppEvent>,
    mut event_rx: mpsc::Receiver<AppEvent>,
) -> Result<()> {
    // Install panic hook BEFORE setting up terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let mut event_stream = crossterm::event::EventStream::new();

    let mut tick_interval = tokio::time::interval(Duration::from_millis(250));

    // Signal handlers for graceful shutdown (Unix only)
    #[cfg(unix)]
    let mut sigterm = signal(SignalKind::terminate())?;
    #[cfg(unix)]
    let mut sigint = signal(SignalKind::interrupt())?;

    // Initial board load
    spawn_board_reload(app, &event_tx);

    loop {
        // Only render when state has changed
        if app.needs_redraw {
            terminal.draw(|f| render(f, app))?;
            app.needs_redraw = false;
        }

        if app.clear_expired_status() {
            app.needs_redraw = true;
        }

        // Drain all pending app events before handling more input, so
        // results are applied promptly even during rapid user input
        while let Ok(event) = event_rx.try_recv() {
            app.needs_redraw = true;
            handle_app_event(app, event);
        }

        #[cfg(unix)]
        let sigterm_fut = sigterm.recv();
        #[cfg(not(unix))]
        let sigterm_fut = std::future::pending::<Option<()>>();

        #[cfg(unix)]
        let sigint_fut = sigint.recv();
        #[cfg(not(unix))]
        let sigint_fut = std::future::pending::<Option<()>>();

        tokio::select! {
            biased;  // Process in order listed for predictable behavior

            _ = sigterm_fut => {
                tracing::info!("Received SIGTERM, shutting down gracefully");
                break;
            }

            _ = sigint_fut => {
                tracing::info!("Received SIGINT, shutting down gracefully");
                break;
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        app.needs_redraw = true;
                        match handle_input(app, key.code, key.modifiers, &event_tx) {
                            Ok(Action::Quit) => break,
                            Ok(Action::Continue) => {}
                            Err(e) => app.set_status(format!("Error: {}", e)),
                        }
                    }
                    Some(Ok(Event::Mouse(mouse))) => {
                        handle_mouse(app, mouse);
                    }
                    Some(Ok(Event::Resize(_, _))) => {
                        // Coalesce resize bursts; the tick applies the
                        // recompute after the debounce window
                        app.pending_resize = Some(tokio::time::Instant::now());
                        app.needs_redraw = true;
                    }
                    _ => {}
                }
            }

            Some(event) = event_rx.recv() => {
                app.needs_redraw = true;
                handle_app_event(app, event);
            }

            _ = tick_interval.tick() => {
                handle_tick(app);
            }
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

/// Handle the periodic tick: expiry, spinner animation, debounced resize.
fn handle_tick(app: &mut App) {
    if app.expire_toasts() {
        app.needs_redraw = true;
    }

    // Animate the spinner while anything is loading
    let loading = matches!(app.board, BoardState::Loading { .. })
        || matches!(app.detail, DetailState::Loading { .. })
        || matches!(app.map, crate::app::MapState::Loading)
        || matches!(app.posturas, crate::app::PosturasState::Loading);
    if loading {
        app.spinner_frame = (app.spinner_frame + 1) % SPINNER_FRAMES;
        app.needs_redraw = true;
    }

    // Debounced resize: carousel offsets re-clamp on the next draw, so
    // one redraw after the burst settles is all that's needed
    if let Some(at) = app.pending_resize {
        if at.elapsed() >= Duration::from_millis(RESIZE_DEBOUNCE_MS) {
            app.pending_resize = None;
            app.needs_redraw = true;
        }
    }
}

/// Set up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state.
fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, RetryPolicy};
    use crate::app::{MapState, PosturasState};
    use crate::selection::Selection;
    use crate::view::Board;
    use url::Url;

    /// An app with nothing loading, so ticks only act on timers.
    fn idle_app() -> App {
        let client = ApiClient::new(
            Url::parse("http://localhost:5000").unwrap(),
            reqwest::Client::new(),
            RetryPolicy::default(),
        );
        let mut app = App::new(client, Selection::default());
        app.apply_board(Board {
            tabs: Vec::new(),
            subcategories: None,
            lanes: Vec::new(),
        });
        app.map = MapState::Empty {
            message: String::new(),
        };
        app.posturas = PosturasState::Ready {
            eventos: Vec::new(),
            selected: 0,
            selected_chip: 0,
        };
        app
    }

    #[tokio::test(start_paused = true)]
    async fn resize_redraw_waits_out_the_debounce_window() {
        let mut app = idle_app();
        app.pending_resize = Some(tokio::time::Instant::now());
        app.needs_redraw = false;

        // Inside the window: the burst is still settling, no redraw
        tokio::time::advance(Duration::from_millis(RESIZE_DEBOUNCE_MS / 2)).await;
        handle_tick(&mut app);
        assert!(!app.needs_redraw);
        assert!(app.pending_resize.is_some());

        // Past the window: exactly one redraw, then the marker is consumed
        tokio::time::advance(Duration::from_millis(RESIZE_DEBOUNCE_MS)).await;
        handle_tick(&mut app);
        assert!(app.needs_redraw);
        assert!(app.pending_resize.is_none());

        app.needs_redraw = false;
        handle_tick(&mut app);
        assert!(!app.needs_redraw);
    }

    #[tokio::test(start_paused = true)]
    async fn later_resize_restarts_the_debounce_window() {
        let mut app = idle_app();
        app.pending_resize = Some(tokio::time::Instant::now());
        tokio::time::advance(Duration::from_millis(RESIZE_DEBOUNCE_MS / 2)).await;

        // A fresh resize event replaces the marker, restarting the clock
        app.pending_resize = Some(tokio::time::Instant::now());
        app.needs_redraw = false;
        tokio::time::advance(Duration::from_millis(RESIZE_DEBOUNCE_MS / 2)).await;
        handle_tick(&mut app);
        assert!(!app.needs_redraw);

        tokio::time::advance(Duration::from_millis(RESIZE_DEBOUNCE_MS)).await;
        handle_tick(&mut app);
        assert!(app.needs_redraw);
    }
}
