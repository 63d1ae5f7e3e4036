pub mod components;
pub mod document;
pub mod layout;

use crate::{
    comments::{self, Comment},
    errors::AppError,
    export::{ExportFormat, ExportService, LogExportService},
    ui::{
        components::{
            DumbComponent, ListId,
            export_menu::MenuKeyOutcome,
            help::{GLOBAL_HELP, HelpOverlay},
            search_bar::{self, SearchBar, SearchOutcome},
            status_bar::StatusBar,
        },
        document::Document,
    },
};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
};
use futures::{StreamExt, future::FutureExt};
use ratatui::{layout::Position, prelude::*, widgets::Paragraph};
use ratatui_macros::line;
use std::{io::stdout, path::PathBuf, sync::Arc};
use tokio::{select, sync::mpsc::Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

const FRAME_RATE: std::time::Duration = std::time::Duration::from_millis(16);
const SKELETON_CARDS: usize = 5;
const WHEEL_STEP: isize = 3;

pub async fn run(state: AppState) -> Result<(), AppError> {
    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let (action_tx, action_rx) = tokio::sync::mpsc::channel(100);
    let mut app = App::new(action_tx, action_rx, state);
    let result = app.run(&mut terminal).await;
    execute!(stdout(), DisableMouseCapture)?;
    ratatui::restore();
    result
}

#[derive(Debug, Default, Clone)]
pub struct AppState {
    pub comments_path: PathBuf,
    pub page_size: usize,
    pub search: Option<String>,
}

struct App {
    action_tx: Sender<Action>,
    action_rx: tokio::sync::mpsc::Receiver<Action>,
    cancel_action: CancellationToken,
    state: AppState,
    document: Document,
    list: ListId,
    source: Arc<[Comment]>,
    shown: usize,
    search_bar: SearchBar,
    status_bar: StatusBar,
    exporter: LogExportService,
    in_help: bool,
}

impl App {
    fn new(
        action_tx: Sender<Action>,
        action_rx: tokio::sync::mpsc::Receiver<Action>,
        state: AppState,
    ) -> Self {
        let mut document = Document::new();
        let list = document.create_list("Comments");
        if let Some(comment_list) = document.list_mut(list) {
            let export_tx = action_tx.clone();
            comment_list.set_export_handler(move |comment_id, format| {
                let action = Action::ExportRequested {
                    comment_id: comment_id.to_string(),
                    format,
                };
                post(&export_tx, action);
            });
            let scroll_tx = action_tx.clone();
            comment_list.set_scroll_handler(move || {
                post(&scroll_tx, Action::ScrollNotified(list));
            });
            comment_list.render_skeleton(SKELETON_CARDS);
        }
        Self {
            search_bar: SearchBar::new(state.search.as_deref()),
            status_bar: StatusBar::new(&state),
            action_tx,
            action_rx,
            cancel_action: Default::default(),
            state,
            document,
            list,
            source: Arc::from(Vec::new()),
            shown: 0,
            exporter: LogExportService::new(),
            in_help: false,
        }
    }

    async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<impl std::io::Write>>,
    ) -> Result<(), AppError> {
        let ctok = self.cancel_action.clone();
        let action_tx = self.action_tx.clone();
        tokio::spawn(async move {
            let mut frame_interval = tokio::time::interval(FRAME_RATE);
            let mut event_stream = EventStream::new();

            loop {
                let event = select! {
                    _ = ctok.cancelled() => break,
                    _ = frame_interval.tick() => Action::Frame,
                    event = event_stream.next().fuse() => {
                        match event {
                            Some(Ok(event)) => Action::AppEvent(event),
                            Some(Err(..)) => Action::None,
                            None => break,
                        }
                    }
                };
                if action_tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok::<(), AppError>(())
        });
        self.spawn_load();
        self.draw(terminal)?;

        loop {
            let action = self.action_rx.recv().await;
            let should_draw = match action {
                Some(Action::None) => false,
                Some(Action::Frame) => {
                    self.document.frame();
                    self.page_in(self.list, 0)
                }
                Some(Action::AppEvent(ref event)) => self.handle_event(event)?,
                Some(Action::CommentsLoaded(comments)) => {
                    self.on_comments_loaded(comments);
                    true
                }
                Some(Action::LoadFailed(message)) => {
                    self.on_load_failed(&message);
                    true
                }
                Some(Action::ScrollNotified(list)) => {
                    let margin = self.document.list(list).map_or(0, |l| l.page_height());
                    self.page_in(list, margin)
                }
                Some(Action::ExportRequested { comment_id, format }) => {
                    self.exporter.request_export(&comment_id, format);
                    if let Some(notice) = self.exporter.last_notice() {
                        self.status_bar.set_notice(notice);
                    }
                    true
                }
                Some(Action::Quit) | None => {
                    self.cancel_action.cancel();
                    break;
                }
            };
            if should_draw {
                self.draw(terminal)?;
            }
            if self.cancel_action.is_cancelled() {
                break;
            }
        }

        Ok(())
    }

    fn spawn_load(&self) {
        let path = self.state.comments_path.clone();
        let action_tx = self.action_tx.clone();
        tokio::spawn(async move {
            let action = match comments::load_comments(&path).await {
                Ok(comments) => Action::CommentsLoaded(Arc::from(comments)),
                Err(err) => {
                    error!(error = %err, path = %path.display(), "Failed to load comments");
                    Action::LoadFailed(err.to_string())
                }
            };
            action_tx
                .send(action)
                .await
                .map_err(|_| AppError::TokioMpsc)?;
            Ok::<(), AppError>(())
        });
    }

    fn on_comments_loaded(&mut self, comments: Arc<[Comment]>) {
        let page = self.state.page_size.max(1).min(comments.len());
        self.source = comments;
        self.shown = page;
        let Some(list) = self.document.list_mut(self.list) else {
            return;
        };
        if self.source.is_empty() {
            list.clear();
            list.show_empty_state("No comments found");
        } else {
            if let Some(term) = &self.state.search {
                list.set_search_term(term);
            }
            list.render(&self.source[..page], false);
        }
        self.status_bar.set_counts(self.shown, self.source.len());
    }

    fn on_load_failed(&mut self, message: &str) {
        if let Some(list) = self.document.list_mut(self.list) {
            list.clear();
            list.show_empty_state("Could not load comments");
        }
        self.status_bar.set_counts(0, 0);
        self.status_bar.set_notice(message);
    }

    /// Appends the next page once the viewport bottom is within `margin`
    /// lines of the end. Returns whether anything was added.
    fn page_in(&mut self, id: ListId, margin: usize) -> bool {
        if self.shown >= self.source.len() {
            return false;
        }
        let Some(list) = self.document.list_mut(id) else {
            return false;
        };
        if !list.near_end(margin) {
            return false;
        }
        let end = (self.shown + self.state.page_size.max(1)).min(self.source.len());
        debug!(from = self.shown, to = end, "Paging in comments");
        list.render(&self.source[self.shown..end], true);
        self.shown = end;
        self.status_bar.set_counts(self.shown, self.source.len());
        true
    }

    /// Returns whether the screen needs a redraw.
    #[instrument(skip(self))]
    fn handle_event(&mut self, event: &Event) -> Result<bool, AppError> {
        Ok(match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.handle_key(key);
                true
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(..) => true,
            _ => false,
        })
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) -> bool {
        let position = Position::new(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.in_help {
                    self.in_help = false;
                } else {
                    self.document.click(position);
                }
                true
            }
            MouseEventKind::ScrollDown => self.document.scroll_at(position, WHEEL_STEP),
            MouseEventKind::ScrollUp => self.document.scroll_at(position, -WHEEL_STEP),
            _ => false,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) {
        use crossterm::event::KeyCode::*;
        if matches!(
            key,
            KeyEvent {
                code: Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        ) {
            self.cancel_action.cancel();
            return;
        }
        if key.code == Char('h') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.in_help = !self.in_help;
            return;
        }
        if self.in_help {
            if matches!(key.code, Esc | Char('?') | Char('q')) {
                self.in_help = false;
            }
            return;
        }

        match self.search_bar.handle_key(key) {
            SearchOutcome::Ignored => {}
            SearchOutcome::Submitted(term) => {
                info!(term, "Applying search term");
                if let Some(list) = self.document.list_mut(self.list) {
                    list.set_search_term(&term);
                }
                return;
            }
            SearchOutcome::Editing | SearchOutcome::Cancelled => return,
        }

        if self.document.handle_key(key) != MenuKeyOutcome::Ignored {
            return;
        }

        let Some(list) = self.document.list_mut(self.list) else {
            return;
        };
        let page = list.page_height() as isize;
        match key.code {
            Char('q') => self.cancel_action.cancel(),
            Char('?') => self.in_help = true,
            Char('/') => self.search_bar.activate(),
            Char('j') | Down => list.handle_scroll(1),
            Char('k') | Up => list.handle_scroll(-1),
            PageDown | Char(' ') => list.handle_scroll(page),
            PageUp => list.handle_scroll(-page),
            Char('g') | Home => list.scroll_to(0),
            Char('G') | End => list.scroll_to(usize::MAX),
            Char('e') => {
                self.document.open_menu_on_first_visible(self.list);
            }
            _ => {}
        }
    }

    fn draw(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<impl std::io::Write>>,
    ) -> Result<(), AppError> {
        terminal.draw(|f| {
            let area = f.area();
            let layout = layout::Layout::new(area);
            if let Some(cursor) = self.search_bar.cursor() {
                f.set_cursor_position(cursor);
            }
            let buf = f.buffer_mut();
            Paragraph::new(line!["Comment Explorer"].style(Style::new().bold()))
                .centered()
                .render(layout.title_bar, buf);

            DumbComponent::render(&mut self.search_bar, layout, buf);
            self.document
                .paint_list(self.list, layout.main_content, buf);
            self.document.paint_menu(layout.main_content, buf);
            DumbComponent::render(&mut self.status_bar, layout, buf);

            if self.in_help {
                let help = if self.search_bar.is_active() {
                    search_bar::HELP
                } else {
                    GLOBAL_HELP
                };
                HelpOverlay::new(help).render(area, buf);
            }
        })?;
        Ok(())
    }
}

/// Posts from a synchronous component callback. A full or closed channel
/// drops the action with a warning.
fn post(tx: &Sender<Action>, action: Action) -> bool {
    match tx.try_send(action) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "Dropped action from component callback");
            false
        }
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum Action {
    None,
    Frame,
    Quit,
    AppEvent(crossterm::event::Event),
    CommentsLoaded(Arc<[Comment]>),
    LoadFailed(String),
    ScrollNotified(ListId),
    ExportRequested {
        comment_id: String,
        format: ExportFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_reports_a_full_channel() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        assert!(post(&tx, Action::ScrollNotified(0)));
        assert!(!post(&tx, Action::ScrollNotified(0)));
        assert!(matches!(rx.try_recv(), Ok(Action::ScrollNotified(0))));

        drop(rx);
        assert!(!post(
            &tx,
            Action::ExportRequested {
                comment_id: "c".to_string(),
                format: ExportFormat::CommentOnly,
            }
        ));
    }
}
