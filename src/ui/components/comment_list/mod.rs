//! The scrollable comment list.
//!
//! `CommentList` owns the rendered markup for its container and the comments
//! it mirrors. Clicks arrive already resolved to a [`ClickTarget`] and are
//! handled once per container, never per card. Scroll notifications are held
//! in a single pending slot until the next frame.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Style, Stylize},
    widgets::{
        Block, BorderType, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget,
    },
};
use tracing::{debug, info, instrument};

use crate::comments::Comment;
use crate::export::ExportFormat;
use crate::markup::Node;
use crate::ui::components::{ClickTarget, ListId, export_menu::ExportMenu};

mod card;
mod paint;
mod throttle;

pub use card::EXPORT_TOOLTIP;
pub use throttle::FrameThrottle;

/// Callbacks a list fires back out. Both default to doing nothing.
pub struct CommentListHandlers {
    pub on_export: Box<dyn FnMut(&str, ExportFormat)>,
    pub on_scroll: Box<dyn FnMut()>,
}

impl Default for CommentListHandlers {
    fn default() -> Self {
        Self {
            on_export: Box::new(|_, _| {}),
            on_scroll: Box::new(|| {}),
        }
    }
}

impl std::fmt::Debug for CommentListHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentListHandlers").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TriggerRegion {
    area: Rect,
    comment_id: String,
}

#[derive(Debug)]
pub struct CommentList {
    id: ListId,
    title: String,
    nodes: Vec<Node>,
    comments: Vec<Comment>,
    is_loading: bool,
    search_term: Option<String>,
    failed_avatars: HashSet<String>,
    handlers: CommentListHandlers,
    throttle: FrameThrottle,
    clock: fn() -> DateTime<Utc>,
    scroll: usize,
    content_height: usize,
    viewport_height: usize,
    area: Rect,
    triggers: Vec<TriggerRegion>,
}

impl CommentList {
    pub fn new(id: ListId) -> Self {
        Self {
            id,
            title: "Comments".to_string(),
            nodes: Vec::new(),
            comments: Vec::new(),
            is_loading: false,
            search_term: None,
            failed_avatars: HashSet::new(),
            handlers: CommentListHandlers::default(),
            throttle: FrameThrottle::default(),
            clock: Utc::now,
            scroll: 0,
            content_height: 0,
            viewport_height: 0,
            area: Rect::default(),
            triggers: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Replaces the source of "now" used for relative timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn set_export_handler(&mut self, handler: impl FnMut(&str, ExportFormat) + 'static) {
        self.handlers.on_export = Box::new(handler);
    }

    pub fn set_scroll_handler(&mut self, handler: impl FnMut() + 'static) {
        self.handlers.on_scroll = Box::new(handler);
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out);
        }
        out
    }

    /// Renders `comments`, replacing the current content or appending to it.
    #[instrument(skip_all, fields(list = self.id, count = comments.len(), append = append))]
    pub fn render(&mut self, comments: &[Comment], append: bool) {
        self.is_loading = true;
        let now = (self.clock)();
        let failed = &self.failed_avatars;
        let is_failed = |id: &str| failed.contains(id);
        let ctx = card::CardContext {
            search_term: self.search_term.as_deref(),
            now,
            avatar_failed: &is_failed,
        };
        let mut nodes = Vec::with_capacity(comments.len());
        for comment in comments {
            card::create_comment_card(comment, ctx, &mut nodes);
        }

        if append {
            self.nodes.extend(nodes);
            self.comments.extend_from_slice(comments);
        } else {
            self.nodes = nodes;
            self.comments = comments.to_vec();
        }
        self.is_loading = false;
        self.update_interactive_elements();
        info!(
            cards = self.nodes.len(),
            stored = self.comments.len(),
            "Rendered comments"
        );
    }

    /// Placeholder cards shown while data is pending. Drops any stored comments.
    pub fn render_skeleton(&mut self, count: usize) {
        self.nodes = (0..count).map(|_| card::skeleton_card()).collect();
        self.comments.clear();
        self.scroll = 0;
    }

    /// Replaces the content with a single message. Stored comments are kept;
    /// call [`CommentList::clear`] as well to drop them.
    pub fn show_empty_state(&mut self, message: &str) {
        self.nodes = vec![card::empty_state(message)];
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.comments.clear();
        self.failed_avatars.clear();
        self.scroll = 0;
    }

    /// Sets the highlighted term, taken verbatim, and re-renders the stored
    /// comments. An empty term removes highlighting.
    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = (!term.is_empty()).then(|| term.to_string());
        debug!(term = ?self.search_term, "Search term updated");
        let comments = std::mem::take(&mut self.comments);
        self.render(&comments, false);
    }

    /// Idempotent pass over fresh content: tooltips on export triggers.
    pub fn update_interactive_elements(&mut self) {
        for el in self.nodes.iter_mut().filter_map(Node::as_element_mut) {
            el.walk_mut(&mut |el| {
                if el.has_class("export-btn") && el.get_attr("title") != Some(EXPORT_TOOLTIP) {
                    el.set_attr("title", EXPORT_TOOLTIP);
                }
            });
        }
    }

    /// The avatar image for `comment_id` failed to load: hide it and reveal
    /// the colored initial. Later renders keep the fallback.
    pub fn avatar_load_failed(&mut self, comment_id: &str) -> bool {
        self.failed_avatars.insert(comment_id.to_string());
        let mut toggled = false;
        for card in self
            .nodes
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .filter(|el| el.get_attr("data-comment-id") == Some(comment_id))
        {
            card.walk_mut(&mut |el| {
                if el.has_class("avatar-image") && !el.is_hidden() {
                    el.set_hidden(true);
                    toggled = true;
                } else if el.has_class("avatar-initial") {
                    el.set_hidden(false);
                }
            });
        }
        toggled
    }

    /// Container click handler. Consumes clicks on this list's export triggers
    /// by opening the shared menu.
    pub fn handle_click(&mut self, target: &ClickTarget, menu: &mut ExportMenu) -> bool {
        match target {
            ClickTarget::ExportTrigger {
                list,
                comment_id,
                anchor,
            } if *list == self.id => {
                menu.open(self.id, comment_id, *anchor);
                true
            }
            _ => false,
        }
    }

    pub fn dispatch_export(&mut self, comment_id: &str, format: ExportFormat) {
        (self.handlers.on_export)(comment_id, format);
    }

    /// Container scroll handler. Moves the viewport and schedules one
    /// notification for the next frame.
    pub fn handle_scroll(&mut self, delta: isize) {
        self.scroll_to(self.scroll.saturating_add_signed(delta));
    }

    /// Clamped to the last full page; `usize::MAX` jumps to the end.
    pub fn scroll_to(&mut self, offset: usize) {
        let max = self.content_height.saturating_sub(self.viewport_height);
        let next = offset.min(max);
        if next == self.scroll {
            return;
        }
        self.scroll = next;
        self.throttle.request();
    }

    pub fn page_height(&self) -> usize {
        self.viewport_height.max(1)
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    /// Frame boundary: releases at most one scroll notification.
    pub fn on_frame(&mut self) {
        if self.throttle.take() {
            (self.handlers.on_scroll)();
        }
    }

    /// True when the viewport bottom is within `margin` lines of the end.
    pub fn near_end(&self, margin: usize) -> bool {
        self.scroll + self.viewport_height + margin >= self.content_height
    }

    pub fn contains(&self, position: Position) -> bool {
        self.area.contains(position)
    }

    pub fn hit_test(&self, position: Position) -> Option<ClickTarget> {
        self.triggers
            .iter()
            .find(|region| region.area.contains(position))
            .map(|region| self.trigger_target(region))
    }

    pub fn first_visible_trigger(&self) -> Option<ClickTarget> {
        self.triggers
            .first()
            .map(|region| self.trigger_target(region))
    }

    fn trigger_target(&self, region: &TriggerRegion) -> ClickTarget {
        ClickTarget::ExportTrigger {
            list: self.id,
            comment_id: region.comment_id.clone(),
            anchor: region.area,
        }
    }

    /// Paints the container and records where export triggers landed.
    pub fn paint(&mut self, area: Rect, buf: &mut Buffer) {
        self.area = area;
        let mut title = format!(" {} ({}) ", self.title, self.comments.len());
        if let Some(term) = &self.search_term {
            title.push_str(&format!("· \"{term}\" "));
        }
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title);
        let inner = block.inner(area);
        block.render(area, buf);

        let text_width = inner.width.saturating_sub(1);
        let lines = paint::paint(&self.nodes, text_width);
        self.content_height = lines.len();
        self.viewport_height = usize::from(inner.height);
        self.scroll = self
            .scroll
            .min(self.content_height.saturating_sub(self.viewport_height));

        self.triggers.clear();
        for (row, painted) in lines
            .iter()
            .skip(self.scroll)
            .take(self.viewport_height)
            .enumerate()
        {
            let y = inner.y + row as u16;
            buf.set_line(inner.x, y, &painted.line, text_width);
            if let Some(trigger) = &painted.trigger {
                self.triggers.push(TriggerRegion {
                    area: Rect::new(inner.x + trigger.x, y, trigger.width, 1),
                    comment_id: trigger.comment_id.clone(),
                });
            }
        }

        if self.content_height > self.viewport_height {
            let mut state = ScrollbarState::new(self.content_height)
                .viewport_content_length(self.viewport_height)
                .position(self.scroll);
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::new().dim())
                .render(inner, buf, &mut state);
        }
    }
}
