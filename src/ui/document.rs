//! The page that hosts comment lists and the one export menu they share.

use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
};
use tracing::{debug, info};

use crate::ui::components::{
    ClickTarget, ListId,
    comment_list::CommentList,
    export_menu::{ExportMenu, ExportSelection, MenuKeyOutcome},
};

#[derive(Debug, Default)]
pub struct Document {
    lists: Vec<CommentList>,
    menu: ExportMenu,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_list(&mut self, title: &str) -> ListId {
        let id = self.lists.len();
        self.lists.push(CommentList::new(id).with_title(title));
        id
    }

    pub fn list(&self, id: ListId) -> Option<&CommentList> {
        self.lists.get(id)
    }

    pub fn list_mut(&mut self, id: ListId) -> Option<&mut CommentList> {
        self.lists.get_mut(id)
    }

    pub fn menu(&self) -> &ExportMenu {
        &self.menu
    }

    /// The open menu is on top; everything not on a trigger is "elsewhere".
    pub fn resolve_click(&self, position: Position) -> ClickTarget {
        if let Some(target) = self.menu.hit_test(position) {
            return target;
        }
        self.lists
            .iter()
            .find_map(|list| list.hit_test(position))
            .unwrap_or(ClickTarget::Elsewhere)
    }

    pub fn click(&mut self, position: Position) -> Option<ExportSelection> {
        let target = self.resolve_click(position);
        self.dispatch_click(&target)
    }

    /// Container handlers first, then the document-level handler.
    pub fn dispatch_click(&mut self, target: &ClickTarget) -> Option<ExportSelection> {
        debug!(?target, "Dispatching click");
        for list in &mut self.lists {
            if list.handle_click(target, &mut self.menu) {
                break;
            }
        }
        let selection = self.menu.handle_document_click(target)?;
        self.route(&selection);
        Some(selection)
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> MenuKeyOutcome {
        let outcome = self.menu.handle_key(key);
        if let MenuKeyOutcome::Selected(selection) = &outcome {
            self.route(selection);
        }
        outcome
    }

    fn route(&mut self, selection: &ExportSelection) {
        info!(
            owner = selection.owner,
            comment_id = selection.comment_id,
            format = %selection.format,
            "Export selected"
        );
        if let Some(list) = self.lists.get_mut(selection.owner) {
            list.dispatch_export(&selection.comment_id, selection.format);
        }
    }

    /// Keyboard path to a trigger: opens the menu on the topmost visible card.
    pub fn open_menu_on_first_visible(&mut self, id: ListId) -> bool {
        let Some(target) = self.lists.get(id).and_then(CommentList::first_visible_trigger) else {
            return false;
        };
        self.dispatch_click(&target);
        self.menu.is_open()
    }

    /// Routes a wheel event to the list under the pointer.
    pub fn scroll_at(&mut self, position: Position, delta: isize) -> bool {
        match self.lists.iter_mut().find(|list| list.contains(position)) {
            Some(list) => {
                list.handle_scroll(delta);
                true
            }
            None => false,
        }
    }

    /// Frame tick for every list.
    pub fn frame(&mut self) {
        for list in &mut self.lists {
            list.on_frame();
        }
    }

    pub fn paint_list(&mut self, id: ListId, area: Rect, buf: &mut Buffer) {
        if let Some(list) = self.lists.get_mut(id) {
            list.paint(area, buf);
        }
    }

    /// Paints the menu above the lists, clamped to `viewport`.
    pub fn paint_menu(&mut self, viewport: Rect, buf: &mut Buffer) {
        self.menu.set_viewport(viewport);
        self.menu.render(buf);
    }
}
