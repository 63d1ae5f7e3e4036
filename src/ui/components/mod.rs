use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use crate::export::ExportFormat;
use crate::ui::layout::Layout;

pub mod comment_list;
pub mod export_menu;
pub mod help;
pub mod search_bar;
pub mod status_bar;

/// Identifies a comment list within a [`crate::ui::document::Document`].
pub type ListId = usize;

/// What a click landed on, resolved from a screen position before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    ExportTrigger {
        list: ListId,
        comment_id: String,
        anchor: Rect,
    },
    MenuOption(ExportFormat),
    Menu,
    Elsewhere,
}

pub trait DumbComponent {
    fn render(&mut self, area: Layout, buf: &mut Buffer);
}
