//! The per-comment export popup.
//!
//! Only one menu exists for the whole application. The [`ExportMenu`] is owned
//! by the document and lent to every list's click handler, so opening a menu
//! from any list replaces whatever menu was open before.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Clear, Widget},
};
use tracing::debug;

use crate::export::ExportFormat;
use crate::ui::components::{ClickTarget, ListId};

pub const MENU_WIDTH: u16 = 18;
pub const MENU_HEIGHT: u16 = ExportFormat::ALL.len() as u16 + 2;

/// An option picked from an open menu, routed back to the list that opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSelection {
    pub owner: ListId,
    pub comment_id: String,
    pub format: ExportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenMenu {
    owner: ListId,
    comment_id: String,
    anchor: Rect,
    highlighted: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum MenuState {
    #[default]
    Closed,
    Open(OpenMenu),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuKeyOutcome {
    Ignored,
    Consumed,
    Selected(ExportSelection),
}

#[derive(Debug, Default)]
pub struct ExportMenu {
    state: MenuState,
    viewport: Rect,
}

impl ExportMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open(_))
    }

    pub fn comment_id(&self) -> Option<&str> {
        self.open_menu().map(|m| m.comment_id.as_str())
    }

    pub fn owner(&self) -> Option<ListId> {
        self.open_menu().map(|m| m.owner)
    }

    pub fn anchor(&self) -> Option<Rect> {
        self.open_menu().map(|m| m.anchor)
    }

    fn open_menu(&self) -> Option<&OpenMenu> {
        match &self.state {
            MenuState::Open(menu) => Some(menu),
            MenuState::Closed => None,
        }
    }

    /// Opens a menu for `comment_id` anchored to the trigger at `anchor`,
    /// closing any menu that is already open.
    pub fn open(&mut self, owner: ListId, comment_id: &str, anchor: Rect) {
        if self.is_open() {
            self.close();
        }
        debug!(owner, comment_id, ?anchor, "Opening export menu");
        self.state = MenuState::Open(OpenMenu {
            owner,
            comment_id: comment_id.to_string(),
            anchor,
            highlighted: 0,
        });
    }

    pub fn close(&mut self) {
        if let MenuState::Open(menu) = std::mem::take(&mut self.state) {
            debug!(comment_id = menu.comment_id, "Closing export menu");
        }
    }

    /// Closes the menu and reports the chosen format. `None` when no menu is open.
    pub fn select(&mut self, format: ExportFormat) -> Option<ExportSelection> {
        let MenuState::Open(menu) = std::mem::take(&mut self.state) else {
            return None;
        };
        debug!(comment_id = menu.comment_id, %format, "Export option selected");
        Some(ExportSelection {
            owner: menu.owner,
            comment_id: menu.comment_id,
            format,
        })
    }

    /// The document-level click handler. Runs after the list handlers, so a
    /// click on an export trigger is exempt: it just opened this menu.
    pub fn handle_document_click(&mut self, target: &ClickTarget) -> Option<ExportSelection> {
        if !self.is_open() {
            return None;
        }
        match target {
            ClickTarget::MenuOption(format) => self.select(*format),
            ClickTarget::Menu | ClickTarget::ExportTrigger { .. } => None,
            ClickTarget::Elsewhere => {
                self.close();
                None
            }
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> MenuKeyOutcome {
        let MenuState::Open(menu) = &mut self.state else {
            return MenuKeyOutcome::Ignored;
        };
        if key.kind == KeyEventKind::Release {
            return MenuKeyOutcome::Ignored;
        }
        let count = ExportFormat::ALL.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                menu.highlighted = (menu.highlighted + count - 1) % count;
                MenuKeyOutcome::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                menu.highlighted = (menu.highlighted + 1) % count;
                MenuKeyOutcome::Consumed
            }
            KeyCode::Enter => {
                let format = ExportFormat::ALL[menu.highlighted];
                self.select(format)
                    .map_or(MenuKeyOutcome::Consumed, MenuKeyOutcome::Selected)
            }
            KeyCode::Esc => {
                self.close();
                MenuKeyOutcome::Consumed
            }
            _ => MenuKeyOutcome::Consumed,
        }
    }

    /// Screen area the menu is clamped into.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// Placement below-left of the anchor: right edges aligned, top edge on
    /// the anchor's bottom. Screen coordinates, independent of list scrolling.
    pub fn area(&self) -> Option<Rect> {
        let anchor = self.anchor()?;
        let placed = Rect::new(
            anchor.right().saturating_sub(MENU_WIDTH),
            anchor.bottom(),
            MENU_WIDTH,
            MENU_HEIGHT,
        );
        if self.viewport.is_empty() {
            Some(placed)
        } else {
            Some(placed.clamp(self.viewport))
        }
    }

    fn option_areas(&self) -> Vec<(Rect, ExportFormat)> {
        let Some(area) = self.area() else {
            return Vec::new();
        };
        ExportFormat::ALL
            .iter()
            .enumerate()
            .map(|(i, format)| {
                let row = Rect::new(
                    area.x + 1,
                    area.y + 1 + i as u16,
                    area.width.saturating_sub(2),
                    1,
                );
                (row.intersection(area), *format)
            })
            .collect()
    }

    /// Resolves a position against the open menu, which sits above everything.
    pub fn hit_test(&self, position: Position) -> Option<ClickTarget> {
        let area = self.area()?;
        if !area.contains(position) {
            return None;
        }
        let option = self
            .option_areas()
            .into_iter()
            .find(|(row, _)| row.contains(position))
            .map(|(_, format)| ClickTarget::MenuOption(format));
        Some(option.unwrap_or(ClickTarget::Menu))
    }

    pub fn render(&self, buf: &mut Buffer) {
        let (Some(area), Some(menu)) = (self.area(), self.open_menu()) else {
            return;
        };
        Clear.render(area, buf);
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title("Export");
        let inner = block.inner(area);
        block.render(area, buf);
        for (i, format) in ExportFormat::ALL.iter().enumerate() {
            let y = inner.y + i as u16;
            if y >= inner.bottom() {
                break;
            }
            let line = if i == menu.highlighted {
                Line::from(format!("> {}", format.label())).style(Style::new().bold().reversed())
            } else {
                Line::from(format!("  {}", format.label()))
            };
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn trigger(x: u16, y: u16) -> Rect {
        Rect::new(x, y, 3, 1)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn opening_replaces_the_previous_menu() {
        let mut menu = ExportMenu::new();
        menu.open(0, "first", trigger(40, 2));
        menu.open(1, "second", trigger(40, 10));
        assert!(menu.is_open());
        assert_eq!(menu.comment_id(), Some("second"));
        assert_eq!(menu.owner(), Some(1));
        assert_eq!(menu.anchor(), Some(trigger(40, 10)));
    }

    #[test]
    fn placed_below_left_of_the_trigger() {
        let mut menu = ExportMenu::new();
        menu.open(0, "c", trigger(40, 2));
        assert_eq!(menu.area(), Some(Rect::new(25, 3, MENU_WIDTH, MENU_HEIGHT)));
    }

    #[test]
    fn clamped_into_the_viewport() {
        let mut menu = ExportMenu::new();
        menu.set_viewport(Rect::new(0, 0, 80, 10));
        menu.open(0, "c", trigger(5, 8));
        let area = menu.area().expect("open");
        assert_eq!(area, Rect::new(0, 5, MENU_WIDTH, MENU_HEIGHT));
    }

    #[test]
    fn option_click_selects_and_closes() {
        let mut menu = ExportMenu::new();
        menu.open(3, "c9", trigger(40, 2));
        let selection =
            menu.handle_document_click(&ClickTarget::MenuOption(ExportFormat::IphoneDark));
        assert_eq!(
            selection,
            Some(ExportSelection {
                owner: 3,
                comment_id: "c9".to_string(),
                format: ExportFormat::IphoneDark,
            })
        );
        assert!(!menu.is_open());
    }

    #[test]
    fn outside_click_closes_without_selection() {
        let mut menu = ExportMenu::new();
        menu.open(0, "c", trigger(40, 2));
        assert_eq!(menu.handle_document_click(&ClickTarget::Elsewhere), None);
        assert!(!menu.is_open());
    }

    #[test]
    fn clicks_inside_menu_or_on_triggers_keep_it_open() {
        let mut menu = ExportMenu::new();
        menu.open(0, "c", trigger(40, 2));
        assert_eq!(menu.handle_document_click(&ClickTarget::Menu), None);
        let other = ClickTarget::ExportTrigger {
            list: 0,
            comment_id: "c".to_string(),
            anchor: trigger(40, 2),
        };
        assert_eq!(menu.handle_document_click(&other), None);
        assert!(menu.is_open());
    }

    #[test]
    fn closed_menu_ignores_clicks_and_selection() {
        let mut menu = ExportMenu::new();
        assert_eq!(
            menu.handle_document_click(&ClickTarget::MenuOption(ExportFormat::CommentOnly)),
            None
        );
        assert_eq!(menu.select(ExportFormat::CommentOnly), None);
        assert_eq!(menu.hit_test(Position::new(0, 0)), None);
    }

    #[test]
    fn hit_test_maps_rows_to_formats() {
        let mut menu = ExportMenu::new();
        menu.open(0, "c", trigger(40, 2));
        let area = menu.area().expect("open");
        assert_eq!(
            menu.hit_test(Position::new(area.x + 2, area.y + 1)),
            Some(ClickTarget::MenuOption(ExportFormat::CommentOnly))
        );
        assert_eq!(
            menu.hit_test(Position::new(area.x + 2, area.y + 3)),
            Some(ClickTarget::MenuOption(ExportFormat::IphoneLight))
        );
        assert_eq!(
            menu.hit_test(Position::new(area.x, area.y)),
            Some(ClickTarget::Menu)
        );
        assert_eq!(menu.hit_test(Position::new(0, 0)), None);
    }

    #[test]
    fn keyboard_moves_highlight_and_selects() {
        let mut menu = ExportMenu::new();
        menu.open(0, "c", trigger(40, 2));
        assert_eq!(menu.handle_key(&key(KeyCode::Up)), MenuKeyOutcome::Consumed);
        match menu.handle_key(&key(KeyCode::Enter)) {
            MenuKeyOutcome::Selected(selection) => {
                assert_eq!(selection.format, ExportFormat::IphoneLight)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(!menu.is_open());
        assert_eq!(menu.handle_key(&key(KeyCode::Enter)), MenuKeyOutcome::Ignored);
    }

    #[test]
    fn escape_dismisses() {
        let mut menu = ExportMenu::new();
        menu.open(0, "c", trigger(40, 2));
        assert_eq!(menu.handle_key(&key(KeyCode::Esc)), MenuKeyOutcome::Consumed);
        assert!(!menu.is_open());
    }

    #[test]
    fn renders_options_inside_a_bordered_popup() {
        let mut menu = ExportMenu::new();
        menu.open(0, "c", trigger(20, 0));
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 8));
        menu.render(&mut buf);

        let row = |y: u16| -> String {
            (0..30)
                .filter_map(|x| buf.cell(Position::new(x, y)).map(|c| c.symbol().to_string()))
                .collect()
        };
        assert!(row(1).contains("Export"));
        assert!(row(2).contains("> Comment only"));
        assert!(row(3).contains("  iPhone dark"));
        assert!(row(4).contains("  iPhone light"));
    }
}
