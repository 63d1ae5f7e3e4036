use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Paragraph, Widget},
};
use textwrap::core::display_width;
use tracing::trace;

use crate::help_keybind;
use crate::ui::components::{DumbComponent, help::HelpElementKind};
use crate::ui::layout::Layout;

pub const HELP: &[HelpElementKind] = &[
    crate::help_text!("Search"),
    help_keybind!("Type", "term to highlight"),
    help_keybind!("Enter", "apply the term"),
    help_keybind!("Esc", "leave without changes"),
    help_keybind!("Ctrl+U", "clear the input"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Ignored,
    Editing,
    Submitted(String),
    Cancelled,
}

/// Single-line prompt for the highlight term. Inactive until focused with `/`.
#[derive(Debug, Default)]
pub struct SearchBar {
    input: String,
    applied: String,
    active: bool,
    area: Rect,
}

impl SearchBar {
    pub fn new(initial: Option<&str>) -> Self {
        let applied = initial.unwrap_or_default().to_string();
        Self {
            input: applied.clone(),
            applied,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> SearchOutcome {
        if !self.active || key.kind == KeyEventKind::Release {
            return SearchOutcome::Ignored;
        }
        match key.code {
            KeyCode::Enter => {
                self.active = false;
                self.applied = self.input.clone();
                trace!(term = self.applied, "Search submitted");
                SearchOutcome::Submitted(self.applied.clone())
            }
            KeyCode::Esc => {
                self.active = false;
                self.input = self.applied.clone();
                SearchOutcome::Cancelled
            }
            KeyCode::Backspace => {
                self.input.pop();
                SearchOutcome::Editing
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                SearchOutcome::Editing
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                SearchOutcome::Editing
            }
            _ => SearchOutcome::Editing,
        }
    }

    pub fn cursor(&self) -> Option<Position> {
        if !self.active || self.area.is_empty() {
            return None;
        }
        let inner = Block::bordered().inner(self.area);
        let x = inner.x + (display_width(&self.input) as u16).min(inner.width.saturating_sub(1));
        Some(Position::new(x, inner.y))
    }

    fn render_w(&mut self, area: Rect, buf: &mut Buffer) {
        self.area = area;
        let border = if self.active {
            Style::new().fg(Color::Cyan)
        } else {
            Style::new().dim()
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title("[/] Search");
        let line = if self.input.is_empty() && !self.active {
            Line::from("Press / to highlight a term").dim()
        } else {
            Line::from(self.input.as_str())
        };
        Paragraph::new(line).block(block).render(area, buf);
    }
}

impl DumbComponent for SearchBar {
    fn render(&mut self, area: Layout, buf: &mut Buffer) {
        self.render_w(area.search_bar, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(bar: &mut SearchBar, code: KeyCode) -> SearchOutcome {
        bar.handle_key(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn inactive_bar_ignores_keys() {
        let mut bar = SearchBar::new(None);
        assert_eq!(press(&mut bar, KeyCode::Char('a')), SearchOutcome::Ignored);
        assert_eq!(bar.input(), "");
    }

    #[test]
    fn typing_then_enter_submits_the_exact_term() {
        let mut bar = SearchBar::new(None);
        bar.activate();
        for c in " hi ".chars() {
            press(&mut bar, KeyCode::Char(c));
        }
        press(&mut bar, KeyCode::Backspace);
        assert_eq!(
            press(&mut bar, KeyCode::Enter),
            SearchOutcome::Submitted(" hi".to_string())
        );
        assert!(!bar.is_active());
    }

    #[test]
    fn escape_restores_the_applied_term() {
        let mut bar = SearchBar::new(Some("old"));
        bar.activate();
        press(&mut bar, KeyCode::Char('x'));
        assert_eq!(press(&mut bar, KeyCode::Esc), SearchOutcome::Cancelled);
        assert_eq!(bar.input(), "old");
    }

    #[test]
    fn ctrl_u_clears_the_input() {
        let mut bar = SearchBar::new(Some("term"));
        bar.activate();
        bar.handle_key(&KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(bar.input(), "");
    }

    #[test]
    fn cursor_follows_input_while_active() {
        let mut bar = SearchBar::new(Some("abc"));
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 3));
        bar.render_w(Rect::new(0, 0, 20, 3), &mut buf);
        assert_eq!(bar.cursor(), None);
        bar.activate();
        assert_eq!(bar.cursor(), Some(Position::new(4, 1)));
    }
}
