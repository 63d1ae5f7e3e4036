use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Clear, Widget},
};
use textwrap::core::display_width;
use tracing::trace;

use crate::help_keybind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpElementKind {
    Keybind(&'static str, &'static str),
    Text(&'static str),
}

#[macro_export]
macro_rules! help_keybind {
    ($key:expr, $description:expr) => {
        $crate::ui::components::help::HelpElementKind::Keybind($key, $description)
    };
}

#[macro_export]
macro_rules! help_text {
    ($text:expr) => {
        $crate::ui::components::help::HelpElementKind::Text($text)
    };
}

pub const GLOBAL_HELP: &[HelpElementKind] = &[
    crate::help_text!("Comment Explorer"),
    help_keybind!("j / Down", "scroll down"),
    help_keybind!("k / Up", "scroll up"),
    help_keybind!("PgDn / PgUp", "scroll a page"),
    help_keybind!("g / G", "jump to top / bottom"),
    help_keybind!("Mouse wheel", "scroll the list under the pointer"),
    help_keybind!("Click [⤓] / e", "open the export menu"),
    help_keybind!("Up / Down, Enter", "pick an export format"),
    help_keybind!("Esc / click outside", "close the export menu"),
    help_keybind!("/", "search and highlight"),
    help_keybind!("? / Ctrl+H", "toggle this help"),
    help_keybind!("q / Ctrl+C", "quit"),
];

/// Lays help elements out for a given inner width: keys left, descriptions
/// right-aligned, free text wrapped and centered.
pub fn help_elements_to_text(elements: &[HelpElementKind], width: u16) -> Text<'static> {
    let width = usize::from(width);
    let key_style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut lines = Vec::with_capacity(elements.len());
    for element in elements {
        match *element {
            HelpElementKind::Keybind(key, description) => {
                let used = display_width(key) + display_width(description);
                let padding = width.saturating_sub(used).max(1);
                lines.push(Line::from(vec![
                    Span::styled(key, key_style),
                    Span::raw(" ".repeat(padding)),
                    Span::raw(description),
                ]));
            }
            HelpElementKind::Text(text) => {
                lines.extend(
                    textwrap::wrap(text, width.max(1))
                        .into_iter()
                        .map(|line| Line::from(line.into_owned()).centered()),
                );
            }
        }
    }
    Text::from(lines)
}

const WIDTH_PERCENT: u16 = 60;

/// Centered popup listing help elements above whatever is underneath.
pub struct HelpOverlay<'a> {
    content: &'a [HelpElementKind],
}

impl<'a> HelpOverlay<'a> {
    pub fn new(content: &'a [HelpElementKind]) -> Self {
        Self { content }
    }
}

impl Widget for HelpOverlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title("Help");
        let width = (u32::from(area.width) * u32::from(WIDTH_PERCENT) / 100) as u16;
        let text = help_elements_to_text(self.content, width.saturating_sub(2));
        let height = (text.height() as u16 + 2).min(area.height);
        trace!(elements = self.content.len(), height, "Rendering help");
        let popup = area.centered(Constraint::Length(width), Constraint::Length(height));
        Clear.render(popup, buf);
        let inner = block.inner(popup);
        block.render(popup, buf);
        text.render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Position;

    #[test]
    fn keybinds_pad_descriptions_to_the_right_edge() {
        let text = help_elements_to_text(&[help_keybind!("q", "quit")], 10);
        let line: String = text.lines[0]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(line, "q     quit");
    }

    #[test]
    fn overlay_is_centered_and_titled() {
        let area = Rect::new(0, 0, 60, 20);
        let mut buf = Buffer::empty(area);
        HelpOverlay::new(GLOBAL_HELP).render(area, &mut buf);
        let row = |y: u16| -> String {
            (0..60)
                .filter_map(|x| buf.cell(Position::new(x, y)).map(|c| c.symbol().to_string()))
                .collect()
        };
        let screen: Vec<String> = (0..20).map(row).collect();
        assert!(screen.iter().any(|r| r.contains("Help")));
        assert!(screen.iter().any(|r| r.contains("quit")));
        assert!(row(0).trim().is_empty());
    }
}
