//! Lays the markup tree out as terminal lines.
//!
//! Cards are recognized by class, the way a stylesheet would target them, so
//! the painter never needs the comment records themselves.

use ratatui::{
    style::{Color, Style, Stylize},
    text::{Line, Span},
};
use textwrap::core::display_width;

use crate::markup::{Element, Node};

pub(super) const TRIGGER: &str = "[⤓]";
const REPLY_INDENT: usize = 4;
const ACTION_GAP: &str = "  ";

#[derive(Debug, Clone)]
pub(super) struct PaintedLine {
    pub line: Line<'static>,
    pub trigger: Option<TriggerSpan>,
}

/// Where an export trigger sits within a painted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TriggerSpan {
    pub x: u16,
    pub width: u16,
    pub comment_id: String,
}

impl From<Line<'static>> for PaintedLine {
    fn from(line: Line<'static>) -> Self {
        Self {
            line,
            trigger: None,
        }
    }
}

pub(super) fn paint(nodes: &[Node], width: u16) -> Vec<PaintedLine> {
    let width = usize::from(width);
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Node::Element(el) if el.has_class("skeleton") => paint_skeleton(el, width, &mut out),
            Node::Element(el) if el.has_class("empty-state") => paint_empty(el, width, &mut out),
            Node::Element(el) if el.has_class("comment-card") => paint_card(el, width, &mut out),
            other => out.push(Line::from(other.text_content()).into()),
        }
    }
    out
}

fn paint_card(card: &Element, width: usize, out: &mut Vec<PaintedLine>) {
    let indent = if card.has_class("reply-card") {
        REPLY_INDENT
    } else {
        0
    };
    let avatar = avatar_span(card);
    let body_indent = indent + display_width(&avatar.content) + 1;
    let trigger_width = display_width(TRIGGER);

    let author = card
        .find_class("comment-author")
        .map(Element::text_content)
        .unwrap_or_default();
    let author = truncate_to_width(
        &author,
        width.saturating_sub(body_indent + trigger_width + 1),
    );
    let used = body_indent + display_width(&author);
    let mut header = vec![
        Span::raw(" ".repeat(indent)),
        avatar,
        Span::raw(" "),
        Span::styled(author, Style::new().bold()),
    ];
    let trigger_id = card
        .find_class("export-btn")
        .and_then(|button| button.get_attr("data-comment-id"));
    let trigger = match trigger_id {
        Some(id) if width >= used + trigger_width + 1 => {
            let x = width - trigger_width;
            header.push(Span::raw(" ".repeat(x - used)));
            header.push(Span::styled(TRIGGER, Style::new().fg(Color::Cyan)));
            Some(TriggerSpan {
                x: x as u16,
                width: trigger_width as u16,
                comment_id: id.to_string(),
            })
        }
        _ => None,
    };
    out.push(PaintedLine {
        line: Line::from(header),
        trigger,
    });

    let segments = card
        .find_class("comment-text")
        .map(text_segments)
        .unwrap_or_default();
    let prefix = " ".repeat(body_indent);
    for spans in wrap_segments(&segments, width.saturating_sub(body_indent)) {
        let mut line = vec![Span::raw(prefix.clone())];
        line.extend(spans);
        out.push(Line::from(line).into());
    }

    if let Some(actions) = card.find_class("comment-actions") {
        let mut line = vec![Span::raw(prefix)];
        for (i, el) in actions.children().iter().filter_map(Node::as_element).enumerate() {
            if i > 0 {
                line.push(Span::raw(ACTION_GAP));
            }
            line.push(Span::styled(el.text_content(), action_style(el)));
        }
        out.push(Line::from(line).into());
    }
    out.push(Line::default().into());
}

fn action_style(el: &Element) -> Style {
    if el.has_class("channel-owner-liked") {
        Style::new().fg(Color::Red)
    } else if el.has_class("comment-reply") {
        Style::new().dim().bold()
    } else {
        Style::new().dim()
    }
}

fn avatar_span(card: &Element) -> Span<'static> {
    let visible = card.find_class("profile-avatar").and_then(|avatar| {
        avatar
            .children()
            .iter()
            .filter_map(Node::as_element)
            .find(|el| !el.is_hidden())
    });
    match visible {
        Some(img) if img.has_class("avatar-image") => {
            Span::styled(" ◉ ", Style::new().fg(Color::Gray).bold())
        }
        Some(initial) => {
            let bg = initial
                .get_attr("style")
                .and_then(background_color)
                .unwrap_or(Color::DarkGray);
            Span::styled(
                format!(" {} ", initial.text_content()),
                Style::new().fg(Color::White).bg(bg).bold(),
            )
        }
        None => Span::raw("   "),
    }
}

fn background_color(style: &str) -> Option<Color> {
    style
        .split(';')
        .find_map(|decl| decl.trim().strip_prefix("background-color:"))
        .and_then(|value| value.trim().parse().ok())
}

fn text_segments(text: &Element) -> Vec<(String, Style)> {
    text.children()
        .iter()
        .map(|node| match node {
            Node::Element(mark) if mark.has_class("search-highlight") => (
                mark.text_content(),
                Style::new().fg(Color::Black).bg(Color::Yellow),
            ),
            other => (other.text_content(), Style::default()),
        })
        .collect()
}

fn paint_skeleton(card: &Element, width: usize, out: &mut Vec<PaintedLine>) {
    let style = Style::new().fg(Color::DarkGray);
    let bar = |el: &Element| -> String {
        let chars = el.get_attr("data-width").map_or(8, |w| match w.strip_suffix('%') {
            Some(pct) => pct.parse::<usize>().map_or(8, |p| width * p / 100),
            None => w.parse::<usize>().map_or(8, |px| px.div_ceil(8)),
        });
        "░".repeat(chars.min(width))
    };
    for child in card.children().iter().filter_map(Node::as_element) {
        let text = if child.has_class("skeleton") {
            bar(child)
        } else {
            child
                .children()
                .iter()
                .filter_map(Node::as_element)
                .map(bar)
                .collect::<Vec<_>>()
                .join(" ")
        };
        out.push(Line::from(Span::styled(text, style)).into());
    }
    out.push(Line::default().into());
}

fn paint_empty(el: &Element, width: usize, out: &mut Vec<PaintedLine>) {
    let message = el.text_content();
    let pad = width.saturating_sub(display_width(&message)) / 2;
    out.push(Line::default().into());
    out.push(
        Line::from(vec![
            Span::raw(" ".repeat(pad)),
            Span::styled(message, Style::new().dim()),
        ])
        .into(),
    );
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let mut char_buf = [0u8; 4];
        let ch_width = display_width(ch.encode_utf8(&mut char_buf));
        if used + ch_width + 1 > max_width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    if max_width > 0 {
        out.push('…');
    }
    out
}

/// Word-wraps styled segments, breaking words longer than a line.
fn wrap_segments(segments: &[(String, Style)], width: usize) -> Vec<Vec<Span<'static>>> {
    let mut wrapper = Wrapper::new(width.max(1));
    for (text, style) in segments {
        for (i, paragraph) in text.split('\n').enumerate() {
            if i > 0 {
                wrapper.break_line();
            }
            for word in paragraph.split_inclusive(' ') {
                wrapper.push_word(word, *style);
            }
        }
    }
    wrapper.finish()
}

struct Wrapper {
    width: usize,
    lines: Vec<Vec<Span<'static>>>,
    current: Vec<Span<'static>>,
    used: usize,
}

impl Wrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: Vec::new(),
            used: 0,
        }
    }

    fn break_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
        self.used = 0;
    }

    fn push_word(&mut self, word: &str, style: Style) {
        let visible = display_width(word.trim_end());
        if self.used > 0 && self.used + visible > self.width {
            self.break_line();
        }
        if visible > self.width {
            self.push_long_word(word, style);
            return;
        }
        self.current.push(Span::styled(word.to_string(), style));
        self.used += display_width(word);
    }

    fn push_long_word(&mut self, word: &str, style: Style) {
        let mut chunk = String::new();
        for ch in word.chars() {
            let mut char_buf = [0u8; 4];
            let ch_width = display_width(ch.encode_utf8(&mut char_buf));
            if self.used + ch_width > self.width && self.used > 0 {
                self.current
                    .push(Span::styled(std::mem::take(&mut chunk), style));
                self.break_line();
            }
            chunk.push(ch);
            self.used += ch_width;
        }
        if !chunk.is_empty() {
            self.current.push(Span::styled(chunk, style));
        }
    }

    fn finish(mut self) -> Vec<Vec<Span<'static>>> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.lines.push(self.current);
        }
        self.lines
    }
}
