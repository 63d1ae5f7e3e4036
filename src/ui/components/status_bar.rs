use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::Widget;
use ratatui_macros::{horizontal, span};

use crate::ui::components::DumbComponent;
use crate::ui::{AppState, layout::Layout};

pub struct StatusBar {
    source_label: String,
    shown: usize,
    total: usize,
    loading: bool,
    notice: Option<String>,
}

impl StatusBar {
    pub fn new(app_state: &AppState) -> Self {
        let name = app_state
            .comments_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| app_state.comments_path.display().to_string());
        Self {
            source_label: format!(" {name} "),
            shown: 0,
            total: 0,
            loading: true,
            notice: None,
        }
    }

    pub fn set_counts(&mut self, shown: usize, total: usize) {
        self.shown = shown;
        self.total = total;
        self.loading = false;
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    fn count_text(&self) -> String {
        if self.loading {
            " Loading… ".to_string()
        } else {
            format!(" Comments: {}/{} ", self.shown, self.total)
        }
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let count_text = self.count_text();
        let count_width = count_text.chars().count() as u16;
        let [left, right] = horizontal![*=1, ==count_width].areas(area);
        let mut start = vec![
            span!(" comment-explorer ").style(Style::new().black().on_green()),
            span!(self.source_label.as_str()),
        ];
        if let Some(notice) = &self.notice {
            start.push(span!(format!(" {notice} ")).style(Style::new().dim()));
        }
        Line::from(start).render(left, buf);
        span!(count_text)
            .style(Style::new().black().on_blue())
            .render(right, buf);
    }
}

impl DumbComponent for StatusBar {
    fn render(&mut self, area: Layout, buf: &mut Buffer) {
        self.render(area.status_bar, buf);
    }
}
