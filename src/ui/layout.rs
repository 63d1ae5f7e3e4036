use ratatui::layout::Rect;
use ratatui_macros::vertical;

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub title_bar: Rect,
    pub search_bar: Rect,
    pub main_content: Rect,
    pub status_bar: Rect,
    pub screen: Rect,
}

impl Layout {
    pub fn new(area: Rect) -> Self {
        let [title_bar, search_bar, main_content, status_bar] =
            vertical![==1, ==3, *=1, ==1].areas(area);
        Self {
            title_bar,
            search_bar,
            main_content,
            status_bar,
            screen: area,
        }
    }
}
