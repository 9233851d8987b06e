use super::Frame;
use crate::state::State;
use crate::ui::widgets::styling;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

/// Render log widget according to state.
///
pub fn log(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let visible = size.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = state
        .get_log_entries(visible)
        .into_iter()
        .map(|entry| {
            let style = if entry.contains(" ERROR ") || entry.contains(" WARN ") {
                styling::invalid_text_style(theme)
            } else {
                styling::normal_text_style(theme)
            };
            ListItem::new(Line::from(vec![Span::styled(entry, style)]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title("Log (L to hide)")
            .borders(Borders::ALL)
            .border_style(styling::normal_block_border_style(theme)),
    );
    frame.render_widget(list, size);
}
