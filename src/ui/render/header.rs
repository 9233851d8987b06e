use super::Frame;
use crate::state::{State, View};
use crate::ui::widgets::{spinner, styling};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

const VIEWS: [View; 3] = [View::Wizard, View::Payload, View::Query];

/// Render the title bar: banner, view tabs and connection status.
///
pub fn header(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let mut spans = vec![Span::styled(" sfadmin ", styling::banner_style(theme))];

    for view in VIEWS {
        let style = if view == *state.current_view() {
            styling::active_list_item_style(theme)
        } else {
            styling::muted_text_style(theme)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(format!(" {} ", view.title()), style));
    }

    spans.push(Span::raw("  "));
    if state.is_connected() {
        let targets = state.get_target_objects();
        let label = if targets.is_empty() {
            "connected, no target objects".to_string()
        } else {
            format!("targets: {}", targets.join(", "))
        };
        spans.push(Span::styled(label, styling::normal_text_style(theme)));
    } else {
        spans.push(Span::styled("offline", styling::invalid_text_style(theme)));
    }

    if state.has_unsaved_rows() {
        spans.push(Span::styled("  ● unsaved", styling::banner_style(theme)));
    }
    if state.is_loading() {
        spans.push(Span::styled(
            format!("  {} working", spinner::frame(*state.get_spinner_index())),
            styling::normal_text_style(theme),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), size);
}
