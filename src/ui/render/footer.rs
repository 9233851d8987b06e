use super::Frame;
use crate::state::{State, View};
use crate::ui::widgets::styling;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Return the key hints for the current mode.
///
fn hints(state: &State) -> &'static str {
    if state.has_reset_confirmation() {
        return " y: confirm reset | n/Esc: cancel";
    }
    if state.get_option_picker().is_some() {
        return " j/k: navigate | Enter: choose | Esc: close";
    }
    if let Some(buffer) = state.get_edit_buffer() {
        return if buffer.multiline {
            " Type to edit | Enter: newline | Ctrl+S: save | Esc: cancel"
        } else {
            " Type to edit | Enter: save | Esc: cancel"
        };
    }
    match state.current_view() {
        View::Wizard => {
            " j/k: navigate | h/l: panes | Enter: edit | a: add | c: clone | d: delete | g: value set | i/e: import/export | D: deploy | R: reset | Tab: view | L: log | q: quit"
        }
        View::Payload => {
            " j/k: scroll | y: copy | l: page layouts | D: deploy | Tab: view | L: log | q: quit"
        }
        View::Query => {
            " :: query | f: filter | s: sort | h/j/k/l: move | e: edit cell | w: save | u: revert | Tab: view | q: quit"
        }
    }
}

/// Render the footer with mode-specific key hints.
///
pub fn footer(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let background = if state.has_reset_confirmation() {
        theme.footer_confirm
    } else if state.get_option_picker().is_some() {
        theme.footer_picker
    } else if state.is_editing() {
        theme.footer_edit
    } else {
        theme.footer_normal
    };
    let style = Style::default()
        .fg(theme.text_secondary.to_color())
        .bg(background.to_color())
        .add_modifier(Modifier::BOLD);
    frame.render_widget(Paragraph::new(Span::styled(hints(state), style)).style(style), size);
}

/// Render the current notification, if any.
///
pub fn notification(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    if let Some(notification) = state.get_notification() {
        let line = Line::from(vec![
            Span::styled(
                format!(" {}", notification.message),
                styling::notification_style(theme, notification.level),
            ),
            Span::styled("  (Esc to dismiss)", styling::muted_text_style(theme)),
        ]);
        frame.render_widget(Paragraph::new(line), size);
    }
}
