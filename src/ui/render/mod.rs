mod footer;
mod header;
mod log;
mod modal;
mod payload;
mod query;
mod wizard;

use super::Frame;
use crate::state::{State, View};
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of the log pane when visible.
const LOG_HEIGHT: u16 = 10;

/// Render the whole screen according to state.
///
pub fn render(frame: &mut Frame, state: &mut State) {
    let log_height = if state.is_log_visible() { LOG_HEIGHT } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(log_height),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    header::header(frame, chunks[0], state);
    match *state.current_view() {
        View::Wizard => wizard::wizard(frame, chunks[1], state),
        View::Payload => payload::payload(frame, chunks[1], state),
        View::Query => query::query(frame, chunks[1], state),
    }
    if state.is_log_visible() {
        log::log(frame, chunks[2], state);
    }
    footer::notification(frame, chunks[3], state);
    footer::footer(frame, chunks[4], state);
    modal::modal(frame, frame.size(), state);
}

/// Return a rectangle centered in `area` with the given percentage size.
///
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(state: &mut State) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .iter()
            .map(|cell| cell.symbol().to_string())
            .collect()
    }

    #[test]
    fn test_render_wizard() {
        let mut state = State::default();
        let screen = draw(&mut state);
        assert!(screen.contains("Field Rows"));
        assert!(screen.contains("Field Label"));
    }

    #[test]
    fn test_render_every_view_with_overlays() {
        let mut state = State::default();
        state.toggle_log();
        state.request_reset();
        assert!(draw(&mut state).contains("Reset"));
        state.cancel_reset();

        state.next_view();
        assert!(draw(&mut state).contains("Payload"));
        state.next_view();
        state.begin_input(crate::state::InputTarget::Soql, "SELECT Id".to_string(), false);
        assert!(draw(&mut state).contains("SELECT Id"));
    }
}
