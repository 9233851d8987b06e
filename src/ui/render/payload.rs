use super::Frame;
use crate::state::State;
use crate::ui::widgets::styling;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Render the deployment payload with deploy results and page layouts.
///
pub fn payload(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(size);

    let fields = state.get_payload().len();
    let json = Paragraph::new(state.get_payload_json())
        .style(styling::normal_text_style(theme))
        .scroll((state.get_payload_scroll(), 0))
        .block(
            Block::default()
                .title(Span::styled(
                    format!("Payload ({} field(s))", fields),
                    styling::active_block_title_style(),
                ))
                .borders(Borders::ALL)
                .border_style(styling::active_block_border_style(theme)),
        );
    frame.render_widget(json, chunks[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let results: Vec<ListItem> = state
        .get_deploy_results()
        .iter()
        .map(|result| {
            let (marker, style) = if result.success {
                ("✓", styling::valid_text_style(theme))
            } else {
                ("✗", styling::invalid_text_style(theme))
            };
            let mut lines = vec![Line::from(vec![
                Span::styled(format!("{} ", marker), style),
                Span::styled(result.full_name.clone(), styling::normal_text_style(theme)),
            ])];
            for error in &result.errors {
                lines.push(Line::from(Span::styled(
                    format!("  {}", error),
                    styling::invalid_text_style(theme),
                )));
            }
            ListItem::new(lines)
        })
        .collect();
    frame.render_widget(
        List::new(results).block(
            Block::default()
                .title("Deploy Results")
                .borders(Borders::ALL)
                .border_style(styling::normal_block_border_style(theme)),
        ),
        side[0],
    );

    let layouts: Vec<ListItem> = state
        .get_layouts()
        .iter()
        .map(|layout| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{}: ", layout.table_enum_or_id),
                    styling::muted_text_style(theme),
                ),
                Span::styled(layout.name.clone(), styling::normal_text_style(theme)),
            ]))
        })
        .collect();
    frame.render_widget(
        List::new(layouts).block(
            Block::default()
                .title("Page Layouts")
                .borders(Borders::ALL)
                .border_style(styling::normal_block_border_style(theme)),
        ),
        side[1],
    );
}
