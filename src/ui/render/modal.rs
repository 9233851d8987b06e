use super::{centered_rect, Frame};
use crate::state::{InputTarget, State};
use crate::ui::widgets::{spinner, styling};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

/// Render whichever overlay is open: reset confirmation, option picker or
/// text prompt.
///
pub fn modal(frame: &mut Frame, size: Rect, state: &State) {
    if state.has_reset_confirmation() {
        confirm_reset(frame, size, state);
    } else if state.get_option_picker().is_some() {
        picker(frame, size, state);
    } else if state.is_editing() {
        prompt(frame, size, state);
    }
}

fn confirm_reset(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let area = centered_rect(50, 20, size);
    let rows = state.get_store().rows.len();
    let text = vec![
        Line::from(Span::styled(
            format!("Discard all {} field row(s)?", rows),
            styling::normal_text_style(theme),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y: reset   n: keep",
            styling::muted_text_style(theme),
        )),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .title("Reset")
                .borders(Borders::ALL)
                .border_style(styling::active_block_border_style(theme)),
        ),
        area,
    );
}

fn picker(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let picker = match state.get_option_picker() {
        Some(picker) => picker,
        None => return,
    };
    let area = centered_rect(50, 60, size);
    let title = state.get_catalog().definition(picker.attribute).label;
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(styling::active_block_border_style(theme));
    frame.render_widget(Clear, area);

    match &picker.options {
        None => {
            let loading = format!(
                "{} Loading options...",
                spinner::frame(*state.get_spinner_index())
            );
            frame.render_widget(
                Paragraph::new(Span::styled(loading, styling::muted_text_style(theme)))
                    .block(block),
                area,
            );
        }
        Some(options) if options.is_empty() => {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "No options available",
                    styling::muted_text_style(theme),
                ))
                .block(block),
                area,
            );
        }
        Some(options) => {
            let items: Vec<ListItem> = options
                .iter()
                .map(|option| {
                    let text = if option.label == option.value {
                        option.label.clone()
                    } else {
                        format!("{} ({})", option.label, option.value)
                    };
                    ListItem::new(Span::styled(text, styling::normal_text_style(theme)))
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(styling::active_list_item_style(theme));
            let mut list_state = ListState::default();
            list_state.select(Some(picker.index));
            frame.render_stateful_widget(list, area, &mut list_state);
        }
    }
}

fn prompt_title(state: &State, target: InputTarget) -> String {
    match target {
        InputTarget::Attribute(attribute) => {
            state.get_catalog().definition(attribute).label.to_string()
        }
        InputTarget::ImportPath => "Import CSV from".to_string(),
        InputTarget::ExportPath => "Export CSV to".to_string(),
        InputTarget::Soql => "SOQL Query".to_string(),
        InputTarget::GridFilter => "Filter Rows".to_string(),
        InputTarget::GridCell => "Cell Value".to_string(),
    }
}

fn prompt(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let buffer = match state.get_edit_buffer() {
        Some(buffer) => buffer,
        None => return,
    };
    let height = if buffer.multiline { 40 } else { 15 };
    let area = centered_rect(70, height, size);
    let lines: Vec<Line> = format!("{}▏", buffer.text)
        .split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), styling::normal_text_style(theme))))
        .collect();
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(prompt_title(state, buffer.target))
                .borders(Borders::ALL)
                .border_style(styling::active_block_border_style(theme)),
        ),
        area,
    );
}
