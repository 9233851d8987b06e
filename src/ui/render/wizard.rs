use super::Frame;
use crate::fields::{AttrValue, Attribute, FieldRow, InputKind};
use crate::state::{Focus, State};
use crate::ui::widgets::styling;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Row, Table, TableState},
};

/// Render the field row list beside the attributes of the selected row.
///
pub fn wizard(frame: &mut Frame, size: Rect, state: &State) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(size);
    rows(frame, chunks[0], state);
    attributes(frame, chunks[1], state);
}

fn row_title(row: &FieldRow) -> String {
    let label = row.text(Attribute::Label);
    let label = if label.is_empty() { "(untitled)" } else { label };
    let field_type = row
        .field_type()
        .map(|t| t.label().to_string())
        .unwrap_or_else(|| row.value(Attribute::Type).to_string());
    format!("{} [{}]", label, field_type)
}

fn rows(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let active = *state.current_focus() == Focus::Rows;
    let store = state.get_store();

    let items: Vec<ListItem> = store
        .rows
        .iter()
        .map(|row| {
            let (marker, marker_style) = if row.all_valid {
                ("✓ ", styling::valid_text_style(theme))
            } else {
                ("✗ ", styling::invalid_text_style(theme))
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, marker_style),
                Span::styled(row_title(row), styling::normal_text_style(theme)),
            ]))
        })
        .collect();

    let valid = store.rows.iter().filter(|r| r.all_valid).count();
    let title = format!("Field Rows ({}/{} valid)", valid, store.rows.len());
    let block = Block::default()
        .title(Span::styled(title, styling::active_block_title_style()))
        .borders(Borders::ALL)
        .border_style(if active {
            styling::active_block_border_style(theme)
        } else {
            styling::normal_block_border_style(theme)
        });

    let highlight = if active {
        styling::active_list_item_style(theme)
    } else {
        styling::current_list_item_style(theme)
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    let mut list_state = ListState::default();
    list_state.select(Some(state.get_row_index()));
    frame.render_stateful_widget(list, size, &mut list_state);
}

fn display_value(input: InputKind, value: &AttrValue) -> String {
    match input {
        InputKind::Checkbox => {
            if value.as_bool() {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            }
        }
        _ => value.to_string().replace('\n', " ⏎ "),
    }
}

fn attributes(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let active = *state.current_focus() == Focus::Attributes;
    let catalog = state.get_catalog();

    let row = match state.get_selected_row() {
        Some(row) => row,
        None => return,
    };

    let table_rows: Vec<Row> = state
        .get_applicable_attributes()
        .into_iter()
        .map(|attribute| {
            let definition = catalog.definition(attribute);
            let attribute_state = row.state(attribute);
            let disabled = definition.is_disabled(row);
            let label = if definition.required {
                format!("{} *", definition.label)
            } else {
                definition.label.to_string()
            };
            let value_style = if disabled {
                styling::muted_text_style(theme)
            } else {
                styling::normal_text_style(theme)
            };
            let error = attribute_state
                .filter(|s| s.touched && !s.is_valid)
                .and_then(|s| s.error_message.clone())
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(Span::styled(label, styling::normal_text_style(theme))),
                Cell::from(Span::styled(
                    display_value(definition.input, row.value(attribute)),
                    value_style,
                )),
                Cell::from(Span::styled(error, styling::invalid_text_style(theme))),
            ])
        })
        .collect();

    let mut title = format!("Attributes: {}", row_title(row));
    if row.field_type().map(|t| t.is_picklist()).unwrap_or(false) {
        let source = if row.uses_global_value_set() {
            "global value set"
        } else {
            "inline values"
        };
        title.push_str(&format!(" ({}, g to switch)", source));
    }
    let block = Block::default()
        .title(Span::styled(title, styling::active_block_title_style()))
        .borders(Borders::ALL)
        .border_style(if active {
            styling::active_block_border_style(theme)
        } else {
            styling::normal_block_border_style(theme)
        });

    let widths = [
        Constraint::Length(24),
        Constraint::Percentage(45),
        Constraint::Min(10),
    ];
    let table = Table::new(table_rows, widths)
        .block(block)
        .highlight_style(if active {
            styling::active_list_item_style(theme)
        } else {
            styling::current_list_item_style(theme)
        });
    let mut table_state = TableState::default();
    table_state.select(Some(state.get_attribute_index()));
    frame.render_stateful_widget(table, size, &mut table_state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(InputKind::Checkbox, &AttrValue::Bool(true)), "[x]");
        assert_eq!(display_value(InputKind::Checkbox, &AttrValue::Null), "[ ]");
        assert_eq!(
            display_value(InputKind::Textarea, &AttrValue::text("a\nb")),
            "a ⏎ b"
        );
        assert_eq!(display_value(InputKind::Text, &AttrValue::Number(18)), "18");
    }
}
