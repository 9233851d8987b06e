use super::Frame;
use crate::grid::{display, Direction as SortDirection};
use crate::state::State;
use crate::ui::widgets::styling;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

/// Columns left of the selected one that stay in view.
const LEADING_COLUMNS: usize = 2;
const MAX_COLUMN_WIDTH: usize = 30;
const MIN_COLUMN_WIDTH: usize = 6;

/// Render the query line and the result grid.
///
pub fn query(frame: &mut Frame, size: Rect, state: &State) {
    let theme = state.get_theme();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(size);

    let query = if state.get_query().is_empty() {
        Span::styled("Press : to enter a SOQL query", styling::muted_text_style(theme))
    } else {
        Span::styled(state.get_query().to_string(), styling::normal_text_style(theme))
    };
    frame.render_widget(
        Paragraph::new(query).block(
            Block::default()
                .title("Query")
                .borders(Borders::ALL)
                .border_style(styling::normal_block_border_style(theme)),
        ),
        chunks[0],
    );

    let grid = match state.get_grid() {
        Some(grid) => grid,
        None => {
            frame.render_widget(
                Block::default()
                    .title("Results")
                    .borders(Borders::ALL)
                    .border_style(styling::normal_block_border_style(theme)),
                chunks[1],
            );
            return;
        }
    };

    let start = state.get_grid_column().saturating_sub(LEADING_COLUMNS);
    let columns = &grid.columns()[start.min(grid.columns().len())..];
    let rows = grid.visible_rows();

    let header = Row::new(
        columns
            .iter()
            .enumerate()
            .map(|(offset, column)| {
                let arrow = match state.get_grid_sort() {
                    Some((name, SortDirection::Ascending)) if *name == column.name => " ▲",
                    Some((name, SortDirection::Descending)) if *name == column.name => " ▼",
                    _ => "",
                };
                let style = if start + offset == state.get_grid_column() {
                    styling::active_list_item_style(theme)
                } else {
                    styling::current_list_item_style(theme)
                };
                Cell::from(Span::styled(format!("{}{}", column.label, arrow), style))
            })
            .collect::<Vec<_>>(),
    );

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|column| {
            let widest = rows
                .iter()
                .filter_map(|r| r.get(&column.name))
                .map(|v| display(v).chars().count())
                .chain(std::iter::once(column.label.chars().count() + 2))
                .max()
                .unwrap_or(MIN_COLUMN_WIDTH);
            Constraint::Length(widest.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH) as u16)
        })
        .collect();

    let body: Vec<Row> = rows
        .iter()
        .map(|record| {
            Row::new(
                columns
                    .iter()
                    .map(|column| {
                        Cell::from(
                            record
                                .get(&column.name)
                                .map(display)
                                .unwrap_or_default(),
                        )
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    let mut title = format!("Results ({} of {})", rows.len(), grid.len());
    if !state.get_grid_filter().is_empty() {
        title.push_str(&format!(" filter: \"{}\"", state.get_grid_filter()));
    }
    if grid.is_dirty() {
        title.push_str(" ● edited (w to save, u to revert)");
    }

    let table = Table::new(body, widths)
        .header(header)
        .style(styling::normal_text_style(theme))
        .highlight_style(styling::current_list_item_style(theme).add_modifier(Modifier::REVERSED))
        .block(
            Block::default()
                .title(Span::styled(title, styling::active_block_title_style()))
                .borders(Borders::ALL)
                .border_style(styling::active_block_border_style(theme)),
        );
    let mut table_state = TableState::default();
    if !rows.is_empty() {
        table_state.select(Some(state.get_grid_row()));
    }
    frame.render_stateful_widget(table, chunks[1], &mut table_state);
}
