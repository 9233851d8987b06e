use super::draft::Draft;
use super::error::StateError;
use super::navigation::{
    EditBuffer, Focus, InputTarget, Notification, NotificationLevel, OptionPicker, View,
};
use crate::app::NetworkEventSender;
use crate::error::AppResult;
use crate::events::network::{queried_object, Event as NetworkEvent};
use crate::fields::{
    export_rows, import_records, prepare_payload, read_csv_file, write_csv_file, Action,
    AttrValue, Attribute, Catalog, FieldMetadata, FieldRow, FieldsError, InputKind, RowKey,
    RowStore, SelectOption,
};
use crate::grid::{DataGrid, Direction};
use crate::logger::LogBuffer;
use crate::salesforce::{DeployResult, PageLayout, SaveResult};
use crate::ui::{Theme, SPINNER_FRAME_COUNT};
use log::*;
use ratatui::layout::Rect;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Houses data representative of application state.
///
pub struct State {
    net_sender: Option<NetworkEventSender>,
    catalog: Arc<Catalog>,
    store: RowStore,
    saved: Draft<Vec<FieldRow>>,
    target_objects: Vec<String>,
    connected: bool,
    terminal_size: Rect,
    spinner_index: usize,
    view: View,
    focus: Focus,
    row_index: usize,
    attribute_index: usize,
    edit_buffer: Option<EditBuffer>,
    option_picker: Option<OptionPicker>,
    next_token: u64,
    reset_confirmation: bool,
    notification: Option<Notification>,
    loading: bool,
    log_visible: bool,
    log_buffer: Option<LogBuffer>,
    theme: Theme,
    deploy_results: Vec<DeployResult>,
    layouts: Vec<PageLayout>,
    payload_scroll: u16,
    query: String,
    grid: Option<DataGrid>,
    grid_row: usize,
    grid_column: usize,
    grid_sort: Option<(String, Direction)>,
    grid_filter: String,
}

/// Defines default application state.
///
impl Default for State {
    fn default() -> State {
        let catalog = Arc::new(Catalog::new());
        let store = RowStore::new(&catalog);
        State {
            net_sender: None,
            saved: Draft::new(store.rows.clone()),
            store,
            catalog,
            target_objects: vec![],
            connected: false,
            terminal_size: Rect::default(),
            spinner_index: 0,
            view: View::Wizard,
            focus: Focus::Rows,
            row_index: 0,
            attribute_index: 0,
            edit_buffer: None,
            option_picker: None,
            next_token: 0,
            reset_confirmation: false,
            notification: None,
            loading: false,
            log_visible: false,
            log_buffer: None,
            theme: Theme::default(),
            deploy_results: vec![],
            layouts: vec![],
            payload_scroll: 0,
            query: String::new(),
            grid: None,
            grid_row: 0,
            grid_column: 0,
            grid_sort: None,
            grid_filter: String::new(),
        }
    }
}

impl State {
    pub fn new(
        net_sender: NetworkEventSender,
        catalog: Arc<Catalog>,
        target_objects: Vec<String>,
        connected: bool,
        theme: Theme,
        log_buffer: LogBuffer,
    ) -> Self {
        let store = RowStore::new(&catalog);
        State {
            net_sender: Some(net_sender),
            saved: Draft::new(store.rows.clone()),
            store,
            catalog,
            target_objects,
            connected,
            theme,
            log_buffer: Some(log_buffer),
            ..State::default()
        }
    }

    fn send(&self, event: NetworkEvent) {
        match &self.net_sender {
            Some(sender) => {
                if let Err(e) = sender.send(event) {
                    error!("Failed to queue network event: {}", e);
                }
            }
            None => warn!("Dropping network event without a sender: {:?}", event),
        }
    }

    /// Get the current theme.
    ///
    pub fn get_theme(&self) -> &Theme {
        &self.theme
    }

    /// Sets the terminal size.
    ///
    pub fn set_terminal_size(&mut self, size: Rect) -> &mut Self {
        self.terminal_size = size;
        self
    }

    pub fn get_terminal_size(&self) -> Rect {
        self.terminal_size
    }

    /// Advance the spinner index.
    ///
    pub fn advance_spinner_index(&mut self) -> &mut Self {
        self.spinner_index += 1;
        if self.spinner_index >= SPINNER_FRAME_COUNT {
            self.spinner_index = 0;
        }
        self
    }

    /// Return the current spinner index.
    ///
    pub fn get_spinner_index(&self) -> &usize {
        &self.spinner_index
    }

    pub fn get_catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn get_store(&self) -> &RowStore {
        &self.store
    }

    pub fn get_target_objects(&self) -> &[String] {
        &self.target_objects
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Run an action through the row reducer and keep the selection and any
    /// open picker consistent with the new rows.
    ///
    pub fn dispatch(&mut self, action: Action) -> &mut Self {
        let store = self.store.clone();
        self.store = store.reduce(&self.catalog, action);
        self.saved.set(self.store.rows.clone());

        if self.row_index >= self.store.rows.len() {
            self.row_index = self.store.rows.len() - 1;
        }
        let attribute_count = self.get_applicable_attributes().len();
        if self.attribute_index >= attribute_count {
            self.attribute_index = attribute_count.saturating_sub(1);
        }
        let picker_row_gone = self
            .option_picker
            .as_ref()
            .map(|p| self.store.row(p.row_key).is_none())
            .unwrap_or(false);
        if picker_row_gone {
            self.option_picker = None;
        }
        self
    }

    /// Whether the rows differ from the last export or deployment.
    ///
    pub fn has_unsaved_rows(&self) -> bool {
        self.saved.is_dirty()
    }

    /// Accept the current rows as saved.
    ///
    pub fn mark_rows_saved(&mut self) -> &mut Self {
        self.saved.commit();
        self
    }

    /// Return the current view.
    ///
    pub fn current_view(&self) -> &View {
        &self.view
    }

    pub fn next_view(&mut self) -> &mut Self {
        self.view = self.view.next();
        self
    }

    pub fn set_view(&mut self, view: View) -> &mut Self {
        self.view = view;
        self
    }

    /// Return the current focus.
    ///
    pub fn current_focus(&self) -> &Focus {
        &self.focus
    }

    pub fn focus_rows(&mut self) -> &mut Self {
        self.focus = Focus::Rows;
        self
    }

    pub fn focus_attributes(&mut self) -> &mut Self {
        self.focus = Focus::Attributes;
        self
    }

    pub fn get_row_index(&self) -> usize {
        self.row_index
    }

    pub fn get_attribute_index(&self) -> usize {
        self.attribute_index
    }

    /// Return the selected row.
    ///
    pub fn get_selected_row(&self) -> Option<&FieldRow> {
        self.store.rows.get(self.row_index)
    }

    /// Return the attributes shown for the selected row.
    ///
    pub fn get_applicable_attributes(&self) -> Vec<Attribute> {
        self.get_selected_row()
            .map(|row| self.catalog.applicable(row))
            .unwrap_or_default()
    }

    pub fn get_selected_attribute(&self) -> Option<Attribute> {
        self.get_applicable_attributes()
            .get(self.attribute_index)
            .copied()
    }

    /// Select the next row, wrapping around.
    ///
    pub fn next_row(&mut self) -> &mut Self {
        self.row_index = (self.row_index + 1) % self.store.rows.len();
        self.attribute_index = 0;
        self
    }

    /// Select the previous row, wrapping around.
    ///
    pub fn previous_row(&mut self) -> &mut Self {
        let len = self.store.rows.len();
        self.row_index = (self.row_index + len - 1) % len;
        self.attribute_index = 0;
        self
    }

    pub fn next_attribute(&mut self) -> &mut Self {
        let len = self.get_applicable_attributes().len();
        if len > 0 {
            self.attribute_index = (self.attribute_index + 1) % len;
        }
        self
    }

    pub fn previous_attribute(&mut self) -> &mut Self {
        let len = self.get_applicable_attributes().len();
        if len > 0 {
            self.attribute_index = (self.attribute_index + len - 1) % len;
        }
        self
    }

    fn selected_key(&self) -> Result<RowKey, StateError> {
        self.get_selected_row()
            .map(|row| row.key)
            .ok_or(StateError::RowNotSelected)
    }

    /// Append a row and select it.
    ///
    pub fn add_row(&mut self) -> &mut Self {
        self.dispatch(Action::Add);
        self.row_index = self.store.rows.len() - 1;
        self.attribute_index = 0;
        self
    }

    /// Duplicate the selected row and select the copy.
    ///
    pub fn clone_selected_row(&mut self) -> Result<(), StateError> {
        let key = self.selected_key()?;
        self.dispatch(Action::CloneRow { key });
        self.row_index = (self.row_index + 1).min(self.store.rows.len() - 1);
        Ok(())
    }

    pub fn delete_selected_row(&mut self) -> Result<(), StateError> {
        let key = self.selected_key()?;
        self.dispatch(Action::Delete { key });
        Ok(())
    }

    pub fn request_reset(&mut self) -> &mut Self {
        self.reset_confirmation = true;
        self
    }

    pub fn has_reset_confirmation(&self) -> bool {
        self.reset_confirmation
    }

    pub fn cancel_reset(&mut self) -> &mut Self {
        self.reset_confirmation = false;
        self
    }

    /// Replace all rows with a single default row.
    ///
    pub fn confirm_reset(&mut self) -> &mut Self {
        self.reset_confirmation = false;
        self.dispatch(Action::Reset);
        self.row_index = 0;
        self.attribute_index = 0;
        self.notify(NotificationLevel::Info, "Field rows reset");
        self
    }

    /// Switch the selected picklist between an inline value set and a
    /// global value set.
    ///
    pub fn toggle_picklist_source(&mut self) -> Result<(), StateError> {
        let row = self.get_selected_row().ok_or(StateError::RowNotSelected)?;
        let picklist = row.field_type().map(|t| t.is_picklist()).unwrap_or(false);
        if !picklist {
            return Err(StateError::Other(
                "Value set source only applies to picklists".to_string(),
            ));
        }
        let action = Action::PicklistOptionChanged {
            key: row.key,
            global: !row.uses_global_value_set(),
        };
        self.dispatch(action);
        Ok(())
    }

    /// Act on the selected attribute: toggle a checkbox, open a text prompt,
    /// or open the option picker.
    ///
    pub fn activate_attribute(&mut self) -> Result<(), StateError> {
        let row = self.get_selected_row().ok_or(StateError::RowNotSelected)?;
        let key = row.key;
        let attribute = self
            .get_selected_attribute()
            .ok_or(StateError::RowNotSelected)?;
        let definition = self.catalog.definition(attribute);
        if definition.is_disabled(row) {
            return Err(StateError::AttributeDisabled(definition.label.to_string()));
        }

        match definition.input {
            InputKind::Checkbox => {
                let value = !row.value(attribute).as_bool();
                self.dispatch(Action::Change {
                    key,
                    attribute,
                    value: AttrValue::Bool(value),
                });
                self.dispatch(Action::Touch { key, attribute });
            }
            InputKind::Text | InputKind::Textarea => {
                let text = row.value(attribute).to_string();
                let multiline = definition.input == InputKind::Textarea;
                self.begin_input(InputTarget::Attribute(attribute), text, multiline);
            }
            InputKind::Picklist | InputKind::Radio => self.open_picker(key, attribute),
        }
        Ok(())
    }

    fn open_picker(&mut self, row_key: RowKey, attribute: Attribute) {
        self.next_token += 1;
        let token = self.next_token;
        let options = self.catalog.static_options(attribute);
        let remote = options.is_none();
        self.option_picker = Some(OptionPicker {
            token,
            row_key,
            attribute,
            options: None,
            index: 0,
        });
        match options {
            Some(options) => {
                self.set_picker_options(token, options);
            }
            None => {
                if !self.connected {
                    self.option_picker = None;
                    self.notify(
                        NotificationLevel::Error,
                        "Options for this attribute need a CRM connection",
                    );
                    return;
                }
                debug!("Requesting options for {} (token {})", attribute, token);
                self.send(NetworkEvent::LoadOptions {
                    token,
                    row_key,
                    attribute,
                });
            }
        }
        if remote {
            self.loading = true;
        }
    }

    /// Store fetched options if the picker that asked for them is still
    /// open. Returns false for stale results.
    ///
    pub fn set_picker_options(&mut self, token: u64, options: Vec<SelectOption>) -> bool {
        let current = match self.store_row_value_for_picker(token) {
            Some(current) => current,
            None => {
                debug!("Discarding options for stale picker token {}", token);
                return false;
            }
        };
        if let Some(picker) = self.option_picker.as_mut() {
            picker.index = options
                .iter()
                .position(|o| o.value == current)
                .unwrap_or(0);
            picker.options = Some(options);
        }
        self.loading = false;
        true
    }

    /// Close the picker whose options failed to load.
    ///
    pub fn fail_picker_options(&mut self, token: u64, message: &str) -> bool {
        if self.option_picker.as_ref().map(|p| p.token) != Some(token) {
            debug!("Discarding failure for stale picker token {}", token);
            return false;
        }
        self.option_picker = None;
        self.loading = false;
        self.notify(
            NotificationLevel::Error,
            &format!("Failed to load options: {}", message),
        );
        true
    }

    fn store_row_value_for_picker(&self, token: u64) -> Option<String> {
        let picker = self.option_picker.as_ref().filter(|p| p.token == token)?;
        let row = self.store.row(picker.row_key)?;
        Some(row.value(picker.attribute).to_string())
    }

    pub fn get_option_picker(&self) -> Option<&OptionPicker> {
        self.option_picker.as_ref()
    }

    pub fn next_picker_option(&mut self) -> &mut Self {
        if let Some(picker) = self.option_picker.as_mut() {
            let len = picker.options.as_ref().map(Vec::len).unwrap_or(0);
            if len > 0 {
                picker.index = (picker.index + 1) % len;
            }
        }
        self
    }

    pub fn previous_picker_option(&mut self) -> &mut Self {
        if let Some(picker) = self.option_picker.as_mut() {
            let len = picker.options.as_ref().map(Vec::len).unwrap_or(0);
            if len > 0 {
                picker.index = (picker.index + len - 1) % len;
            }
        }
        self
    }

    /// Close the picker. Options still in flight for it will be dropped.
    ///
    pub fn close_picker(&mut self) -> &mut Self {
        if self.option_picker.take().is_some() {
            self.loading = false;
        }
        self
    }

    /// Write the highlighted option into the row and close the picker.
    ///
    pub fn choose_picker_option(&mut self) -> &mut Self {
        let picker = match self.option_picker.take() {
            Some(picker) => picker,
            None => return self,
        };
        let chosen = picker
            .options
            .as_ref()
            .and_then(|options| options.get(picker.index))
            .map(|o| o.value.clone());
        if let Some(value) = chosen {
            self.dispatch(Action::Change {
                key: picker.row_key,
                attribute: picker.attribute,
                value: AttrValue::text(value),
            });
            self.dispatch(Action::Touch {
                key: picker.row_key,
                attribute: picker.attribute,
            });
        }
        self
    }

    /// Open a text prompt.
    ///
    pub fn begin_input(&mut self, target: InputTarget, text: String, multiline: bool) -> &mut Self {
        self.edit_buffer = Some(EditBuffer {
            target,
            text,
            multiline,
        });
        self
    }

    pub fn get_edit_buffer(&self) -> Option<&EditBuffer> {
        self.edit_buffer.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.edit_buffer.is_some()
    }

    pub fn input_char(&mut self, c: char) -> &mut Self {
        if let Some(buffer) = self.edit_buffer.as_mut() {
            buffer.text.push(c);
        }
        self
    }

    pub fn input_backspace(&mut self) -> &mut Self {
        if let Some(buffer) = self.edit_buffer.as_mut() {
            buffer.text.pop();
        }
        self
    }

    pub fn cancel_input(&mut self) -> &mut Self {
        self.edit_buffer = None;
        self
    }

    /// Apply the prompt text to whatever it was collecting.
    ///
    pub fn submit_input(&mut self) -> AppResult<()> {
        let buffer = match self.edit_buffer.take() {
            Some(buffer) => buffer,
            None => return Ok(()),
        };
        match buffer.target {
            InputTarget::Attribute(attribute) => {
                let key = self.selected_key()?;
                let value = if self.catalog.definition(attribute).numeric {
                    buffer
                        .text
                        .trim()
                        .parse::<i64>()
                        .map(AttrValue::Number)
                        .unwrap_or_else(|_| AttrValue::text(buffer.text.trim()))
                } else {
                    AttrValue::text(buffer.text)
                };
                self.dispatch(Action::Change {
                    key,
                    attribute,
                    value,
                });
                self.dispatch(Action::Touch { key, attribute });
            }
            InputTarget::ImportPath => {
                let count = self.import_csv(Path::new(buffer.text.trim()))?;
                self.notify(
                    NotificationLevel::Success,
                    &format!("Imported {} field row(s)", count),
                );
            }
            InputTarget::ExportPath => {
                self.export_csv(Path::new(buffer.text.trim()))?;
                self.notify(
                    NotificationLevel::Success,
                    &format!("Exported field rows to {}", buffer.text.trim()),
                );
            }
            InputTarget::Soql => self.run_query(buffer.text)?,
            InputTarget::GridFilter => self.set_grid_filter(buffer.text)?,
            InputTarget::GridCell => self.set_grid_cell(&buffer.text)?,
        }
        Ok(())
    }

    /// Append rows read from a CSV file. Returns how many were read.
    ///
    pub fn import_csv(&mut self, path: &Path) -> Result<usize, FieldsError> {
        info!("Importing field rows from {}...", path.display());
        let records = read_csv_file(path)?;
        let rows = import_records(&self.catalog, &records)?;
        let count = rows.len();
        self.dispatch(Action::Import { rows });
        Ok(count)
    }

    /// Write the rows to a CSV file and mark them saved.
    ///
    pub fn export_csv(&mut self, path: &Path) -> Result<(), FieldsError> {
        info!("Exporting field rows to {}...", path.display());
        let records = export_rows(&self.catalog, &self.store.rows);
        write_csv_file(path, &records)?;
        self.mark_rows_saved();
        Ok(())
    }

    /// Return one create request per target object and row.
    ///
    pub fn get_payload(&self) -> Vec<FieldMetadata> {
        prepare_payload(&self.catalog, &self.target_objects, &self.store.rows)
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn get_payload_json(&self) -> String {
        serde_json::to_string_pretty(&self.get_payload()).unwrap_or_default()
    }

    pub fn get_payload_scroll(&self) -> u16 {
        self.payload_scroll
    }

    pub fn scroll_payload_down(&mut self) -> &mut Self {
        self.payload_scroll = self.payload_scroll.saturating_add(1);
        self
    }

    pub fn scroll_payload_up(&mut self) -> &mut Self {
        self.payload_scroll = self.payload_scroll.saturating_sub(1);
        self
    }

    /// Queue deployment of every row to every target object.
    ///
    pub fn request_deploy(&mut self) -> Result<(), StateError> {
        if !self.store.all_valid {
            let invalid = self.store.rows.iter().filter(|r| !r.all_valid).count();
            return Err(StateError::InvalidRows(invalid));
        }
        if self.target_objects.is_empty() {
            return Err(StateError::NoTargetObjects);
        }
        if !self.connected {
            return Err(StateError::NotConnected);
        }
        let fields = self.get_payload();
        info!("Queueing deployment of {} custom field(s)", fields.len());
        self.loading = true;
        self.deploy_results.clear();
        self.send(NetworkEvent::Deploy { fields });
        Ok(())
    }

    /// Record deployment outcomes. The rows count as saved only when every
    /// field was created.
    ///
    pub fn set_deploy_results(&mut self, results: Vec<DeployResult>) -> &mut Self {
        self.loading = false;
        let failed: Vec<&DeployResult> = results.iter().filter(|r| !r.success).collect();
        if failed.is_empty() {
            self.notify(
                NotificationLevel::Success,
                &format!("Deployed {} custom field(s)", results.len()),
            );
            self.mark_rows_saved();
        } else {
            let first = failed
                .first()
                .and_then(|r| r.errors.first().map(|e| format!("{}: {}", r.full_name, e)))
                .unwrap_or_default();
            self.notify(
                NotificationLevel::Error,
                &format!(
                    "{} of {} field(s) failed. {}",
                    failed.len(),
                    results.len(),
                    first
                ),
            );
        }
        self.deploy_results = results;
        self
    }

    pub fn get_deploy_results(&self) -> &[DeployResult] {
        &self.deploy_results
    }

    /// Queue a page layout lookup for the target objects.
    ///
    pub fn request_layouts(&mut self) -> Result<(), StateError> {
        if self.target_objects.is_empty() {
            return Err(StateError::NoTargetObjects);
        }
        if !self.connected {
            return Err(StateError::NotConnected);
        }
        self.loading = true;
        self.send(NetworkEvent::LoadLayouts {
            sobjects: self.target_objects.clone(),
        });
        Ok(())
    }

    pub fn set_layouts(&mut self, layouts: Vec<PageLayout>) -> &mut Self {
        self.loading = false;
        self.layouts = layouts;
        self
    }

    pub fn get_layouts(&self) -> &[PageLayout] {
        &self.layouts
    }

    /// Show a message until dismissed or replaced.
    ///
    pub fn notify(&mut self, level: NotificationLevel, message: &str) -> &mut Self {
        match level {
            NotificationLevel::Error => warn!("{}", message),
            _ => info!("{}", message),
        }
        self.notification = Some(Notification {
            level,
            message: message.to_string(),
        });
        self
    }

    /// Surface a failed remote call and clear the loading flag.
    ///
    pub fn notify_failure(&mut self, message: &str) -> &mut Self {
        self.loading = false;
        self.notify(NotificationLevel::Error, message)
    }

    pub fn get_notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn dismiss_notification(&mut self) -> &mut Self {
        self.notification = None;
        self
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn toggle_log(&mut self) -> &mut Self {
        self.log_visible = !self.log_visible;
        self
    }

    pub fn is_log_visible(&self) -> bool {
        self.log_visible
    }

    /// Return the newest log entries, oldest first.
    ///
    pub fn get_log_entries(&self, limit: usize) -> Vec<String> {
        match &self.log_buffer {
            Some(buffer) => match buffer.lock() {
                Ok(entries) => {
                    let skip = entries.len().saturating_sub(limit);
                    entries.iter().skip(skip).cloned().collect()
                }
                Err(_) => vec![],
            },
            None => vec![],
        }
    }

    pub fn get_query(&self) -> &str {
        &self.query
    }

    /// Queue a query for the grid.
    ///
    pub fn run_query(&mut self, soql: String) -> Result<(), StateError> {
        if soql.trim().is_empty() {
            return Err(StateError::Other("Query is empty".to_string()));
        }
        if !self.connected {
            return Err(StateError::NotConnected);
        }
        self.query = soql.trim().to_string();
        self.loading = true;
        self.send(NetworkEvent::RunQuery {
            soql: self.query.clone(),
        });
        Ok(())
    }

    /// Replace the grid with new results, keeping sort and filter when the
    /// columns still exist.
    ///
    pub fn set_grid(&mut self, mut grid: DataGrid) -> &mut Self {
        self.loading = false;
        if let Some((column, direction)) = &self.grid_sort {
            if grid.sort_by(column, *direction).is_err() {
                self.grid_sort = None;
            }
        }
        if !self.grid_filter.is_empty() {
            let _ = grid.set_filter(None, &self.grid_filter);
        }
        info!("Loaded {} record(s) into the grid", grid.len());
        self.grid = Some(grid);
        self.grid_row = 0;
        self.grid_column = 0;
        self
    }

    pub fn get_grid(&self) -> Option<&DataGrid> {
        self.grid.as_ref()
    }

    pub fn get_grid_row(&self) -> usize {
        self.grid_row
    }

    pub fn get_grid_column(&self) -> usize {
        self.grid_column
    }

    pub fn get_grid_sort(&self) -> Option<&(String, Direction)> {
        self.grid_sort.as_ref()
    }

    pub fn get_grid_filter(&self) -> &str {
        &self.grid_filter
    }

    pub fn next_grid_row(&mut self) -> &mut Self {
        let len = self
            .grid
            .as_ref()
            .map(|g| g.visible_indexes().len())
            .unwrap_or(0);
        if len > 0 {
            self.grid_row = (self.grid_row + 1) % len;
        }
        self
    }

    pub fn previous_grid_row(&mut self) -> &mut Self {
        let len = self
            .grid
            .as_ref()
            .map(|g| g.visible_indexes().len())
            .unwrap_or(0);
        if len > 0 {
            self.grid_row = (self.grid_row + len - 1) % len;
        }
        self
    }

    pub fn next_grid_column(&mut self) -> &mut Self {
        let len = self.grid.as_ref().map(|g| g.columns().len()).unwrap_or(0);
        if len > 0 {
            self.grid_column = (self.grid_column + 1) % len;
        }
        self
    }

    pub fn previous_grid_column(&mut self) -> &mut Self {
        let len = self.grid.as_ref().map(|g| g.columns().len()).unwrap_or(0);
        if len > 0 {
            self.grid_column = (self.grid_column + len - 1) % len;
        }
        self
    }

    fn selected_column_name(&self) -> Result<String, StateError> {
        let grid = self.grid.as_ref().ok_or(StateError::NoGrid)?;
        grid.columns()
            .get(self.grid_column)
            .map(|c| c.name.clone())
            .ok_or(StateError::NoGrid)
    }

    /// Cycle the selected column through ascending, descending and unsorted.
    ///
    pub fn cycle_grid_sort(&mut self) -> AppResult<()> {
        let column = self.selected_column_name()?;
        let next = match &self.grid_sort {
            Some((current, Direction::Ascending)) if *current == column => {
                Some(Direction::Descending)
            }
            Some((current, Direction::Descending)) if *current == column => None,
            _ => Some(Direction::Ascending),
        };
        let grid = self.grid.as_mut().ok_or(StateError::NoGrid)?;
        match next {
            Some(direction) => {
                grid.sort_by(&column, direction)?;
                self.grid_sort = Some((column, direction));
            }
            None => {
                grid.clear_sort();
                self.grid_sort = None;
            }
        }
        self.grid_row = 0;
        Ok(())
    }

    /// Filter rows on any column containing the text.
    ///
    pub fn set_grid_filter(&mut self, text: String) -> AppResult<()> {
        let grid = self.grid.as_mut().ok_or(StateError::NoGrid)?;
        grid.set_filter(None, text.trim())?;
        self.grid_filter = text.trim().to_string();
        self.grid_row = 0;
        Ok(())
    }

    /// Prompt for a new value of the selected cell.
    ///
    pub fn begin_grid_cell_edit(&mut self) -> AppResult<()> {
        let column = self.selected_column_name()?;
        let grid = self.grid.as_ref().ok_or(StateError::NoGrid)?;
        let editable = grid
            .columns()
            .get(self.grid_column)
            .map(|c| c.editable)
            .unwrap_or(false);
        if !editable {
            return Err(crate::grid::GridError::ReadOnlyColumn(column).into());
        }
        let current = grid
            .visible_rows()
            .get(self.grid_row)
            .and_then(|r| r.get(&column))
            .map(crate::grid::display)
            .unwrap_or_default();
        self.begin_input(InputTarget::GridCell, current, false);
        Ok(())
    }

    fn set_grid_cell(&mut self, text: &str) -> AppResult<()> {
        let column = self.selected_column_name()?;
        let row = self.grid_row;
        let grid = self.grid.as_mut().ok_or(StateError::NoGrid)?;
        let index = grid
            .visible_indexes()
            .get(row)
            .copied()
            .ok_or(crate::grid::GridError::RecordNotFound(row))?;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str::<Value>(text)
                .ok()
                .filter(|v| v.is_number() || v.is_boolean())
                .unwrap_or_else(|| Value::String(text.to_string()))
        };
        grid.set_cell(index, &column, value)?;
        Ok(())
    }

    /// Discard grid edits.
    ///
    pub fn revert_grid(&mut self) -> &mut Self {
        if let Some(grid) = self.grid.as_mut() {
            grid.revert();
        }
        self
    }

    /// Queue the pending grid edits for saving to the queried object.
    ///
    pub fn request_grid_save(&mut self) -> Result<(), StateError> {
        let grid = self.grid.as_ref().ok_or(StateError::NoGrid)?;
        let changes = grid.changes();
        if changes.is_empty() {
            return Err(StateError::NoGridChanges);
        }
        let sobject = queried_object(&self.query).ok_or(StateError::UnknownQueryObject)?;
        if !self.connected {
            return Err(StateError::NotConnected);
        }
        info!("Queueing save of {} edited {} record(s)", changes.len(), sobject);
        self.loading = true;
        self.send(NetworkEvent::SaveRecords { sobject, changes });
        Ok(())
    }

    /// Record save outcomes. Saved records stop counting as edited; failed
    /// ones keep their edits.
    ///
    pub fn set_save_results(&mut self, results: Vec<SaveResult>) -> &mut Self {
        self.loading = false;
        let failed: Vec<&SaveResult> = results.iter().filter(|r| !r.success).collect();
        if let Some(grid) = self.grid.as_mut() {
            if failed.is_empty() {
                grid.commit();
            } else {
                let saved: Vec<String> = results
                    .iter()
                    .filter(|r| r.success)
                    .map(|r| r.id.clone())
                    .collect();
                grid.commit_records(&saved);
            }
        }
        if failed.is_empty() {
            self.notify(
                NotificationLevel::Success,
                &format!("Saved {} record(s)", results.len()),
            )
        } else {
            let first = failed
                .first()
                .and_then(|r| r.errors.first().map(|e| format!("{}: {}", r.id, e)))
                .unwrap_or_default();
            self.notify(
                NotificationLevel::Error,
                &format!(
                    "{} of {} record(s) failed to save. {}",
                    failed.len(),
                    results.len(),
                    first
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{naming::api_name_from_label, FieldType};
    use fake::{Fake, Faker};
    use serde_json::json;

    fn labelled(state: &mut State, label: &str) {
        state.focus_attributes();
        let position = state
            .get_applicable_attributes()
            .iter()
            .position(|a| *a == Attribute::Label)
            .unwrap();
        state.attribute_index = position;
        state.activate_attribute().unwrap();
        for c in label.chars() {
            state.input_char(c);
        }
        state.submit_input().unwrap();
    }

    fn grid_state() -> State {
        let records = vec![
            json!({"Id": "001A", "Name": "Zeta", "Employees": 10}),
            json!({"Id": "001B", "Name": "Alpha", "Employees": null}),
            json!({"Id": "001C", "Name": "Mid", "Employees": 3}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let mut state = State::default();
        state.set_grid(DataGrid::from_records(records, None));
        state
    }

    #[test]
    fn default_state_has_one_clean_row() {
        let state = State::default();
        assert_eq!(state.get_store().rows.len(), 1);
        assert!(!state.has_unsaved_rows());
        assert_eq!(*state.current_view(), View::Wizard);
    }

    #[test]
    fn add_and_clone_select_the_new_row() {
        let mut state = State::default();
        state.add_row();
        assert_eq!(state.get_row_index(), 1);
        assert!(state.has_unsaved_rows());

        state.previous_row();
        state.clone_selected_row().unwrap();
        assert_eq!(state.get_store().rows.len(), 3);
        assert_eq!(state.get_row_index(), 1);
    }

    #[test]
    fn delete_keeps_selection_in_range() {
        let mut state = State::default();
        state.add_row();
        state.delete_selected_row().unwrap();
        assert_eq!(state.get_row_index(), 0);
        state.delete_selected_row().unwrap();
        assert_eq!(state.get_store().rows.len(), 1);
    }

    #[test]
    fn row_navigation_wraps() {
        let mut state = State::default();
        state.add_row().add_row();
        state.next_row();
        assert_eq!(state.get_row_index(), 0);
        state.previous_row();
        assert_eq!(state.get_row_index(), 2);
    }

    #[test]
    fn reset_requires_confirmation() {
        let mut state = State::default();
        state.add_row();
        state.request_reset();
        assert!(state.has_reset_confirmation());
        state.cancel_reset();
        assert_eq!(state.get_store().rows.len(), 2);

        state.request_reset().confirm_reset();
        assert!(!state.has_reset_confirmation());
        assert_eq!(state.get_store().rows.len(), 1);
        assert!(state.get_notification().is_some());
    }

    #[test]
    fn typed_label_derives_full_name() {
        let mut state = State::default();
        labelled(&mut state, "Customer Region");
        let row = state.get_selected_row().unwrap();
        assert_eq!(row.text(Attribute::Label), "Customer Region");
        assert_eq!(
            Some(row.text(Attribute::FullName).to_string()),
            api_name_from_label("Customer Region")
        );
        assert!(row.state(Attribute::Label).unwrap().touched);
    }

    #[test]
    fn cancelled_input_changes_nothing() {
        let mut state = State::default();
        let before = state.get_store().clone();
        state.begin_input(InputTarget::Attribute(Attribute::Label), String::new(), false);
        state.input_char('x').input_backspace().input_char('y');
        assert_eq!(state.get_edit_buffer().unwrap().text, "y");
        state.cancel_input();
        assert_eq!(*state.get_store(), before);
    }

    #[test]
    fn checkbox_attribute_toggles() {
        let mut state = State::default();
        let position = state
            .get_applicable_attributes()
            .iter()
            .position(|a| *a == Attribute::Required)
            .unwrap();
        state.attribute_index = position;
        state.activate_attribute().unwrap();
        assert!(state
            .get_selected_row()
            .unwrap()
            .value(Attribute::Required)
            .as_bool());
    }

    #[test]
    fn static_picker_chooses_type() {
        let mut state = State::default();
        state.attribute_index = state
            .get_applicable_attributes()
            .iter()
            .position(|a| *a == Attribute::Type)
            .unwrap();
        state.activate_attribute().unwrap();
        let picker = state.get_option_picker().unwrap();
        let options = picker.options.clone().unwrap();
        let target = options
            .iter()
            .position(|o| o.value == FieldType::Checkbox.api_name())
            .unwrap();
        while state.get_option_picker().unwrap().index != target {
            state.next_picker_option();
        }
        state.choose_picker_option();
        assert!(state.get_option_picker().is_none());
        assert_eq!(
            state.get_selected_row().unwrap().field_type(),
            Some(FieldType::Checkbox)
        );
    }

    #[test]
    fn stale_picker_options_are_discarded() {
        let mut state = State::default();
        let key = state.get_selected_row().unwrap().key;
        state.option_picker = Some(OptionPicker {
            token: 7,
            row_key: key,
            attribute: Attribute::ReferenceTo,
            options: None,
            index: 0,
        });
        let options = vec![SelectOption::new("Account", "Account")];
        assert!(!state.set_picker_options(6, options.clone()));
        assert!(state.get_option_picker().unwrap().options.is_none());
        assert!(state.set_picker_options(7, options.clone()));
        assert_eq!(state.get_option_picker().unwrap().options, Some(options));

        state.close_picker();
        assert!(!state.fail_picker_options(7, "timeout"));
        assert!(state.get_notification().is_none());
    }

    #[test]
    fn remote_picker_without_connection_notifies() {
        let mut state = State::default();
        let key = state.get_selected_row().unwrap().key;
        state.open_picker(key, Attribute::ReferenceTo);
        assert!(state.get_option_picker().is_none());
        assert_eq!(
            state.get_notification().unwrap().level,
            NotificationLevel::Error
        );
    }

    #[test]
    fn deploy_refused_for_invalid_rows() {
        let mut state = State::default();
        assert!(matches!(
            state.request_deploy(),
            Err(StateError::InvalidRows(1))
        ));
        assert!(!state.is_loading());
    }

    #[test]
    fn deploy_results_mark_rows_saved_only_on_success() {
        let mut state = State::default();
        state.add_row();
        let failed = DeployResult {
            success: false,
            errors: vec!["DUPLICATE_DEVELOPER_NAME: exists".to_string()],
            ..Faker.fake()
        };
        state.set_deploy_results(vec![failed]);
        assert!(state.has_unsaved_rows());
        assert_eq!(
            state.get_notification().unwrap().level,
            NotificationLevel::Error
        );

        let created = DeployResult {
            success: true,
            ..Faker.fake()
        };
        state.set_deploy_results(vec![created]);
        assert!(!state.has_unsaved_rows());
        assert!(!state.is_loading());
    }

    #[test]
    fn payload_crosses_objects_and_rows() {
        let mut state = State {
            target_objects: vec!["Account".to_string(), "Contact".to_string()],
            ..State::default()
        };
        labelled(&mut state, "Region");
        state.add_row();
        assert_eq!(state.get_payload().len(), 4);
        assert!(state.get_payload_json().contains("Account.Region__c"));
    }

    #[test]
    fn grid_sort_cycles() {
        let mut state = grid_state();
        state.grid_column = state
            .get_grid()
            .unwrap()
            .columns()
            .iter()
            .position(|c| c.name == "Name")
            .unwrap();
        state.cycle_grid_sort().unwrap();
        assert_eq!(
            state.get_grid().unwrap().visible_rows()[0]["Name"],
            json!("Alpha")
        );
        state.cycle_grid_sort().unwrap();
        assert_eq!(
            state.get_grid().unwrap().visible_rows()[0]["Name"],
            json!("Zeta")
        );
        state.cycle_grid_sort().unwrap();
        assert!(state.get_grid_sort().is_none());
    }

    #[test]
    fn grid_filter_applies_to_all_columns() {
        let mut state = grid_state();
        state.set_grid_filter("mid".to_string()).unwrap();
        assert_eq!(state.get_grid().unwrap().visible_rows().len(), 1);
        state.set_grid_filter(String::new()).unwrap();
        assert_eq!(state.get_grid().unwrap().visible_rows().len(), 3);
    }

    #[test]
    fn grid_actions_without_results_fail() {
        let mut state = State::default();
        assert!(state.cycle_grid_sort().is_err());
        assert!(state.set_grid_filter("x".to_string()).is_err());
        assert!(matches!(state.request_grid_save(), Err(StateError::NoGrid)));
    }

    fn edited_grid_state() -> (State, std::sync::mpsc::Receiver<NetworkEvent>) {
        let (sender, receiver) = std::sync::mpsc::channel();
        let mut state = grid_state();
        state.net_sender = Some(sender);
        state.connected = true;
        state.query = "SELECT Id, Name, Employees FROM Account".to_string();
        let grid = state.grid.as_mut().unwrap();
        grid.set_cell(0, "Name", json!("Zeta Two")).unwrap();
        grid.set_cell(2, "Employees", json!(4)).unwrap();
        (state, receiver)
    }

    #[test]
    fn grid_save_sends_changes_for_queried_object() {
        let (mut state, receiver) = edited_grid_state();
        state.request_grid_save().unwrap();
        assert!(state.is_loading());
        match receiver.try_recv().unwrap() {
            NetworkEvent::SaveRecords { sobject, changes } => {
                assert_eq!(sobject, "Account");
                assert_eq!(changes.len(), 2);
                assert_eq!(changes[0].id, "001A");
                assert_eq!(changes[0].fields.get("Name"), Some(&json!("Zeta Two")));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn grid_save_needs_edits_and_an_object() {
        let mut state = grid_state();
        state.connected = true;
        state.query = "SELECT Id FROM Account".to_string();
        assert!(matches!(
            state.request_grid_save(),
            Err(StateError::NoGridChanges)
        ));

        let (mut state, _receiver) = edited_grid_state();
        state.query = String::new();
        assert!(matches!(
            state.request_grid_save(),
            Err(StateError::UnknownQueryObject)
        ));

        let (mut state, _receiver) = edited_grid_state();
        state.connected = false;
        assert!(matches!(
            state.request_grid_save(),
            Err(StateError::NotConnected)
        ));
    }

    #[test]
    fn grid_save_results_keep_failed_edits() {
        let (mut state, _receiver) = edited_grid_state();
        state.set_save_results(vec![
            SaveResult {
                id: "001A".to_string(),
                success: true,
                errors: vec![],
            },
            SaveResult {
                id: "001C".to_string(),
                success: false,
                errors: vec!["FIELD_INTEGRITY_EXCEPTION: bad value".to_string()],
            },
        ]);
        let pending = state.get_grid().unwrap().changes();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "001C");
        let notification = state.get_notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(notification.message.contains("FIELD_INTEGRITY_EXCEPTION"));
    }

    #[test]
    fn spinner_wraps() {
        let mut state = State::default();
        for _ in 0..SPINNER_FRAME_COUNT {
            state.advance_spinner_index();
        }
        assert_eq!(*state.get_spinner_index(), 0);
    }
}
