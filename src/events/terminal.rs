use crate::state::{Focus, InputTarget, NotificationLevel, State, View};
use anyhow::Result;
use clipboard::{ClipboardContext, ClipboardProvider};
use crossterm::{
    event,
    event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
};
use log::*;
use std::fmt::Display;
use std::{sync::mpsc, thread, time::Duration};

/// Specify terminal event poll rate in milliseconds.
///
const TICK_RATE_IN_MS: u64 = 60;

const DEFAULT_EXPORT_PATH: &str = "fields.csv";

/// Specify different terminal event types.
///
#[derive(Debug)]
pub enum Event<I> {
    Input(I),
    Tick,
}

/// Specify struct for managing terminal events channel.
///
pub struct Handler {
    rx: mpsc::Receiver<Event<KeyEvent>>,
    _tx: mpsc::Sender<Event<KeyEvent>>,
}

impl Default for Handler {
    fn default() -> Self {
        Handler::new()
    }
}

impl Handler {
    /// Return new instance after spawning new input polling thread.
    ///
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let tx_clone = tx.clone();
        thread::spawn(move || loop {
            let tick_rate = Duration::from_millis(TICK_RATE_IN_MS);
            if let Ok(true) = event::poll(tick_rate) {
                if let Ok(CrosstermEvent::Key(key)) = event::read() {
                    if tx_clone.send(Event::Input(key)).is_err() {
                        break;
                    }
                }
            }
            if tx_clone.send(Event::Tick).is_err() {
                break;
            }
        });
        Handler { rx, _tx: tx }
    }

    /// Receive next terminal event and handle it accordingly. Returns result
    /// with value true if should continue or false if exit was requested.
    ///
    pub fn handle_next(&self, state: &mut State) -> Result<bool> {
        match self.rx.recv()? {
            Event::Input(key) => Ok(handle_key(state, key)),
            Event::Tick => {
                if state.is_loading() {
                    state.advance_spinner_index();
                }
                Ok(true)
            }
        }
    }
}

/// Apply one key press to state. Returns false when exit was requested.
///
pub fn handle_key(state: &mut State, key: KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return true;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        debug!("Processing exit terminal event '{:?}'...", key);
        return false;
    }

    if state.is_editing() {
        handle_input_key(state, key);
        return true;
    }
    if state.get_option_picker().is_some() {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                state.next_picker_option();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                state.previous_picker_option();
            }
            KeyCode::Enter => {
                state.choose_picker_option();
            }
            KeyCode::Esc => {
                state.close_picker();
            }
            _ => (),
        }
        return true;
    }
    if state.has_reset_confirmation() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.confirm_reset();
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                state.cancel_reset();
            }
            _ => (),
        }
        return true;
    }

    match key.code {
        KeyCode::Char('q') => {
            debug!("Processing exit terminal event '{:?}'...", key);
            return false;
        }
        KeyCode::Esc => {
            state.dismiss_notification();
        }
        KeyCode::Tab => {
            state.next_view();
        }
        KeyCode::Char('L') => {
            state.toggle_log();
        }
        _ => match *state.current_view() {
            View::Wizard => handle_wizard_key(state, key),
            View::Payload => handle_payload_key(state, key),
            View::Query => handle_query_key(state, key),
        },
    }
    true
}

fn handle_input_key(state: &mut State, key: KeyEvent) {
    let multiline = state.get_edit_buffer().map(|b| b.multiline).unwrap_or(false);
    match key.code {
        KeyCode::Esc => {
            state.cancel_input();
        }
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let result = state.submit_input();
            report(state, result);
        }
        KeyCode::Enter if multiline => {
            state.input_char('\n');
        }
        KeyCode::Enter => {
            let result = state.submit_input();
            report(state, result);
        }
        KeyCode::Backspace => {
            state.input_backspace();
        }
        KeyCode::Char(c) => {
            state.input_char(c);
        }
        _ => (),
    }
}

fn handle_wizard_key(state: &mut State, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => match state.current_focus() {
            Focus::Rows => {
                state.next_row();
            }
            Focus::Attributes => {
                state.next_attribute();
            }
        },
        KeyCode::Char('k') | KeyCode::Up => match state.current_focus() {
            Focus::Rows => {
                state.previous_row();
            }
            Focus::Attributes => {
                state.previous_attribute();
            }
        },
        KeyCode::Char('h') | KeyCode::Left => {
            state.focus_rows();
        }
        KeyCode::Char('l') | KeyCode::Right => {
            state.focus_attributes();
        }
        KeyCode::Enter => match state.current_focus() {
            Focus::Rows => {
                state.focus_attributes();
            }
            Focus::Attributes => {
                let result = state.activate_attribute();
                report(state, result);
            }
        },
        KeyCode::Char('a') => {
            state.add_row();
        }
        KeyCode::Char('c') => {
            let result = state.clone_selected_row();
            report(state, result);
        }
        KeyCode::Char('d') => {
            let result = state.delete_selected_row();
            report(state, result);
        }
        KeyCode::Char('R') => {
            state.request_reset();
        }
        KeyCode::Char('g') => {
            let result = state.toggle_picklist_source();
            report(state, result);
        }
        KeyCode::Char('i') => {
            state.begin_input(InputTarget::ImportPath, String::new(), false);
        }
        KeyCode::Char('e') => {
            state.begin_input(
                InputTarget::ExportPath,
                DEFAULT_EXPORT_PATH.to_string(),
                false,
            );
        }
        KeyCode::Char('D') => {
            let result = state.request_deploy();
            report(state, result);
        }
        _ => (),
    }
}

fn handle_payload_key(state: &mut State, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.scroll_payload_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.scroll_payload_up();
        }
        KeyCode::Char('y') => {
            let payload = state.get_payload_json();
            match copy_to_clipboard(payload) {
                Ok(()) => {
                    state.notify(NotificationLevel::Success, "Payload copied to clipboard");
                }
                Err(e) => {
                    state.notify(
                        NotificationLevel::Error,
                        &format!("Failed to copy payload: {}", e),
                    );
                }
            }
        }
        KeyCode::Char('l') => {
            let result = state.request_layouts();
            report(state, result);
        }
        KeyCode::Char('D') => {
            let result = state.request_deploy();
            report(state, result);
        }
        _ => (),
    }
}

fn handle_query_key(state: &mut State, key: KeyEvent) {
    match key.code {
        KeyCode::Char(':') | KeyCode::Char('/') => {
            let query = state.get_query().to_string();
            state.begin_input(InputTarget::Soql, query, false);
        }
        KeyCode::Char('f') => {
            let filter = state.get_grid_filter().to_string();
            state.begin_input(InputTarget::GridFilter, filter, false);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.next_grid_row();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.previous_grid_row();
        }
        KeyCode::Char('l') | KeyCode::Right => {
            state.next_grid_column();
        }
        KeyCode::Char('h') | KeyCode::Left => {
            state.previous_grid_column();
        }
        KeyCode::Char('s') => {
            let result = state.cycle_grid_sort();
            report(state, result);
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            let result = state.begin_grid_cell_edit();
            report(state, result);
        }
        KeyCode::Char('u') => {
            state.revert_grid();
        }
        KeyCode::Char('w') => {
            let result = state.request_grid_save();
            report(state, result);
        }
        _ => (),
    }
}

fn report<E: Display>(state: &mut State, result: Result<(), E>) {
    if let Err(e) = result {
        state.notify(NotificationLevel::Error, &e.to_string());
    }
}

fn copy_to_clipboard(text: String) -> std::result::Result<(), String> {
    let mut context: ClipboardContext = ClipboardProvider::new().map_err(|e| e.to_string())?;
    context.set_contents(text).map_err(|e| e.to_string())
}
