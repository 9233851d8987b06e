use crate::config::Config;
use crate::error::AppError;
use crate::events::network::{Event as NetworkEvent, Handler as NetworkEventHandler};
use crate::events::terminal::Handler as TerminalEventHandler;
use crate::fields::{Catalog, GlobalValueSetSource, ReferenceObjectsSource, SourceKind};
use crate::logger::{log_buffer, CustomLogger};
use crate::salesforce::Salesforce;
use crate::state::State;
use crate::ui::Theme;
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::*;
use std::io::{self, stdout};
use std::sync::Arc;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::Mutex;

pub type NetworkEventSender = std::sync::mpsc::Sender<NetworkEvent>;
type NetworkEventReceiver = std::sync::mpsc::Receiver<NetworkEvent>;

/// Oversees event processing, state management, and terminal output.
///
pub struct App {
    state: Arc<Mutex<State>>,
    salesforce: Option<Arc<Salesforce>>,
    catalog: Arc<Catalog>,
}

impl App {
    /// Start a new application according to the given configuration. Returns
    /// the result of the application execution.
    ///
    pub async fn start(config: Config, level: LevelFilter) -> Result<()> {
        let buffer = log_buffer();
        CustomLogger::buffered(level, Arc::clone(&buffer))
            .install()
            .map_err(|e| AppError::Logger(e.to_string()))?;

        info!("Starting application...");
        let salesforce = match config.connection() {
            Ok((instance_url, access_token)) => Some(Arc::new(Salesforce::new(
                access_token,
                instance_url,
                &config.api_version,
            ))),
            Err(e) => {
                warn!("Remote features disabled: {}", e);
                None
            }
        };
        let catalog = Arc::new(catalog_for(salesforce.as_ref()));
        let theme = Theme::from_name(&config.theme_name).unwrap_or_else(|| {
            warn!("Unknown theme '{}', using default", config.theme_name);
            Theme::default()
        });

        let (tx, rx) = std::sync::mpsc::channel::<NetworkEvent>();
        let app = App {
            state: Arc::new(Mutex::new(State::new(
                tx,
                Arc::clone(&catalog),
                config.target_objects.clone(),
                salesforce.is_some(),
                theme,
                buffer,
            ))),
            salesforce,
            catalog,
        };
        app.start_network(rx)?;
        app.start_ui().await?;

        info!("Exiting application...");
        Ok(())
    }

    /// Start a separate thread for asynchronous state mutations.
    ///
    fn start_network(&self, net_receiver: NetworkEventReceiver) -> Result<()> {
        let salesforce = match &self.salesforce {
            Some(salesforce) => Arc::clone(salesforce),
            None => {
                debug!("No connection configured; network thread not started.");
                return Ok(());
            }
        };
        debug!("Creating new thread for asynchronous networking...");
        let cloned_state = Arc::clone(&self.state);
        let catalog = Arc::clone(&self.catalog);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        std::thread::spawn(move || {
            runtime.block_on(async {
                let mut network_event_handler =
                    NetworkEventHandler::new(&cloned_state, &salesforce, &catalog);
                while let Ok(network_event) = net_receiver.recv() {
                    match network_event_handler.handle(network_event).await {
                        Ok(_) => (),
                        Err(e) => error!("Failed to handle network event: {}", e),
                    }
                }
            })
        });
        Ok(())
    }

    /// Begin the terminal event poll on a separate thread before starting the
    /// render loop on the main thread. Return the result following an exit
    /// request or unrecoverable error.
    ///
    async fn start_ui(&self) -> Result<()> {
        debug!("Starting user interface on main thread...");
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        enable_raw_mode()?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let terminal_event_handler = TerminalEventHandler::new();
        let result = loop {
            let mut state = self.state.lock().await;
            if let Ok(size) = terminal.size() {
                state.set_terminal_size(size);
            };
            if let Err(e) = terminal.draw(|frame| crate::ui::render(frame, &mut state)) {
                break Err(e.into());
            }
            match terminal_event_handler.handle_next(&mut state) {
                Ok(true) => (),
                Ok(false) => {
                    debug!("Received application exit request.");
                    break Ok(());
                }
                Err(e) => break Err(e),
            }
        };

        disable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;

        result
    }
}

/// Build the catalog, wiring remote option sources when connected.
///
pub fn catalog_for(salesforce: Option<&Arc<Salesforce>>) -> Catalog {
    match salesforce {
        Some(salesforce) => Catalog::new()
            .with_source(
                SourceKind::ReferenceObjects,
                Arc::new(ReferenceObjectsSource::new(Arc::clone(salesforce))),
            )
            .with_source(
                SourceKind::GlobalValueSets,
                Arc::new(GlobalValueSetSource::new(Arc::clone(salesforce))),
            ),
        None => Catalog::new(),
    }
}

