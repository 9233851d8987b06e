use crate::expression::mask_nested;
use crate::fields::{Attribute, Catalog, FieldMetadata, RowKey, SourceContext};
use crate::grid::{DataGrid, RecordChange};
use crate::salesforce::Salesforce;
use crate::state::State;
use anyhow::Result;
use log::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Specify different network event types.
///
#[derive(Debug, Clone)]
pub enum Event {
    LoadOptions {
        token: u64,
        row_key: RowKey,
        attribute: Attribute,
    },
    Deploy {
        fields: Vec<FieldMetadata>,
    },
    LoadLayouts {
        sobjects: Vec<String>,
    },
    RunQuery {
        soql: String,
    },
    SaveRecords {
        sobject: String,
        changes: Vec<RecordChange>,
    },
}

/// Specify struct for managing state with network events.
///
pub struct Handler<'a> {
    state: &'a Arc<Mutex<State>>,
    salesforce: &'a Salesforce,
    catalog: &'a Catalog,
}

impl<'a> Handler<'a> {
    /// Return new instance with reference to state.
    ///
    pub fn new(
        state: &'a Arc<Mutex<State>>,
        salesforce: &'a Salesforce,
        catalog: &'a Catalog,
    ) -> Self {
        Handler {
            state,
            salesforce,
            catalog,
        }
    }

    /// Handle network events by type. Failures are written to state as a
    /// notification before being returned.
    ///
    pub async fn handle(&mut self, event: Event) -> Result<()> {
        debug!("Processing network event '{:?}'...", event);
        let result = match event {
            Event::LoadOptions {
                token,
                row_key,
                attribute,
            } => self.load_options(token, row_key, attribute).await,
            Event::Deploy { fields } => self.deploy(fields).await,
            Event::LoadLayouts { sobjects } => self.load_layouts(sobjects).await,
            Event::RunQuery { soql } => self.run_query(soql).await,
            Event::SaveRecords { sobject, changes } => self.save_records(sobject, changes).await,
        };
        if let Err(e) = &result {
            let mut state = self.state.lock().await;
            state.notify_failure(&e.to_string());
        }
        result
    }

    /// Fetch options for an open picker. Results for a picker that has since
    /// closed are dropped by the state.
    ///
    async fn load_options(&mut self, token: u64, row_key: RowKey, attribute: Attribute) -> Result<()> {
        info!("Fetching options for {}...", attribute);
        let options = self
            .catalog
            .options(attribute, SourceContext::new(row_key, attribute))
            .await;
        let mut state = self.state.lock().await;
        match options {
            Ok(options) => {
                info!("Fetched {} options for {}", options.len(), attribute);
                state.set_picker_options(token, options);
            }
            Err(e) => {
                state.fail_picker_options(token, &e.to_string());
            }
        }
        Ok(())
    }

    /// Create the fields and record the per-field outcome.
    ///
    async fn deploy(&mut self, fields: Vec<FieldMetadata>) -> Result<()> {
        info!("Deploying {} custom field(s)...", fields.len());
        let results = self.salesforce.deploy_fields(&fields).await?;
        let failed = results.iter().filter(|r| !r.success).count();
        info!(
            "Deployment finished: {} created, {} failed",
            results.len() - failed,
            failed
        );
        let mut state = self.state.lock().await;
        state.set_deploy_results(results);
        Ok(())
    }

    async fn load_layouts(&mut self, sobjects: Vec<String>) -> Result<()> {
        info!("Fetching page layouts for {} object(s)...", sobjects.len());
        let layouts = self.salesforce.page_layouts(&sobjects).await?;
        let mut state = self.state.lock().await;
        state.set_layouts(layouts);
        Ok(())
    }

    async fn run_query(&mut self, soql: String) -> Result<()> {
        info!("Running query: {}", soql);
        let grid = query_grid(self.salesforce, &soql).await?;
        let mut state = self.state.lock().await;
        state.set_grid(grid);
        Ok(())
    }

    async fn save_records(&mut self, sobject: String, changes: Vec<RecordChange>) -> Result<()> {
        info!("Saving {} edited {} record(s)...", changes.len(), sobject);
        let results = self.salesforce.update_records(&sobject, &changes).await?;
        let mut state = self.state.lock().await;
        state.set_save_results(results);
        Ok(())
    }
}

/// Run a query into a grid, using the queried object's field describe for
/// column labels and kinds when it can be fetched.
///
pub async fn query_grid(salesforce: &Salesforce, soql: &str) -> Result<DataGrid> {
    let records = salesforce.query(soql).await?;
    let describe = match queried_object(soql) {
        Some(sobject) => match salesforce.describe_fields(&sobject).await {
            Ok(fields) => Some(fields),
            Err(e) => {
                warn!(
                    "Describe of {} failed, inferring column kinds: {}",
                    sobject, e
                );
                None
            }
        },
        None => None,
    };
    Ok(DataGrid::from_records(records, describe.as_deref()))
}

lazy_static! {
    static ref FROM_OBJECT: Regex = Regex::new(r"(?i)\bFROM\s+([A-Za-z][A-Za-z0-9_]*)").unwrap();
}

/// Return the object named in the outermost FROM clause of a query,
/// skipping relationship subqueries and quoted values.
///
pub fn queried_object(soql: &str) -> Option<String> {
    let outer = mask_nested(soql);
    FROM_OBJECT
        .captures(&outer)
        .map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Action, AttrValue, FieldType, SelectOption, SourceKind, ValueSource};
    use crate::logger::log_buffer;
    use crate::state::NotificationLevel;
    use crate::ui::Theme;
    use futures::future::{BoxFuture, FutureExt};
    use httpmock::prelude::*;
    use serde_json::json;

    struct FixedObjects;

    impl ValueSource for FixedObjects {
        fn fetch<'a>(
            &'a self,
            _ctx: &'a SourceContext,
        ) -> BoxFuture<'a, anyhow::Result<Vec<SelectOption>>> {
            async { Ok(vec![SelectOption::new("Account", "Account")]) }.boxed()
        }
    }

    #[test]
    fn test_queried_object() {
        assert_eq!(
            queried_object("SELECT Id, Name FROM Account WHERE Name != null"),
            Some("Account".to_string())
        );
        assert_eq!(
            queried_object("select id from my_object__c"),
            Some("my_object__c".to_string())
        );
        assert_eq!(queried_object("SELECT Id"), None);
    }

    #[test]
    fn test_queried_object_skips_subqueries() {
        assert_eq!(
            queried_object("SELECT Id, (SELECT Id FROM Contacts) FROM Account"),
            Some("Account".to_string())
        );
        assert_eq!(
            queried_object("SELECT Id FROM Contact WHERE Description = 'sent from Lead'"),
            Some("Contact".to_string())
        );
    }

    #[tokio::test]
    async fn test_load_options_fills_open_picker() {
        let server = MockServer::start();
        let salesforce = Salesforce::new("token", &server.base_url(), "59.0");
        let catalog = Arc::new(
            Catalog::new().with_source(SourceKind::ReferenceObjects, Arc::new(FixedObjects)),
        );
        let (tx, rx) = std::sync::mpsc::channel::<Event>();
        let state = Arc::new(Mutex::new(State::new(
            tx,
            Arc::clone(&catalog),
            vec!["Contact".to_string()],
            true,
            Theme::default(),
            log_buffer(),
        )));
        {
            let mut state = state.lock().await;
            let key = state.get_store().rows[0].key;
            state.dispatch(Action::Change {
                key,
                attribute: Attribute::Type,
                value: AttrValue::text(FieldType::Lookup.api_name()),
            });
            while state.get_selected_attribute() != Some(Attribute::ReferenceTo) {
                state.next_attribute();
            }
            state.activate_attribute().unwrap();
            assert!(state.is_loading());
        }

        let event = rx.try_recv().unwrap();
        let mut handler = Handler::new(&state, &salesforce, &catalog);
        handler.handle(event).await.unwrap();

        let state = state.lock().await;
        assert!(!state.is_loading());
        let picker = state.get_option_picker().unwrap();
        assert_eq!(
            picker.options,
            Some(vec![SelectOption::new("Account", "Account")])
        );
    }

    #[tokio::test]
    async fn test_deploy_records_results() {
        let server = MockServer::start();
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/services/data/v59.0/tooling/sobjects/CustomField/");
            then.status(201)
                .json_body(json!({"id": "00N000000000001", "success": true, "errors": []}));
        });
        let salesforce = Salesforce::new("token", &server.base_url(), "59.0");
        let catalog = Catalog::new();
        let state = Arc::new(Mutex::new(State::default()));
        let fields = {
            let state = state.lock().await;
            let row = &state.get_store().rows[0];
            vec![crate::fields::field_metadata(&catalog, "Account", row)]
        };

        let mut handler = Handler::new(&state, &salesforce, &catalog);
        handler.handle(Event::Deploy { fields }).await.unwrap();

        create.assert();
        let state = state.lock().await;
        assert_eq!(state.get_deploy_results().len(), 1);
        assert!(state.get_deploy_results()[0].success);
        assert_eq!(
            state.get_notification().unwrap().level,
            NotificationLevel::Success
        );
    }

    #[tokio::test]
    async fn test_query_failure_becomes_notification() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/services/data/v59.0/query/");
            then.status(400).json_body(json!([
                {"errorCode": "MALFORMED_QUERY", "message": "unexpected token"}
            ]));
        });
        let salesforce = Salesforce::new("token", &server.base_url(), "59.0");
        let catalog = Catalog::new();
        let state = Arc::new(Mutex::new(State::default()));

        let mut handler = Handler::new(&state, &salesforce, &catalog);
        let result = handler
            .handle(Event::RunQuery {
                soql: "SELECT FROM".to_string(),
            })
            .await;

        assert!(result.is_err());
        let state = state.lock().await;
        assert!(!state.is_loading());
        let notification = state.get_notification().unwrap();
        assert_eq!(notification.level, NotificationLevel::Error);
        assert!(notification.message.contains("MALFORMED_QUERY"));
    }

    #[tokio::test]
    async fn test_query_loads_grid_with_describe() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/services/data/v59.0/query/");
            then.status(200).json_body(json!({
                "totalSize": 1,
                "done": true,
                "records": [
                    {"attributes": {"type": "Account"}, "Id": "001A", "Name": "Acme"}
                ]
            }));
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/services/data/v59.0/sobjects/Account/describe/");
            then.status(200).json_body(json!({
                "fields": [
                    {"name": "Id", "label": "Account ID", "type": "id", "updateable": false},
                    {"name": "Name", "label": "Account Name", "type": "string", "updateable": true}
                ]
            }));
        });
        let salesforce = Salesforce::new("token", &server.base_url(), "59.0");
        let catalog = Catalog::new();
        let state = Arc::new(Mutex::new(State::default()));

        let mut handler = Handler::new(&state, &salesforce, &catalog);
        handler
            .handle(Event::RunQuery {
                soql: "SELECT Id, Name FROM Account".to_string(),
            })
            .await
            .unwrap();

        let state = state.lock().await;
        let grid = state.get_grid().unwrap();
        assert_eq!(grid.len(), 1);
        let name = grid.columns().iter().find(|c| c.name == "Name").unwrap();
        assert_eq!(name.label, "Account Name");
        assert!(name.editable);
    }

    #[tokio::test]
    async fn test_save_records_commits_saved_edits() {
        let server = MockServer::start();
        let update = server.mock(|when, then| {
            when.method("PATCH")
                .path("/services/data/v59.0/sobjects/Account/001A")
                .json_body(json!({"Name": "Acme Corp"}));
            then.status(204);
        });
        let salesforce = Salesforce::new("token", &server.base_url(), "59.0");
        let catalog = Catalog::new();
        let records = vec![json!({"Id": "001A", "Name": "Acme"})]
            .into_iter()
            .filter_map(|v| v.as_object().cloned())
            .collect();
        let mut grid = DataGrid::from_records(records, None);
        grid.set_cell(0, "Name", json!("Acme Corp")).unwrap();
        let changes = grid.changes();
        let state = Arc::new(Mutex::new(State::default()));
        state.lock().await.set_grid(grid);

        let mut handler = Handler::new(&state, &salesforce, &catalog);
        handler
            .handle(Event::SaveRecords {
                sobject: "Account".to_string(),
                changes,
            })
            .await
            .unwrap();

        update.assert();
        let state = state.lock().await;
        assert!(!state.get_grid().unwrap().is_dirty());
        assert_eq!(
            state.get_notification().unwrap().level,
            NotificationLevel::Success
        );
    }
}
