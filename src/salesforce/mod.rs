mod client;
mod error;
mod models;
mod resource;

pub use error::SalesforceError;
pub use resource::*;

use crate::fields::FieldMetadata;
use crate::grid::RecordChange;
use anyhow::Result;
use client::Client;
use log::*;
use models::{error_message, CreateResponse, DescribeGlobal, SObjectDescribe};
use serde::de::DeserializeOwned;

/// Largest number of object names put in one layout query.
pub const LAYOUT_QUERY_CHUNK: usize = 100;

/// Responsible for asynchronous interaction with the CRM REST and Tooling
/// APIs including transformation of response data into explicitly-defined
/// types.
///
pub struct Salesforce {
    client: Client,
}

impl Salesforce {
    /// Returns a new instance for the given access token, instance URL and
    /// API version.
    ///
    pub fn new(access_token: &str, instance_url: &str, api_version: &str) -> Salesforce {
        debug!(
            "Initializing CRM client for {} (API v{})...",
            instance_url, api_version
        );
        Salesforce {
            client: Client::new(access_token, instance_url, api_version),
        }
    }

    /// Returns every object visible to the user.
    ///
    pub async fn describe_objects(&self) -> Result<Vec<SObjectSummary>> {
        debug!("Requesting global object describe...");
        let data: DescribeGlobal = self
            .client
            .get(&self.client.data_path("sobjects/"), None)
            .await?;
        debug!("Retrieved {} objects", data.sobjects.len());
        Ok(data.sobjects)
    }

    /// Returns the field metadata of an object.
    ///
    pub async fn describe_fields(&self, sobject: &str) -> Result<Vec<FieldDescribe>> {
        debug!("Requesting field describe for {}...", sobject);
        let path = self
            .client
            .data_path(&format!("sobjects/{}/describe/", sobject));
        let data: SObjectDescribe = self.client.get(&path, None).await?;
        Ok(data.fields)
    }

    /// Returns all records matching a SOQL query.
    ///
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        debug!("Running query: {}", soql);
        self.client.query_all("query/", soql).await
    }

    /// Returns all records matching a Tooling API query.
    ///
    pub async fn tooling_query<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        debug!("Running tooling query: {}", soql);
        self.client.query_all("tooling/query/", soql).await
    }

    /// Returns the org's global value sets.
    ///
    pub async fn global_value_sets(&self) -> Result<Vec<GlobalValueSet>> {
        self.tooling_query("SELECT Id, DeveloperName, MasterLabel FROM GlobalValueSet ORDER BY MasterLabel")
            .await
    }

    /// Returns the page layouts of the given objects, querying at most
    /// [`LAYOUT_QUERY_CHUNK`] names at a time.
    ///
    pub async fn page_layouts(&self, sobjects: &[String]) -> Result<Vec<PageLayout>> {
        let mut layouts = Vec::new();
        for chunk in sobjects.chunks(LAYOUT_QUERY_CHUNK) {
            let names = chunk
                .iter()
                .map(|name| format!("'{}'", name.replace('\\', "\\\\").replace('\'', "\\'")))
                .collect::<Vec<_>>()
                .join(",");
            let soql = format!(
                "SELECT Id, Name, TableEnumOrId FROM Layout WHERE TableEnumOrId IN ({})",
                names
            );
            layouts.extend(self.tooling_query::<PageLayout>(&soql).await?);
        }
        debug!(
            "Retrieved {} layouts for {} objects",
            layouts.len(),
            sobjects.len()
        );
        Ok(layouts)
    }

    /// Creates custom fields one by one. A rejected or unreadable reply is
    /// reported in that field's result and does not stop the remaining ones.
    ///
    pub async fn deploy_fields(&self, fields: &[FieldMetadata]) -> Result<Vec<DeployResult>> {
        let path = self.client.data_path("tooling/sobjects/CustomField/");
        let mut results = Vec::with_capacity(fields.len());

        for field in fields {
            info!("Deploying custom field {}...", field.full_name);
            let result = match self.deploy_field(&path, field).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Custom field {} failed: {}", field.full_name, e);
                    DeployResult {
                        full_name: field.full_name.clone(),
                        id: None,
                        success: false,
                        errors: vec![e.to_string()],
                    }
                }
            };
            results.push(result);
        }

        Ok(results)
    }

    /// Saves edited records of one object, one update per record. Failures
    /// are reported per record.
    ///
    pub async fn update_records(
        &self,
        sobject: &str,
        changes: &[RecordChange],
    ) -> Result<Vec<SaveResult>> {
        let mut results = Vec::with_capacity(changes.len());
        for change in changes {
            debug!("Updating {} {}...", sobject, change.id);
            let path = self
                .client
                .data_path(&format!("sobjects/{}/{}", sobject, change.id));
            let result = match self.client.patch(&path, &change.fields).await {
                Ok(response) if response.status().is_success() => SaveResult {
                    id: change.id.clone(),
                    success: true,
                    errors: vec![],
                },
                Ok(response) => {
                    let body = response.text().await.unwrap_or_else(|e| e.to_string());
                    let message = error_message(&body);
                    warn!("Update of {} {} rejected: {}", sobject, change.id, message);
                    SaveResult {
                        id: change.id.clone(),
                        success: false,
                        errors: message.split("; ").map(str::to_string).collect(),
                    }
                }
                Err(e) => {
                    warn!("Update of {} {} failed: {}", sobject, change.id, e);
                    SaveResult {
                        id: change.id.clone(),
                        success: false,
                        errors: vec![e.to_string()],
                    }
                }
            };
            results.push(result);
        }
        Ok(results)
    }

    async fn deploy_field(&self, path: &str, field: &FieldMetadata) -> Result<DeployResult> {
        let response = self.client.post(path, field).await?;
        let status = response.status();
        let body = response.text().await.map_err(SalesforceError::from)?;

        if status.is_success() {
            let created: CreateResponse =
                serde_json::from_str(&body).map_err(SalesforceError::from)?;
            return Ok(DeployResult {
                full_name: field.full_name.clone(),
                id: created.id,
                success: created.success,
                errors: vec![],
            });
        }
        let message = error_message(&body);
        warn!("Custom field {} rejected: {}", field.full_name, message);
        Ok(DeployResult {
            full_name: field.full_name.clone(),
            id: None,
            success: false,
            errors: message.split("; ").map(str::to_string).collect(),
        })
    }
}
