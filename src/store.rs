//! Lifecycle orchestration for one managed document.
//!
//! The store wires a schema, a [`ManagedDocument`], and the [`ApiClient`]
//! into the load / edit / save / delete workflow every admin page follows.
//! Failures surface as a banner on the document and leave its data
//! untouched; nothing retries automatically.

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{ApiClient, SaveMethod};
use crate::document::{DeleteTarget, ManagedDocument};
use crate::error::StoreError;
use crate::media::StagedFile;
use crate::merge::merge_document;
use crate::path::DotPath;
use crate::schema::{DocumentSchema, Plan};

/// Configuration for one document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// API origin, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// Endpoint for this document type, e.g. `/api/testimonials`.
    pub api_path: String,
    /// Subscription tier from the external site context; gates list caps.
    pub plan: Plan,
}

/// Owns one content document's client-side lifecycle.
pub struct DocumentStore {
    config: StoreConfig,
    client: ApiClient,
    schema: Arc<DocumentSchema>,
    doc: ManagedDocument,
}

impl DocumentStore {
    pub fn new(config: StoreConfig, schema: DocumentSchema) -> Self {
        let client = ApiClient::new(config.base_url.clone());
        let schema = Arc::new(schema);
        let doc = ManagedDocument::new(schema.clone());
        Self {
            config,
            client,
            schema,
            doc,
        }
    }

    pub fn document(&self) -> &ManagedDocument {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut ManagedDocument {
        &mut self.doc
    }

    pub fn data(&self) -> &serde_json::Value {
        self.doc.data()
    }

    pub fn plan(&self) -> Plan {
        self.config.plan
    }

    /// Fetch the document and merge it over defaults. Absence means "no
    /// document yet": defaults stay and `exists` is false. A failure sets
    /// the error banner and leaves the data unchanged.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        match self.client.fetch(&self.config.api_path).await {
            Ok(Some(server)) => {
                let merged = merge_document(&self.schema, &server);
                self.doc.hydrate(merged, true);
                info!(schema = %self.schema.name, "document loaded");
                Ok(())
            }
            Ok(None) => {
                info!(schema = %self.schema.name, "no persisted document; defaults in place");
                Ok(())
            }
            Err(e) => {
                warn!(schema = %self.schema.name, error = %e, "fetch failed");
                self.doc.set_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Persist the document and all staged files in one request: POST when
    /// the document has never existed, PUT otherwise. On success the server
    /// response is re-merged (it carries final media URLs), staging is
    /// cleared with previews revoked, and the state machine lands on
    /// `Success`. On failure the in-memory edits and staging are untouched
    /// so the user can retry.
    pub async fn save(&mut self) -> Result<(), StoreError> {
        self.doc.begin_save()?;

        let values = self.doc.values_for_save();
        let files: Vec<(DotPath, StagedFile)> = self
            .doc
            .staging()
            .pending()
            .map(|(p, f)| (p.clone(), f.clone()))
            .collect();
        let method = if self.doc.exists() {
            SaveMethod::Put
        } else {
            SaveMethod::Post
        };

        match self
            .client
            .save(&self.config.api_path, method, &values, &files)
            .await
        {
            Ok(response) => {
                let merged = merge_document(&self.schema, &response);
                self.doc.hydrate(merged, true);
                self.doc.staging_mut().clear();
                self.doc.finish_save_ok();
                info!(schema = %self.schema.name, ?method, "document saved");
                Ok(())
            }
            Err(e) => {
                warn!(schema = %self.schema.name, error = %e, "save failed");
                self.doc.finish_save_err(e.to_string());
                Err(e)
            }
        }
    }

    /// Confirm the open delete modal. Delete-all issues a DELETE and resets
    /// to defaults; an item delete sends the record's id and removes it
    /// locally. Without an open modal this is a no-op.
    pub async fn confirm_delete(&mut self) -> Result<(), StoreError> {
        let Some(modal) = self.doc.take_delete_modal() else {
            return Ok(());
        };

        match modal.target {
            DeleteTarget::All => {
                match self.client.delete(&self.config.api_path, &[]).await {
                    Ok(()) => {
                        self.doc.reset_to_defaults();
                        info!(schema = %self.schema.name, "document deleted; defaults restored");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(schema = %self.schema.name, error = %e, "delete failed");
                        self.doc.set_error(e.to_string());
                        Err(e)
                    }
                }
            }
            DeleteTarget::Item { list, index, .. } => {
                let id = self
                    .doc
                    .get(&format!("{}.{}.id", list, index))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                let ids: Vec<String> = id.into_iter().collect();

                match self.client.delete(&self.config.api_path, &ids).await {
                    Ok(()) => {
                        self.doc.remove_list_item(&list, index)?;
                        info!(schema = %self.schema.name, list, index, "record deleted");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(schema = %self.schema.name, error = %e, "record delete failed");
                        self.doc.set_error(e.to_string());
                        Err(e)
                    }
                }
            }
        }
    }

    // --- conveniences delegating to the document ----------------------------

    pub fn update_nested(
        &mut self,
        path: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.doc.update_nested(path, value)
    }

    pub fn stage_file(&mut self, path: &str, file: StagedFile) -> Result<String, StoreError> {
        self.doc.stage_file(path, file)
    }

    pub fn clear_file(&mut self, path: &str) -> Result<(), StoreError> {
        self.doc.clear_file(path)
    }

    pub fn add_list_item(&mut self, list: &str) -> Result<usize, StoreError> {
        self.doc.add_list_item(list, self.config.plan)
    }

    pub fn update_list_item(
        &mut self,
        list: &str,
        index: usize,
        patch: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.doc.update_list_item(list, index, patch)
    }

    pub fn remove_list_item(&mut self, list: &str, index: usize) -> Result<(), StoreError> {
        self.doc.remove_list_item(list, index).map(|_| ())
    }

    pub fn move_list_item(&mut self, list: &str, from: usize, to: usize) -> Result<(), StoreError> {
        self.doc.move_list_item(list, from, to)
    }

    pub fn open_delete_all_modal(&mut self) {
        self.doc.open_delete_all_modal();
    }

    pub fn close_delete_modal(&mut self) {
        self.doc.close_delete_modal();
    }

    pub fn completeness(&self) -> u8 {
        self.doc.completeness()
    }
}
