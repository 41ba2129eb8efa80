//! In-memory state of one managed content document.
//!
//! A [`ManagedDocument`] owns the live JSON data, whether the document has
//! ever been persisted, the staged media changes, the save lifecycle
//! machine, and transient delete-confirmation state. It knows nothing about
//! the wire; the store drives it.

use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreError;
use crate::list::ListController;
use crate::media::{FileStaging, StagedFile};
use crate::path::{get_path, get_path_mut, set_path, DotPath};
use crate::schema::{DocumentSchema, Plan};

/// Save lifecycle: `Idle → Saving → (Success | Error) → Idle`.
///
/// `Success` and `Error` are the banner states; they clear back to `Idle`
/// on the next edit or an explicit [`ManagedDocument::acknowledge`] (the
/// UI's clear-after-timeout).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Success,
    Error(String),
}

impl SaveState {
    pub fn is_saving(&self) -> bool {
        matches!(self, SaveState::Saving)
    }

    /// User-facing banner message, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SaveState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// What a pending delete confirmation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// The whole document; confirming resets to defaults.
    All,
    /// One record of a list field, identified for multi-record endpoints.
    Item {
        list: String,
        index: usize,
        label: String,
    },
}

/// Transient confirmation-dialog state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteModal {
    pub target: DeleteTarget,
}

/// One content document's client-side state.
pub struct ManagedDocument {
    schema: Arc<DocumentSchema>,
    /// Live document. Always fully populated: every recognized field holds
    /// at least its default.
    data: Value,
    /// Whether this document has been persisted before (POST vs PUT).
    exists: bool,
    staging: FileStaging,
    save_state: SaveState,
    delete_modal: Option<DeleteModal>,
}

impl ManagedDocument {
    pub fn new(schema: Arc<DocumentSchema>) -> Self {
        let data = schema.default_document();
        Self {
            schema,
            data,
            exists: false,
            staging: FileStaging::new(),
            save_state: SaveState::Idle,
            delete_modal: None,
        }
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn save_state(&self) -> &SaveState {
        &self.save_state
    }

    pub fn staging(&self) -> &FileStaging {
        &self.staging
    }

    pub fn delete_modal(&self) -> Option<&DeleteModal> {
        self.delete_modal.as_ref()
    }

    pub fn completeness(&self) -> u8 {
        self.schema.completeness(&self.data)
    }

    /// Replace the live data wholesale (after a merge) and mark persisted.
    pub(crate) fn hydrate(&mut self, merged: Value, exists: bool) {
        self.data = merged;
        self.exists = exists;
    }

    /// Set the value at a dot-path, creating intermediate containers. Clears
    /// a lingering success/error banner.
    pub fn update_nested(&mut self, path: &str, value: Value) -> Result<(), StoreError> {
        let path = DotPath::parse(path)?;
        set_path(&mut self.data, &path, value)?;
        self.clear_banner();
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let path = DotPath::parse(path).ok()?;
        get_path(&self.data, &path)
    }

    /// Stage a file for a media field and write its preview token into the
    /// document so the field renders immediately.
    pub fn stage_file(&mut self, path: &str, file: StagedFile) -> Result<String, StoreError> {
        let parsed = DotPath::parse(path)?;
        let preview = self.staging.stage(parsed.clone(), file);
        set_path(&mut self.data, &parsed, Value::String(preview.clone()))?;
        self.clear_banner();
        Ok(preview)
    }

    /// Clear a media field: blanks the document value and marks the
    /// persisted URL for removal on the next save.
    pub fn clear_file(&mut self, path: &str) -> Result<(), StoreError> {
        let parsed = DotPath::parse(path)?;
        self.staging.clear_field(parsed.clone());
        set_path(&mut self.data, &parsed, Value::String(String::new()))?;
        self.clear_banner();
        Ok(())
    }

    /// Append a blank record to a list field. Refused at the plan cap.
    pub fn add_list_item(&mut self, list: &str, plan: Plan) -> Result<usize, StoreError> {
        let index = self.list_controller(list)?.add(plan)?;
        self.clear_banner();
        Ok(index)
    }

    /// Shallow-merge a partial record over one list entry.
    pub fn update_list_item(
        &mut self,
        list: &str,
        index: usize,
        patch: &Value,
    ) -> Result<(), StoreError> {
        self.list_controller(list)?.update(index, patch)?;
        self.clear_banner();
        Ok(())
    }

    /// Remove a list record. Staged files addressed inside the removed
    /// record are dropped (never uploaded) and later entries re-indexed.
    pub fn remove_list_item(&mut self, list: &str, index: usize) -> Result<Value, StoreError> {
        let removed = self.list_controller(list)?.remove(index)?;
        let list_path = DotPath::parse(list)?;
        self.staging.drop_list_item(&list_path, index);
        self.clear_banner();
        Ok(removed)
    }

    /// Move a list record from one index to another. Staged entries follow
    /// their records.
    pub fn move_list_item(&mut self, list: &str, from: usize, to: usize) -> Result<(), StoreError> {
        let list_path = DotPath::parse(list)?;
        self.list_controller(list)?.move_item(from, to)?;
        self.staging.remap_move(&list_path, from, to);
        self.clear_banner();
        Ok(())
    }

    fn list_controller<'a>(
        &'a mut self,
        list: &'a str,
    ) -> Result<ListController<'a>, StoreError> {
        let spec = self
            .schema
            .list_spec(list)
            .ok_or_else(|| StoreError::NotAList(list.to_string()))?;
        let path = DotPath::parse(list)?;
        let items = get_path_mut(&mut self.data, &path)
            .and_then(|v| v.as_array_mut())
            .ok_or_else(|| StoreError::NotAList(list.to_string()))?;
        Ok(ListController::new(items, spec, list))
    }

    // --- save lifecycle -----------------------------------------------------

    /// Enter `Saving`. Rejects a second save while one is in flight.
    ///
    /// The store calls this; it is public for UI layers that drive their
    /// own request plumbing.
    pub fn begin_save(&mut self) -> Result<(), StoreError> {
        if self.save_state.is_saving() {
            return Err(StoreError::SaveInFlight);
        }
        self.save_state = SaveState::Saving;
        Ok(())
    }

    pub fn finish_save_ok(&mut self) {
        self.save_state = SaveState::Success;
    }

    pub fn finish_save_err(&mut self, message: String) {
        self.save_state = SaveState::Error(message);
    }

    /// Record a fetch/delete failure banner without touching the data.
    pub(crate) fn set_error(&mut self, message: String) {
        self.save_state = SaveState::Error(message);
    }

    /// Dismiss a success/error banner (the UI's auto-clear).
    pub fn acknowledge(&mut self) {
        self.clear_banner();
    }

    fn clear_banner(&mut self) {
        if matches!(self.save_state, SaveState::Success | SaveState::Error(_)) {
            self.save_state = SaveState::Idle;
        }
    }

    /// The outgoing `values` document: live data with every pending-upload
    /// and cleared media field blanked (the server assigns final URLs).
    pub(crate) fn values_for_save(&self) -> Value {
        let mut values = self.data.clone();
        for path in self.staging.blanked_paths() {
            // A staged path always addresses an existing slot.
            let _ = set_path(&mut values, path, Value::String(String::new()));
        }
        values
    }

    pub(crate) fn staging_mut(&mut self) -> &mut FileStaging {
        &mut self.staging
    }

    // --- delete confirmation ------------------------------------------------

    pub fn open_delete_all_modal(&mut self) {
        self.delete_modal = Some(DeleteModal {
            target: DeleteTarget::All,
        });
    }

    pub fn open_delete_item_modal(&mut self, list: &str, index: usize, label: &str) {
        self.delete_modal = Some(DeleteModal {
            target: DeleteTarget::Item {
                list: list.to_string(),
                index,
                label: label.to_string(),
            },
        });
    }

    pub fn close_delete_modal(&mut self) {
        self.delete_modal = None;
    }

    pub(crate) fn take_delete_modal(&mut self) -> Option<DeleteModal> {
        self.delete_modal.take()
    }

    /// Revert to defaults after a confirmed delete-all.
    pub(crate) fn reset_to_defaults(&mut self) {
        self.data = self.schema.default_document();
        self.exists = false;
        self.staging.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, ListSpec, PlanLimits};
    use serde_json::json;

    fn schema() -> Arc<DocumentSchema> {
        Arc::new(DocumentSchema::new(
            "services",
            vec![
                FieldSpec::text("title", "Our services").required(),
                FieldSpec::media("hero.image"),
                FieldSpec::list(
                    "services",
                    ListSpec::new(
                        "service",
                        vec![
                            FieldSpec::text("name", "").required(),
                            FieldSpec::media("icon"),
                        ],
                        PlanLimits::new(2, 8),
                    ),
                ),
            ],
        ))
    }

    fn png(name: &str) -> StagedFile {
        StagedFile::new(name, "image/png", vec![0u8; 4])
    }

    #[test]
    fn test_new_document_starts_at_defaults() {
        let doc = ManagedDocument::new(schema());
        assert!(!doc.exists());
        assert_eq!(doc.data()["title"], "Our services");
        assert_eq!(doc.save_state(), &SaveState::Idle);
    }

    #[test]
    fn test_update_nested_clears_banner() {
        let mut doc = ManagedDocument::new(schema());
        doc.finish_save_ok();
        assert_eq!(doc.save_state(), &SaveState::Success);

        doc.update_nested("title", json!("Updated")).unwrap();
        assert_eq!(doc.data()["title"], "Updated");
        assert_eq!(doc.save_state(), &SaveState::Idle);
    }

    #[test]
    fn test_save_guard_rejects_reentry() {
        let mut doc = ManagedDocument::new(schema());
        doc.begin_save().unwrap();
        assert!(matches!(doc.begin_save(), Err(StoreError::SaveInFlight)));

        doc.finish_save_ok();
        assert!(doc.begin_save().is_ok());
    }

    #[test]
    fn test_stage_file_writes_preview_and_blanks_on_save() {
        let mut doc = ManagedDocument::new(schema());
        let preview = doc.stage_file("hero.image", png("hero.png")).unwrap();
        assert_eq!(doc.data()["hero"]["image"], json!(preview.clone()));

        let values = doc.values_for_save();
        assert_eq!(values["hero"]["image"], "");
        // Live data keeps the preview until the server answers
        assert_eq!(doc.data()["hero"]["image"], json!(preview));
        doc.staging_mut().clear();
    }

    #[test]
    fn test_clear_file_blanks_immediately() {
        let mut doc = ManagedDocument::new(schema());
        doc.update_nested("hero.image", json!("https://cdn/old.png"))
            .unwrap();
        doc.clear_file("hero.image").unwrap();
        assert_eq!(doc.data()["hero"]["image"], "");
        assert_eq!(doc.values_for_save()["hero"]["image"], "");
    }

    #[test]
    fn test_remove_list_item_drops_staged_file() {
        let mut doc = ManagedDocument::new(schema());
        doc.add_list_item("services", Plan::Pro).unwrap();
        doc.stage_file("services.1.icon", png("orphan.png")).unwrap();

        doc.remove_list_item("services", 1).unwrap();
        assert_eq!(doc.staging().pending().count(), 0);
        assert_eq!(doc.staging().outstanding_previews(), 0);
    }

    #[test]
    fn test_delete_modal_lifecycle() {
        let mut doc = ManagedDocument::new(schema());
        doc.open_delete_all_modal();
        assert!(matches!(
            doc.delete_modal().unwrap().target,
            DeleteTarget::All
        ));
        doc.close_delete_modal();
        assert!(doc.delete_modal().is_none());

        doc.open_delete_item_modal("services", 0, "Tutoring");
        let modal = doc.take_delete_modal().unwrap();
        assert!(matches!(modal.target, DeleteTarget::Item { index: 0, .. }));
        assert!(doc.delete_modal().is_none());
    }

    #[test]
    fn test_reset_to_defaults_clears_everything() {
        let mut doc = ManagedDocument::new(schema());
        doc.hydrate(json!({"title": "Persisted"}), true);
        doc.stage_file("hero.image", png("x.png")).unwrap();

        doc.reset_to_defaults();
        assert!(!doc.exists());
        assert_eq!(doc.data()["title"], "Our services");
        assert_eq!(doc.staging().outstanding_previews(), 0);
    }
}
