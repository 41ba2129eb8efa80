//! copydesk: the reusable core of a content-management admin panel.
//!
//! Non-technical operators edit structured JSON content (copy, images,
//! colors, lists of records) through form pages; every page binds one typed
//! document to the same workflow. This crate is that workflow, as a typed
//! client-side engine:
//!
//! - [`schema::DocumentSchema`] declares a document's recognized fields;
//! - [`merge::merge_document`] fills a server payload's gaps from defaults,
//!   so the in-memory document is always fully populated;
//! - [`path`] addresses nested fields with validated dot-paths;
//! - [`media::FileStaging`] tracks local files awaiting upload, with
//!   enforced preview-token cleanup;
//! - [`list::ListController`] is the one add/update/remove/reorder
//!   implementation for every editable list;
//! - [`store::DocumentStore`] drives load, guarded save (multipart JSON +
//!   files), and the delete-confirmation flow against the content API.
//!
//! Rendering, routing, auth, and the server side of the API are
//! collaborators outside this crate.

pub mod client;
pub mod document;
pub mod error;
pub mod list;
pub mod media;
pub mod merge;
pub mod path;
pub mod schema;
pub mod store;

pub use client::{ApiClient, SaveMethod};
pub use document::{DeleteModal, DeleteTarget, ManagedDocument, SaveState};
pub use error::StoreError;
pub use list::ListController;
pub use media::{FileStaging, MediaSource, StagedFile};
pub use merge::merge_document;
pub use path::{get_path, remove_path, set_path, DotPath, PathError, Segment};
pub use schema::{DocumentSchema, FieldKind, FieldSpec, ListSpec, Plan, PlanLimits};
pub use store::{DocumentStore, StoreConfig};
