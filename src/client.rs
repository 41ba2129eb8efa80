//! HTTP client for the content API.
//!
//! Wire convention: `GET {api_path}` returns either a bare document object
//! or `{ "values": [ {...} ] }` depending on endpoint family, with 404
//! meaning "no document yet". `POST` (create) and `PUT` (update) send
//! `multipart/form-data` with a `values` JSON part (file-bearing fields
//! blanked) plus one part per staged file named `file:{path}`. `DELETE`
//! removes the document, carrying record ids in a JSON body for
//! multi-record endpoints.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::media::StagedFile;
use crate::path::DotPath;

/// HTTP method used for a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMethod {
    /// Create: the document has never been persisted.
    Post,
    /// Update: the document already exists.
    Put,
}

/// Body of a record-targeted `DELETE` on a multi-record endpoint.
#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

/// Client for one content API origin.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, api_path: &str) -> String {
        format!("{}/{}", self.base_url, api_path.trim_start_matches('/'))
    }

    /// Fetch the document. Absence (404) is not an error.
    pub async fn fetch(&self, api_path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.url(api_path);
        debug!(%url, "fetching document");
        let resp = self.http.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let body: Value = resp.json().await?;
        Ok(normalize_payload(body))
    }

    /// Persist the document plus staged files in one multipart request.
    /// Returns the server's document (media fields rewritten to final
    /// storage URLs).
    pub async fn save(
        &self,
        api_path: &str,
        method: SaveMethod,
        values: &Value,
        files: &[(DotPath, StagedFile)],
    ) -> Result<Value, StoreError> {
        let mut form = Form::new().text("values", serde_json::to_string(values)?);
        for (path, file) in files {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(&file.content_type)?;
            form = form.part(format!("file:{}", path), part);
        }

        let url = self.url(api_path);
        debug!(%url, ?method, files = files.len(), "saving document");
        let request = match method {
            SaveMethod::Post => self.http.post(&url),
            SaveMethod::Put => self.http.put(&url),
        };
        let resp = request.multipart(form).send().await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }

        let body: Value = resp.json().await?;
        Ok(normalize_payload(body).unwrap_or_else(|| values.clone()))
    }

    /// Delete the document, or specific records on multi-record endpoints.
    pub async fn delete(&self, api_path: &str, ids: &[String]) -> Result<(), StoreError> {
        let url = self.url(api_path);
        debug!(%url, ids = ids.len(), "deleting document");
        let mut request = self.http.delete(&url);
        if !ids.is_empty() {
            request = request.json(&DeleteRequest { ids });
        }
        let resp = request.send().await?;

        if !resp.status().is_success() {
            return Err(api_error(resp).await);
        }
        Ok(())
    }
}

/// Unwrap both endpoint families to the document object. A `values` array
/// takes its first element; an empty array or a null body means absent.
fn normalize_payload(body: Value) -> Option<Value> {
    if body.is_null() {
        return None;
    }
    if let Some(values) = body.get("values").and_then(|v| v.as_array()) {
        return values.first().cloned();
    }
    Some(body)
}

async fn api_error(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    StoreError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_bare_document() {
        let body = json!({"title": "t", "items": []});
        assert_eq!(normalize_payload(body.clone()), Some(body));
    }

    #[test]
    fn test_normalize_values_family() {
        let body = json!({"values": [{"title": "first"}, {"title": "second"}]});
        assert_eq!(normalize_payload(body), Some(json!({"title": "first"})));

        assert_eq!(normalize_payload(json!({"values": []})), None);
        assert_eq!(normalize_payload(Value::Null), None);
    }

    #[test]
    fn test_delete_body_shape() {
        let ids = vec!["t-1".to_string(), "t-2".to_string()];
        let body = serde_json::to_value(DeleteRequest { ids: &ids }).unwrap();
        assert_eq!(body, json!({"ids": ["t-1", "t-2"]}));
    }

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(
            client.url("/api/testimonials"),
            "http://localhost:3000/api/testimonials"
        );
        assert_eq!(
            client.url("api/footer"),
            "http://localhost:3000/api/footer"
        );
    }
}
