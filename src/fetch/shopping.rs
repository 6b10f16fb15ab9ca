//! Shopping list resource: `GET/POST {base}lists/{id}`, `DELETE {base}lists/{id}/{item}`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use super::{decode, require_session, send, FetchError, FetchPipeline, FetchResult, Fetched};
use crate::session::Session;
use crate::transport::{endpoint, HttpRequest, HttpTransport};

/// Ids arrive as numbers or strings depending on the backend version.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntity {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "contents", default)]
    pub entries: Vec<ListEntry>,
}

impl ListEntity {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trim `content`, rejecting blank input before any request is made.
pub fn validate_content(content: &str) -> Result<&str, FetchError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(FetchError::Validation("empty-input".to_string()));
    }
    Ok(trimmed)
}

/// Loads one list and performs its mutations.
pub struct ShoppingListPipeline {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    list_id: String,
}

impl ShoppingListPipeline {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        list_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            list_id: list_id.into(),
        }
    }

    fn list_url(&self) -> String {
        endpoint(&self.base_url, &format!("lists/{}", self.list_id))
    }

    /// `POST` a new entry. The response body is ignored; callers reload.
    pub async fn create_entry(
        &self,
        session: Option<&Session>,
        content: &str,
    ) -> Result<(), FetchError> {
        let content = validate_content(content)?;
        let session = require_session(session)?;

        let request = HttpRequest::post(self.list_url())
            .bearer(&session.token)
            .json(serde_json::json!({ "content": content }));
        send(self.transport.as_ref(), request).await?;

        tracing::debug!("Added entry to list {}", self.list_id);
        Ok(())
    }

    /// `DELETE` one entry.
    pub async fn delete_entry(
        &self,
        session: Option<&Session>,
        item_id: &str,
    ) -> Result<(), FetchError> {
        let session = require_session(session)?;

        let url = endpoint(&self.list_url(), item_id);
        send(
            self.transport.as_ref(),
            HttpRequest::delete(url).bearer(&session.token),
        )
        .await?;

        tracing::debug!("Removed entry {} from list {}", item_id, self.list_id);
        Ok(())
    }
}

#[async_trait]
impl FetchPipeline for ShoppingListPipeline {
    type Output = ListEntity;

    async fn run(&self, session: Option<&Session>) -> FetchResult<ListEntity> {
        let session = require_session(session)?;
        let json = send(
            self.transport.as_ref(),
            HttpRequest::get(self.list_url()).bearer(&session.token),
        )
        .await?;

        Ok(Fetched::now(decode(json)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockTransport, Scripted};
    use crate::transport::HttpMethod;
    use serde_json::json;

    const LIST: &str = "http://dash.test/lists/1";

    fn pipeline(transport: &Arc<MockTransport>) -> ShoppingListPipeline {
        ShoppingListPipeline::new(transport.clone(), "http://dash.test/", "1")
    }

    fn session() -> Session {
        Session::new("tok", "Ada")
    }

    #[test]
    fn test_validate_content() {
        assert_eq!(validate_content("  milk "), Ok("milk"));
        assert!(matches!(validate_content(""), Err(FetchError::Validation(_))));
        assert!(matches!(validate_content(" \t "), Err(FetchError::Validation(_))));
    }

    #[test]
    fn test_list_accepts_numeric_ids() {
        let list: ListEntity = serde_json::from_value(json!({
            "id": 1,
            "title": "Groceries",
            "contents": [ { "id": 10, "content": "milk" }, { "id": "b2", "content": "eggs" } ]
        }))
        .unwrap();

        assert_eq!(list.id, "1");
        assert_eq!(list.entries[0].id, "10");
        assert_eq!(list.entries[1].id, "b2");
    }

    #[tokio::test]
    async fn test_load_list() {
        let transport = Arc::new(MockTransport::new());
        transport.once(
            HttpMethod::Get,
            LIST,
            Scripted::ok(200, json!({ "id": 1, "title": "Groceries", "contents": [] })),
        );

        let list = pipeline(&transport).run(Some(&session())).await.unwrap().payload;
        assert_eq!(list.title, "Groceries");
        assert!(list.is_empty());
        assert_eq!(transport.calls()[0].header("Authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn test_create_sends_trimmed_content() {
        let transport = Arc::new(MockTransport::new());
        transport.once(HttpMethod::Post, LIST, Scripted::ok(201, json!({ "id": 3 })));

        pipeline(&transport)
            .create_entry(Some(&session()), "  milk ")
            .await
            .unwrap();

        let call = &transport.calls()[0];
        assert_eq!(call.body, Some(json!({ "content": "milk" })));
    }

    #[tokio::test]
    async fn test_create_blank_issues_no_request() {
        let transport = Arc::new(MockTransport::new());
        let err = pipeline(&transport)
            .create_entry(Some(&session()), "   ")
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Validation("empty-input".to_string()));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_targets_item_url() {
        let transport = Arc::new(MockTransport::new());
        transport.once(HttpMethod::Delete, LIST, Scripted::ok(204, json!(null)));

        pipeline(&transport)
            .delete_entry(Some(&session()), "10")
            .await
            .unwrap();

        assert_eq!(transport.calls()[0].url, "http://dash.test/lists/1/10");
    }

    #[tokio::test]
    async fn test_mutations_require_session() {
        let transport = Arc::new(MockTransport::new());
        let pipeline = pipeline(&transport);

        assert_eq!(
            pipeline.create_entry(None, "milk").await,
            Err(FetchError::Unauthenticated)
        );
        assert_eq!(
            pipeline.delete_entry(None, "10").await,
            Err(FetchError::Unauthenticated)
        );
        assert_eq!(transport.call_count(), 0);
    }
}
