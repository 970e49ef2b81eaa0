#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_client, workspace_path};
    use mockito::{Matcher, Server};

    const BLOCK_JSON: &str = r#"{
        "id": "bd-1",
        "created": "2024-02-01T10:00:00Z",
        "updated": "2024-02-01T10:00:00Z",
        "name": "slack-token",
        "data": {"value": "xoxb-old", "retries": 3, "verify": true},
        "block_schema_id": "bs-1",
        "block_type_id": "bt-1",
        "block_type_name": "Secret",
        "block_document_references": {},
        "is_anonymous": false
    }"#;

    /// Matches a workspace route with or without a query string.
    fn route(route: &str) -> Matcher {
        Matcher::Regex(format!(
            r"^{}(\?.*)?$",
            workspace_path(route).replace('.', r"\.")
        ))
    }

    fn include_secrets() -> Matcher {
        Matcher::UrlEncoded("include_secrets".into(), "true".into())
    }

    #[test]
    fn block_values_decode_heterogeneous_data() {
        let doc: BlockDocument = serde_json::from_str(BLOCK_JSON).unwrap();

        assert_eq!(doc.data["value"].as_str(), Some("xoxb-old"));
        assert_eq!(doc.data["retries"], BlockValue::Integer(3));
        assert_eq!(doc.data["verify"], BlockValue::Bool(true));
        assert!(doc.block_document_references.is_empty());
    }

    #[test]
    fn nested_values_convert_from_json() {
        let value = BlockValue::from(serde_json::json!({"a": [1, 2.5, null, "x"]}));

        let expected = BlockValue::Map(
            [(
                "a".to_string(),
                BlockValue::List(vec![
                    BlockValue::Integer(1),
                    BlockValue::Float(2.5),
                    BlockValue::Null,
                    BlockValue::from("x"),
                ]),
            )]
            .into_iter()
            .collect(),
        );
        assert_eq!(value, expected);
    }

    #[test]
    fn update_request_never_sends_name() {
        let request = UpdateBlockDocumentRequest {
            data: Some([("value".to_string(), "new".into())].into_iter().collect()),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"data": {"value": "new"}, "merge_existing_data": true})
        );
    }

    #[tokio::test]
    async fn get_requests_secrets() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", route("block_documents/bd-1"))
            .match_query(include_secrets())
            .with_body(BLOCK_JSON)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let doc = client.get_block_document("bd-1", "w1").await.unwrap();

        assert_eq!(doc.name.as_deref(), Some("slack-token"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_requests_secrets() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", workspace_path("block_documents/filter").as_str())
            .match_body(Matcher::PartialJsonString(
                r#"{"include_secrets":true,"offset":0}"#.to_string(),
            ))
            .with_body(format!("[{}]", BLOCK_JSON))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let docs = client.get_all_block_documents("w1").await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["value"].as_str(), Some("xoxb-old"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_by_name_rejects_blank_segments() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let api = client.workspace("w1");
        let err = api.block_documents().get_by_name("", "token").await.unwrap_err();
        assert!(err.to_string().contains("block type slug"), "{}", err);
        let err = api.block_documents().get_by_name("secret", " ").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { status: 400, .. }));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_by_name_uses_block_type_slug() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                route("block_types/slug/secret/block_documents/name/slack-token"),
            )
            .match_query(include_secrets())
            .with_body(BLOCK_JSON)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let doc = client
            .workspace("w1")
            .block_documents()
            .get_by_name("secret", "slack-token")
            .await
            .unwrap();

        assert_eq!(doc.id, "bd-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_block_document() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", workspace_path("block_documents/").as_str())
            .match_body(Matcher::Json(serde_json::json!({
                "name": "slack-token",
                "data": {"value": "xoxb-old", "retries": 3, "verify": true},
                "block_schema_id": "bs-1",
                "block_type_id": "bt-1",
                "is_anonymous": false
            })))
            .with_status(201)
            .with_body(BLOCK_JSON)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let request = CreateBlockDocumentRequest {
            name: Some("slack-token".to_string()),
            data: [
                ("value".to_string(), BlockValue::from("xoxb-old")),
                ("retries".to_string(), BlockValue::Integer(3)),
                ("verify".to_string(), BlockValue::Bool(true)),
            ]
            .into_iter()
            .collect(),
            block_schema_id: "bs-1".to_string(),
            block_type_id: "bt-1".to_string(),
            is_anonymous: false,
        };
        let doc = client.create_block_document(&request, "w1").await.unwrap();

        assert_eq!(doc.id, "bd-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_named_block_without_name_is_rejected_locally() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", workspace_path("block_documents/").as_str())
            .expect(0)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let request = CreateBlockDocumentRequest {
            block_schema_id: "bs-1".to_string(),
            block_type_id: "bt-1".to_string(),
            ..Default::default()
        };
        let err = client
            .create_block_document(&request, "w1")
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn partial_update_preserves_name() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", workspace_path("block_documents/bd-1").as_str())
            .match_body(Matcher::Json(serde_json::json!({
                "data": {"value": "xoxb-new"},
                "merge_existing_data": true
            })))
            .with_status(204)
            .create_async()
            .await;
        let read_back = server
            .mock("GET", route("block_documents/bd-1"))
            .match_query(include_secrets())
            .with_body(BLOCK_JSON.replace("xoxb-old", "xoxb-new"))
            .expect(1)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let request = UpdateBlockDocumentRequest {
            data: Some([("value".to_string(), "xoxb-new".into())].into_iter().collect()),
            ..Default::default()
        };
        let doc = client
            .update_block_document(&request, "bd-1", "w1")
            .await
            .unwrap();

        assert_eq!(doc.name.as_deref(), Some("slack-token"));
        assert_eq!(doc.data["value"].as_str(), Some("xoxb-new"));
        assert_eq!(doc.data["retries"], BlockValue::Integer(3));
        patch.assert_async().await;
        read_back.assert_async().await;
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("DELETE", workspace_path("block_documents/bd-1").as_str())
            .with_status(204)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client.delete_block_document("bd-1", "w1").await.unwrap();
        first.remove_async().await;

        let _gone = server
            .mock("DELETE", workspace_path("block_documents/bd-1").as_str())
            .with_status(404)
            .with_body(r#"{"detail":"Block document not found"}"#)
            .create_async()
            .await;

        let err = client.delete_block_document("bd-1", "w1").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
