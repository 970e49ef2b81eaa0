#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::api::test_helpers::{create_test_client, workspace_path, TEST_AUTH_HEADER};
    use mockito::{Matcher, Server};

    const NIGHTLY_JSON: &str = r#"{
        "id": "wq-123",
        "created": "2024-05-01T00:00:00Z",
        "updated": "2024-05-01T00:00:00Z",
        "name": "nightly",
        "description": null,
        "is_paused": false,
        "concurrency_limit": 5,
        "priority": 1,
        "work_pool_id": "wp-1",
        "filter": null,
        "last_polled": null
    }"#;

    #[test]
    fn test_work_queues_api_new() {
        let client = create_test_client("https://api.example.com");
        let api = WorkQueuesApi::new(&client, "w1");
        assert_eq!(api.workspace_id, "w1");
    }

    #[test]
    fn update_request_skips_unset_fields() {
        let request = UpdateWorkQueueRequest {
            is_paused: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"is_paused": true})
        );
    }

    #[tokio::test]
    async fn test_list_work_queues_empty() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", workspace_path("work_queues/filter").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let queues = client.get_all_work_queues("w1").await.unwrap();

        assert!(queues.is_empty());
    }

    #[tokio::test]
    async fn test_list_work_queues_with_data() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", workspace_path("work_queues/filter").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"[{}, {{"id": "wq-2", "name": "default", "is_paused": true}}]"#,
                NIGHTLY_JSON
            ))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let queues = client.workspace("w1").work_queues().list().await.unwrap();

        assert_eq!(queues.len(), 2);
        assert_eq!(queues[0].name, "nightly");
        assert_eq!(queues[0].concurrency_limit, Some(5));
        assert_eq!(queues[1].name, "default");
        assert!(queues[1].is_paused);
        assert_eq!(queues[1].priority, None);
    }

    #[tokio::test]
    async fn test_create_work_queue() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", workspace_path("work_queues/").as_str())
            .match_header("authorization", TEST_AUTH_HEADER)
            .match_header("content-type", "application/json")
            .match_body(Matcher::JsonString(
                r#"{"name":"nightly","concurrency_limit":5,"priority":1}"#.to_string(),
            ))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(NIGHTLY_JSON)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let request = CreateWorkQueueRequest {
            name: "nightly".to_string(),
            concurrency_limit: Some(5),
            priority: Some(1),
            ..Default::default()
        };
        let queue = client.create_work_queue(&request, "w1").await.unwrap();

        assert_eq!(queue.id, "wq-123");
        assert_eq!(queue.work_pool_id.as_deref(), Some("wp-1"));
    }

    #[tokio::test]
    async fn test_get_work_queue_by_name() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", workspace_path("work_queues/name/nightly%20run").as_str())
            .with_body(NIGHTLY_JSON)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let queue = client
            .workspace("w1")
            .work_queues()
            .get_by_name("nightly run")
            .await
            .unwrap();

        assert_eq!(queue.id, "wq-123");
    }

    #[tokio::test]
    async fn test_update_work_queue_echoed_body() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", workspace_path("work_queues/wq-123").as_str())
            .match_body(Matcher::JsonString(r#"{"priority":3}"#.to_string()))
            .with_status(200)
            .with_body(NIGHTLY_JSON.replace(r#""priority": 1"#, r#""priority": 3"#))
            .create_async()
            .await;
        let get = server
            .mock("GET", workspace_path("work_queues/wq-123").as_str())
            .expect(0)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let request = UpdateWorkQueueRequest {
            priority: Some(3),
            ..Default::default()
        };
        let queue = client
            .update_work_queue(&request, "wq-123", "w1")
            .await
            .unwrap();

        assert_eq!(queue.priority, Some(3));
        assert_eq!(queue.name, "nightly");
        assert_eq!(queue.concurrency_limit, Some(5));
        patch.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_missing_work_queue() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", workspace_path("work_queues/missing").as_str())
            .with_status(404)
            .with_body(r#"{"detail":"Work queue not found."}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client.get_work_queue("missing", "w1").await.unwrap_err();

        match err {
            ApiError::NotFound { message } => assert_eq!(message, "Work queue not found."),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }
}
