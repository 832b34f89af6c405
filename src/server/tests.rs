#[cfg(test)]
mod tests {
    use crate::server::handler::{handle_tool_call, FETCH_TOOL};
    use crate::server::protocol::*;
    use crate::server::{ready_message, tool_call_response, Server};
    use crate::tools::fetch::testing::{Reply, ScriptedBackend};
    use crate::tools::fetch::Ladder;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio_util::sync::CancellationToken;

    fn server_with(replies: Vec<Reply>) -> (Server, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new(replies));
        let ladder = Ladder::new(backend.clone()).with_attempt_timeout(Duration::from_secs(5));
        (Server::new(ladder), backend)
    }

    fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .unwrap()
    }

    fn call(id: i64, arguments: Value) -> JsonRpcRequest {
        request(
            id,
            METHOD_TOOLS_CALL,
            json!({ "name": FETCH_TOOL, "arguments": arguments }),
        )
    }

    fn tool_result(response: JsonRpcResponse) -> ToolCallResult {
        serde_json::from_value(response.result.expect("expected a result")).unwrap()
    }

    #[tokio::test]
    async fn initialize_advertises_tools() {
        let (server, _) = server_with(vec![]);
        let response = server
            .respond(request(1, METHOD_INITIALIZE, json!({})))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(response.id, json!(1));
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["serverInfo"]["name"], "tierfetch");
    }

    #[tokio::test]
    async fn tools_list_describes_fetch_page() {
        let (server, _) = server_with(vec![]);
        let response = server
            .respond(request(2, METHOD_TOOLS_LIST, Value::Null))
            .await
            .unwrap();

        let tools = &response.result.unwrap()["tools"];
        assert_eq!(tools.as_array().unwrap().len(), 1);
        assert_eq!(tools[0]["name"], FETCH_TOOL);
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["url"]));
        assert!(tools[0]["inputSchema"]["properties"]["selector"].is_object());
    }

    #[tokio::test]
    async fn successful_call_reports_tier() {
        let (server, _) = server_with(vec![Reply::Page(200, "# Example Domain")]);
        let response = server
            .respond(call(3, json!({ "url": "https://example.com" })))
            .await
            .unwrap();

        let result = tool_result(response);
        assert!(!result.is_error);
        assert_eq!(result.text_content(), "# Example Domain");
        let meta = result.meta.unwrap();
        assert_eq!(meta["tier"], "basic");
        assert_eq!(meta["attempts"], 1);
    }

    #[tokio::test]
    async fn selector_is_passed_through() {
        let (server, backend) = server_with(vec![Reply::Page(200, "# Rendered")]);
        server
            .respond(call(
                4,
                json!({ "url": "https://example.com", "selector": ".article-body" }),
            ))
            .await
            .unwrap();

        let calls = backend.calls();
        assert_eq!(calls[0].options.wait_for.as_deref(), Some(".article-body"));
        assert!(calls[0].options.render_js);
    }

    #[tokio::test]
    async fn exhausted_ladder_is_error_flagged() {
        let (server, backend) = server_with(vec![
            Reply::Page(403, ""),
            Reply::Page(403, ""),
            Reply::Page(403, ""),
            Reply::Page(403, ""),
        ]);
        let response = server
            .respond(call(5, json!({ "url": "https://example.com" })))
            .await
            .unwrap();

        assert!(response.error.is_none());
        let result = tool_result(response);
        assert!(result.is_error);
        let text = result.text_content();
        assert!(text.starts_with("fetch failed:"), "{text}");
        assert!(text.contains("wait"), "{text}");
        assert_eq!(backend.calls().len(), 4);
    }

    #[tokio::test]
    async fn unknown_tool_is_error_flagged() {
        let ladder = Ladder::new(Arc::new(ScriptedBackend::new(vec![])));
        let params = ToolCallParams {
            name: "screenshot".to_string(),
            arguments: json!({ "url": "https://example.com" }),
        };

        let result = handle_tool_call(&ladder, params, &CancellationToken::new()).await;

        assert!(result.is_error);
        assert_eq!(result.text_content(), "unknown tool: screenshot");
    }

    #[tokio::test]
    async fn missing_url_is_error_flagged() {
        let (server, backend) = server_with(vec![]);
        let result = tool_result(
            server
                .respond(call(6, json!({ "selector": "#main" })))
                .await
                .unwrap(),
        );
        assert!(result.is_error);
        assert!(result.text_content().starts_with("invalid arguments"));

        let result = tool_result(server.respond(call(7, json!({ "url": "  " }))).await.unwrap());
        assert!(result.is_error);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_method_is_rpc_error() {
        let (server, _) = server_with(vec![]);
        let response = server
            .respond(request(8, "resources/list", Value::Null))
            .await
            .unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert!(error.message.contains("resources/list"));
    }

    #[tokio::test]
    async fn bad_call_params_are_rpc_error() {
        let (server, _) = server_with(vec![]);
        let response = server
            .respond(request(9, METHOD_TOOLS_CALL, json!({ "arguments": {} })))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let (server, _) = server_with(vec![]);
        let notification: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": METHOD_INITIALIZED,
        }))
        .unwrap();
        assert!(server.respond(notification).await.is_none());
    }

    #[tokio::test]
    async fn cancel_notification_stops_call() {
        let (server, backend) = server_with(vec![Reply::Hang, Reply::Page(200, "# Late")]);

        let worker = server.clone();
        let task = tokio::spawn(async move {
            worker
                .respond(call(10, json!({ "url": "https://example.com" })))
                .await
        });

        while server.in_flight_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let cancel: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": METHOD_CANCELLED,
            "params": { "requestId": 10, "reason": "user aborted" },
        }))
        .unwrap();
        assert!(server.respond(cancel).await.is_none());

        let result = tool_result(task.await.unwrap().unwrap());
        assert!(result.is_error);
        assert!(result.text_content().contains("cancelled"));
        assert_eq!(backend.calls().len(), 1);
        assert_eq!(server.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_request_id_is_refused_while_running() {
        let (server, backend) = server_with(vec![Reply::Hang, Reply::Page(200, "# Again")]);

        let worker = server.clone();
        let first = tokio::spawn(async move {
            worker
                .respond(call(7, json!({ "url": "https://example.com" })))
                .await
        });
        while server.in_flight_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let duplicate = server
            .respond(call(7, json!({ "url": "https://example.org" })))
            .await
            .unwrap();
        let error = duplicate.error.unwrap();
        assert_eq!(error.code, INVALID_REQUEST);
        assert!(error.message.contains("already in flight"), "{}", error.message);
        assert_eq!(server.in_flight_count(), 1);
        assert_eq!(backend.calls().len(), 1);

        // The running call still owns the id, so a cancel reaches it.
        let cancel: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": METHOD_CANCELLED,
            "params": { "requestId": 7 },
        }))
        .unwrap();
        server.respond(cancel).await;
        let result = tool_result(first.await.unwrap().unwrap());
        assert!(result.is_error);
        assert!(result.text_content().contains("cancelled"));
        assert_eq!(server.in_flight_count(), 0);

        // Once answered, the id can be reused.
        let result = tool_result(
            server
                .respond(call(7, json!({ "url": "https://example.com" })))
                .await
                .unwrap(),
        );
        assert_eq!(result.text_content(), "# Again");
    }

    #[tokio::test]
    async fn null_id_is_a_request() {
        let (server, _) = server_with(vec![]);
        let ping: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": null,
            "method": METHOD_PING,
        }))
        .unwrap();
        assert!(!ping.is_notification());

        let response = server.respond(ping).await.unwrap();
        assert!(response.id.is_null());
        assert_eq!(response.result, Some(json!({})));
    }

    #[test]
    fn unserializable_result_is_internal_error() {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        let response = tool_call_response(json!(11), Err(err));

        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, INTERNAL_ERROR);
        assert_eq!(response.id, json!(11));
    }

    #[test]
    fn ready_message_names_transport_and_backend() {
        let message = ready_message("scripted");
        assert!(message.contains("running on stdio"), "{message}");
        assert!(message.contains("scripted"), "{message}");
    }

    #[tokio::test]
    async fn serve_answers_each_request_line() {
        let (server, _) = server_with(vec![Reply::Page(200, "# Example Domain")]);
        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "",
            "this is not json",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"fetch_page","arguments":{"url":"https://example.com"}}}"#,
        ]
        .join("\n");

        let (mut client, server_end) = tokio::io::duplex(64 * 1024);
        server.serve(input.as_bytes(), server_end).await.unwrap();

        let mut output = String::new();
        client.read_to_string(&mut output).await.unwrap();
        let responses: Vec<JsonRpcResponse> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 3);
        let parse_error = responses
            .iter()
            .find(|r| r.id.is_null())
            .and_then(|r| r.error.clone())
            .unwrap();
        assert_eq!(parse_error.code, PARSE_ERROR);

        let call = responses.iter().find(|r| r.id == json!(2)).unwrap();
        let result = tool_result(call.clone());
        assert_eq!(result.text_content(), "# Example Domain");
        assert!(responses.iter().any(|r| r.id == json!(1) && r.result.is_some()));
    }

    #[test]
    fn tool_result_wire_format() {
        let value = serde_json::to_value(
            ToolCallResult::text("# Hi").with_meta(json!({ "tier": "premium" })),
        )
        .unwrap();
        assert_eq!(
            value,
            json!({
                "content": [{ "type": "text", "text": "# Hi" }],
                "isError": false,
                "_meta": { "tier": "premium" },
            })
        );

        let value = serde_json::to_value(ToolCallResult::error("boom")).unwrap();
        assert_eq!(value["isError"], true);
        assert!(value.get("_meta").is_none());
    }
}
