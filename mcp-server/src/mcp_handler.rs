use anyhow::Result;
use baloto::HistoryStore;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::sync::Arc;
use tracing::{info, warn};

use crate::use_cases::{InvalidParams, PickUseCase};

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, serde::Deserialize)]
struct JsonRpcRequest {
    #[serde(default = "default_jsonrpc")]
    jsonrpc: String,
    method: String,
    params: Option<Value>,
    id: Option<Value>,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

#[derive(Debug, serde::Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Option<Value>,
}

impl JsonRpcResponse {
    fn ok(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id: Some(id.unwrap_or(json!(1))),
        }
    }

    fn err(id: Option<Value>, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data,
            }),
            id,
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

#[derive(Debug, serde::Serialize)]
struct Tool {
    name: String,
    description: String,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

pub struct MCPHandler<S> {
    pick_use_case: Arc<PickUseCase<S>>,
}

impl<S: HistoryStore> MCPHandler<S> {
    pub fn new(pick_use_case: Arc<PickUseCase<S>>) -> Self {
        Self { pick_use_case }
    }

    /// Answer line-delimited JSON-RPC requests until the reader is exhausted.
    pub async fn serve<R, W>(self, reader: R, mut writer: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(req) => req,
                Err(e) => {
                    warn!("Failed to parse request: {} - Line: {}", e, line);
                    let error_response = JsonRpcResponse::err(
                        None,
                        PARSE_ERROR,
                        "Parse error".to_string(),
                        Some(json!(e.to_string())),
                    );
                    writeln!(writer, "{}", serde_json::to_string(&error_response)?)?;
                    writer.flush()?;
                    continue;
                }
            };

            if request.jsonrpc != "2.0" {
                warn!("Rejecting request with jsonrpc version {}", request.jsonrpc);
                if request.id.is_some() {
                    let error_response = JsonRpcResponse::err(
                        request.id,
                        INVALID_REQUEST,
                        format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                        None,
                    );
                    writeln!(writer, "{}", serde_json::to_string(&error_response)?)?;
                    writer.flush()?;
                }
                continue;
            }

            // Notifications never get a response.
            if request.id.is_none() || request.method.starts_with("notifications/") {
                if request.method == "notifications/initialized" {
                    info!("🎰 Client initialized");
                }
                continue;
            }

            let response = self.handle_request(request).await;
            writeln!(writer, "{}", serde_json::to_string(&response)?)?;
            writer.flush()?;
        }

        Ok(())
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => JsonRpcResponse::ok(request.id, json!({ "tools": self.get_tools() })),
            "tools/call" => self.handle_call_tool(request.params, request.id).await,
            _ => JsonRpcResponse::err(
                Some(request.id.unwrap_or(json!(1))),
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
                None,
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("🎰 Initializing baloto MCP server");
        JsonRpcResponse::ok(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "baloto-mcp-server",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    async fn handle_call_tool(&self, params: Option<Value>, id: Option<Value>) -> JsonRpcResponse {
        let id = Some(id.unwrap_or(json!(1)));
        let Some(params) = params else {
            return JsonRpcResponse::err(id, INVALID_PARAMS, "Missing params".to_string(), None);
        };
        let Some(tool_name) = params.get("name").and_then(|n| n.as_str()) else {
            return JsonRpcResponse::err(id, INVALID_PARAMS, "Missing tool name".to_string(), None);
        };

        let arguments_map: HashMap<String, Value> = match params.get("arguments") {
            None | Some(Value::Null) => HashMap::new(),
            Some(Value::Object(map)) => map.clone().into_iter().collect(),
            Some(_) => {
                return JsonRpcResponse::err(
                    id,
                    INVALID_PARAMS,
                    "Tool arguments must be an object".to_string(),
                    None,
                );
            }
        };

        match self.execute_tool(tool_name, &arguments_map).await {
            Ok(content) => JsonRpcResponse::ok(
                id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": content
                        }
                    ]
                }),
            ),
            Err(e) if e.is::<InvalidParams>() => {
                JsonRpcResponse::err(id, INVALID_PARAMS, e.to_string(), None)
            }
            Err(e) => JsonRpcResponse::err(
                id,
                INTERNAL_ERROR,
                format!("Tool execution error: {}", e),
                None,
            ),
        }
    }

    async fn execute_tool(&self, tool_name: &str, arguments: &HashMap<String, Value>) -> Result<String> {
        match tool_name {
            "get_draw_period" => self.pick_use_case.get_draw_period(arguments).await,
            "get_status" => self.pick_use_case.get_status(arguments).await,
            "check_guard" => self.pick_use_case.check_guard(arguments).await,
            "generate_numbers" => self.pick_use_case.generate_numbers(arguments).await,
            "save_numbers" => self.pick_use_case.save_numbers(arguments).await,
            "get_history" => self.pick_use_case.get_history(arguments).await,
            _ => Err(InvalidParams(format!("Unknown tool: {}", tool_name)).into()),
        }
    }

    fn get_tools(&self) -> Vec<Tool> {
        let no_arguments = json!({ "type": "object", "properties": {} });
        vec![
            Tool {
                name: "get_draw_period".to_string(),
                description: "Get the draw period (SORTEO1, SORTEO2 or none) for now or a given instant".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "at": {
                            "type": "string",
                            "description": "Optional RFC 3339 timestamp; defaults to now"
                        }
                    }
                }),
            },
            Tool {
                name: "get_status".to_string(),
                description: "Get the current period, save guard state and unsaved numbers".to_string(),
                input_schema: no_arguments.clone(),
            },
            Tool {
                name: "check_guard".to_string(),
                description: "Re-check whether a pick is already saved for the current period".to_string(),
                input_schema: no_arguments.clone(),
            },
            Tool {
                name: "generate_numbers".to_string(),
                description: "Generate five numbers in 1-43 plus a superbalota in 1-16".to_string(),
                input_schema: no_arguments.clone(),
            },
            Tool {
                name: "save_numbers".to_string(),
                description: "Save the generated numbers, once per draw period".to_string(),
                input_schema: no_arguments,
            },
            Tool {
                name: "get_history".to_string(),
                description: "List saved picks, newest first".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "limit": {
                            "type": "integer",
                            "description": "Optional maximum number of picks to return"
                        }
                    }
                }),
            },
        ]
    }
}

pub fn stdio() -> (BufReader<io::Stdin>, io::Stdout) {
    (BufReader::new(io::stdin()), io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use baloto::{FixedClock, PickController, SqliteStore};
    use chrono::{DateTime, TimeZone, Utc};
    use tokio::sync::Mutex;

    fn handler_at(at: DateTime<Utc>) -> MCPHandler<SqliteStore> {
        let clock = Arc::new(FixedClock::new(at));
        let store = SqliteStore::open_in_memory().unwrap().with_clock(clock.clone());
        let controller = PickController::new(store, clock).with_seed(5);
        MCPHandler::new(Arc::new(PickUseCase::new(Arc::new(Mutex::new(controller)))))
    }

    async fn run(handler: MCPHandler<SqliteStore>, requests: &[&str]) -> Vec<Value> {
        let input = requests.join("\n");
        let mut output = Vec::new();
        handler.serve(input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn call(id: u32, tool: &str) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": tool, "arguments": {} }
        })
        .to_string()
    }

    fn tool_payload(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    fn thursday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let responses = run(
            handler_at(thursday_morning()),
            &[
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            ],
        )
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "baloto-mcp-server");
        let names: Vec<_> = responses[1]["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&"save_numbers".to_string()));
        assert!(names.contains(&"get_history".to_string()));
    }

    #[tokio::test]
    async fn test_generate_save_and_history() {
        let save_first = call(3, "save_numbers");
        let generate = call(4, "generate_numbers");
        let save = call(5, "save_numbers");
        let save_again = call(6, "save_numbers");
        let history = call(7, "get_history");
        let status = call(8, "get_status");
        let responses = run(
            handler_at(thursday_morning()),
            &[&save_first, &generate, &save, &save_again, &history, &status],
        )
        .await;

        let nothing = tool_payload(&responses[0]);
        assert_eq!(nothing["saved"], false);
        assert_eq!(nothing["notice"], "Generate numbers before saving.");

        let generated = tool_payload(&responses[1]);
        assert_eq!(generated["numbers"]["numbers"].as_array().unwrap().len(), 5);
        assert_eq!(generated["can_save"], true);

        let saved = tool_payload(&responses[2]);
        assert_eq!(saved["saved"], true);
        assert_eq!(saved["entry"]["period"], "SORTEO1");

        let again = tool_payload(&responses[3]);
        assert_eq!(again["saved"], false);
        assert_eq!(again["notice"], "A pick is already saved for this draw.");

        let listed = tool_payload(&responses[4]);
        assert_eq!(listed["results"].as_array().unwrap().len(), 1);

        let status = tool_payload(&responses[5]);
        assert_eq!(status["guard"]["state"], "saved");
        assert_eq!(status["can_save"], false);
        assert_eq!(status["history_count"], 1);
    }

    #[tokio::test]
    async fn test_outside_period_refuses_save() {
        let wednesday_evening = Utc.with_ymd_and_hms(2026, 10, 14, 20, 0, 0).unwrap();
        let generate = call(1, "generate_numbers");
        let save = call(2, "save_numbers");
        let period = call(3, "get_draw_period");
        let responses = run(handler_at(wednesday_evening), &[&generate, &save, &period]).await;

        let refused = tool_payload(&responses[1]);
        assert_eq!(refused["saved"], false);
        assert_eq!(refused["notice"], "It is not time to save numbers.");

        let period = tool_payload(&responses[2]);
        assert_eq!(period["open"], false);
        assert!(period["period"].is_null());
    }

    #[tokio::test]
    async fn test_draw_period_for_given_instant() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {
                "name": "get_draw_period",
                "arguments": { "at": "2026-10-17T11:59:00Z" }
            }
        })
        .to_string();
        let responses = run(handler_at(thursday_morning()), &[&request]).await;

        let payload = tool_payload(&responses[0]);
        assert_eq!(payload["period"], "SORTEO1");
        assert_eq!(payload["open"], true);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let unknown_tool = call(3, "delete_everything");
        let responses = run(
            handler_at(thursday_morning()),
            &[
                "{not json",
                r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#,
                &unknown_tool,
                r#"{"jsonrpc":"2.0","id":4,"method":"tools/call"}"#,
            ],
        )
        .await;

        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[1]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses[2]["error"]["code"], INVALID_PARAMS);
        assert_eq!(responses[3]["error"]["code"], INVALID_PARAMS);
    }

    fn call_with(id: u32, tool: &str, arguments: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": tool, "arguments": arguments }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_bad_arguments_are_invalid_params() {
        let bad_at = call_with(1, "get_draw_period", json!({ "at": "not-a-date" }));
        let numeric_at = call_with(2, "get_draw_period", json!({ "at": 17 }));
        let list_arguments = call_with(3, "get_status", json!(["at"]));
        let string_limit = call_with(4, "get_history", json!({ "limit": "two" }));
        let negative_limit = call_with(5, "get_history", json!({ "limit": -1 }));
        let responses = run(
            handler_at(thursday_morning()),
            &[&bad_at, &numeric_at, &list_arguments, &string_limit, &negative_limit],
        )
        .await;

        assert_eq!(responses.len(), 5);
        for (i, response) in responses.iter().enumerate() {
            assert_eq!(response["error"]["code"], INVALID_PARAMS, "response {i}: {response}");
            assert_eq!(response["id"], json!(i + 1));
        }
        let message = responses[0]["error"]["message"].as_str().unwrap();
        assert!(message.contains("RFC 3339"), "{message}");
    }

    #[tokio::test]
    async fn test_null_arguments_are_treated_as_empty() {
        let request = call_with(1, "get_status", Value::Null);
        let responses = run(handler_at(thursday_morning()), &[&request]).await;

        let status = tool_payload(&responses[0]);
        assert_eq!(status["success"], true);
        assert_eq!(status["period"], "SORTEO1");
    }

    #[tokio::test]
    async fn test_history_limit() {
        let generate = call(1, "generate_numbers");
        let save = call(2, "save_numbers");
        let limited = call_with(3, "get_history", json!({ "limit": 0 }));
        let wide = call_with(4, "get_history", json!({ "limit": 10 }));
        let responses = run(handler_at(thursday_morning()), &[&generate, &save, &limited, &wide]).await;

        assert_eq!(tool_payload(&responses[1])["saved"], true);
        assert!(tool_payload(&responses[2])["results"].as_array().unwrap().is_empty());
        assert_eq!(tool_payload(&responses[3])["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version_is_rejected() {
        let responses = run(
            handler_at(thursday_morning()),
            &[
                r#"{"jsonrpc":"1.0","id":1,"method":"tools/list"}"#,
                r#"{"jsonrpc":"1.0","method":"notifications/initialized"}"#,
                r#"{"id":2,"method":"tools/list"}"#,
            ],
        )
        .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], INVALID_REQUEST);
        assert_eq!(responses[0]["id"], 1);
        assert!(responses[1]["result"]["tools"].is_array());
    }
}
