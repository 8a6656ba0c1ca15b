use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::agent::{AgentConfig, SomniaAgent};
use crate::config::Config;
use crate::error::SomniaError;
use crate::rpc::{KeySlot, RpcClient};
use crate::tools::{Tool, ToolDefinition};

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 Request format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Value,
}

/// JSON-RPC 2.0 Response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        JsonRpcError {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Response for a line that could not be parsed as a request.
    pub fn parse_error(detail: String) -> Self {
        let mut error = JsonRpcError::new(PARSE_ERROR, "Parse error");
        error.data = Some(Value::String(detail));
        Self::failure(Value::Null, error)
    }
}

/// Tool failures keep the message a user would read; bad arguments map to
/// the invalid-params code.
impl From<SomniaError> for JsonRpcError {
    fn from(err: SomniaError) -> Self {
        let code = match err {
            SomniaError::InvalidArguments(_) => INVALID_PARAMS,
            _ => INTERNAL_ERROR,
        };
        JsonRpcError::new(code, err.to_string())
    }
}

/// MCP server exposing the Somnia agent tools
pub struct McpServer {
    config: Config,
    agent: Arc<RwLock<Option<Arc<SomniaAgent>>>>,
    tools: Arc<RwLock<Vec<Arc<dyn Tool>>>>,
}

impl McpServer {
    pub fn new(config: Config) -> Self {
        McpServer {
            config,
            agent: Arc::new(RwLock::new(None)),
            tools: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Server over a fixed tool set, without an agent.
    pub fn with_tools(config: Config, tools: Vec<Arc<dyn Tool>>) -> Self {
        McpServer {
            config,
            agent: Arc::new(RwLock::new(None)),
            tools: Arc::new(RwLock::new(tools)),
        }
    }

    /// Build the agent from configuration and register its tools
    pub async fn initialize(&self) -> crate::error::Result<()> {
        info!(
            "Initializing MCP server with RPC URL: {}",
            self.config.rpc_url
        );

        let agent_config = AgentConfig::from_config(&self.config)?;
        let key_slot = KeySlot::new();
        let rpc = RpcClient::from_config(&self.config, key_slot.clone())?;
        let agent = Arc::new(SomniaAgent::with_backend(
            agent_config,
            key_slot,
            Arc::new(rpc),
        )?);
        let tools = agent.tools();

        info!(
            "Agent wallet {} with {} tools",
            agent.address(),
            tools.len()
        );

        *self.tools.write().await = tools;
        *self.agent.write().await = Some(agent);

        info!("MCP server initialized successfully");
        Ok(())
    }

    pub async fn agent(&self) -> Option<Arc<SomniaAgent>> {
        self.agent.read().await.clone()
    }

    /// Definitions of every registered tool, as `tools/list` returns them
    pub async fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .read()
            .await
            .iter()
            .map(|tool| tool.definition())
            .collect()
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(
            "Handling MCP request: {} with params: {:?}",
            request.method, request.params
        );

        let response = match request.method.as_str() {
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tool_call(&request.params).await,
            "ping" => Ok(json!({"status": "ok"})),
            _ => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        };

        match response {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(err) => JsonRpcResponse::failure(request.id, err),
        }
    }

    async fn handle_tools_list(&self) -> Result<Value, JsonRpcError> {
        let tools = self.get_tool_definitions().await;
        serde_json::to_value(&tools)
            .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {}", e)))
    }

    async fn find_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .await
            .iter()
            .find(|tool| tool.name() == name)
            .cloned()
    }

    async fn handle_tool_call(&self, params: &Value) -> Result<Value, JsonRpcError> {
        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                JsonRpcError::new(INVALID_PARAMS, "Missing or invalid 'name' parameter")
            })?;

        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        let tool = self.find_tool(tool_name).await.ok_or_else(|| {
            JsonRpcError::new(METHOD_NOT_FOUND, format!("Tool not found: {}", tool_name))
        })?;

        match tool.call(arguments).await {
            Ok(result) => {
                info!("Tool {} completed", tool_name);
                Ok(result)
            }
            Err(e) => {
                if matches!(e, SomniaError::InvalidArguments(_)) {
                    warn!("Tool {} rejected arguments: {}", tool_name, e);
                } else {
                    error!("Tool {} failed: {}", tool_name, e);
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonrpc_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "tools/call".to_string(),
            params: json!({}),
            id: json!(1),
        };

        let json_str = serde_json::to_string(&request).unwrap();
        assert!(json_str.contains("tools/call"));
        assert!(json_str.contains("2.0"));
    }

    #[test]
    fn test_request_without_params() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"ping","id":7}"#).unwrap();
        assert!(request.params.is_null());
    }

    #[test]
    fn test_error_codes_from_tool_errors() {
        let err: JsonRpcError = SomniaError::InvalidArguments("missing field".to_string()).into();
        assert_eq!(err.code, INVALID_PARAMS);

        let err: JsonRpcError = SomniaError::GasFailure.into();
        assert_eq!(err.code, INTERNAL_ERROR);
        assert_eq!(err.message, "Gas estimation failed or gas limit exceeded");
    }

    #[test]
    fn test_parse_error_response_shape() {
        let response = JsonRpcResponse::parse_error("expected value".to_string());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["id"], Value::Null);
        assert!(value.get("result").is_none());
    }

    #[tokio::test]
    async fn test_uninitialized_server_has_no_tools() {
        let server = McpServer::new(Config::from_url("http://localhost:8545".to_string()));
        assert!(server.get_tool_definitions().await.is_empty());
        assert!(server.agent().await.is_none());
    }
}
