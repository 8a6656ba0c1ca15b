use serde_json::Value;
use somnia_agent_tools::server::{JsonRpcRequest, JsonRpcResponse};
use somnia_agent_tools::{Config, McpServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting Somnia agent MCP server...");

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!("Using RPC endpoint {} (chain {})", config.rpc_url, config.chain_id);

    let listen_addr: SocketAddr = config.listen_addr.parse()?;
    let mcp_server = Arc::new(McpServer::new(config));

    match mcp_server.initialize().await {
        Ok(_) => info!("MCP server initialized successfully"),
        Err(e) => {
            error!("Failed to initialize MCP server: {}", e);
            return Err(e.into());
        }
    }

    let listener = TcpListener::bind(&listen_addr).await?;

    let names: Vec<String> = mcp_server
        .get_tool_definitions()
        .await
        .into_iter()
        .map(|t| t.name)
        .collect();
    info!("MCP server listening on {}", listen_addr);
    info!("Available tools: {}", names.join(", "));

    loop {
        let (socket, peer_addr) = listener.accept().await?;
        let mcp_server = Arc::clone(&mcp_server);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, mcp_server).await {
                error!("Error handling connection from {}: {}", peer_addr, e);
            }
        });
    }
}

async fn handle_connection(
    socket: tokio::net::TcpStream,
    mcp_server: Arc<McpServer>,
) -> eyre::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut buf_reader = BufReader::new(reader);
    let mut line = String::new();

    while buf_reader.read_line(&mut line).await? > 0 {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            line.clear();
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => {
                info!(
                    "Received request: {} (id: {:?})",
                    request.method, request.id
                );
                mcp_server.handle_request(request).await
            }
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                JsonRpcResponse::parse_error(e.to_string())
            }
        };

        write_line(&mut writer, &serde_json::to_value(&response)?).await?;
        line.clear();
    }

    Ok(())
}

async fn write_line(writer: &mut OwnedWriteHalf, value: &Value) -> eyre::Result<()> {
    let json = serde_json::to_string(value)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
