use serde_json::{json, Value};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

type Reader = BufReader<OwnedReadHalf>;
type Writer = OwnedWriteHalf;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    println!("╔═══════════════════════════════════════════════════════╗");
    println!("║     Somnia Agent MCP Server - Test Client v1.0       ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");

    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    println!("Connecting to server at {}...", addr);

    let socket = TcpStream::connect(&addr).await?;
    let (reader, writer) = socket.into_split();
    let reader = BufReader::new(reader);

    println!("✓ Connected successfully!\n");

    let mut client = TestClient::new(reader, writer);

    loop {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║ Available Commands:                                  ║");
        println!("║ 1. get_somi_balance  - Native balance               ║");
        println!("║ 2. get_erc20_balance - ERC20 token balance          ║");
        println!("║ 3. transfer_somi     - Send native tokens           ║");
        println!("║ 4. transfer_erc20    - Send ERC20 tokens            ║");
        println!("║ 5. burn_erc20        - Burn ERC20 tokens            ║");
        println!("║ 6. deploy_contract   - Deploy a contract            ║");
        println!("║ 7. tools/list        - List available tools         ║");
        println!("║ 8. exit              - Close connection             ║");
        println!("╚═══════════════════════════════════════════════════════╝");

        let choice = prompt("\nEnter command number (1-8): ")?;

        match choice.as_str() {
            "1" => {
                let wallet = optional(prompt("Wallet address (Enter for agent wallet): ")?);
                client
                    .call_tool("get_somi_balance", json!({ "walletAddress": wallet }))
                    .await?;
            }
            "2" => {
                let token = prompt("Token address (0x...): ")?;
                let wallet = optional(prompt("Wallet address (Enter for agent wallet): ")?);
                client
                    .call_tool(
                        "get_erc20_balance",
                        json!({ "tokenAddress": token, "walletAddress": wallet }),
                    )
                    .await?;
            }
            "3" => {
                let to = prompt("Recipient address (0x...): ")?;
                let amount = prompt("Amount: ")?;
                client
                    .call_tool("transfer_somi", json!({ "toAddress": to, "amount": amount }))
                    .await?;
            }
            "4" => {
                let token = prompt("Token address (0x...): ")?;
                let to = prompt("Recipient address (0x...): ")?;
                let amount = prompt("Amount: ")?;
                client
                    .call_tool(
                        "transfer_erc20",
                        json!({ "tokenAddress": token, "toAddress": to, "amount": amount }),
                    )
                    .await?;
            }
            "5" => {
                let token = prompt("Token address (0x...): ")?;
                let amount = prompt("Amount to burn: ")?;
                client
                    .call_tool(
                        "burn_erc20",
                        json!({ "tokenAddress": token, "amount": amount }),
                    )
                    .await?;
            }
            "6" => {
                let abi_path = prompt("Path to ABI JSON file: ")?;
                let abi = std::fs::read_to_string(&abi_path)?;
                let bytecode = prompt("Bytecode (0x...): ")?;
                let args = prompt("Constructor args as JSON array (Enter for none): ")?;
                client
                    .call_tool("deploy_contract", deploy_arguments(&abi, &bytecode, &args)?)
                    .await?;
            }
            "7" => {
                client.list_tools().await?;
            }
            "8" => {
                println!("\nGoodbye!");
                break;
            }
            _ => println!("Invalid choice. Please enter 1-8."),
        }
    }

    Ok(())
}

fn prompt(label: &str) -> eyre::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn optional(input: String) -> Value {
    if input.is_empty() {
        Value::Null
    } else {
        Value::String(input)
    }
}

/// Arguments for `deploy_contract` from an ABI file body and typed-in values.
fn deploy_arguments(abi_json: &str, bytecode: &str, args: &str) -> eyre::Result<Value> {
    let abi: Value = serde_json::from_str(abi_json)?;
    // solc artifacts wrap the ABI in an object
    let abi = match abi.get("abi") {
        Some(inner) => inner.clone(),
        None => abi,
    };
    let args = if args.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(args)?
    };

    Ok(json!({ "abi": abi, "bytecode": bytecode, "args": args }))
}

struct TestClient {
    reader: Reader,
    writer: Writer,
    request_id: i32,
}

impl TestClient {
    fn new(reader: Reader, writer: Writer) -> Self {
        TestClient {
            reader,
            writer,
            request_id: 1,
        }
    }

    async fn send_request(&mut self, request: Value) -> eyre::Result<()> {
        let request_json = serde_json::to_string(&request)?;
        println!(
            "\n→ Sending request:\n{}",
            serde_json::to_string_pretty(&request)?
        );

        self.writer.write_all(request_json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut response_line = String::new();
        self.reader.read_line(&mut response_line).await?;

        if !response_line.is_empty() {
            println!("\n← Response received:");
            let response: Value = serde_json::from_str(&response_line)?;
            println!("{}", serde_json::to_string_pretty(&response)?);

            if let Some(error) = response.get("error") {
                if !error.is_null() {
                    println!(
                        "\n⚠️  Error: {}",
                        error.get("message").unwrap_or(&Value::Null)
                    );
                }
            }
        }

        self.request_id += 1;
        Ok(())
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> eyre::Result<()> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": name,
                "arguments": arguments
            },
            "id": self.request_id
        });

        self.send_request(request).await
    }

    async fn list_tools(&mut self) -> eyre::Result<()> {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║ Listing Available Tools                              ║");
        println!("╚═══════════════════════════════════════════════════════╝");

        let request = json!({
            "jsonrpc": "2.0",
            "method": "tools/list",
            "params": {},
            "id": self.request_id
        });

        self.send_request(request).await
    }
}
