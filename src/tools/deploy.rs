use alloy::dyn_abi::{DynSolValue, Specifier};
use alloy::json_abi::JsonAbi;
use alloy::network::TransactionBuilder;
use alloy::primitives::{hex, Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::{parse_args, submit_and_confirm, Tool, ToolDefinition};
use crate::error::{Result, SomniaError};
use crate::failure::{self, FailureContext};
use crate::rpc::ChainBackend;

#[derive(Debug, Clone, Deserialize)]
pub struct DeployContractRequest {
    pub abi: Vec<Value>,
    pub bytecode: String,
    #[serde(default)]
    pub args: Option<Vec<ConstructorArg>>,
}

/// Constructor arguments arrive as plain JSON scalars and are coerced to the
/// parameter types the ABI declares.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConstructorArg {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl ConstructorArg {
    fn as_string(&self) -> String {
        match self {
            ConstructorArg::Text(s) => s.clone(),
            ConstructorArg::Number(n) => n.to_string(),
            ConstructorArg::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployResponse {
    pub transaction_hash: TxHash,
    pub contract_address: Address,
}

/// ABI-encode `args` against the constructor of `abi`.
pub fn encode_constructor_args(abi: &JsonAbi, args: &[ConstructorArg]) -> Result<Vec<u8>> {
    let Some(constructor) = abi.constructor() else {
        if args.is_empty() {
            return Ok(Vec::new());
        }
        return Err(SomniaError::InvalidArguments(format!(
            "ABI has no constructor but {} argument(s) were given",
            args.len()
        )));
    };

    if constructor.inputs.len() != args.len() {
        return Err(SomniaError::InvalidArguments(format!(
            "Constructor expects {} argument(s), got {}",
            constructor.inputs.len(),
            args.len()
        )));
    }

    let values = constructor
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param
                .resolve()
                .map_err(|e| SomniaError::InvalidAbi(format!("{}: {}", param.ty, e)))?;
            ty.coerce_str(&arg.as_string()).map_err(|e| {
                SomniaError::InvalidArguments(format!(
                    "Argument '{}' is not a valid {}: {}",
                    param.name, param.ty, e
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

/// Bytecode followed by the encoded constructor arguments.
pub fn build_deploy_code(request: &DeployContractRequest) -> Result<Vec<u8>> {
    let abi: JsonAbi = serde_json::from_value(Value::Array(request.abi.clone()))
        .map_err(|e| SomniaError::InvalidAbi(e.to_string()))?;

    let bytecode = request.bytecode.trim();
    if bytecode.is_empty() || bytecode == "0x" {
        return Err(SomniaError::InvalidArguments(
            "Contract bytecode is required".to_string(),
        ));
    }

    let mut code = hex::decode(bytecode)
        .map_err(|e| SomniaError::InvalidArguments(format!("Invalid bytecode: {}", e)))?;

    let args = request.args.as_deref().unwrap_or_default();
    code.extend(encode_constructor_args(&abi, args)?);

    Ok(code)
}

/// `deploy_contract`
pub struct DeployContractTool {
    backend: Arc<dyn ChainBackend>,
    native_symbol: String,
}

impl DeployContractTool {
    pub fn new(backend: Arc<dyn ChainBackend>, native_symbol: &str) -> Self {
        DeployContractTool {
            backend,
            native_symbol: native_symbol.to_string(),
        }
    }

    pub async fn deploy(&self, request: DeployContractRequest) -> Result<DeployResponse> {
        let ctx = FailureContext {
            operation: "Contract deployment",
            action: "deployment",
            symbol: &self.native_symbol,
        };

        let result: Result<DeployResponse> = async {
            let code = build_deploy_code(&request)?;
            let backend = self.backend.as_ref();

            let from = backend.signer_address().await?;
            let tx = TransactionRequest::default()
                .with_from(from)
                .with_deploy_code(code);

            let gas_estimate = backend.estimate_gas(&tx).await?;
            info!("Deploying contract from {} (gas {})", from, gas_estimate);

            let (hash, receipt) =
                submit_and_confirm(backend, tx.with_gas_limit(gas_estimate)).await?;

            let contract_address = receipt.contract_address.ok_or_else(|| {
                SomniaError::DeploymentFailed(format!("receipt for {} has no contract address", hash))
            })?;

            Ok(DeployResponse {
                transaction_hash: hash,
                contract_address,
            })
        }
        .await;

        let response = result.map_err(|e| failure::classify(e, &ctx))?;
        info!(
            "Contract deployed at {} (tx {})",
            response.contract_address, response.transaction_hash
        );
        Ok(response)
    }
}

#[async_trait]
impl Tool for DeployContractTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "deploy_contract".to_string(),
            description: "Deploy a smart contract to Somnia network".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "abi": {
                        "type": "array",
                        "items": { "type": "object" },
                        "description": "The contract ABI as an array of objects"
                    },
                    "bytecode": {
                        "type": "string",
                        "description": "The contract bytecode"
                    },
                    "args": {
                        "type": ["array", "null"],
                        "items": { "type": ["string", "number", "boolean"] },
                        "description": "Constructor arguments (optional)"
                    }
                },
                "required": ["abi", "bytecode"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<Value> {
        let request: DeployContractRequest = parse_args(arguments)?;
        let response = self.deploy(request).await?;
        Ok(serde_json::to_value(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abi_with_constructor() -> Vec<Value> {
        vec![json!({
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "owner", "type": "address", "internalType": "address" },
                { "name": "supply", "type": "uint256", "internalType": "uint256" },
                { "name": "paused", "type": "bool", "internalType": "bool" }
            ]
        })]
    }

    fn request(abi: Vec<Value>, args: Option<Value>) -> DeployContractRequest {
        serde_json::from_value(json!({
            "abi": abi,
            "bytecode": "0x6080604052",
            "args": args
        }))
        .unwrap()
    }

    #[test]
    fn test_constructor_args_are_appended() {
        let req = request(
            abi_with_constructor(),
            Some(json!([
                "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                1000,
                true
            ])),
        );

        let code = build_deploy_code(&req).unwrap();
        assert_eq!(&code[..5], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(code.len(), 5 + 32 * 3);
        // uint256 1000 in the second word
        assert_eq!(code[5 + 32 + 30], 0x03);
        assert_eq!(code[5 + 32 + 31], 0xe8);
        // bool true in the last byte
        assert_eq!(code[code.len() - 1], 0x01);
    }

    #[test]
    fn test_no_constructor_no_args() {
        let req = request(vec![], None);
        let code = build_deploy_code(&req).unwrap();
        assert_eq!(code, vec![0x60, 0x80, 0x60, 0x40, 0x52]);
    }

    #[test]
    fn test_argument_count_mismatch() {
        let req = request(abi_with_constructor(), Some(json!(["0x00"])));
        assert!(matches!(
            build_deploy_code(&req),
            Err(SomniaError::InvalidArguments(_))
        ));

        let req = request(vec![], Some(json!([1])));
        assert!(matches!(
            build_deploy_code(&req),
            Err(SomniaError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_uncoercible_argument() {
        let req = request(
            abi_with_constructor(),
            Some(json!(["not-an-address", 1, true])),
        );
        let err = build_deploy_code(&req).unwrap_err();
        assert!(err.to_string().contains("owner"));
    }

    #[test]
    fn test_bad_bytecode() {
        let mut req = request(vec![], None);
        req.bytecode = "0xzz".to_string();
        assert!(build_deploy_code(&req).is_err());

        req.bytecode = "".to_string();
        assert!(matches!(
            build_deploy_code(&req),
            Err(SomniaError::InvalidArguments(_))
        ));
    }
}
