#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolValue;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use somnia_agent_tools::agent::{AgentConfig, PartialAgentConfig, SomniaAgent};
use somnia_agent_tools::error::Result;
use somnia_agent_tools::rpc::{ChainBackend, FeeData, KeySlot, ProviderError, TxReceipt};

pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const RECIPIENT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const SENT_HASH: TxHash = TxHash::repeat_byte(0xab);

pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;
pub const GWEI: u128 = 1_000_000_000;

const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];
const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// Token the fake chain answers `eth_call` for.
#[derive(Debug, Clone)]
pub struct FakeToken {
    pub decimals: u8,
    pub symbol: String,
    pub balance: U256,
}

/// Mutable knobs for [`FakeChain`].
#[derive(Debug, Clone)]
pub struct FakeState {
    pub balance: U256,
    pub gas_estimate: u64,
    pub gas_price: Option<u128>,
    pub token: Option<FakeToken>,
    pub receipt_success: bool,
    pub receipt_missing: bool,
    pub contract_address: Option<Address>,
    /// `(method, error)`: the named method fails with this provider error.
    pub fail: Option<(&'static str, ProviderError)>,
}

impl Default for FakeState {
    fn default() -> Self {
        FakeState {
            balance: U256::from(10 * ONE_ETHER),
            gas_estimate: 21_000,
            gas_price: Some(GWEI),
            token: None,
            receipt_success: true,
            receipt_missing: false,
            contract_address: None,
            fail: None,
        }
    }
}

/// In-memory chain that records every backend call by name.
pub struct FakeChain {
    pub key_slot: KeySlot,
    pub state: Mutex<FakeState>,
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<TransactionRequest>>,
}

impl FakeChain {
    pub fn new(key_slot: KeySlot) -> Self {
        FakeChain {
            key_slot,
            state: Mutex::new(FakeState::default()),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_state(key_slot: KeySlot, state: FakeState) -> Self {
        let chain = Self::new(key_slot);
        *chain.state.lock().unwrap() = state;
        chain
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, method: &str) -> Result<FakeState> {
        self.calls.lock().unwrap().push(method.to_string());
        let state = self.state.lock().unwrap().clone();
        match &state.fail {
            Some((name, err)) if *name == method => Err(err.clone().into()),
            _ => Ok(state),
        }
    }
}

#[async_trait]
impl ChainBackend for FakeChain {
    async fn signer_address(&self) -> Result<Address> {
        self.key_slot.address().await
    }

    async fn balance(&self, _address: Address) -> Result<U256> {
        Ok(self.record("balance")?.balance)
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64> {
        Ok(self.record("estimate_gas")?.gas_estimate)
    }

    async fn fee_data(&self) -> Result<FeeData> {
        let state = self.record("fee_data")?;
        Ok(FeeData {
            gas_price: state.gas_price,
            ..Default::default()
        })
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        let state = self.record("call")?;
        let Some(token) = state.token else {
            return Ok(Bytes::new());
        };

        let input = tx.input.input().cloned().unwrap_or_default();
        let data = match input.get(..4) {
            Some(s) if s == DECIMALS_SELECTOR => U256::from(token.decimals).abi_encode(),
            Some(s) if s == SYMBOL_SELECTOR => token.symbol.abi_encode(),
            Some(s) if s == BALANCE_OF_SELECTOR => token.balance.abi_encode(),
            _ => Vec::new(),
        };
        Ok(data.into())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        self.record("send_transaction")?;
        self.sent.lock().unwrap().push(tx);
        Ok(SENT_HASH)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>> {
        let state = self.record("wait_for_receipt")?;
        if state.receipt_missing {
            return Ok(None);
        }
        Ok(Some(TxReceipt {
            transaction_hash: hash,
            success: state.receipt_success,
            block_number: Some(1),
            contract_address: state.contract_address,
        }))
    }
}

/// A fake chain whose key slot already holds [`TEST_KEY`].
pub async fn signed_chain(state: FakeState) -> Arc<FakeChain> {
    let slot = KeySlot::new();
    slot.set_private_key(TEST_KEY).await.unwrap();
    Arc::new(FakeChain::with_state(slot, state))
}

/// An agent over a fake chain.
pub fn create_test_agent(state: FakeState) -> (Arc<SomniaAgent>, Arc<FakeChain>) {
    let config = AgentConfig::from_partial(PartialAgentConfig {
        private_key: Some(TEST_KEY.to_string()),
        ..Default::default()
    })
    .unwrap();

    let slot = KeySlot::new();
    let chain = Arc::new(FakeChain::with_state(slot.clone(), state));
    let agent =
        SomniaAgent::with_backend(config, slot, Arc::clone(&chain) as Arc<dyn ChainBackend>)
            .unwrap();
    (Arc::new(agent), chain)
}

pub fn token(decimals: u8, symbol: &str, balance: U256) -> FakeToken {
    FakeToken {
        decimals,
        symbol: symbol.to_string(),
        balance,
    }
}
