use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pool::PoolRef;

/// The user actions the orchestrator can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LendingAction {
    SupplyLiquidity,
    SupplyCollateral,
    /// Keyed by shares, not assets.
    WithdrawLiquidity,
    Borrow,
    Repay,
    SwapCollateral,
}

impl LendingAction {
    /// Whether the entrypoint pulls tokens from the user, requiring an
    /// ERC-20 allowance. Withdraw burns shares, borrow pays out, and swaps
    /// move position-held funds, so none of those need approval.
    pub fn requires_allowance(&self) -> bool {
        matches!(
            self,
            LendingAction::SupplyLiquidity
                | LendingAction::SupplyCollateral
                | LendingAction::Repay
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub token_in: Address,
    pub token_out: Address,
    pub min_out: U256,
    pub fee_tier: u32,
}

/// Everything needed to drive one action on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: LendingAction,
    pub pool: PoolRef,
    /// The token the entrypoint would pull from the user; checked for
    /// allowance when the action requires it.
    pub token: Address,
    /// The entrypoint contract that spends the token.
    pub spender: Address,
    /// Asset amount, or share count for withdrawals.
    pub amount: U256,
    pub swap: Option<SwapRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    Idle,
    Reviewing,
    Approving,
    Executing,
    Success,
    Error,
}

/// Observable state of one in-flight action. Created at review time,
/// reset to idle when the user dismisses the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFlow {
    pub id: Uuid,
    pub action: Option<LendingAction>,
    pub phase: FlowPhase,
    pub needs_approval: bool,
    pub approval_hash: Option<B256>,
    pub action_hash: Option<B256>,
    pub error: Option<String>,
}

impl TransactionFlow {
    pub fn idle() -> Self {
        Self {
            id: Uuid::new_v4(),
            action: None,
            phase: FlowPhase::Idle,
            needs_approval: false,
            approval_hash: None,
            action_hash: None,
            error: None,
        }
    }
}

impl Default for TransactionFlow {
    fn default() -> Self {
        Self::idle()
    }
}
