use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{ActionRequest, FlowPhase, LendingAction, TransactionFlow};
use crate::services::snapshot_cache::SnapshotCache;

/// Failures surfaced by the wallet/submission collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmitError {
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),
}

/// Client-side checks that run before any chain interaction. These never
/// reach the wallet and are never retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("amount exceeds available balance")]
    InsufficientBalance,

    #[error("amount exceeds available pool liquidity")]
    ExceedsLiquidity,

    #[error("amount exceeds maximum borrowable")]
    ExceedsMaxBorrowable,

    #[error("a collateral position is required before borrowing")]
    PositionRequired,
}

/// Misuse of the state machine itself, distinct from chain failures (which
/// land in the flow's error state, not here).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    #[error("no action under review")]
    NoActiveRequest,

    #[error("operation not allowed in phase {0:?}")]
    InvalidPhase(FlowPhase),
}

/// Account-state bounds the caller derives from the aggregator and risk
/// calculator before review.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionLimits {
    /// Balance of the acting token (or shares for withdrawals).
    pub balance: U256,
    /// Assets immediately available in the pool; bounds borrows.
    pub liquidity: U256,
    pub max_borrowable: U256,
    pub has_position: bool,
}

/// Wallet/submission collaborator. The engine never signs; it hands intents
/// to this trait and observes hashes and confirmations.
#[async_trait]
pub trait ActionSubmitter: Send + Sync {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SubmitError>;

    /// Submit an unlimited-allowance approval; returns the tx hash.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, SubmitError>;

    /// Submit the primary action; returns the tx hash.
    async fn submit(&self, request: &ActionRequest, account: Address) -> Result<B256, SubmitError>;

    /// Resolve once the chain confirms the transaction or the wallet
    /// reports failure. No client-imposed timeout.
    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<(), SubmitError>;
}

/// Drives one action slot through allowance-check, approval, execution and
/// confirmation. One instance per slot; the view layer reads the flow and
/// calls `review`/`submit`/`retry`/`cancel`.
pub struct TransactionOrchestrator {
    submitter: Arc<dyn ActionSubmitter>,
    cache: Arc<SnapshotCache>,
    account: Address,
    flow: TransactionFlow,
    request: Option<ActionRequest>,
}

impl TransactionOrchestrator {
    pub fn new(
        submitter: Arc<dyn ActionSubmitter>,
        cache: Arc<SnapshotCache>,
        account: Address,
    ) -> Self {
        Self {
            submitter,
            cache,
            account,
            flow: TransactionFlow::idle(),
            request: None,
        }
    }

    /// Read-only state for the view layer.
    pub fn flow(&self) -> &TransactionFlow {
        &self.flow
    }

    /// Validate a request and move `idle -> reviewing`. Violations leave
    /// the phase untouched and never touch the chain.
    pub fn review(
        &mut self,
        request: ActionRequest,
        limits: &ActionLimits,
    ) -> Result<(), ValidationError> {
        validate(&request, limits)?;

        self.flow = TransactionFlow {
            id: Uuid::new_v4(),
            action: Some(request.action),
            phase: FlowPhase::Reviewing,
            needs_approval: false,
            approval_hash: None,
            action_hash: None,
            error: None,
        };
        self.request = Some(request);
        Ok(())
    }

    /// Drive the reviewed action to `success` or `error`. Chain failures
    /// land in the flow state; the returned error only covers calling this
    /// in the wrong phase.
    pub async fn submit(&mut self) -> Result<(), OrchestratorError> {
        if self.flow.phase != FlowPhase::Reviewing {
            return Err(OrchestratorError::InvalidPhase(self.flow.phase));
        }
        let request = self
            .request
            .clone()
            .ok_or(OrchestratorError::NoActiveRequest)?;

        if request.action.requires_allowance() {
            let allowance = match self
                .submitter
                .allowance(request.token, self.account, request.spender)
                .await
            {
                Ok(allowance) => allowance,
                Err(e) => {
                    self.fail(e);
                    return Ok(());
                }
            };

            if allowance < request.amount {
                self.flow.needs_approval = true;
                self.flow.phase = FlowPhase::Approving;
                info!(action = ?request.action, token = %request.token, "allowance insufficient, approving");

                let approval_hash = match self
                    .submitter
                    .approve(request.token, request.spender, U256::MAX)
                    .await
                {
                    Ok(hash) => hash,
                    Err(e) => {
                        self.fail(e);
                        return Ok(());
                    }
                };
                self.flow.approval_hash = Some(approval_hash);

                // The primary action must not go out until the approval is
                // confirmed, or it reverts on insufficient allowance.
                if let Err(e) = self.submitter.wait_for_confirmation(approval_hash).await {
                    self.fail(e);
                    return Ok(());
                }
            }
        }

        self.flow.phase = FlowPhase::Executing;
        let action_hash = match self.submitter.submit(&request, self.account).await {
            Ok(hash) => hash,
            Err(e) => {
                self.fail(e);
                return Ok(());
            }
        };
        self.flow.action_hash = Some(action_hash);

        if let Err(e) = self.submitter.wait_for_confirmation(action_hash).await {
            self.fail(e);
            return Ok(());
        }

        self.flow.phase = FlowPhase::Success;
        info!(action = ?request.action, pool = %request.pool.address, "action confirmed");

        // All derived state for the affected pool and account goes stale
        // together; one atomic invalidation, then the pollers refetch.
        self.cache
            .invalidate_after_transaction(&request.pool, self.account)
            .await;
        Ok(())
    }

    /// `error -> reviewing`. Re-entry happens at the allowance check, so a
    /// confirmed approval is observed on-chain and never re-submitted.
    pub fn retry(&mut self) -> Result<(), OrchestratorError> {
        if self.flow.phase != FlowPhase::Error {
            return Err(OrchestratorError::InvalidPhase(self.flow.phase));
        }
        self.flow.error = None;
        self.flow.phase = FlowPhase::Reviewing;
        Ok(())
    }

    /// Reset to idle; only allowed once the flow is settled.
    pub fn cancel(&mut self) -> Result<(), OrchestratorError> {
        match self.flow.phase {
            FlowPhase::Idle | FlowPhase::Success | FlowPhase::Error => {
                self.flow = TransactionFlow::idle();
                self.request = None;
                Ok(())
            }
            phase => Err(OrchestratorError::InvalidPhase(phase)),
        }
    }

    fn fail(&mut self, error: SubmitError) {
        let message = first_line(&error.to_string());
        warn!(phase = ?self.flow.phase, error = %message, "transaction flow failed");
        self.flow.error = Some(message);
        self.flow.phase = FlowPhase::Error;
    }
}

fn validate(request: &ActionRequest, limits: &ActionLimits) -> Result<(), ValidationError> {
    if request.amount.is_zero() {
        return Err(ValidationError::ZeroAmount);
    }
    if request.amount > limits.balance {
        return Err(ValidationError::InsufficientBalance);
    }
    if request.action == LendingAction::Borrow {
        if !limits.has_position {
            return Err(ValidationError::PositionRequired);
        }
        if request.amount > limits.liquidity {
            return Err(ValidationError::ExceedsLiquidity);
        }
        if request.amount > limits.max_borrowable {
            return Err(ValidationError::ExceedsMaxBorrowable);
        }
    }
    Ok(())
}

/// Wallet and RPC failures can be multi-line dumps; only the first line is
/// fit for display.
fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or("").to_string()
}
