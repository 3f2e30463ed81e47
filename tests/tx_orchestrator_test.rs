use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lendscope::models::{ActionRequest, FlowPhase, LendingAction, PoolRef};
use lendscope::services::position_aggregator::summarize;
use lendscope::services::snapshot_cache::SnapshotCache;
use lendscope::services::tx_orchestrator::{
    ActionLimits, ActionSubmitter, SubmitError, TransactionOrchestrator, ValidationError,
};

const APPROVAL_HASH: B256 = B256::repeat_byte(0xaa);
const ACTION_HASH: B256 = B256::repeat_byte(0xbb);

/// Scripted wallet collaborator recording every call in order.
struct MockSubmitter {
    allowance: Mutex<U256>,
    fail_next_submit: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockSubmitter {
    fn with_allowance(allowance: U256) -> Self {
        Self {
            allowance: Mutex::new(allowance),
            fail_next_submit: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn fail_next_submit(&self, message: &str) {
        *self.fail_next_submit.lock().unwrap() = Some(message.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl ActionSubmitter for MockSubmitter {
    async fn allowance(
        &self,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256, SubmitError> {
        self.record("allowance");
        Ok(*self.allowance.lock().unwrap())
    }

    async fn approve(
        &self,
        _token: Address,
        _spender: Address,
        amount: U256,
    ) -> Result<B256, SubmitError> {
        assert_eq!(amount, U256::MAX, "approvals request unlimited allowance");
        self.record("approve");
        Ok(APPROVAL_HASH)
    }

    async fn submit(&self, _request: &ActionRequest, _account: Address) -> Result<B256, SubmitError> {
        self.record("submit");
        if let Some(message) = self.fail_next_submit.lock().unwrap().take() {
            return Err(SubmitError::Wallet(message));
        }
        Ok(ACTION_HASH)
    }

    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<(), SubmitError> {
        if tx_hash == APPROVAL_HASH {
            self.record("confirm_approval");
            // Once the unlimited approval confirms, the chain reports it.
            *self.allowance.lock().unwrap() = U256::MAX;
        } else {
            self.record("confirm_action");
        }
        Ok(())
    }
}

fn supply_request(amount: u64) -> ActionRequest {
    ActionRequest {
        action: LendingAction::SupplyLiquidity,
        pool: PoolRef {
            chain_id: 1,
            address: Address::repeat_byte(0x11),
        },
        token: Address::repeat_byte(0x22),
        spender: Address::repeat_byte(0x33),
        amount: U256::from(amount),
        swap: None,
    }
}

fn limits(balance: u64) -> ActionLimits {
    ActionLimits {
        balance: U256::from(balance),
        ..Default::default()
    }
}

fn orchestrator(submitter: Arc<MockSubmitter>) -> (TransactionOrchestrator, Arc<SnapshotCache>) {
    let cache = Arc::new(SnapshotCache::new(Duration::from_secs(60)));
    let account = Address::repeat_byte(0x44);
    (
        TransactionOrchestrator::new(submitter, cache.clone(), account),
        cache,
    )
}

#[tokio::test]
async fn sufficient_allowance_skips_approval_entirely() {
    let submitter = Arc::new(MockSubmitter::with_allowance(U256::from(1_000u64)));
    let (mut orch, _cache) = orchestrator(submitter.clone());

    orch.review(supply_request(500), &limits(1_000)).unwrap();
    orch.submit().await.unwrap();

    assert_eq!(orch.flow().phase, FlowPhase::Success);
    assert!(!orch.flow().needs_approval);
    assert!(orch.flow().approval_hash.is_none());
    assert_eq!(orch.flow().action_hash, Some(ACTION_HASH));
    assert_eq!(
        submitter.calls(),
        vec!["allowance", "submit", "confirm_action"]
    );
}

#[tokio::test]
async fn insufficient_allowance_approves_and_waits_before_acting() {
    let submitter = Arc::new(MockSubmitter::with_allowance(U256::ZERO));
    let (mut orch, _cache) = orchestrator(submitter.clone());

    orch.review(supply_request(500), &limits(1_000)).unwrap();
    orch.submit().await.unwrap();

    assert_eq!(orch.flow().phase, FlowPhase::Success);
    assert!(orch.flow().needs_approval);
    assert_eq!(orch.flow().approval_hash, Some(APPROVAL_HASH));
    assert_eq!(orch.flow().action_hash, Some(ACTION_HASH));
    // The approval confirmation strictly precedes the primary submission.
    assert_eq!(
        submitter.calls(),
        vec![
            "allowance",
            "approve",
            "confirm_approval",
            "submit",
            "confirm_action"
        ]
    );
}

#[tokio::test]
async fn actions_without_allowance_skip_the_check() {
    let submitter = Arc::new(MockSubmitter::with_allowance(U256::ZERO));
    let (mut orch, _cache) = orchestrator(submitter.clone());

    let request = ActionRequest {
        action: LendingAction::WithdrawLiquidity,
        ..supply_request(100)
    };
    orch.review(request, &limits(1_000)).unwrap();
    orch.submit().await.unwrap();

    assert_eq!(orch.flow().phase, FlowPhase::Success);
    assert_eq!(submitter.calls(), vec!["submit", "confirm_action"]);
}

#[tokio::test]
async fn submission_failure_surfaces_first_line_and_retry_reuses_approval() {
    let submitter = Arc::new(MockSubmitter::with_allowance(U256::ZERO));
    let (mut orch, _cache) = orchestrator(submitter.clone());
    submitter.fail_next_submit("user rejected transaction\nRequest Arguments:\n  from: 0x44");

    orch.review(supply_request(500), &limits(1_000)).unwrap();
    orch.submit().await.unwrap();

    assert_eq!(orch.flow().phase, FlowPhase::Error);
    assert_eq!(
        orch.flow().error.as_deref(),
        Some("Wallet error: user rejected transaction")
    );
    // Approval went through before the failure and stays recorded.
    assert_eq!(orch.flow().approval_hash, Some(APPROVAL_HASH));

    orch.retry().unwrap();
    assert_eq!(orch.flow().phase, FlowPhase::Reviewing);
    assert!(orch.flow().error.is_none());

    orch.submit().await.unwrap();
    assert_eq!(orch.flow().phase, FlowPhase::Success);

    // Retry re-enters at the allowance check; the confirmed approval is
    // observed on-chain and never re-submitted.
    let approvals = submitter
        .calls()
        .iter()
        .filter(|c| c.as_str() == "approve")
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
async fn validation_failures_never_touch_the_chain() {
    let submitter = Arc::new(MockSubmitter::with_allowance(U256::MAX));
    let (mut orch, _cache) = orchestrator(submitter.clone());

    assert_eq!(
        orch.review(supply_request(0), &limits(1_000)),
        Err(ValidationError::ZeroAmount)
    );
    assert_eq!(
        orch.review(supply_request(2_000), &limits(1_000)),
        Err(ValidationError::InsufficientBalance)
    );
    assert_eq!(orch.flow().phase, FlowPhase::Idle);

    let borrow = ActionRequest {
        action: LendingAction::Borrow,
        ..supply_request(100)
    };
    assert_eq!(
        orch.review(borrow, &limits(1_000)),
        Err(ValidationError::PositionRequired)
    );
    assert!(submitter.calls().is_empty());
}

#[tokio::test]
async fn cancel_is_only_allowed_once_settled() {
    let submitter = Arc::new(MockSubmitter::with_allowance(U256::MAX));
    let (mut orch, _cache) = orchestrator(submitter.clone());

    // Cancelling an idle flow is a no-op reset.
    orch.cancel().unwrap();

    orch.review(supply_request(500), &limits(1_000)).unwrap();
    assert!(orch.cancel().is_err());

    orch.submit().await.unwrap();
    assert_eq!(orch.flow().phase, FlowPhase::Success);
    orch.cancel().unwrap();
    assert_eq!(orch.flow().phase, FlowPhase::Idle);
    assert!(orch.flow().action.is_none());
}

#[tokio::test]
async fn confirmed_action_invalidates_pool_and_portfolio_caches() {
    let submitter = Arc::new(MockSubmitter::with_allowance(U256::MAX));
    let (mut orch, cache) = orchestrator(submitter.clone());
    let account = Address::repeat_byte(0x44);

    cache.put_portfolio(summarize(account, vec![], false)).await;
    assert!(cache.get_portfolio(account).await.is_some());

    orch.review(supply_request(500), &limits(1_000)).unwrap();
    orch.submit().await.unwrap();

    assert_eq!(orch.flow().phase, FlowPhase::Success);
    assert!(cache.get_portfolio(account).await.is_none());
}
