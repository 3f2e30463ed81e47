use alloy::{
    primitives::{aliases::U24, Address, B256, U256},
    providers::Provider,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::blockchain::bindings::{IERC20, ILendingEntrypoint};
use crate::models::{ActionRequest, LendingAction};
use crate::services::tx_orchestrator::{ActionSubmitter, SubmitError};

/// Production [`ActionSubmitter`] backed by a wallet-filled alloy provider:
/// the provider signs locally and the chain confirms. Confirmation waiting
/// polls for the receipt with no client-side timeout; an already-broadcast
/// transaction cannot be cancelled from here.
pub struct WalletSubmitter<P> {
    provider: P,
    receipt_poll_interval: Duration,
}

impl<P> WalletSubmitter<P>
where
    P: Provider<Http<Client>> + Send + Sync,
{
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            receipt_poll_interval: Duration::from_secs(2),
        }
    }
}

#[async_trait]
impl<P> ActionSubmitter for WalletSubmitter<P>
where
    P: Provider<Http<Client>> + Send + Sync,
{
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, SubmitError> {
        let erc20 = IERC20::new(token, &self.provider);
        let allowance = erc20
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| SubmitError::Rpc(e.to_string()))?
            ._0;
        debug!(%token, %owner, %spender, %allowance, "read allowance");
        Ok(allowance)
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, SubmitError> {
        let erc20 = IERC20::new(token, &self.provider);
        let call = erc20.approve(spender, amount);
        let pending = call
            .send()
            .await
            .map_err(|e| SubmitError::Wallet(e.to_string()))?;
        let hash = *pending.tx_hash();
        info!(%token, %spender, %hash, "approval submitted");
        Ok(hash)
    }

    async fn submit(&self, request: &ActionRequest, account: Address) -> Result<B256, SubmitError> {
        let entrypoint = ILendingEntrypoint::new(request.spender, &self.provider);
        let hash = match request.action {
            LendingAction::SupplyLiquidity => {
                let call = entrypoint.supplyLiquidity(account, request.amount);
                let pending = call
                    .send()
                    .await
                    .map_err(|e| SubmitError::Wallet(e.to_string()))?;
                *pending.tx_hash()
            }
            LendingAction::SupplyCollateral => {
                let call = entrypoint.supplyCollateral(account, request.amount);
                let pending = call
                    .send()
                    .await
                    .map_err(|e| SubmitError::Wallet(e.to_string()))?;
                *pending.tx_hash()
            }
            LendingAction::WithdrawLiquidity => {
                let call = entrypoint.withdrawLiquidity(request.amount);
                let pending = call
                    .send()
                    .await
                    .map_err(|e| SubmitError::Wallet(e.to_string()))?;
                *pending.tx_hash()
            }
            LendingAction::Borrow => {
                let call = entrypoint.borrowDebt(request.amount);
                let pending = call
                    .send()
                    .await
                    .map_err(|e| SubmitError::Wallet(e.to_string()))?;
                *pending.tx_hash()
            }
            LendingAction::Repay => {
                let call = entrypoint.repayDebt(request.amount);
                let pending = call
                    .send()
                    .await
                    .map_err(|e| SubmitError::Wallet(e.to_string()))?;
                *pending.tx_hash()
            }
            LendingAction::SwapCollateral => {
                let swap = request.swap.as_ref().ok_or_else(|| {
                    SubmitError::Wallet("swap parameters missing for collateral swap".to_string())
                })?;
                let params = ILendingEntrypoint::SwapParams {
                    tokenIn: swap.token_in,
                    tokenOut: swap.token_out,
                    amountIn: request.amount,
                    minOut: swap.min_out,
                    feeTier: U24::from(swap.fee_tier),
                };
                let call = entrypoint.swapTokenByPosition(params);
                let pending = call
                    .send()
                    .await
                    .map_err(|e| SubmitError::Wallet(e.to_string()))?;
                *pending.tx_hash()
            }
        };

        info!(action = ?request.action, pool = %request.pool.address, %hash, "action submitted");
        Ok(hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<(), SubmitError> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| SubmitError::Rpc(e.to_string()))?;
            match receipt {
                Some(receipt) if receipt.status() => {
                    info!(%tx_hash, "transaction confirmed");
                    return Ok(());
                }
                Some(_) => {
                    return Err(SubmitError::Reverted(format!(
                        "transaction {tx_hash} reverted on-chain"
                    )));
                }
                None => {
                    debug!(%tx_hash, "receipt not yet available");
                    sleep(self.receipt_poll_interval).await;
                }
            }
        }
    }
}
