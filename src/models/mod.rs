pub mod flow;
pub mod pool;
pub mod position;
pub mod token;

pub use flow::{ActionRequest, FlowPhase, LendingAction, SwapRequest, TransactionFlow};
pub use pool::{PoolRef, PoolSnapshot, RateBreakdown};
pub use position::{AccountPosition, CollateralLine, PortfolioSummary};
pub use token::{OraclePrice, TokenAmount, TokenInfo};
