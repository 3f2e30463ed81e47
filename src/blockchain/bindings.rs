use alloy::sol;

// Contract surfaces of the lending protocol, declared with the alloy sol!
// macro. Only the functions the engine actually reads or writes.
sol! {
    /// A deployed pool exposes its router, which carries all economic state.
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ILendingPool {
        function router() external view returns (address);
    }

    /// Per-pool accounting: token roles, totals, shares, LTV, and the
    /// account-level views.
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ILendingRouter {
        function borrowToken() external view returns (address);
        function collateralToken() external view returns (address);
        function sharesToken() external view returns (address);
        function totalSupplyAssets() external view returns (uint256);
        function totalBorrowAssets() external view returns (uint256);
        function totalBorrowShares() external view returns (uint256);
        function ltv() external view returns (uint256);
        function factory() external view returns (address);
        function addressPositions(address account) external view returns (address);
        function userBorrowShares(address account) external view returns (uint256);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IPoolFactory {
        function interestRateModel() external view returns (address);
        function tokenDataStream() external view returns (address);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IInterestRateModel {
        function calculateBorrowRate(address router, uint256 totalSupply, uint256 totalBorrow) external view returns (uint256);
        function tokenReserveFactor(address router) external view returns (uint256);
    }

    /// The factory's price oracle. A reported price of zero means the token
    /// is not (yet) listed, never a zero valuation.
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ITokenDataStream {
        function latestRoundData(address token) external view returns (uint80 roundId, uint256 price, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound);
        function decimals(address token) external view returns (uint8);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC20 {
        function symbol() external view returns (string memory);
        function name() external view returns (string memory);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Write surface for user actions. Withdrawals are keyed by shares;
    /// everything else by asset amounts.
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ILendingEntrypoint {
        struct SwapParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint256 minOut;
            uint24 feeTier;
        }

        function supplyLiquidity(address account, uint256 amount) external;
        function supplyCollateral(address account, uint256 amount) external;
        function withdrawLiquidity(uint256 shares) external;
        function borrowDebt(uint256 amount) external;
        function repayDebt(uint256 amount) external;
        function swapTokenByPosition(SwapParams calldata params) external returns (uint256 amountOut);
    }
}
