//! Centralized Contract Definitions
//!
//! All Solidity contract interfaces consumed by the arbitrage bot, defined
//! using alloy's `sol!` macro. Each interface is annotated with `#[sol(rpc)]`
//! to generate contract instance types that can make RPC calls via any
//! alloy Provider.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use alloy::sol;

// ── ERC20 ─────────────────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
    }
}

// ── Concentrated-liquidity pool (swapr_yes / swapr_no / swapr_pred_*) ──

sol! {
    #[sol(rpc)]
    interface IConcentratedPool {
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked);
        function tickSpacing() external view returns (int24);
        function ticks(int24 tick) external view returns (uint128 liquidityGross, int128 liquidityNet, int56 tickCumulativeOutside, uint160 secondsPerLiquidityOutsideX128, uint32 secondsOutside, bool initialized);
        function tickTable(int16 wordPosition) external view returns (uint256);
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}

// ── Weighted-pool vault (weighted_spot) ────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IWeightedVault {
        function getPoolTokens(bytes32 poolId) external view returns (address[] memory tokens, uint256[] memory lastBalancesLive, uint256[] memory rawBalances, uint256 lastChangeBlock);
    }

    #[sol(rpc)]
    interface IWeightedPool {
        function getPoolId() external view returns (bytes32);
        function getVault() external view returns (address);
    }
}

// ── futarchy_v5 executor ───────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IFutarchyV5Executor {
        function buyConditional(uint256 amountIn, bool cheaperIsYes, int256 minProfit, address swaprRouter, address balancerRouter, address futarchyRouter) external returns (int256 profit);
        function sellConditional(uint256 amountIn, bool cheaperIsYes, int256 minProfit, address swaprRouter, address balancerRouter, address futarchyRouter) external returns (int256 profit);
        function withdraw(address token, address to, uint256 amount) external;
        function owner() external view returns (address);
    }
}

// ── pnk_variant executor (hard-coded multi-hop spot leg) ───────────────

sol! {
    #[sol(rpc)]
    interface IPnkVariantExecutor {
        function sellConditionalViaVault(uint256 amountIn, int256 minProfit) external returns (int256 profit);
        function withdraw(address token, address to, uint256 amount) external;
        function owner() external view returns (address);
    }
}

// ── prediction_v1 executor ──────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IPredictionV1Executor {
        function run(uint256 amountIn, int8 forcedFlow, int256 minProfit) external returns (int256 profit);
        function withdraw(address token, address to, uint256 amount) external;
        function owner() external view returns (address);
    }
}
