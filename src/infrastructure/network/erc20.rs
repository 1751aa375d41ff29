// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::infrastructure::network::connector::{ChainConnector, TxCall};
use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IERC721 {
        function balanceOf(address owner) external view returns (uint256);
    }
}

pub async fn balance_of(
    conn: &dyn ChainConnector,
    token: Address,
    owner: Address,
) -> Result<U256, AppError> {
    let data = IERC20::balanceOfCall { account: owner }.abi_encode();
    let out = conn.call(&TxCall::new(token, data.into())).await?;
    IERC20::balanceOfCall::abi_decode_returns(&out)
        .map_err(|e| AppError::Connection(format!("balanceOf decode failed: {e}")))
}

pub async fn nft_balance_of(
    conn: &dyn ChainConnector,
    collection: Address,
    owner: Address,
) -> Result<U256, AppError> {
    let data = IERC721::balanceOfCall { owner }.abi_encode();
    let out = conn.call(&TxCall::new(collection, data.into())).await?;
    IERC721::balanceOfCall::abi_decode_returns(&out)
        .map_err(|e| AppError::Connection(format!("balanceOf decode failed: {e}")))
}

/// Approve `spender` for `amount` unless the current allowance covers it.
/// Returns whether an approval was sent.
pub async fn ensure_allowance(
    conn: &dyn ChainConnector,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<bool, AppError> {
    let data = IERC20::allowanceCall {
        owner: conn.address(),
        spender,
    }
    .abi_encode();
    let out = conn.call(&TxCall::new(token, data.into())).await?;
    let current = IERC20::allowanceCall::abi_decode_returns(&out)
        .map_err(|e| AppError::Connection(format!("allowance decode failed: {e}")))?;
    if current >= amount {
        return Ok(false);
    }

    let approve = IERC20::approveCall { spender, amount }.abi_encode();
    conn.submit(TxCall::new(token, approve.into())).await?;
    tracing::info!(
        target: "rpc",
        account = %conn.address(),
        token = %token,
        spender = %spender,
        "Approved spender"
    );
    Ok(true)
}
