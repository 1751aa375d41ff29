// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface UniV2Router {
        function swapExactETHForTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) payable returns (uint256[] memory amounts);
        function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) returns (uint256[] memory amounts);
        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) returns (uint256[] memory amounts);
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface LayerBankCore {
        function supply(address lToken, uint256 uAmount) external payable returns (uint256);
        function redeemToken(address lToken, uint256 lAmount) external returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface CogPair {
        function add_collateral(address to, uint256 amount) external;
        function remove_collateral(address to, uint256 amount) external;
        function user_collateral_share(address user) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface Weth9 {
        function deposit() external payable;
        function withdraw(uint256 wad) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface DmailHub {
        function send_mail(string to, string subject) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface Nft2Me {
        function mint() external payable;
    }
}
