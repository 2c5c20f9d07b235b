//! Typed bindings for the router and ERC-20 contracts the relay talks to.

use ethers::contract::abigen;

abigen!(
    SwapRouter,
    r#"[
        function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts)
        function getAmountsIn(uint256 amountOut, address[] path) external view returns (uint256[] amounts)
        function swapExactETHForTokens(uint256 amountOutMin, address[] path, address to, uint256 deadline) external payable returns (uint256[] amounts)
        function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) external returns (uint256[] amounts)
        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) external returns (uint256[] amounts)
    ]"#
);

abigen!(
    Erc20,
    r#"[
        function decimals() external view returns (uint8)
        function balanceOf(address owner) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#
);
