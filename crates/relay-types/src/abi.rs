//! ABI definitions for calls the protocol makes into other contracts.

use alloy_sol_types::sol;

sol! {
	/// Fungible token calls used for fee settlement.
	interface IERC20 {
		function transfer(address to, uint256 amount) external returns (bool);
		function transferFrom(address from, address to, uint256 amount) external returns (bool);
		function approve(address spender, uint256 amount) external returns (bool);
		function balanceOf(address account) external view returns (uint256);
		function allowance(address owner, address spender) external view returns (uint256);
	}

	/// Entry points a custom-logic wallet delegates to.
	interface IWalletCustomLogic {
		function initialize(bytes initParams) external;
		function execute(address to, uint256 value, bytes data) external returns (bytes);
		function directExecute(address to, bytes data) external returns (bytes);
	}
}
