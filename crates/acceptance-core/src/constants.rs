use std::time::Duration;

/// The only payout asset the liquidity provider settles in.
pub const PAYOUT_ASSET: &str = "USDC";

/// USDC has 6 decimal places; payouts are truncated to this precision.
pub const PAYOUT_DECIMALS: u32 = 6;

/// Chain identifier attached to every recipient wallet.
pub const DEFAULT_PAYOUT_CHAIN: &str = "world_chain";

/// Sandbox payout wallet used when a merchant has no wallet on file.
pub const SANDBOX_PAYOUT_ADDRESS: &str = "0x1234567890ABCDEF1234567890ABCDEF12345678";

/// Upper bound on a single liquidity-provider call.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Simulated chain-confirmation delay of the mock liquidity provider.
pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(100);

pub const INTENT_ID_PREFIX: &str = "pi";
pub const INSTRUCTION_ID_PREFIX: &str = "instr";
