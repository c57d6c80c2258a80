mod suite;

pub use suite::PowerTokenTestingSuite;

pub const MINTER: &str = "minter";
pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const CHARLIE: &str = "charlie";
pub const SPENDER: &str = "spender";

pub const INITIAL_BALANCE: u128 = 1_000;
