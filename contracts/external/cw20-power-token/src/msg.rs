use std::fmt;

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};
use cw20::{Cw20Coin, Expiration, MinterResponse};
use cw_checkpoints::Checkpoint;

use crate::state::Delegation;

/// The two independent power metrics tracked per account.
#[cw_serde]
#[derive(Copy, Eq, Hash, PartialOrd, Ord)]
pub enum PowerType {
    Voting,
    Proposition,
}

impl PowerType {
    pub const ALL: [PowerType; 2] = [PowerType::Voting, PowerType::Proposition];

    /// storage key component
    pub fn key(self) -> u8 {
        match self {
            PowerType::Voting => 0,
            PowerType::Proposition => 1,
        }
    }
}

impl fmt::Display for PowerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerType::Voting => write!(f, "voting"),
            PowerType::Proposition => write!(f, "proposition"),
        }
    }
}

#[cw_serde]
pub struct InstantiateMsg {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_balances: Vec<Cw20Coin>,
    /// The minter and its optional cap. If not set, the supply is fixed at
    /// the initial balances.
    pub mint: Option<MinterResponse>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Move tokens from the sender to `recipient`. Power follows the tokens
    /// between the two accounts' delegatees.
    Transfer { recipient: String, amount: Uint128 },
    /// Delegate both voting and proposition power. `None` delegates to the
    /// zero address.
    Delegate { delegatee: Option<String> },
    /// Delegate a single power type.
    DelegateByType {
        delegatee: Option<String>,
        power_type: PowerType,
    },
    /// Only with the "mintable" extension. If authorized, creates amount new
    /// tokens and adds to the recipient balance.
    Mint { recipient: String, amount: Uint128 },
    /// Allows spender to access an additional amount tokens from the owner's
    /// (env.sender) account. If expires is Some(), overwrites current
    /// allowance expiration with this one.
    IncreaseAllowance {
        spender: String,
        amount: Uint128,
        expires: Option<Expiration>,
    },
    /// Lowers the spender's access of tokens from the owner's (env.sender)
    /// account by amount. If expires is Some(), overwrites current allowance
    /// expiration with this one.
    DecreaseAllowance {
        spender: String,
        amount: Uint128,
        expires: Option<Expiration>,
    },
    /// Transfers amount tokens from owner -> recipient if `env.sender` has
    /// sufficient pre-approval.
    TransferFrom {
        owner: String,
        recipient: String,
        amount: Uint128,
    },
    /// The current minter may set a new minter. Setting the minter to None
    /// removes the token's minter forever.
    UpdateMinter { new_minter: Option<String> },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(cw20::BalanceResponse)]
    Balance { address: String },
    #[returns(cw20::TokenInfoResponse)]
    TokenInfo {},
    #[returns(Option<cw20::MinterResponse>)]
    Minter {},
    #[returns(cw20::AllowanceResponse)]
    Allowance { owner: String, spender: String },
    /// The power of an address at the current block.
    #[returns(PowerResponse)]
    PowerCurrent {
        address: String,
        power_type: PowerType,
    },
    /// The power of an address at the end of a block. Defaults to the
    /// current block.
    #[returns(PowerResponse)]
    PowerAtHeight {
        address: String,
        height: Option<u64>,
        power_type: PowerType,
    },
    /// The address an account's power is attributed to. An account that
    /// never delegated, or delegated to the zero address, is its own
    /// delegatee.
    #[returns(DelegateeResponse)]
    DelegateeByType {
        address: String,
        power_type: PowerType,
    },
    /// The raw delegation record of an account.
    #[returns(DelegationResponse)]
    Delegation {
        address: String,
        power_type: PowerType,
    },
    #[returns(bool)]
    IsSnapshotted {
        address: String,
        power_type: PowerType,
    },
    /// Paginated power history of an address, oldest first.
    #[returns(CheckpointsResponse)]
    Checkpoints {
        address: String,
        power_type: PowerType,
        start_after: Option<u32>,
        limit: Option<u32>,
    },
    #[returns(cw2::ContractVersion)]
    Info {},
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
pub struct PowerResponse {
    pub power: Uint128,
    pub height: u64,
}

#[cw_serde]
pub struct DelegateeResponse {
    pub delegatee: Addr,
}

#[cw_serde]
pub struct DelegationResponse {
    /// `None` if the account never delegated this power type.
    pub delegation: Option<Delegation>,
    /// the number of other accounts explicitly delegating to this one.
    pub delegators: u64,
    /// whether this account's power is resolved from tracked aggregates
    /// rather than read live from its balance.
    pub tracked: bool,
}

#[cw_serde]
pub struct CheckpointsResponse {
    pub checkpoints: Vec<Checkpoint>,
}
