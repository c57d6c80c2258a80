use cosmwasm_std::{OverflowError, StdError, Uint128};
use cw_utils::PaymentError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error(transparent)]
    Std(#[from] StdError),

    #[error(transparent)]
    Overflow(#[from] OverflowError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Cw20(#[from] cw20_base::ContractError),

    #[error("semver parsing error: {0}")]
    SemVer(String),

    #[error("insufficient balance: {balance} < {amount}")]
    InsufficientBalance { balance: Uint128, amount: Uint128 },

    #[error("power of {address} was last recorded at height {latest}, cannot record at {height}")]
    StaleHeight {
        address: String,
        height: u64,
        latest: u64,
    },

    #[error("migration error: incorrect contract: expected {expected}, actual {actual}")]
    MigrationErrorIncorrectContract { expected: String, actual: String },

    #[error("migration error: invalid version: new {new}, current {current}")]
    MigrationErrorInvalidVersion { new: String, current: String },
}

impl From<semver::Error> for ContractError {
    fn from(err: semver::Error) -> Self {
        Self::SemVer(err.to_string())
    }
}
