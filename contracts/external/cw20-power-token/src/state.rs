use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Uint128};
use cw20_base::state::BALANCES;
use cw_checkpoints::Checkpoints;
use cw_storage_plus::Map;

use crate::msg::PowerType;

/// An explicit delegation choice. Accounts that never delegated have no
/// entry and count as delegating to themselves.
#[cw_serde]
pub enum Delegation {
    /// delegated to the zero address. the account remains its own
    /// delegatee but its power is only counted while it has delegators.
    Abstain,
    /// delegated to an address, possibly the account itself.
    To(Addr),
}

/// How an account's power is resolved for one power type.
#[cw_serde]
#[derive(Default)]
pub enum PowerState {
    /// power mirrors the account's balance and is read live.
    #[default]
    Live,
    /// power is resolved from aggregates maintained by the engine.
    Tracked {
        /// the sum of balances whose effective delegatee is this account.
        backing: Uint128,
        /// the number of other accounts explicitly delegating to this one.
        delegators: u64,
    },
}

/// (delegator, power type) -> delegation. absent when never delegated.
pub const DELEGATIONS: Map<(&Addr, u8), Delegation> = Map::new("delegations");

/// (account, power type) -> power state. absent means live.
pub const POWER_STATES: Map<(&Addr, u8), PowerState> = Map::new("power_states");

/// the current power of (account, power type) by block height.
pub const POWER_CHECKPOINTS: Checkpoints<(&Addr, u8)> =
    Checkpoints::new("power_checkpoints", "power_checkpoints__count");

/// Token balances live in the cw20-base store so that its queries and
/// allowance handling see the same accounts.
pub fn balance(store: &dyn Storage, addr: &Addr) -> StdResult<Uint128> {
    Ok(BALANCES.may_load(store, addr)?.unwrap_or_default())
}

pub fn set_balance(store: &mut dyn Storage, addr: &Addr, amount: Uint128) -> StdResult<()> {
    BALANCES.save(store, addr, &amount)
}

pub fn delegation(
    store: &dyn Storage,
    addr: &Addr,
    power_type: PowerType,
) -> StdResult<Option<Delegation>> {
    DELEGATIONS.may_load(store, (addr, power_type.key()))
}

pub fn set_delegation(
    store: &mut dyn Storage,
    addr: &Addr,
    power_type: PowerType,
    delegation: &Delegation,
) -> StdResult<()> {
    DELEGATIONS.save(store, (addr, power_type.key()), delegation)
}

/// The address reported as `addr`'s delegatee: the explicit target if
/// there is one, otherwise `addr` itself.
pub fn delegatee(store: &dyn Storage, addr: &Addr, power_type: PowerType) -> StdResult<Addr> {
    Ok(match delegation(store, addr, power_type)? {
        Some(Delegation::To(delegatee)) => delegatee,
        Some(Delegation::Abstain) | None => addr.clone(),
    })
}

/// True iff `addr` delegates its balance to some other account.
pub fn is_delegating(store: &dyn Storage, addr: &Addr, power_type: PowerType) -> StdResult<bool> {
    Ok(matches!(
        delegation(store, addr, power_type)?,
        Some(Delegation::To(delegatee)) if &delegatee != addr
    ))
}

pub fn power_state(store: &dyn Storage, addr: &Addr, power_type: PowerType) -> StdResult<PowerState> {
    Ok(POWER_STATES
        .may_load(store, (addr, power_type.key()))?
        .unwrap_or_default())
}

pub fn set_power_state(
    store: &mut dyn Storage,
    addr: &Addr,
    power_type: PowerType,
    state: &PowerState,
) -> StdResult<()> {
    POWER_STATES.save(store, (addr, power_type.key()), state)
}
