//! Read-only resolution of delegation relationships into power.

use cosmwasm_std::{Addr, StdResult, Storage, Uint128};

use crate::msg::PowerType;
use crate::state::{self, Delegation, PowerState, POWER_CHECKPOINTS};

/// The account whose backing holds `addr`'s balance. Received power is
/// never forwarded, so this is at most one hop away.
pub fn effective_delegatee(
    store: &dyn Storage,
    addr: &Addr,
    power_type: PowerType,
) -> StdResult<Addr> {
    Ok(match state::delegation(store, addr, power_type)? {
        Some(Delegation::To(delegatee)) if &delegatee != addr => delegatee,
        _ => addr.clone(),
    })
}

/// An account is anchored when it explicitly delegated to itself or others
/// delegate to it. Only anchored tracked accounts hold power.
pub fn is_anchored(store: &dyn Storage, addr: &Addr, power_type: PowerType) -> StdResult<bool> {
    let self_delegated = matches!(
        state::delegation(store, addr, power_type)?,
        Some(Delegation::To(delegatee)) if &delegatee == addr
    );
    if self_delegated {
        return Ok(true);
    }
    Ok(match state::power_state(store, addr, power_type)? {
        PowerState::Live => false,
        PowerState::Tracked { delegators, .. } => delegators > 0,
    })
}

pub fn current_power(store: &dyn Storage, addr: &Addr, power_type: PowerType) -> StdResult<Uint128> {
    match state::power_state(store, addr, power_type)? {
        PowerState::Live => state::balance(store, addr),
        PowerState::Tracked { backing, .. } => {
            if is_anchored(store, addr, power_type)? {
                Ok(backing)
            } else {
                Ok(Uint128::zero())
            }
        }
    }
}

/// True for a tracked account that keeps its own balance but holds no
/// power because nothing anchors it. Live accounts and accounts that
/// delegate out report false.
pub fn is_snapshotted(store: &dyn Storage, addr: &Addr, power_type: PowerType) -> StdResult<bool> {
    if matches!(
        state::power_state(store, addr, power_type)?,
        PowerState::Live
    ) {
        return Ok(false);
    }
    if state::is_delegating(store, addr, power_type)? {
        return Ok(false);
    }
    Ok(!is_anchored(store, addr, power_type)?)
}

/// Power at the end of block `height`. Heights before the first
/// checkpoint resolve to zero.
pub fn power_at_height(
    store: &dyn Storage,
    addr: &Addr,
    power_type: PowerType,
    height: u64,
) -> StdResult<Uint128> {
    POWER_CHECKPOINTS.value_at_height(store, (addr, power_type.key()), height)
}
