//! The power mutation engine. Every balance or delegation change goes
//! through here so that backings, delegator counts and checkpoints stay in
//! step with balances.
//!
//! Each call checks balances and checkpoint heights before writing, so a
//! rejected call leaves storage untouched even outside of a reverting
//! transaction.

use cosmwasm_std::{Addr, Event, StdError, StdResult, Storage, Uint128};

use crate::msg::PowerType;
use crate::resolver::{current_power, effective_delegatee};
use crate::state::{self, Delegation, PowerState, POWER_CHECKPOINTS};
use crate::ContractError;

/// A change in an account's observable power.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerChange {
    pub address: Addr,
    pub power_type: PowerType,
    pub previous: Uint128,
    pub current: Uint128,
}

impl PowerChange {
    pub fn into_event(self) -> Event {
        Event::new("delegated_power_changed")
            .add_attribute("address", self.address)
            .add_attribute("power_type", self.power_type.to_string())
            .add_attribute("previous_power", self.previous)
            .add_attribute("power", self.current)
    }
}

/// Switch a live account to tracked, seeding its backing with its balance.
/// Must run before the account's balance moves.
fn touch(store: &mut dyn Storage, addr: &Addr, power_type: PowerType) -> StdResult<()> {
    if let PowerState::Live = state::power_state(store, addr, power_type)? {
        let backing = state::balance(store, addr)?;
        state::set_power_state(
            store,
            addr,
            power_type,
            &PowerState::Tracked {
                backing,
                delegators: 0,
            },
        )?;
    }
    Ok(())
}

fn update_tracked<F>(
    store: &mut dyn Storage,
    addr: &Addr,
    power_type: PowerType,
    action: F,
) -> Result<(), ContractError>
where
    F: FnOnce(Uint128, u64) -> Result<(Uint128, u64), ContractError>,
{
    match state::power_state(store, addr, power_type)? {
        PowerState::Tracked {
            backing,
            delegators,
        } => {
            let (backing, delegators) = action(backing, delegators)?;
            state::set_power_state(
                store,
                addr,
                power_type,
                &PowerState::Tracked {
                    backing,
                    delegators,
                },
            )?;
            Ok(())
        }
        PowerState::Live => Err(StdError::generic_err(format!(
            "{power_type} power of {addr} is not tracked"
        ))
        .into()),
    }
}

fn add_backing(
    store: &mut dyn Storage,
    addr: &Addr,
    power_type: PowerType,
    amount: Uint128,
) -> Result<(), ContractError> {
    update_tracked(store, addr, power_type, |backing, delegators| {
        Ok((backing.checked_add(amount)?, delegators))
    })
}

fn sub_backing(
    store: &mut dyn Storage,
    addr: &Addr,
    power_type: PowerType,
    amount: Uint128,
) -> Result<(), ContractError> {
    update_tracked(store, addr, power_type, |backing, delegators| {
        Ok((backing.checked_sub(amount)?, delegators))
    })
}

fn add_delegator(
    store: &mut dyn Storage,
    addr: &Addr,
    power_type: PowerType,
) -> Result<(), ContractError> {
    update_tracked(store, addr, power_type, |backing, delegators| {
        let delegators = delegators
            .checked_add(1)
            .ok_or_else(|| StdError::generic_err("delegator count overflow"))?;
        Ok((backing, delegators))
    })
}

fn remove_delegator(
    store: &mut dyn Storage,
    addr: &Addr,
    power_type: PowerType,
) -> Result<(), ContractError> {
    update_tracked(store, addr, power_type, |backing, delegators| {
        let delegators = delegators
            .checked_sub(1)
            .ok_or_else(|| StdError::generic_err("delegator count underflow"))?;
        Ok((backing, delegators))
    })
}

/// Fail if `height` precedes a checkpoint already recorded for any of
/// `addrs`.
fn ensure_height(
    store: &dyn Storage,
    addrs: &[&Addr],
    power_type: PowerType,
    height: u64,
) -> Result<(), ContractError> {
    for addr in addrs {
        if let Some(latest) = POWER_CHECKPOINTS.latest(store, (addr, power_type.key()))? {
            if latest.height > height {
                return Err(ContractError::StaleHeight {
                    address: addr.to_string(),
                    height,
                    latest: latest.height,
                });
            }
        }
    }
    Ok(())
}

/// Record the account's current power at `height` if it differs from the
/// last recorded value.
pub fn refresh(
    store: &mut dyn Storage,
    addr: &Addr,
    power_type: PowerType,
    height: u64,
) -> StdResult<Option<PowerChange>> {
    let key = (addr, power_type.key());
    let previous = POWER_CHECKPOINTS.latest_value(store, key)?;
    let current = current_power(store, addr, power_type)?;
    if previous == current {
        return Ok(None);
    }
    POWER_CHECKPOINTS.push(store, key, height, current)?;
    Ok(Some(PowerChange {
        address: addr.clone(),
        power_type,
        previous,
        current,
    }))
}

fn refresh_all(
    store: &mut dyn Storage,
    addrs: &[&Addr],
    power_type: PowerType,
    height: u64,
) -> StdResult<Vec<PowerChange>> {
    let mut seen: Vec<&Addr> = Vec::with_capacity(addrs.len());
    let mut changes = vec![];
    for &addr in addrs {
        if seen.contains(&addr) {
            continue;
        }
        seen.push(addr);
        changes.extend(refresh(store, addr, power_type, height)?);
    }
    Ok(changes)
}

/// Point `delegator`'s power of `power_type` at `delegatee`. `None`
/// delegates to the zero address. Setting the same delegation twice is a
/// no-op.
pub fn delegate(
    store: &mut dyn Storage,
    delegator: &Addr,
    delegatee: Option<&Addr>,
    power_type: PowerType,
    height: u64,
) -> Result<Vec<PowerChange>, ContractError> {
    let next = match delegatee {
        Some(delegatee) => Delegation::To(delegatee.clone()),
        None => Delegation::Abstain,
    };
    let prev = state::delegation(store, delegator, power_type)?;
    if prev.as_ref() == Some(&next) {
        return Ok(vec![]);
    }

    let old_target = effective_delegatee(store, delegator, power_type)?;
    let new_target = match &next {
        Delegation::To(delegatee) => delegatee.clone(),
        Delegation::Abstain => delegator.clone(),
    };
    ensure_height(
        store,
        &[delegator, &old_target, &new_target],
        power_type,
        height,
    )?;

    touch(store, delegator, power_type)?;
    touch(store, &old_target, power_type)?;
    touch(store, &new_target, power_type)?;

    if let Some(Delegation::To(prev)) = &prev {
        if prev != delegator {
            remove_delegator(store, prev, power_type)?;
        }
    }
    if let Delegation::To(next) = &next {
        if next != delegator {
            add_delegator(store, next, power_type)?;
        }
    }

    if old_target != new_target {
        let amount = state::balance(store, delegator)?;
        sub_backing(store, &old_target, power_type, amount)?;
        add_backing(store, &new_target, power_type, amount)?;
    }

    state::set_delegation(store, delegator, power_type, &next)?;

    Ok(refresh_all(
        store,
        &[delegator, &old_target, &new_target],
        power_type,
        height,
    )?)
}

/// Move `amount` from `from` to `to`. Power moves between the two
/// accounts' effective delegatees for every power type where they differ.
/// Empty transfers and transfers to self leave power untouched.
pub fn transfer(
    store: &mut dyn Storage,
    from: &Addr,
    to: &Addr,
    amount: Uint128,
    height: u64,
) -> Result<Vec<PowerChange>, ContractError> {
    let from_balance = state::balance(store, from)?;
    if from_balance < amount {
        return Err(ContractError::InsufficientBalance {
            balance: from_balance,
            amount,
        });
    }
    if from == to || amount.is_zero() {
        return Ok(vec![]);
    }
    let to_balance = state::balance(store, to)?.checked_add(amount)?;

    let mut moves = vec![];
    for power_type in PowerType::ALL {
        let src = effective_delegatee(store, from, power_type)?;
        let dst = effective_delegatee(store, to, power_type)?;
        if src != dst {
            ensure_height(store, &[&src, &dst], power_type, height)?;
            moves.push((power_type, src, dst));
        }
    }
    for (power_type, src, dst) in &moves {
        touch(store, src, *power_type)?;
        touch(store, dst, *power_type)?;
    }

    state::set_balance(store, from, from_balance - amount)?;
    state::set_balance(store, to, to_balance)?;

    let mut changes = vec![];
    for (power_type, src, dst) in moves {
        sub_backing(store, &src, power_type, amount)?;
        add_backing(store, &dst, power_type, amount)?;
        changes.extend(refresh_all(store, &[&src, &dst], power_type, height)?);
    }
    Ok(changes)
}

/// Issue `amount` new tokens to `to`. Total supply is the caller's
/// concern.
pub fn mint(
    store: &mut dyn Storage,
    to: &Addr,
    amount: Uint128,
    height: u64,
) -> Result<Vec<PowerChange>, ContractError> {
    let balance = state::balance(store, to)?.checked_add(amount)?;

    let mut targets = vec![];
    for power_type in PowerType::ALL {
        let target = match state::power_state(store, to, power_type)? {
            PowerState::Live => None,
            PowerState::Tracked { .. } => Some(effective_delegatee(store, to, power_type)?),
        };
        ensure_height(store, &[target.as_ref().unwrap_or(to)], power_type, height)?;
        targets.push((power_type, target));
    }

    state::set_balance(store, to, balance)?;

    let mut changes = vec![];
    for (power_type, target) in targets {
        match target {
            None => {
                changes.extend(refresh(store, to, power_type, height)?);
            }
            Some(target) => {
                add_backing(store, &target, power_type, amount)?;
                changes.extend(refresh(store, &target, power_type, height)?);
            }
        }
    }
    Ok(changes)
}
