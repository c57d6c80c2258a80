#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    attr, to_json_binary, Binary, Deps, DepsMut, Env, Event, MessageInfo, Response, StdResult,
    Uint128,
};
use cw2::{get_contract_version, set_contract_version};
use cw20_base::allowances::deduct_allowance;
use cw20_base::msg::InstantiateMsg as Cw20InstantiateMsg;
use cw20_base::state::TOKEN_INFO;
use cw_utils::nonpayable;
use semver::Version;

use crate::error::ContractError;
use crate::msg::{
    CheckpointsResponse, DelegateeResponse, DelegationResponse, ExecuteMsg, InstantiateMsg,
    MigrateMsg, PowerResponse, PowerType, QueryMsg,
};
use crate::power::{self, PowerChange};
use crate::resolver::{current_power, is_snapshotted, power_at_height};
use crate::state::{self, PowerState, POWER_CHECKPOINTS};

pub(crate) const CONTRACT_NAME: &str = "crates.io:cw20-power-token";
pub(crate) const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

fn power_events(changes: Vec<PowerChange>) -> Vec<Event> {
    changes.into_iter().map(PowerChange::into_event).collect()
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    mut deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    let holders = msg
        .initial_balances
        .iter()
        .map(|coin| deps.api.addr_validate(&coin.address))
        .collect::<StdResult<Vec<_>>>()?;

    // cw20-base validates the token, the minter and the initial balances.
    cw20_base::contract::instantiate(
        deps.branch(),
        env.clone(),
        info,
        Cw20InstantiateMsg {
            name: msg.name,
            symbol: msg.symbol,
            decimals: msg.decimals,
            initial_balances: msg.initial_balances,
            mint: msg.mint,
            marketing: None,
        },
    )?;

    // cw20-base::contract::instantiate sets the contract version, so overwrite
    // it here.
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    // every initial holder is live and starts with a power checkpoint.
    let mut changes = vec![];
    for holder in &holders {
        for power_type in PowerType::ALL {
            changes.extend(power::refresh(
                deps.storage,
                holder,
                power_type,
                env.block.height,
            )?);
        }
    }

    let total_supply = TOKEN_INFO.load(deps.storage)?.total_supply;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("total_supply", total_supply)
        .add_events(power_events(changes)))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    nonpayable(&info)?;

    match msg {
        ExecuteMsg::Transfer { recipient, amount } => {
            execute_transfer(deps, env, info, recipient, amount)
        }
        ExecuteMsg::Delegate { delegatee } => {
            execute_delegate(deps, env, info, delegatee, &PowerType::ALL)
        }
        ExecuteMsg::DelegateByType {
            delegatee,
            power_type,
        } => execute_delegate(deps, env, info, delegatee, &[power_type]),
        ExecuteMsg::Mint { recipient, amount } => execute_mint(deps, env, info, recipient, amount),
        ExecuteMsg::IncreaseAllowance {
            spender,
            amount,
            expires,
        } => Ok(cw20_base::allowances::execute_increase_allowance(
            deps, env, info, spender, amount, expires,
        )?),
        ExecuteMsg::DecreaseAllowance {
            spender,
            amount,
            expires,
        } => Ok(cw20_base::allowances::execute_decrease_allowance(
            deps, env, info, spender, amount, expires,
        )?),
        ExecuteMsg::TransferFrom {
            owner,
            recipient,
            amount,
        } => execute_transfer_from(deps, env, info, owner, recipient, amount),
        ExecuteMsg::UpdateMinter { new_minter } => Ok(
            cw20_base::contract::execute_update_minter(deps, env, info, new_minter)?,
        ),
    }
}

pub fn execute_transfer(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    recipient: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let rcpt_addr = deps.api.addr_validate(&recipient)?;

    let changes = power::transfer(
        deps.storage,
        &info.sender,
        &rcpt_addr,
        amount,
        env.block.height,
    )?;

    Ok(Response::new()
        .add_attribute("action", "transfer")
        .add_attribute("from", info.sender)
        .add_attribute("to", recipient)
        .add_attribute("amount", amount)
        .add_events(power_events(changes)))
}

pub fn execute_transfer_from(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    owner: String,
    recipient: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let rcpt_addr = deps.api.addr_validate(&recipient)?;
    let owner_addr = deps.api.addr_validate(&owner)?;

    // deduct allowance before doing anything else
    deduct_allowance(deps.storage, &owner_addr, &info.sender, &env.block, amount)?;

    let changes = power::transfer(
        deps.storage,
        &owner_addr,
        &rcpt_addr,
        amount,
        env.block.height,
    )?;

    Ok(Response::new()
        .add_attributes(vec![
            attr("action", "transfer_from"),
            attr("from", owner),
            attr("to", recipient),
            attr("by", info.sender),
            attr("amount", amount),
        ])
        .add_events(power_events(changes)))
}

pub fn execute_delegate(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    delegatee: Option<String>,
    power_types: &[PowerType],
) -> Result<Response, ContractError> {
    let delegatee = delegatee
        .map(|d| deps.api.addr_validate(&d))
        .transpose()?;

    let mut changes = vec![];
    for power_type in power_types {
        changes.extend(power::delegate(
            deps.storage,
            &info.sender,
            delegatee.as_ref(),
            *power_type,
            env.block.height,
        )?);
    }

    Ok(Response::new()
        .add_attribute("action", "delegate")
        .add_attribute("delegator", info.sender)
        .add_attribute(
            "delegatee",
            delegatee
                .map(Into::into)
                .unwrap_or_else(|| "none".to_string()),
        )
        .add_attribute(
            "power_types",
            power_types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        )
        .add_events(power_events(changes)))
}

// Copied from cw20-base and modified to move power with the new tokens.
pub fn execute_mint(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    recipient: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    if amount == Uint128::zero() {
        return Err(cw20_base::ContractError::InvalidZeroAmount {}.into());
    }

    let mut config = TOKEN_INFO
        .may_load(deps.storage)?
        .ok_or(cw20_base::ContractError::Unauthorized {})?;
    if config
        .mint
        .as_ref()
        .ok_or(cw20_base::ContractError::Unauthorized {})?
        .minter
        != info.sender
    {
        return Err(cw20_base::ContractError::Unauthorized {}.into());
    }

    config.total_supply = config.total_supply.checked_add(amount)?;
    if let Some(limit) = config.get_cap() {
        if config.total_supply > limit {
            return Err(cw20_base::ContractError::CannotExceedCap {}.into());
        }
    }
    TOKEN_INFO.save(deps.storage, &config)?;

    let rcpt_addr = deps.api.addr_validate(&recipient)?;
    let changes = power::mint(deps.storage, &rcpt_addr, amount, env.block.height)?;

    Ok(Response::new()
        .add_attribute("action", "mint")
        .add_attribute("to", recipient)
        .add_attribute("amount", amount)
        .add_events(power_events(changes)))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Balance { address } => {
            to_json_binary(&cw20_base::contract::query_balance(deps, address)?)
        }
        QueryMsg::TokenInfo {} => to_json_binary(&cw20_base::contract::query_token_info(deps)?),
        QueryMsg::Minter {} => to_json_binary(&cw20_base::contract::query_minter(deps)?),
        QueryMsg::Allowance { owner, spender } => to_json_binary(
            &cw20_base::allowances::query_allowance(deps, owner, spender)?,
        ),
        QueryMsg::PowerCurrent {
            address,
            power_type,
        } => to_json_binary(&query_power_current(deps, env, address, power_type)?),
        QueryMsg::PowerAtHeight {
            address,
            height,
            power_type,
        } => to_json_binary(&query_power_at_height(
            deps, env, address, height, power_type,
        )?),
        QueryMsg::DelegateeByType {
            address,
            power_type,
        } => to_json_binary(&query_delegatee(deps, address, power_type)?),
        QueryMsg::Delegation {
            address,
            power_type,
        } => to_json_binary(&query_delegation(deps, address, power_type)?),
        QueryMsg::IsSnapshotted {
            address,
            power_type,
        } => to_json_binary(&query_is_snapshotted(deps, address, power_type)?),
        QueryMsg::Checkpoints {
            address,
            power_type,
            start_after,
            limit,
        } => to_json_binary(&query_checkpoints(
            deps,
            address,
            power_type,
            start_after,
            limit,
        )?),
        QueryMsg::Info {} => to_json_binary(&get_contract_version(deps.storage)?),
    }
}

pub fn query_power_current(
    deps: Deps,
    env: Env,
    address: String,
    power_type: PowerType,
) -> StdResult<PowerResponse> {
    let address = deps.api.addr_validate(&address)?;
    let power = current_power(deps.storage, &address, power_type)?;
    Ok(PowerResponse {
        power,
        height: env.block.height,
    })
}

pub fn query_power_at_height(
    deps: Deps,
    env: Env,
    address: String,
    height: Option<u64>,
    power_type: PowerType,
) -> StdResult<PowerResponse> {
    let address = deps.api.addr_validate(&address)?;
    let height = height.unwrap_or(env.block.height);
    let power = power_at_height(deps.storage, &address, power_type, height)?;
    Ok(PowerResponse { power, height })
}

pub fn query_delegatee(
    deps: Deps,
    address: String,
    power_type: PowerType,
) -> StdResult<DelegateeResponse> {
    let address = deps.api.addr_validate(&address)?;
    let delegatee = state::delegatee(deps.storage, &address, power_type)?;
    Ok(DelegateeResponse { delegatee })
}

pub fn query_delegation(
    deps: Deps,
    address: String,
    power_type: PowerType,
) -> StdResult<DelegationResponse> {
    let address = deps.api.addr_validate(&address)?;
    let delegation = state::delegation(deps.storage, &address, power_type)?;
    let (delegators, tracked) = match state::power_state(deps.storage, &address, power_type)? {
        PowerState::Live => (0, false),
        PowerState::Tracked { delegators, .. } => (delegators, true),
    };
    Ok(DelegationResponse {
        delegation,
        delegators,
        tracked,
    })
}

pub fn query_is_snapshotted(deps: Deps, address: String, power_type: PowerType) -> StdResult<bool> {
    let address = deps.api.addr_validate(&address)?;
    is_snapshotted(deps.storage, &address, power_type)
}

pub fn query_checkpoints(
    deps: Deps,
    address: String,
    power_type: PowerType,
    start_after: Option<u32>,
    limit: Option<u32>,
) -> StdResult<CheckpointsResponse> {
    let address = deps.api.addr_validate(&address)?;
    let key = (&address, power_type.key());

    let count = POWER_CHECKPOINTS.count(deps.storage, key)?;
    let start = start_after.map_or(0, |i| i.saturating_add(1));
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let end = start.saturating_add(limit).min(count);

    let checkpoints = (start..end)
        .map(|index| POWER_CHECKPOINTS.checkpoint(deps.storage, key, index))
        .collect::<StdResult<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    Ok(CheckpointsResponse { checkpoints })
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let contract_version = get_contract_version(deps.storage)?;

    if contract_version.contract != CONTRACT_NAME {
        return Err(ContractError::MigrationErrorIncorrectContract {
            expected: CONTRACT_NAME.to_string(),
            actual: contract_version.contract,
        });
    }

    let new_version: Version = CONTRACT_VERSION.parse()?;
    let current_version: Version = contract_version.version.parse()?;

    // only allow upgrades
    if new_version <= current_version {
        return Err(ContractError::MigrationErrorInvalidVersion {
            new: new_version.to_string(),
            current: current_version.to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::default())
}
