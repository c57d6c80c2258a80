use cosmwasm_schema::serde::de::DeserializeOwned;
use cosmwasm_std::{Addr, Uint128};
use cw2::ContractVersion;
use cw20::{
    AllowanceResponse, BalanceResponse, Cw20Coin, Expiration, MinterResponse, TokenInfoResponse,
};
use cw_checkpoints::Checkpoint;
use cw_multi_test::{next_block, App, AppResponse, Executor};

use super::tests::power_token_contract;
use super::*;
use crate::msg::{
    CheckpointsResponse, DelegateeResponse, DelegationResponse, ExecuteMsg, InstantiateMsg,
    PowerResponse, PowerType, QueryMsg,
};
use crate::ContractError;

pub struct PowerTokenTestingSuite {
    pub app: App,

    // initial config
    initial_balances: Vec<Cw20Coin>,
    cap: Option<Uint128>,

    /// token code ID
    pub code_id: u64,
    /// token contract address
    pub token_addr: Addr,
}

// CONSTRUCTOR
impl PowerTokenTestingSuite {
    pub fn new() -> Self {
        let mut app = App::default();
        let code_id = app.store_code(power_token_contract());

        Self {
            app,

            initial_balances: [ALICE, BOB, CHARLIE]
                .into_iter()
                .map(|address| Cw20Coin {
                    address: address.to_string(),
                    amount: Uint128::new(INITIAL_BALANCE),
                })
                .collect(),
            cap: None,

            code_id,
            token_addr: Addr::unchecked(""),
        }
    }

    pub fn with_initial_balances(mut self, initial_balances: Vec<(&str, u128)>) -> Self {
        self.initial_balances = initial_balances
            .into_iter()
            .map(|(address, amount)| Cw20Coin {
                address: address.to_string(),
                amount: Uint128::new(amount),
            })
            .collect();
        self
    }

    pub fn with_cap(mut self, cap: u128) -> Self {
        self.cap = Some(Uint128::new(cap));
        self
    }

    pub fn instantiate_msg(&self) -> InstantiateMsg {
        InstantiateMsg {
            name: "Governance Power".to_string(),
            symbol: "GOVP".to_string(),
            decimals: 6,
            initial_balances: self.initial_balances.clone(),
            mint: Some(MinterResponse {
                minter: MINTER.to_string(),
                cap: self.cap,
            }),
        }
    }

    pub fn build(mut self) -> Self {
        let msg = self.instantiate_msg();
        self.token_addr = self
            .app
            .instantiate_contract(
                self.code_id,
                Addr::unchecked(MINTER),
                &msg,
                &[],
                "power token",
                Some(MINTER.to_string()),
            )
            .unwrap();
        self
    }
}

// EXECUTIONS
impl PowerTokenTestingSuite {
    pub fn height(&self) -> u64 {
        self.app.block_info().height
    }

    pub fn advance_block(&mut self) {
        self.app.update_block(next_block);
    }

    pub fn execute(
        &mut self,
        sender: impl Into<String>,
        msg: &ExecuteMsg,
    ) -> anyhow::Result<AppResponse> {
        self.app.execute_contract(
            Addr::unchecked(sender),
            self.token_addr.clone(),
            msg,
            &[],
        )
    }

    pub fn execute_ok(&mut self, sender: impl Into<String>, msg: &ExecuteMsg) -> AppResponse {
        self.execute(sender, msg).unwrap()
    }

    pub fn execute_err(&mut self, sender: impl Into<String>, msg: &ExecuteMsg) -> ContractError {
        self.execute(sender, msg).unwrap_err().downcast().unwrap()
    }

    /// transfer tokens
    pub fn transfer(&mut self, sender: &str, recipient: &str, amount: u128) -> AppResponse {
        self.execute_ok(
            sender,
            &ExecuteMsg::Transfer {
                recipient: recipient.to_string(),
                amount: Uint128::new(amount),
            },
        )
    }

    /// delegate both power types. `None` delegates to the zero address.
    pub fn delegate(&mut self, delegator: &str, delegatee: Option<&str>) -> AppResponse {
        self.execute_ok(
            delegator,
            &ExecuteMsg::Delegate {
                delegatee: delegatee.map(Into::into),
            },
        )
    }

    /// delegate a single power type
    pub fn delegate_by_type(
        &mut self,
        delegator: &str,
        delegatee: Option<&str>,
        power_type: PowerType,
    ) -> AppResponse {
        self.execute_ok(
            delegator,
            &ExecuteMsg::DelegateByType {
                delegatee: delegatee.map(Into::into),
                power_type,
            },
        )
    }

    /// mint new tokens
    pub fn mint(&mut self, sender: &str, recipient: &str, amount: u128) -> AppResponse {
        self.execute_ok(
            sender,
            &ExecuteMsg::Mint {
                recipient: recipient.to_string(),
                amount: Uint128::new(amount),
            },
        )
    }

    /// allow a spender to move the owner's tokens
    pub fn increase_allowance(
        &mut self,
        owner: &str,
        spender: &str,
        amount: u128,
        expires: Option<Expiration>,
    ) -> AppResponse {
        self.execute_ok(
            owner,
            &ExecuteMsg::IncreaseAllowance {
                spender: spender.to_string(),
                amount: Uint128::new(amount),
                expires,
            },
        )
    }

    /// move the owner's tokens as a spender
    pub fn transfer_from(
        &mut self,
        spender: &str,
        owner: &str,
        recipient: &str,
        amount: u128,
    ) -> AppResponse {
        self.execute_ok(
            spender,
            &ExecuteMsg::TransferFrom {
                owner: owner.to_string(),
                recipient: recipient.to_string(),
                amount: Uint128::new(amount),
            },
        )
    }
}

// QUERIES
impl PowerTokenTestingSuite {
    fn query<T: DeserializeOwned>(&self, msg: &QueryMsg) -> T {
        self.app
            .wrap()
            .query_wasm_smart(&self.token_addr, msg)
            .unwrap()
    }

    pub fn balance(&self, address: &str) -> Uint128 {
        let res: BalanceResponse = self.query(&QueryMsg::Balance {
            address: address.to_string(),
        });
        res.balance
    }

    pub fn token_info(&self) -> TokenInfoResponse {
        self.query(&QueryMsg::TokenInfo {})
    }

    pub fn minter(&self) -> Option<MinterResponse> {
        self.query(&QueryMsg::Minter {})
    }

    pub fn allowance(&self, owner: &str, spender: &str) -> AllowanceResponse {
        self.query(&QueryMsg::Allowance {
            owner: owner.to_string(),
            spender: spender.to_string(),
        })
    }

    pub fn power(&self, address: &str, power_type: PowerType) -> Uint128 {
        let res: PowerResponse = self.query(&QueryMsg::PowerCurrent {
            address: address.to_string(),
            power_type,
        });
        res.power
    }

    pub fn power_at_height(&self, address: &str, height: u64, power_type: PowerType) -> Uint128 {
        let res: PowerResponse = self.query(&QueryMsg::PowerAtHeight {
            address: address.to_string(),
            height: Some(height),
            power_type,
        });
        res.power
    }

    pub fn delegatee(&self, address: &str, power_type: PowerType) -> Addr {
        let res: DelegateeResponse = self.query(&QueryMsg::DelegateeByType {
            address: address.to_string(),
            power_type,
        });
        res.delegatee
    }

    pub fn delegation(&self, address: &str, power_type: PowerType) -> DelegationResponse {
        self.query(&QueryMsg::Delegation {
            address: address.to_string(),
            power_type,
        })
    }

    pub fn is_snapshotted(&self, address: &str, power_type: PowerType) -> bool {
        self.query(&QueryMsg::IsSnapshotted {
            address: address.to_string(),
            power_type,
        })
    }

    pub fn checkpoints(
        &self,
        address: &str,
        power_type: PowerType,
        start_after: Option<u32>,
        limit: Option<u32>,
    ) -> Vec<Checkpoint> {
        let res: CheckpointsResponse = self.query(&QueryMsg::Checkpoints {
            address: address.to_string(),
            power_type,
            start_after,
            limit,
        });
        res.checkpoints
    }

    pub fn info(&self) -> ContractVersion {
        self.query(&QueryMsg::Info {})
    }
}

// ASSERTIONS
impl PowerTokenTestingSuite {
    /// assert an account's current power of one type
    pub fn assert_power(&self, address: &str, power_type: PowerType, expected: u128) {
        assert_eq!(
            self.power(address, power_type),
            Uint128::new(expected),
            "{power_type} power of {address}"
        );
    }

    /// assert an account's current power of both types
    pub fn assert_powers(&self, address: &str, expected: u128) {
        for power_type in PowerType::ALL {
            self.assert_power(address, power_type, expected);
        }
    }

    /// assert an account's balance
    pub fn assert_balance(&self, address: &str, expected: u128) {
        assert_eq!(self.balance(address), Uint128::new(expected));
    }

    /// assert the total supply
    pub fn assert_total_supply(&self, expected: u128) {
        assert_eq!(self.token_info().total_supply, Uint128::new(expected));
    }
}
