#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{StdError, StdResult, Storage, Uint128};
use cw_storage_plus::{Map, PrimaryKey};


/// A value recorded for a key as of a block height.
#[cw_serde]
#[derive(Copy)]
pub struct Checkpoint {
    pub height: u64,
    pub value: Uint128,
}

pub struct Checkpoints<'a, K> {
    /// snapshots(k, i) := the i-th checkpoint recorded for key k.
    /// heights are non-decreasing in i.
    snapshots: Map<'a, (K, u32), Checkpoint>,
    /// counts(k) := the number of checkpoints recorded for key k.
    counts: Map<'a, K, u32>,
}

impl<'a, K> Checkpoints<'a, K> {
    /// Creates a new series map using the provided namespaces for the
    /// checkpoints and their per-key counts.
    ///
    /// # Example
    ///
    /// ```
    /// # use cw_checkpoints::Checkpoints;
    /// # use cosmwasm_std::Addr;
    ///
    /// pub const POWER: Checkpoints<(&Addr, u8)> = Checkpoints::new("power", "power__count");
    /// ```
    pub const fn new(snapshots_namespace: &'a str, counts_namespace: &'a str) -> Self {
        Self {
            snapshots: Map::new(snapshots_namespace),
            counts: Map::new(counts_namespace),
        }
    }
}

impl<'a, K> Checkpoints<'a, K>
where
    K: Clone + PrimaryKey<'a>,
    (K, u32): PrimaryKey<'a>,
{
    /// The number of checkpoints recorded for `k`.
    pub fn count(&self, store: &dyn Storage, k: K) -> StdResult<u32> {
        Ok(self.counts.may_load(store, k)?.unwrap_or_default())
    }

    /// Loads the checkpoint at position `index` in the series for `k`,
    /// if there is one.
    pub fn checkpoint(&self, store: &dyn Storage, k: K, index: u32) -> StdResult<Option<Checkpoint>> {
        self.snapshots.may_load(store, (k, index))
    }

    /// The most recent checkpoint recorded for `k`.
    pub fn latest(&self, store: &dyn Storage, k: K) -> StdResult<Option<Checkpoint>> {
        match self.count(store, k.clone())? {
            0 => Ok(None),
            n => self.checkpoint(store, k, n - 1),
        }
    }

    /// The value of the most recent checkpoint for `k`, or zero if none
    /// has been recorded.
    pub fn latest_value(&self, store: &dyn Storage, k: K) -> StdResult<Uint128> {
        Ok(self
            .latest(store, k)?
            .map(|c| c.value)
            .unwrap_or_default())
    }

    /// Records `value` for `k` at `height`. If the latest checkpoint
    /// was recorded at the same height it is overwritten. Heights must
    /// be pushed in non-decreasing order; pushing to the past errors.
    pub fn push(
        &self,
        store: &mut dyn Storage,
        k: K,
        height: u64,
        value: Uint128,
    ) -> StdResult<()> {
        let count = self.count(store, k.clone())?;
        let checkpoint = Checkpoint { height, value };

        if let Some(last) = self.latest(store, k.clone())? {
            if last.height > height {
                return Err(StdError::generic_err(format!(
                    "checkpoint at height {height} precedes latest checkpoint at height {}",
                    last.height
                )));
            }
            if last.height == height {
                return self.snapshots.save(store, (k, count - 1), &checkpoint);
            }
        }

        self.snapshots.save(store, (k.clone(), count), &checkpoint)?;
        self.counts.save(store, k, &(count + 1))
    }

    /// Loads the value of `k` as of the end of block `height`: the value
    /// of the latest checkpoint with a height less than or equal to
    /// `height`. Zero if the series is empty or starts after `height`.
    pub fn value_at_height(&self, store: &dyn Storage, k: K, height: u64) -> StdResult<Uint128> {
        let count = self.count(store, k.clone())?;
        if count == 0 {
            return Ok(Uint128::zero());
        }

        // most lookups are for recent heights.
        let last = self.load_at(store, k.clone(), count - 1)?;
        if last.height <= height {
            return Ok(last.value);
        }
        let first = self.load_at(store, k.clone(), 0)?;
        if first.height > height {
            return Ok(Uint128::zero());
        }

        // invariant: snapshots[lower].height <= height < snapshots[upper].height
        let (mut lower, mut upper) = (0, count - 1);
        while upper - lower > 1 {
            let center = lower + (upper - lower) / 2;
            let checkpoint = self.load_at(store, k.clone(), center)?;
            if checkpoint.height <= height {
                lower = center;
            } else {
                upper = center;
            }
        }
        Ok(self.load_at(store, k, lower)?.value)
    }

    fn load_at(&self, store: &dyn Storage, k: K, index: u32) -> StdResult<Checkpoint> {
        self.snapshots.load(store, (k, index))
    }
}
