//! Cargo manifests: product → unit count.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::{CoreError, CoreResult, ProductId};

/// The cargo carried by one transport, or a batch of stock to add to a
/// warehouse.
///
/// Backed by a `BTreeMap` so iteration (and therefore SQL write order) is
/// deterministic.  Zero counts are never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Manifest {
    items: BTreeMap<ProductId, u64>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` units of `product`, accumulating with any existing entry.
    /// Saturates at `u64::MAX`; use [`try_add`](Self::try_add) where an
    /// overflow must be reported.
    pub fn add(&mut self, product: ProductId, count: u64) {
        if count == 0 {
            return;
        }
        let units = self.items.entry(product).or_insert(0);
        *units = units.saturating_add(count);
    }

    /// Like [`add`](Self::add) but fails, leaving `self` unchanged, if the
    /// total would overflow.
    pub fn try_add(&mut self, product: ProductId, count: u64) -> CoreResult<()> {
        let total = self
            .get(product)
            .checked_add(count)
            .ok_or(CoreError::CountOverflow(product))?;
        if total > 0 {
            self.items.insert(product, total);
        }
        Ok(())
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, product: ProductId, count: u64) -> Self {
        self.add(product, count);
        self
    }

    /// Units of `product`, `0` if absent.
    pub fn get(&self, product: ProductId) -> u64 {
        self.items.get(&product).copied().unwrap_or(0)
    }

    /// Merge every entry of `other` into `self`.
    pub fn merge(&mut self, other: &Manifest) {
        for (product, count) in other {
            self.add(product, count);
        }
    }

    /// Merge `other` into `self`, or change nothing if any total would
    /// overflow.
    pub fn try_merge(&mut self, other: &Manifest) -> CoreResult<()> {
        let mut merged = self.clone();
        for (product, count) in other {
            merged.try_add(product, count)?;
        }
        *self = merged;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProductId, u64)> + '_ {
        self.items.iter().map(|(&p, &c)| (p, c))
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all unit counts, saturating at `u64::MAX`.
    pub fn total_units(&self) -> u64 {
        self.items.values().fold(0, |sum, &c| sum.saturating_add(c))
    }

    /// Parse a `product:count` token, e.g. `"3:40"`.
    pub fn parse_entry(token: &str) -> CoreResult<(ProductId, u64)> {
        let (product, count) = token
            .split_once(':')
            .ok_or_else(|| CoreError::Parse(format!("expected `product:count`, got `{token}`")))?;
        let product = product
            .parse::<ProductId>()
            .map_err(|e| CoreError::Parse(format!("bad product id `{product}`: {e}")))?;
        let count = count
            .trim()
            .parse::<u64>()
            .map_err(|e| CoreError::Parse(format!("bad count `{count}`: {e}")))?;
        if count == 0 {
            return Err(CoreError::ZeroCount(product));
        }
        Ok((product, count))
    }
}

impl FromIterator<(ProductId, u64)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (ProductId, u64)>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for (product, count) in iter {
            manifest.add(product, count);
        }
        manifest
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = (ProductId, u64);
    type IntoIter = std::iter::Map<
        btree_map::Iter<'a, ProductId, u64>,
        fn((&'a ProductId, &'a u64)) -> (ProductId, u64),
    >;

    fn into_iter(self) -> Self::IntoIter {
        let copied: fn((&'a ProductId, &'a u64)) -> (ProductId, u64) = |(&p, &c)| (p, c);
        self.items.iter().map(copied)
    }
}
