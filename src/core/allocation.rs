//! Turns a balance, a strategy and a price list into whole-share purchases.
//!
//! All arithmetic is done on [`Decimal`] with checked operations, so a run is
//! exactly reproducible and never panics on pathological inputs.

use crate::core::config::{Account, Strategy};
use crate::core::price::Quote;
use crate::core::strategy;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Failed to find a strategy by name '{0}'")]
    StrategyNotFound(String),

    #[error("Arithmetic overflow while allocating {0}")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationStatus {
    #[default]
    Priced,
    /// No quote was supplied for the symbol
    Unpriced,
    /// The supplied quote was zero or negative
    InvalidPrice,
}

/// Purchase plan for one symbol of one account.
///
/// Entries that are not [`AllocationStatus::Priced`] buy nothing: shares,
/// totals and remainder are zero, while the ideal cash and percentages of
/// their group are still filled in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allocation {
    pub shares: i64,
    pub share_price: Decimal,
    /// Cash left over from `ideal_allocation` after buying `shares`
    pub remainder: Decimal,
    /// `shares * share_price`
    pub total_allocated: Decimal,
    /// The symbol's exact share of the balance
    pub ideal_allocation: Decimal,
    /// Percentage of the balance given to the symbol's group
    pub group_percentage: Decimal,
    /// Percentage of the balance given to the symbol alone
    pub symbol_percentage: Decimal,
    pub status: AllocationStatus,
}

impl Allocation {
    pub fn is_priced(&self) -> bool {
        self.status == AllocationStatus::Priced
    }
}

/// Group tag -> symbol -> allocation.
pub type GroupAllocations = BTreeMap<String, BTreeMap<String, Allocation>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPlan {
    pub account: String,
    pub balance: Decimal,
    pub groups: GroupAllocations,
}

impl AccountPlan {
    pub fn allocations(&self) -> impl Iterator<Item = (&str, &str, &Allocation)> {
        self.groups.iter().flat_map(|(group, symbols)| {
            symbols
                .iter()
                .map(move |(symbol, alloc)| (group.as_str(), symbol.as_str(), alloc))
        })
    }

    pub fn total_allocated(&self) -> Decimal {
        self.allocations().map(|(_, _, a)| a.total_allocated).sum()
    }

    pub fn total_remainder(&self) -> Decimal {
        self.allocations().map(|(_, _, a)| a.remainder).sum()
    }

    /// Symbols that ended up without a usable price.
    pub fn unpriced_symbols(&self) -> Vec<&str> {
        self.allocations()
            .filter(|(_, _, a)| !a.is_priced())
            .map(|(_, symbol, _)| symbol)
            .collect()
    }
}

/// Resolves the account's strategy and allocates its balance.
pub fn balance_account(
    strategies: &[Strategy],
    account: &Account,
    quotes: &[Quote],
) -> Result<AccountPlan, AllocationError> {
    let strategy = strategy::resolve(strategies, &account.strategy)?;
    let groups = allocate(strategy, account.balance, quotes)?;
    Ok(AccountPlan {
        account: account.name.clone(),
        balance: account.balance,
        groups,
    })
}

/// Splits `balance` across the strategy's groups, then evenly across the
/// symbols of each group, buying as many whole shares as the symbol's ideal
/// cash allows.
///
/// Percentages are not required to sum to 100. A group whose tag has no
/// percentage gets 0%. When `quotes` holds several entries for a symbol the
/// last one is used.
pub fn allocate(
    strategy: &Strategy,
    balance: Decimal,
    quotes: &[Quote],
) -> Result<GroupAllocations, AllocationError> {
    let mut groups: GroupAllocations = BTreeMap::new();
    for symbol in &strategy.symbols {
        groups
            .entry(symbol.kind.clone())
            .or_default()
            .insert(symbol.symbol.clone(), Allocation::default());
    }

    for (group, symbols) in groups.iter_mut() {
        if symbols.is_empty() {
            continue;
        }

        let percentage = match strategy.allocations.get(group) {
            Some(pct) => *pct,
            None => {
                warn!(
                    strategy = %strategy.name,
                    "No allocation for type '{}', treating it as 0%", group
                );
                Decimal::ZERO
            }
        };
        let overflow = || AllocationError::Overflow(format!("group '{group}'"));

        let count = Decimal::from(symbols.len());
        let group_cash = percentage
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|p| p.checked_mul(balance))
            .ok_or_else(overflow)?;
        let symbol_percentage = percentage.checked_div(count).ok_or_else(overflow)?;
        let ideal = group_cash.checked_div(count).ok_or_else(overflow)?;
        debug!(%group, %group_cash, %ideal, "Allocating group");

        for (symbol, allocation) in symbols.iter_mut() {
            let quote = quotes.iter().rev().find(|q| &q.symbol == symbol);
            *allocation =
                allocate_symbol(symbol, quote, ideal, percentage, symbol_percentage)?;
        }
    }

    Ok(groups)
}

fn allocate_symbol(
    symbol: &str,
    quote: Option<&Quote>,
    ideal: Decimal,
    group_percentage: Decimal,
    symbol_percentage: Decimal,
) -> Result<Allocation, AllocationError> {
    let unpurchased = Allocation {
        ideal_allocation: ideal,
        group_percentage,
        symbol_percentage,
        ..Default::default()
    };

    let Some(quote) = quote else {
        warn!("No price for symbol {}, nothing allocated", symbol);
        return Ok(Allocation {
            status: AllocationStatus::Unpriced,
            ..unpurchased
        });
    };

    if quote.price <= Decimal::ZERO {
        warn!(
            price = %quote.price,
            "Invalid price for symbol {}, nothing allocated", symbol
        );
        return Ok(Allocation {
            share_price: quote.price,
            status: AllocationStatus::InvalidPrice,
            ..unpurchased
        });
    }

    let overflow = || AllocationError::Overflow(format!("symbol '{symbol}'"));
    let mut shares = ideal.checked_div(quote.price).ok_or_else(overflow)?.floor();
    let mut total_allocated = shares.checked_mul(quote.price).ok_or_else(overflow)?;
    // The quotient is rounded to 28 digits and can land on the next whole share
    if total_allocated > ideal {
        shares -= Decimal::ONE;
        total_allocated = shares.checked_mul(quote.price).ok_or_else(overflow)?;
    }
    let remainder = ideal.checked_sub(total_allocated).ok_or_else(overflow)?;

    Ok(Allocation {
        shares: shares.to_i64().ok_or_else(overflow)?,
        share_price: quote.price,
        remainder,
        total_allocated,
        status: AllocationStatus::Priced,
        ..unpurchased
    })
}
