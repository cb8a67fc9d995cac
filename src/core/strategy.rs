//! Strategy lookup and the opt-in allocation sanity check

use crate::core::allocation::AllocationError;
use crate::core::config::Strategy;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Finds a strategy by exact name.
pub fn resolve<'a>(
    strategies: &'a [Strategy],
    name: &str,
) -> Result<&'a Strategy, AllocationError> {
    strategies
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| AllocationError::StrategyNotFound(name.to_string()))
}

/// Reports strategies whose percentages would over- or under-allocate a balance.
///
/// Only the tags that actually group at least one symbol take part in the sum,
/// since those are the only ones the engine spends. Nothing here is enforced
/// by the engine itself.
pub fn allocation_warnings(strategies: &[Strategy]) -> Vec<String> {
    let mut warnings = Vec::new();

    for strategy in strategies {
        let tags: BTreeSet<&str> = strategy.symbols.iter().map(|s| s.kind.as_str()).collect();

        for tag in &tags {
            if !strategy.allocations.contains_key(*tag) {
                warnings.push(format!(
                    "Strategy '{}' has symbols of type '{}' but no allocation for it",
                    strategy.name, tag
                ));
            }
        }

        for tag in strategy.allocations.keys() {
            if !tags.contains(tag.as_str()) {
                warnings.push(format!(
                    "Strategy '{}' allocates to type '{}' which has no symbols",
                    strategy.name, tag
                ));
            }
        }

        let total: Decimal = tags
            .iter()
            .filter_map(|tag| strategy.allocations.get(*tag))
            .sum();
        if total != Decimal::ONE_HUNDRED {
            warnings.push(format!(
                "Strategy '{}' allocations sum to {}%, expected 100%",
                strategy.name,
                total.normalize()
            ));
        }
    }

    warnings
}
