//! Fee arithmetic and unit formatting for log output

use ethers::types::U256;
use ethers::utils::format_units;

/// Total cost in wei
pub fn calculate_cost(gas_limit: U256, gas_price: U256) -> U256 {
    gas_limit.saturating_mul(gas_price)
}

/// Format a wei amount in gwei, e.g. `1.0`
pub fn format_gwei(amount: U256) -> String {
    format_trimmed(amount, "gwei")
}

/// Format a wei amount in ether, e.g. `0.00005`
pub fn format_ether(amount: U256) -> String {
    format_trimmed(amount, "ether")
}

/// Fixed-point output with trailing zeros removed, keeping one fractional digit
fn format_trimmed(amount: U256, unit: &str) -> String {
    let formatted = match format_units(amount, unit) {
        Ok(s) => s,
        // Only reachable with an unknown unit name
        Err(_) => return amount.to_string(),
    };

    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => format!("{}.0", formatted),
    }
}
