// ✂️ Split Search - One bank amount covered by 2 or 3 ledger amounts
//
// Exhaustive over the (date-filtered) candidate list: every pair in
// lexicographic index order, then every triple. The first subset whose sum
// lands within the tolerance wins; alternatives are never collected.

use rust_decimal::Decimal;

/// Largest subset size tried
pub const MAX_SPLIT_PARTS: usize = 3;

/// First 2- or 3-element subset of `amounts` summing to `target`
///
/// `amounts` is a list of (ledger index, ledger amount) in candidate order.
/// Returns the ledger indices of the subset, in candidate order.
pub fn find_split(target: Decimal, amounts: &[(usize, Decimal)], tolerance: Decimal) -> Option<Vec<usize>> {
    (2..=MAX_SPLIT_PARTS).find_map(|size| first_combination(target, amounts, size, tolerance))
}

fn first_combination(
    target: Decimal,
    amounts: &[(usize, Decimal)],
    size: usize,
    tolerance: Decimal,
) -> Option<Vec<usize>> {
    let n = amounts.len();
    if size == 0 || n < size {
        return None;
    }

    // Positions into `amounts`, advanced like an odometer in lexicographic order
    let mut positions: Vec<usize> = (0..size).collect();

    loop {
        let sum: Decimal = positions.iter().map(|&p| amounts[p].1).sum();
        if (sum - target).abs() < tolerance {
            return Some(positions.iter().map(|&p| amounts[p].0).collect());
        }

        // Rightmost position that can still move forward
        let mut slot = size;
        while slot > 0 {
            slot -= 1;
            if positions[slot] < n - size + slot {
                break;
            }
            if slot == 0 {
                return None;
            }
        }

        positions[slot] += 1;
        for next in slot + 1..size {
            positions[next] = positions[next - 1] + 1;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
