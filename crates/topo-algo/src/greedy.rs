//! Greedy ranked selection.
//!
//! Options are ranked once by a caller-supplied order, then taken one at a
//! time: each round accepts the best-ranked option that the caller's
//! [`GreedyState`] deems eligible and that still fits the budget. The loop
//! ends when no option qualifies, the count limit is hit, or the state
//! reports it is done. Deterministic for a deterministic order.

use std::cmp::Ordering;

/// Hard limits on a greedy selection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GreedyLimits {
    pub budget: Option<f64>,
    pub max_count: Option<usize>,
}

/// Caller state consulted and updated as options are accepted.
pub trait GreedyState<T> {
    fn eligible(&self, option: &T) -> bool;
    fn accept(&mut self, option: &T);
    fn done(&self) -> bool {
        false
    }
}

/// Outcome of a greedy selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Indices into the option slice, in acceptance order
    pub chosen: Vec<usize>,
    pub spent: f64,
    /// Eligible options passed over because they did not fit the budget
    pub over_budget: Vec<usize>,
}

const BUDGET_TOLERANCE: f64 = 1e-9;

pub fn greedy_select<T, S: GreedyState<T>>(
    options: &[T],
    limits: &GreedyLimits,
    order: impl Fn(&T, &T) -> Ordering,
    cost: impl Fn(&T) -> f64,
    state: &mut S,
) -> Selection {
    let mut ranked: Vec<usize> = (0..options.len()).collect();
    ranked.sort_by(|&a, &b| order(&options[a], &options[b]).then(a.cmp(&b)));

    let mut taken = vec![false; options.len()];
    let mut selection = Selection::default();
    let max_count = limits.max_count.unwrap_or(usize::MAX);

    while selection.chosen.len() < max_count && !state.done() {
        let mut picked = None;
        for &index in &ranked {
            if taken[index] || !state.eligible(&options[index]) {
                continue;
            }
            let price = cost(&options[index]);
            if let Some(budget) = limits.budget {
                if selection.spent + price > budget + BUDGET_TOLERANCE * budget.abs().max(1.0) {
                    // Spending only grows, so this option never fits again
                    taken[index] = true;
                    selection.over_budget.push(index);
                    continue;
                }
            }
            picked = Some((index, price));
            break;
        }
        let Some((index, price)) = picked else {
            break;
        };
        taken[index] = true;
        selection.spent += price;
        selection.chosen.push(index);
        state.accept(&options[index]);
    }
    selection
}
