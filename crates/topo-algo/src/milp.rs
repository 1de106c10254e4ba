//! Solver-independent MILP container.
//!
//! Formulators append variables, constraints and an objective to a
//! [`MilpModel`]. The [driver](crate::driver) hands the model to a good_lp
//! engine, copies the primal values of every registered variable into an
//! [`Assignment`] and drops the engine model before returning.

use good_lp::{variable, Constraint, Expression, ProblemVariables, Solution, Variable, VariableDefinition};
use std::collections::HashMap;

/// Threshold above which a relaxed binary is read as "on".
pub const BINARY_THRESHOLD: f64 = 0.5;

/// Variables, constraints and objective of one solve invocation.
pub struct MilpModel {
    pub(crate) vars: ProblemVariables,
    pub(crate) registry: Vec<Variable>,
    pub(crate) objective: Expression,
    pub(crate) constraints: Vec<Constraint>,
    binaries: usize,
}

impl MilpModel {
    pub fn new() -> Self {
        Self {
            vars: ProblemVariables::new(),
            registry: Vec::new(),
            objective: Expression::from(0.0),
            constraints: Vec::new(),
            binaries: 0,
        }
    }

    fn add(&mut self, definition: VariableDefinition) -> Variable {
        let var = self.vars.add(definition);
        self.registry.push(var);
        var
    }

    /// 0/1 decision variable.
    pub fn add_binary(&mut self) -> Variable {
        self.binaries += 1;
        self.add(variable().binary())
    }

    /// Continuous variable bounded to `[min, max]`.
    pub fn add_bounded(&mut self, min: f64, max: f64) -> Variable {
        self.add(variable().min(min).max(max))
    }

    pub fn constrain(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Add `term` to the minimisation objective.
    pub fn add_to_objective(&mut self, term: Expression) {
        self.objective += term;
    }

    pub fn num_variables(&self) -> usize {
        self.registry.len()
    }

    pub fn num_binaries(&self) -> usize {
        self.binaries
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

impl Default for MilpModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Primal values copied out of a solved engine model.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    values: HashMap<Variable, f64>,
}

impl Assignment {
    pub(crate) fn capture<S: Solution>(solution: &S, registry: &[Variable]) -> Self {
        let values = registry
            .iter()
            .map(|var| (*var, solution.value(*var)))
            .collect();
        Self { values }
    }

    /// Value of `var`; variables the engine never saw read as zero.
    pub fn value(&self, var: Variable) -> f64 {
        self.values.get(&var).copied().unwrap_or(0.0)
    }

    /// Binary decision read with the rounding threshold.
    pub fn is_on(&self, var: Variable) -> bool {
        self.value(var) > BINARY_THRESHOLD
    }

    #[cfg(test)]
    pub(crate) fn from_values(values: impl IntoIterator<Item = (Variable, f64)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}
