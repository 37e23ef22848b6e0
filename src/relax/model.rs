//! Linear relaxation model over edge variables.

/// A sparse linear expression `sum(coef * x[var])`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(usize, f64)>,
}

impl LinearExpr {
    /// Creates an empty (zero) expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit-coefficient sum over the given variables.
    pub fn sum_of(vars: impl IntoIterator<Item = usize>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
        }
    }

    /// Adds `coef * x[var]`.
    pub fn with_term(mut self, var: usize, coef: f64) -> Self {
        self.terms.push((var, coef));
        self
    }

    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression at `values`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, c)| c * values[v]).sum()
    }

    /// Largest variable index referenced, if any.
    pub fn max_var(&self) -> Option<usize> {
        self.terms.iter().map(|&(v, _)| v).max()
    }
}

/// Comparison sense of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `expr <= rhs`
    LessEqual,
    /// `expr == rhs`
    Equal,
}

/// A named linear constraint `expr {<=, ==} rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Row name, used in diagnostics.
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Creates a `<=` row.
    pub fn leq(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            sense: Sense::LessEqual,
            rhs,
        }
    }

    /// Creates an `==` row.
    pub fn eq(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Self {
            name: name.into(),
            expr,
            sense: Sense::Equal,
            rhs,
        }
    }

    /// Whether `values` satisfy the row within `epsilon`.
    pub fn is_satisfied(&self, values: &[f64], epsilon: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::LessEqual => lhs <= self.rhs + epsilon,
            Sense::Equal => (lhs - self.rhs).abs() <= epsilon,
        }
    }
}

/// Objective of a single relaxation solve.
#[derive(Debug, Clone, PartialEq)]
pub enum Objective {
    /// Maximize a linear expression.
    Maximize(LinearExpr),
    /// Zero objective: any feasible vertex will do.
    Feasibility,
}

impl Objective {
    /// Objective value at `values` (0 for feasibility).
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        match self {
            Objective::Maximize(expr) => expr.evaluate(values),
            Objective::Feasibility => 0.0,
        }
    }
}

/// One relaxation solve: `num_vars` variables in `[0, 1]`, an objective,
/// and the constraint rows.
///
/// Rows are borrowed so the structural family can be built once per
/// run and shared across passes while the lock rows grow.
#[derive(Debug, Clone)]
pub struct RelaxationProblem<'a> {
    pub num_vars: usize,
    pub objective: Objective,
    pub constraints: Vec<&'a Constraint>,
}

impl<'a> RelaxationProblem<'a> {
    pub fn new(num_vars: usize, objective: Objective) -> Self {
        Self {
            num_vars,
            objective,
            constraints: Vec::new(),
        }
    }

    /// Appends rows.
    pub fn with_constraints(mut self, rows: impl IntoIterator<Item = &'a Constraint>) -> Self {
        self.constraints.extend(rows);
        self
    }

    /// Checks that every referenced variable exists and every rhs is finite.
    pub fn validate(&self) -> Result<(), String> {
        if let Objective::Maximize(expr) = &self.objective {
            if let Some(v) = expr.max_var().filter(|&v| v >= self.num_vars) {
                return Err(format!("objective references undefined variable {v}"));
            }
        }
        for row in &self.constraints {
            if !row.rhs.is_finite() {
                return Err(format!("row {} has a non-finite rhs", row.name));
            }
            if let Some(v) = row.expr.max_var().filter(|&v| v >= self.num_vars) {
                return Err(format!("row {} references undefined variable {v}", row.name));
            }
        }
        Ok(())
    }

    /// Whether `values` lie in `[0, 1]` and satisfy every row within `epsilon`.
    pub fn is_feasible(&self, values: &[f64], epsilon: f64) -> bool {
        values.len() == self.num_vars
            && values
                .iter()
                .all(|&x| (-epsilon..=1.0 + epsilon).contains(&x))
            && self.constraints.iter().all(|c| c.is_satisfied(values, epsilon))
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_evaluate() {
        let expr = LinearExpr::sum_of([0, 2]).with_term(1, -2.0);
        assert!((expr.evaluate(&[1.0, 0.5, 1.0]) - 1.0).abs() < 1e-12);
        assert_eq!(expr.max_var(), Some(2));
        assert!(LinearExpr::new().is_empty());
    }

    #[test]
    fn test_constraint_satisfaction() {
        let leq = Constraint::leq("cap", LinearExpr::sum_of([0, 1]), 1.0);
        assert!(leq.is_satisfied(&[1.0, 0.0], 1e-6));
        assert!(!leq.is_satisfied(&[1.0, 1.0], 1e-6));

        let eq = Constraint::eq("lock", LinearExpr::sum_of([0, 1]), 2.0);
        assert!(eq.is_satisfied(&[1.0, 1.0 - 1e-9], 1e-6));
        assert!(!eq.is_satisfied(&[1.0, 0.0], 1e-6));
    }

    #[test]
    fn test_problem_validate() {
        let row = Constraint::leq("bad", LinearExpr::sum_of([5]), 1.0);
        let problem = RelaxationProblem::new(2, Objective::Feasibility).with_constraints([&row]);
        assert!(problem.validate().is_err());

        let problem = RelaxationProblem::new(2, Objective::Maximize(LinearExpr::sum_of([3])));
        assert!(problem.validate().is_err());

        let inf = Constraint::leq("inf", LinearExpr::sum_of([0]), f64::INFINITY);
        let problem = RelaxationProblem::new(2, Objective::Feasibility).with_constraints([&inf]);
        assert!(problem.validate().is_err());
    }

    #[test]
    fn test_problem_feasibility() {
        let row = Constraint::leq("one", LinearExpr::sum_of([0, 1]), 1.0);
        let problem = RelaxationProblem::new(2, Objective::Feasibility).with_constraints([&row]);
        assert!(problem.is_feasible(&[0.0, 1.0], 1e-6));
        assert!(!problem.is_feasible(&[1.0, 1.0], 1e-6));
        assert!(!problem.is_feasible(&[1.5, 0.0], 1e-6));
        assert!(!problem.is_feasible(&[0.0], 1e-6));
        assert_eq!(problem.constraint_count(), 1);
    }
}
