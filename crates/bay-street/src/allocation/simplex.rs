//! Dense two-phase primal simplex for small linear programs.
//!
//! Problems are stated as `maximize c·x` subject to linear rows and `x >= 0`.
//! Pivoting follows Bland's rule so the method terminates on degenerate
//! problems.

const EPSILON: f64 = 1e-9;
const FEASIBILITY_TOLERANCE: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

#[derive(Debug, Clone)]
pub(crate) struct Constraint {
    pub(crate) coefficients: Vec<f64>,
    pub(crate) relation: Relation,
    pub(crate) rhs: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct LinearProgram {
    pub(crate) objective: Vec<f64>,
    pub(crate) constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LpOutcome {
    Optimal { values: Vec<f64>, objective: f64 },
    Infeasible,
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum SimplexError {
    #[error("constraint {row} has {found} coefficients, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("linear program contains non-finite coefficients")]
    NonFinite,
    #[error("simplex did not converge within {0} pivots")]
    IterationLimit(usize),
}

enum PhaseOutcome {
    Optimal,
    Unbounded,
}

struct Tableau {
    rows: Vec<Vec<f64>>,
    objective: Vec<f64>,
    basis: Vec<usize>,
    width: usize,
    first_artificial: usize,
    pivots: usize,
    pivot_limit: usize,
}

impl Tableau {
    fn rhs(&self, row: usize) -> f64 {
        self.rows[row][self.width]
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let pivot = self.rows[row][col];
        for value in self.rows[row].iter_mut() {
            *value /= pivot;
        }

        let pivot_row = self.rows[row].clone();
        for (index, other) in self.rows.iter_mut().enumerate() {
            if index == row {
                continue;
            }
            let factor = other[col];
            if factor.abs() > 0.0 {
                for (value, pivot_value) in other.iter_mut().zip(&pivot_row) {
                    *value -= factor * pivot_value;
                }
            }
        }

        let factor = self.objective[col];
        if factor.abs() > 0.0 {
            for (value, pivot_value) in self.objective.iter_mut().zip(&pivot_row) {
                *value -= factor * pivot_value;
            }
        }

        self.basis[row] = col;
        self.pivots += 1;
    }

    /// Rewrite the objective row so basic columns carry zero reduced cost.
    fn price_out_basis(&mut self) {
        for row in 0..self.rows.len() {
            let col = self.basis[row];
            let factor = self.objective[col];
            if factor.abs() > 0.0 {
                let source = self.rows[row].clone();
                for (value, row_value) in self.objective.iter_mut().zip(&source) {
                    *value -= factor * row_value;
                }
            }
        }
    }

    fn run(&mut self, allow_artificial: bool) -> Result<PhaseOutcome, SimplexError> {
        let candidate_limit = if allow_artificial {
            self.width
        } else {
            self.first_artificial
        };

        loop {
            if self.pivots >= self.pivot_limit {
                return Err(SimplexError::IterationLimit(self.pivot_limit));
            }

            // Bland: lowest-index column with a negative reduced cost enters.
            let entering = (0..candidate_limit).find(|&col| self.objective[col] < -EPSILON);
            let Some(col) = entering else {
                return Ok(PhaseOutcome::Optimal);
            };

            let mut leaving: Option<(usize, f64)> = None;
            for row in 0..self.rows.len() {
                let coefficient = self.rows[row][col];
                if coefficient <= EPSILON {
                    continue;
                }
                let ratio = self.rhs(row) / coefficient;
                leaving = match leaving {
                    None => Some((row, ratio)),
                    Some((best, best_ratio)) => {
                        if ratio < best_ratio - EPSILON
                            || (ratio <= best_ratio + EPSILON && self.basis[row] < self.basis[best])
                        {
                            Some((row, ratio))
                        } else {
                            Some((best, best_ratio))
                        }
                    }
                };
            }

            match leaving {
                Some((row, _)) => self.pivot(row, col),
                None => return Ok(PhaseOutcome::Unbounded),
            }
        }
    }
}

impl LinearProgram {
    pub(crate) fn solve(&self) -> Result<LpOutcome, SimplexError> {
        let variables = self.objective.len();
        self.check_dimensions()?;

        // Flip rows with negative right-hand sides so the initial basis is feasible.
        let rows: Vec<(Vec<f64>, Relation, f64)> = self
            .constraints
            .iter()
            .map(|constraint| {
                if constraint.rhs < 0.0 {
                    let flipped = match constraint.relation {
                        Relation::LessOrEqual => Relation::GreaterOrEqual,
                        Relation::GreaterOrEqual => Relation::LessOrEqual,
                        Relation::Equal => Relation::Equal,
                    };
                    (
                        constraint.coefficients.iter().map(|value| -value).collect(),
                        flipped,
                        -constraint.rhs,
                    )
                } else {
                    (
                        constraint.coefficients.clone(),
                        constraint.relation,
                        constraint.rhs,
                    )
                }
            })
            .collect();

        let slack_count = rows
            .iter()
            .filter(|(_, relation, _)| *relation != Relation::Equal)
            .count();
        let artificial_count = rows
            .iter()
            .filter(|(_, relation, _)| *relation != Relation::LessOrEqual)
            .count();

        let first_slack = variables;
        let first_artificial = first_slack + slack_count;
        let width = first_artificial + artificial_count;

        let mut tableau_rows = Vec::with_capacity(rows.len());
        let mut basis = Vec::with_capacity(rows.len());
        let mut next_slack = first_slack;
        let mut next_artificial = first_artificial;

        for (coefficients, relation, rhs) in rows {
            let mut row = vec![0.0; width + 1];
            row[..variables].copy_from_slice(&coefficients);
            row[width] = rhs;

            match relation {
                Relation::LessOrEqual => {
                    row[next_slack] = 1.0;
                    basis.push(next_slack);
                    next_slack += 1;
                }
                Relation::GreaterOrEqual => {
                    row[next_slack] = -1.0;
                    next_slack += 1;
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
                Relation::Equal => {
                    row[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
            }

            tableau_rows.push(row);
        }

        let row_count = tableau_rows.len();
        let mut tableau = Tableau {
            rows: tableau_rows,
            objective: vec![0.0; width + 1],
            basis,
            width,
            first_artificial,
            pivots: 0,
            pivot_limit: 50 * (width + row_count + 1),
        };

        if artificial_count > 0 {
            // Phase one: maximize the negated sum of artificials.
            for col in first_artificial..width {
                tableau.objective[col] = 1.0;
            }
            tableau.price_out_basis();

            if let PhaseOutcome::Unbounded = tableau.run(true)? {
                return Ok(LpOutcome::Infeasible);
            }
            if tableau.objective[width] < -FEASIBILITY_TOLERANCE {
                return Ok(LpOutcome::Infeasible);
            }

            for row in 0..row_count {
                if tableau.basis[row] < first_artificial {
                    continue;
                }
                let replacement = (0..first_artificial)
                    .find(|&col| tableau.rows[row][col].abs() > EPSILON);
                // Rows without a replacement are redundant and keep a zero artificial.
                if let Some(col) = replacement {
                    tableau.pivot(row, col);
                }
            }
        }

        tableau.objective = vec![0.0; width + 1];
        for (col, cost) in self.objective.iter().enumerate() {
            tableau.objective[col] = -cost;
        }
        tableau.price_out_basis();

        if let PhaseOutcome::Unbounded = tableau.run(false)? {
            return Ok(LpOutcome::Unbounded);
        }

        let mut values = vec![0.0; variables];
        for (row, &col) in tableau.basis.iter().enumerate() {
            if col < variables {
                values[col] = tableau.rhs(row).max(0.0);
            }
        }
        let objective = values
            .iter()
            .zip(&self.objective)
            .map(|(value, cost)| value * cost)
            .sum();

        Ok(LpOutcome::Optimal { values, objective })
    }

    fn check_dimensions(&self) -> Result<(), SimplexError> {
        let variables = self.objective.len();
        for (row, constraint) in self.constraints.iter().enumerate() {
            if constraint.coefficients.len() != variables {
                return Err(SimplexError::DimensionMismatch {
                    row,
                    expected: variables,
                    found: constraint.coefficients.len(),
                });
            }
        }

        let finite = self.objective.iter().all(|value| value.is_finite())
            && self.constraints.iter().all(|constraint| {
                constraint.rhs.is_finite()
                    && constraint
                        .coefficients
                        .iter()
                        .all(|value| value.is_finite())
            });
        if finite {
            Ok(())
        } else {
            Err(SimplexError::NonFinite)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(coefficients: &[f64], relation: Relation, rhs: f64) -> Constraint {
        Constraint {
            coefficients: coefficients.to_vec(),
            relation,
            rhs,
        }
    }

    fn optimal(outcome: LpOutcome) -> (Vec<f64>, f64) {
        match outcome {
            LpOutcome::Optimal { values, objective } => (values, objective),
            other => panic!("expected optimal solution, got {other:?}"),
        }
    }

    #[test]
    fn solves_textbook_maximization() {
        // max 3x + 5y s.t. x <= 4, 2y <= 12, 3x + 2y <= 18
        let program = LinearProgram {
            objective: vec![3.0, 5.0],
            constraints: vec![
                row(&[1.0, 0.0], Relation::LessOrEqual, 4.0),
                row(&[0.0, 2.0], Relation::LessOrEqual, 12.0),
                row(&[3.0, 2.0], Relation::LessOrEqual, 18.0),
            ],
        };

        let (values, objective) = optimal(program.solve().expect("solves"));

        assert!((values[0] - 2.0).abs() < 1e-9);
        assert!((values[1] - 6.0).abs() < 1e-9);
        assert!((objective - 36.0).abs() < 1e-9);
    }

    #[test]
    fn handles_equality_and_greater_rows() {
        // max x + 2y s.t. x + y = 1, x >= 0.25
        let program = LinearProgram {
            objective: vec![1.0, 2.0],
            constraints: vec![
                row(&[1.0, 1.0], Relation::Equal, 1.0),
                row(&[1.0, 0.0], Relation::GreaterOrEqual, 0.25),
            ],
        };

        let (values, objective) = optimal(program.solve().expect("solves"));

        assert!((values[0] - 0.25).abs() < 1e-9);
        assert!((values[1] - 0.75).abs() < 1e-9);
        assert!((objective - 1.75).abs() < 1e-9);
    }

    #[test]
    fn detects_infeasible_rows() {
        let program = LinearProgram {
            objective: vec![1.0, 1.0],
            constraints: vec![
                row(&[1.0, 1.0], Relation::Equal, 1.0),
                row(&[5.0, 6.0], Relation::LessOrEqual, 2.0),
            ],
        };

        assert_eq!(program.solve().expect("solves"), LpOutcome::Infeasible);
    }

    #[test]
    fn detects_unbounded_objective() {
        let program = LinearProgram {
            objective: vec![1.0, 0.0],
            constraints: vec![row(&[0.0, 1.0], Relation::LessOrEqual, 3.0)],
        };

        assert_eq!(program.solve().expect("solves"), LpOutcome::Unbounded);
    }

    #[test]
    fn negative_rhs_rows_are_normalized() {
        // -x - y <= -1 is x + y >= 1; minimize x + y by maximizing its negation.
        let program = LinearProgram {
            objective: vec![-1.0, -1.0],
            constraints: vec![row(&[-1.0, -1.0], Relation::LessOrEqual, -1.0)],
        };

        let (values, objective) = optimal(program.solve().expect("solves"));

        assert!((values.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((objective + 1.0).abs() < 1e-9);
    }

    #[test]
    fn redundant_equalities_do_not_break_phase_two() {
        let program = LinearProgram {
            objective: vec![2.0, 1.0],
            constraints: vec![
                row(&[1.0, 1.0], Relation::Equal, 1.0),
                row(&[2.0, 2.0], Relation::Equal, 2.0),
            ],
        };

        let (values, objective) = optimal(program.solve().expect("solves"));

        assert!((values[0] - 1.0).abs() < 1e-9);
        assert!((objective - 2.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_finite_and_mismatched_rows() {
        let program = LinearProgram {
            objective: vec![f64::NAN],
            constraints: vec![row(&[1.0], Relation::Equal, 1.0)],
        };
        assert_eq!(program.solve(), Err(SimplexError::NonFinite));

        let program = LinearProgram {
            objective: vec![1.0, 1.0],
            constraints: vec![row(&[1.0], Relation::Equal, 1.0)],
        };
        assert!(matches!(
            program.solve(),
            Err(SimplexError::DimensionMismatch { row: 0, .. })
        ));
    }
}
