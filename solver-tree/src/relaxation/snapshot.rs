//! Captured linear relaxation of a search node.

use sprs::CsMat;

use crate::error::{TreeError, TreeResult};
use crate::search::BoundChange;

/// Sparse matrix in CSC format.
pub type SparseCsc = CsMat<f64>;

/// Outcome of solving a relaxation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationSolution {
    /// Whether the relaxation has a primal feasible point.
    pub primal_feasible: bool,

    /// Optimal objective value (None if infeasible).
    pub objective_value: Option<f64>,

    /// Primal column values (empty if infeasible).
    pub column_values: Vec<f64>,
}

impl RelaxationSolution {
    /// Create a feasible solution.
    pub fn feasible(objective_value: f64, column_values: Vec<f64>) -> Self {
        Self {
            primal_feasible: true,
            objective_value: Some(objective_value),
            column_values,
        }
    }

    /// Create an infeasible result.
    pub fn infeasible() -> Self {
        Self {
            primal_feasible: false,
            objective_value: None,
            column_values: Vec::new(),
        }
    }
}

/// Linear relaxation of one node:
///
/// ```text
/// minimize    c^T x
/// subject to  row_lower <= A x <= row_upper
///             col_lower <=  x  <= col_upper
/// ```
///
/// Once the owning node is processed the node map never hands out a mutable
/// reference again, so the snapshot is frozen together with its solution.
#[derive(Debug, Clone)]
pub struct RelaxationSnapshot {
    row_lower: Vec<f64>,
    row_upper: Vec<f64>,
    col_lower: Vec<f64>,
    col_upper: Vec<f64>,
    matrix: SparseCsc,
    objective: Vec<f64>,
    solution: Option<RelaxationSolution>,
}

impl RelaxationSnapshot {
    /// Capture a relaxation.
    ///
    /// A row-ordered matrix is converted to column order. Fails if the
    /// bound and objective vectors disagree with the matrix shape.
    pub fn new(
        matrix: SparseCsc,
        objective: Vec<f64>,
        col_lower: Vec<f64>,
        col_upper: Vec<f64>,
        row_lower: Vec<f64>,
        row_upper: Vec<f64>,
    ) -> TreeResult<Self> {
        let matrix = if matrix.is_csc() { matrix } else { matrix.to_csc() };
        let (m, n) = matrix.shape();

        if objective.len() != n || col_lower.len() != n || col_upper.len() != n {
            return Err(TreeError::InvalidSnapshot(format!(
                "matrix has {} columns but objective/column bounds have lengths {}/{}/{}",
                n,
                objective.len(),
                col_lower.len(),
                col_upper.len()
            )));
        }
        if row_lower.len() != m || row_upper.len() != m {
            return Err(TreeError::InvalidSnapshot(format!(
                "matrix has {} rows but row bounds have lengths {}/{}",
                m,
                row_lower.len(),
                row_upper.len()
            )));
        }

        Ok(Self {
            row_lower,
            row_upper,
            col_lower,
            col_upper,
            matrix,
            objective,
            solution: None,
        })
    }

    /// Attach a solution at construction time.
    pub fn with_solution(mut self, solution: RelaxationSolution) -> TreeResult<Self> {
        self.set_solution(solution)?;
        Ok(self)
    }

    /// Number of rows (constraints).
    pub fn num_rows(&self) -> usize {
        self.matrix.rows()
    }

    /// Number of columns (variables).
    pub fn num_cols(&self) -> usize {
        self.matrix.cols()
    }

    /// Row lower bounds.
    pub fn row_lower(&self) -> &[f64] {
        &self.row_lower
    }

    /// Row upper bounds.
    pub fn row_upper(&self) -> &[f64] {
        &self.row_upper
    }

    /// Column lower bounds.
    pub fn col_lower(&self) -> &[f64] {
        &self.col_lower
    }

    /// Column upper bounds.
    pub fn col_upper(&self) -> &[f64] {
        &self.col_upper
    }

    /// Constraint matrix (column-ordered).
    pub fn matrix(&self) -> &SparseCsc {
        &self.matrix
    }

    /// Objective coefficients (minimization).
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    /// Solution, if the relaxation has been solved.
    pub fn solution(&self) -> Option<&RelaxationSolution> {
        self.solution.as_ref()
    }

    /// True once a solution has been stored.
    pub fn is_solved(&self) -> bool {
        self.solution.is_some()
    }

    /// Objective value of the stored solution.
    pub fn objective_value(&self) -> Option<f64> {
        self.solution.as_ref().and_then(|s| s.objective_value)
    }

    /// Primal feasibility of the stored solution; false while unsolved.
    pub fn primal_feasible(&self) -> bool {
        self.solution.as_ref().is_some_and(|s| s.primal_feasible)
    }

    /// Primal value of one column in the stored solution.
    pub fn column_value(&self, var: usize) -> Option<f64> {
        self.solution
            .as_ref()
            .and_then(|s| s.column_values.get(var).copied())
    }

    pub(crate) fn set_solution(&mut self, solution: RelaxationSolution) -> TreeResult<()> {
        if solution.primal_feasible && solution.column_values.len() != self.num_cols() {
            return Err(TreeError::InvalidSnapshot(format!(
                "solution has {} column values for {} columns",
                solution.column_values.len(),
                self.num_cols()
            )));
        }
        self.solution = Some(solution);
        Ok(())
    }

    /// Rewrite every row into `>=`-form.
    ///
    /// A row `lo <= a^T x <= hi` becomes `-a^T x >= -hi` (if `hi` is finite)
    /// followed by `a^T x >= lo` (if `lo` is finite). Rows bounded on neither
    /// side are dropped. All resulting upper bounds are `+inf`, so calling
    /// this twice is a no-op. Any stored solution is kept: the feasible set
    /// does not change.
    pub fn standardize(&mut self) {
        let m = self.num_rows();
        let n = self.num_cols();

        // Old row -> [(new row, sign)]
        let mut row_map: Vec<Vec<(usize, f64)>> = vec![Vec::new(); m];
        let mut row_lower = Vec::with_capacity(2 * m);
        for i in 0..m {
            let (lo, hi) = (self.row_lower[i], self.row_upper[i]);
            if hi < f64::INFINITY {
                row_map[i].push((row_lower.len(), -1.0));
                row_lower.push(-hi);
            }
            if lo > f64::NEG_INFINITY {
                row_map[i].push((row_lower.len(), 1.0));
                row_lower.push(lo);
            }
        }
        let m_new = row_lower.len();

        let mut indptr = Vec::with_capacity(n + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        let mut column: Vec<(usize, f64)> = Vec::new();
        for col in self.matrix.outer_iterator() {
            column.clear();
            for (row, &val) in col.iter() {
                for &(new_row, sign) in &row_map[row] {
                    column.push((new_row, sign * val));
                }
            }
            column.sort_by_key(|&(row, _)| row);
            for &(row, val) in &column {
                indices.push(row);
                data.push(val);
            }
            indptr.push(indices.len());
        }

        self.matrix = CsMat::new_csc((m_new, n), indptr, indices, data);
        self.row_upper = vec![f64::INFINITY; m_new];
        self.row_lower = row_lower;
    }

    /// Derive a child relaxation by applying a branching bound change.
    ///
    /// The child starts unsolved.
    pub fn with_bound_change(&self, change: &BoundChange) -> TreeResult<Self> {
        if change.var >= self.num_cols() {
            return Err(TreeError::InvalidSnapshot(format!(
                "bound change on column {} but only {} columns",
                change.var,
                self.num_cols()
            )));
        }

        let mut child = self.clone();
        child.col_lower[change.var] = change.new_lb;
        child.col_upper[change.var] = change.new_ub;
        child.solution = None;
        Ok(child)
    }

    /// Columns whose bounds in `self` are looser than in `parent`.
    ///
    /// Empty if `self` refines `parent`. Column counts must match.
    pub fn loosened_columns(&self, parent: &Self, tol: f64) -> Vec<usize> {
        loosened_bounds(
            (&self.col_lower[..], &self.col_upper[..]),
            (&parent.col_lower[..], &parent.col_upper[..]),
            tol,
        )
    }
}

/// Indices whose `(lower, upper)` interval is wider than the parent's by
/// more than `tol`, over the shorter of the two.
pub fn loosened_bounds(bounds: (&[f64], &[f64]), parent: (&[f64], &[f64]), tol: f64) -> Vec<usize> {
    let (lower, upper) = bounds;
    let (parent_lower, parent_upper) = parent;
    let len = lower.len().min(parent_lower.len());
    (0..len)
        .filter(|&j| lower[j] < parent_lower[j] - tol || upper[j] > parent_upper[j] + tol)
        .collect()
}
