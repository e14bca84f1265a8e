//! Shared fixtures for the integration tests.
//!
//! `VertexEngine` solves tiny bounded LPs exactly by enumerating the vertices
//! of the feasible polytope, and `run_search` plays the part of the external
//! solver: a depth-first branch and bound that reports every step to an
//! [`EventBridge`].

#![allow(dead_code)]

use nalgebra::{DMatrix, DVector};
use solver_tree::events::{BranchOutcome, EventBridge, EventHandler};
use solver_tree::relaxation::{RelaxationEngine, RelaxationSnapshot, RelaxationSolution};
use solver_tree::search::FeasibilityStatus;
use solver_tree::{TreeError, TreeResult};
use sprs::CsMat;

const FEAS_TOL: f64 = 1e-9;
const INT_TOL: f64 = 1e-6;

/// Exact LP engine for models with a handful of bounded columns.
#[derive(Debug, Default)]
pub struct VertexEngine {
    /// Number of solves performed.
    pub solves: usize,
}

impl RelaxationEngine for VertexEngine {
    fn name(&self) -> &str {
        "vertex"
    }

    fn solve_relaxation(&mut self, snapshot: &RelaxationSnapshot) -> TreeResult<RelaxationSolution> {
        self.solves += 1;
        let n = snapshot.num_cols();
        let (col_lower, col_upper) = self.column_bounds(snapshot);
        let (row_lower, row_upper) = self.row_bounds(snapshot);
        if col_lower
            .iter()
            .chain(col_upper)
            .any(|b| !b.is_finite())
        {
            return Err(TreeError::Engine("vertex engine needs bounded columns".into()));
        }

        let rows = dense_rows(snapshot.matrix());

        // Every finite side of every row and column is a candidate hyperplane.
        let mut planes: Vec<(Vec<f64>, f64)> = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            if row_lower[i].is_finite() {
                planes.push((row.clone(), row_lower[i]));
            }
            if row_upper[i].is_finite() {
                planes.push((row.clone(), row_upper[i]));
            }
        }
        for j in 0..n {
            let mut unit = vec![0.0; n];
            unit[j] = 1.0;
            planes.push((unit.clone(), col_lower[j]));
            planes.push((unit, col_upper[j]));
        }

        let mut best: Option<(f64, Vec<f64>)> = None;
        for subset in combinations(planes.len(), n) {
            let a = DMatrix::from_fn(n, n, |r, c| planes[subset[r]].0[c]);
            let b = DVector::from_fn(n, |r, _| planes[subset[r]].1);
            let Some(x) = a.lu().solve(&b) else {
                continue;
            };
            let x: Vec<f64> = x.iter().map(|&v| snap_integral(v)).collect();

            if !is_feasible(&x, &rows, row_lower, row_upper, col_lower, col_upper) {
                continue;
            }
            let obj: f64 = x.iter().zip(snapshot.objective()).map(|(xj, cj)| xj * cj).sum();
            if best.as_ref().map_or(true, |(b, _)| obj < *b - FEAS_TOL) {
                best = Some((obj, x));
            }
        }

        Ok(match best {
            Some((obj, x)) => RelaxationSolution::feasible(obj, x),
            None => RelaxationSolution::infeasible(),
        })
    }
}

fn dense_rows(matrix: &CsMat<f64>) -> Vec<Vec<f64>> {
    let (m, n) = matrix.shape();
    let mut rows = vec![vec![0.0; n]; m];
    for (j, col) in matrix.outer_iterator().enumerate() {
        for (i, &v) in col.iter() {
            rows[i][j] = v;
        }
    }
    rows
}

fn snap_integral(v: f64) -> f64 {
    if (v - v.round()).abs() < FEAS_TOL {
        v.round()
    } else {
        v
    }
}

fn is_feasible(
    x: &[f64],
    rows: &[Vec<f64>],
    row_lower: &[f64],
    row_upper: &[f64],
    col_lower: &[f64],
    col_upper: &[f64],
) -> bool {
    let cols_ok = x
        .iter()
        .enumerate()
        .all(|(j, &v)| v >= col_lower[j] - FEAS_TOL && v <= col_upper[j] + FEAS_TOL);
    let rows_ok = rows.iter().enumerate().all(|(i, row)| {
        let ax: f64 = row.iter().zip(x).map(|(a, v)| a * v).sum();
        ax >= row_lower[i] - FEAS_TOL && ax <= row_upper[i] + FEAS_TOL
    });
    cols_ok && rows_ok
}

/// All `k`-subsets of `0..n` in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn extend(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            extend(i + 1, n, k, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    extend(0, n, k, &mut Vec::with_capacity(k), &mut out);
    out
}

/// How a fixture search ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best integral objective found.
    pub incumbent: Option<f64>,

    /// True if the search stopped before exhausting the tree.
    pub stopped_early: bool,
}

/// Depth-first branch and bound over `integers`, reporting to `bridge`.
///
/// Branches on the lowest-index fractional integer column, explores the down
/// child first and prunes nodes that cannot beat the incumbent.
pub fn run_search<H: EventHandler>(
    bridge: &mut EventBridge<H>,
    engine: &mut VertexEngine,
    root: RelaxationSnapshot,
    integers: &[usize],
) -> TreeResult<SearchOutcome> {
    let root = bridge.search_started(root)?;
    let mut stack = vec![root];
    let mut incumbent: Option<f64> = None;

    while let Some(id) = stack.pop() {
        if bridge.node_examined(id)?.is_stop() {
            return Ok(SearchOutcome {
                incumbent,
                stopped_early: true,
            });
        }

        let snapshot = bridge
            .map()
            .get(id)?
            .snapshot()
            .cloned()
            .ok_or(TreeError::NotSolved)?;
        let solution = engine.solve_relaxation(&snapshot)?;
        if bridge.node_solved(id, solution.clone())? == FeasibilityStatus::Infeasible {
            continue;
        }

        let obj = solution.objective_value.unwrap_or(f64::INFINITY);
        if incumbent.is_some_and(|best| obj >= best - FEAS_TOL) {
            continue;
        }

        let x = &solution.column_values;
        let fractional = integers
            .iter()
            .copied()
            .find(|&j| (x[j] - x[j].round()).abs() > INT_TOL);

        match fractional {
            None => {
                incumbent = Some(obj);
                if bridge.solution_found(obj, x).is_stop() {
                    return Ok(SearchOutcome {
                        incumbent,
                        stopped_early: true,
                    });
                }
            }
            Some(j) => match bridge.branch_decided(id, j, x[j])? {
                BranchOutcome::Created { down, up } => {
                    stack.push(up);
                    stack.push(down);
                }
                BranchOutcome::BudgetExhausted => {
                    return Ok(SearchOutcome {
                        incumbent,
                        stopped_early: true,
                    });
                }
            },
        }
    }

    Ok(SearchOutcome {
        incumbent,
        stopped_early: false,
    })
}

/// Snapshot over `n` columns in `[0, 10]` from dense rows.
pub fn snapshot(rows: &[Vec<f64>], objective: Vec<f64>, row_lower: Vec<f64>, row_upper: Vec<f64>) -> RelaxationSnapshot {
    let n = objective.len();
    let m = rows.len();

    let mut indptr = vec![0];
    let mut indices = Vec::new();
    let mut data = Vec::new();
    for j in 0..n {
        for (i, row) in rows.iter().enumerate() {
            if row[j] != 0.0 {
                indices.push(i);
                data.push(row[j]);
            }
        }
        indptr.push(indices.len());
    }

    let a = CsMat::new_csc((m, n), indptr, indices, data);
    RelaxationSnapshot::new(a, objective, vec![0.0; n], vec![10.0; n], row_lower, row_upper)
        .expect("valid fixture snapshot")
}

/// `0 <= x0 + x2 <= 1.5`, `0 <= x1 <= 1.25`, minimize `x0 - x1 + x2`.
///
/// Root optimum `(0, 1.25, 0)`; one branch on `x1` solves it.
pub fn single_branch_model() -> RelaxationSnapshot {
    snapshot(
        &[vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]],
        vec![1.0, -1.0, 1.0],
        vec![0.0, 0.0],
        vec![1.5, 1.25],
    )
}

/// `0 <= x0 + x2 <= 0.5`, `0 <= x1 <= 0`, minimize `x0 + x1 - x2`.
///
/// Root optimum `(0, 0, 0.5)`; branches on `x2`.
pub fn refinement_model() -> RelaxationSnapshot {
    snapshot(
        &[vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]],
        vec![1.0, 1.0, -1.0],
        vec![0.0, 0.0],
        vec![0.5, 0.0],
    )
}

/// `2 x0 + 2 x1 <= 3`, minimize `-x0 - x1`: every relaxation on the
/// optimal face is fractional, so the search keeps branching.
pub fn face_model() -> RelaxationSnapshot {
    snapshot(
        &[vec![2.0, 2.0]],
        vec![-1.0, -1.0],
        vec![f64::NEG_INFINITY],
        vec![3.0],
    )
}

/// Small knapsack: maximize `5 x0 + 4 x1 + 3 x2 + 2 x3` subject to two
/// capacity rows, as a minimization.
pub fn knapsack_model() -> RelaxationSnapshot {
    snapshot(
        &[vec![2.0, 3.0, 1.0, 4.0], vec![3.0, 1.0, 2.0, 2.0]],
        vec![-5.0, -4.0, -3.0, -2.0],
        vec![f64::NEG_INFINITY, f64::NEG_INFINITY],
        vec![5.5, 6.5],
    )
}
