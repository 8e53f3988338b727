//! Sparse matrices and linear solvers for the conformal system.
//!
//! The assembled system is rectangular and kept in a lightweight CSR
//! matrix. Solving goes through the regularized normal equations
//! `AᵀA + εI`, either by sparse Cholesky (nalgebra-sparse) or by the
//! conjugate gradient method below.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::error::{MeshError, Result};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in CSR format for efficient matrix-vector multiplication.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
    /// Row pointers: row_ptr[i] is the index in col_idx/values where row i starts.
    /// Length is rows + 1, with row_ptr[rows] = nnz.
    row_ptr: Vec<usize>,
    /// Column indices for each non-zero value.
    col_idx: Vec<usize>,
    /// Non-zero values.
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries at the same (row, col) are summed.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            if last == Some((row, col)) {
                if let Some(acc) = values.last_mut() {
                    *acc += val;
                }
            } else {
                col_idx.push(col);
                values.push(val);
                row_ptr[row + 1] += 1;
                last = Some((row, col));
            }
        }

        // Per-row counts to offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Get the number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Get the number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Get the number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the stored entries of row `i` as `(col, value)`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Iterate over all stored entries as `(row, col, value)`.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.rows).flat_map(move |i| self.row(i).map(move |(j, v)| (i, j, v)))
    }

    /// Multiply matrix by vector: y = A * x.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.rows);
        for i in 0..self.rows {
            y[i] = self.row(i).map(|(j, v)| v * x[j]).sum();
        }
        y
    }

    /// Multiply the transpose by a vector: y = Aᵀ * x.
    pub fn transpose_mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(x.len(), self.rows, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.cols);
        for i in 0..self.rows {
            let xi = x[i];
            if xi == 0.0 {
                continue;
            }
            for (j, v) in self.row(i) {
                y[j] += v * xi;
            }
        }
        y
    }

    /// Regularized normal matrix `AᵀA + εI`.
    pub fn normal_matrix(&self, regularization: f64) -> CsrMatrix {
        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        for i in 0..self.rows {
            let row: Vec<(usize, f64)> = self.row(i).collect();
            for &(j, a) in &row {
                for &(k, b) in &row {
                    triplets.push((j, k, a * b));
                }
            }
        }
        for d in 0..self.cols {
            triplets.push((d, d, regularization));
        }
        CsrMatrix::from_triplets(self.cols, self.cols, triplets)
    }

    /// Convert to a dense matrix.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.rows, self.cols);
        for (i, j, v) in self.triplets() {
            dense[(i, j)] += v;
        }
        dense
    }

    /// Convert to nalgebra-sparse's CSC format.
    pub fn to_csc(&self) -> CscMatrix<f64> {
        let mut coo = CooMatrix::new(self.rows, self.cols);
        for (i, j, v) in self.triplets() {
            coo.push(i, j, v);
        }
        CscMatrix::from(&coo)
    }
}

/// Solve the symmetric positive definite system `A * x = b` by sparse
/// Cholesky factorization.
pub fn cholesky_solve(a: &CsrMatrix, b: &DVector<f64>) -> Result<DVector<f64>> {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n {
        return Err(MeshError::SolverFailed(format!(
            "{}x{} matrix does not match right-hand side of length {}",
            a.nrows(),
            a.ncols(),
            n
        )));
    }

    let factor = CscCholesky::factor(&a.to_csc())
        .map_err(|e| MeshError::SolverFailed(format!("Cholesky factorization failed: {:?}", e)))?;

    let rhs = DMatrix::from_column_slice(n, 1, b.as_slice());
    let solution = factor.solve(&rhs);
    Ok(solution.column(0).into_owned())
}

/// Solve A*x = b using the Conjugate Gradient method.
///
/// Requires A to be symmetric positive definite.
///
/// # Arguments
///
/// * `a` - The system matrix (must be symmetric positive definite)
/// * `b` - The right-hand side vector
/// * `x0` - Optional initial guess (zeros if None)
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Convergence tolerance (relative residual norm)
///
/// # Returns
///
/// The solution vector x, or an error if convergence fails.
pub fn conjugate_gradient(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: Option<&DVector<f64>>,
    max_iter: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n {
        return Err(MeshError::SolverFailed(format!(
            "{}x{} matrix does not match right-hand side of length {}",
            a.nrows(),
            a.ncols(),
            n
        )));
    }

    let mut x = match x0 {
        Some(x0) => x0.clone(),
        None => DVector::zeros(n),
    };

    let b_norm = b.norm();
    if b_norm < 1e-15 {
        return Ok(DVector::zeros(n));
    }

    // r = b - A*x
    let mut r = b - a.mul_vec(&x);
    let mut r_norm_sq = r.dot(&r);
    if r_norm_sq.sqrt() / b_norm < tolerance {
        return Ok(x);
    }

    let mut p = r.clone();

    for iter in 0..max_iter {
        let ap = a.mul_vec(&p);

        let p_ap = p.dot(&ap);
        if p_ap.abs() < 1e-300 {
            // Matrix might be singular or nearly so
            break;
        }
        let alpha = r_norm_sq / p_ap;

        x += alpha * &p;
        r -= alpha * &ap;

        let new_r_norm_sq = r.dot(&r);
        if new_r_norm_sq.sqrt() / b_norm < tolerance {
            log::trace!("conjugate gradient converged after {} iterations", iter + 1);
            return Ok(x);
        }

        let beta = new_r_norm_sq / r_norm_sq;
        p = &r + beta * &p;
        r_norm_sq = new_r_norm_sq;
    }

    Err(MeshError::ConvergenceFailed {
        iterations: max_iter,
    })
}

/// Condition number of a symmetric matrix from its eigenvalues.
///
/// Returns `None` if the smallest eigenvalue magnitude is zero.
pub fn symmetric_condition_number(a: &CsrMatrix) -> Option<f64> {
    let eigenvalues = a.to_dense().symmetric_eigenvalues();
    let abs = eigenvalues.iter().map(|e| e.abs());
    let max = abs.clone().fold(0.0, f64::max);
    let min = abs.fold(f64::INFINITY, f64::min);
    (min > 0.0 && min.is_finite()).then(|| max / min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spd_2x2() -> CsrMatrix {
        // [ 4  1 ]
        // [ 1  3 ]
        CsrMatrix::from_triplets(2, 2, vec![(0, 0, 4.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)])
    }

    #[test]
    fn test_csr_from_triplets_with_duplicates() {
        let triplets = vec![
            (1, 1, 3.0),
            (0, 0, 2.0),
            (0, 1, 1.0),
            (0, 0, 2.0), // Duplicate: should sum to 4.0
            (1, 0, 1.0),
        ];
        let a = CsrMatrix::from_triplets(2, 2, triplets);
        assert_eq!(a.nnz(), 4);

        let y = a.mul_vec(&DVector::from_vec(vec![1.0, 0.0]));
        assert!((y[0] - 4.0).abs() < 1e-10);
        assert!((y[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_csr_empty_rows() {
        // Row 1 has no entries
        let a = CsrMatrix::from_triplets(3, 2, vec![(0, 0, 1.0), (2, 1, 2.0)]);
        assert_eq!(a.row(1).count(), 0);
        let y = a.mul_vec(&DVector::from_vec(vec![1.0, 1.0]));
        assert_eq!(y.as_slice(), &[1.0, 0.0, 2.0]);

        let empty = CsrMatrix::from_triplets(2, 2, Vec::new());
        assert_eq!(empty.nnz(), 0);
    }

    #[test]
    fn test_transpose_mul_vec() {
        // A = [1 2; 0 3; 4 0]
        let a = CsrMatrix::from_triplets(3, 2, vec![(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0), (2, 0, 4.0)]);
        let y = a.transpose_mul_vec(&DVector::from_vec(vec![1.0, 1.0, 1.0]));
        assert!((y[0] - 5.0).abs() < 1e-12);
        assert!((y[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_matrix_matches_dense() {
        let a = CsrMatrix::from_triplets(3, 2, vec![(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0), (2, 0, 4.0)]);
        let dense = a.to_dense();
        let expected = dense.transpose() * &dense + DMatrix::identity(2, 2) * 1e-8;

        let normal = a.normal_matrix(1e-8).to_dense();
        assert!((normal - expected).norm() < 1e-12);
    }

    #[test]
    fn test_cholesky_solve() {
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let x = cholesky_solve(&a, &b).unwrap();

        assert!((x[0] - 1.0 / 11.0).abs() < 1e-10);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-10);
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, -1.0)]);
        let b = DVector::from_vec(vec![1.0, 1.0]);
        assert!(matches!(cholesky_solve(&a, &b), Err(MeshError::SolverFailed(_))));
    }

    #[test]
    fn test_cg_simple() {
        // Solution: x = 1/11, y = 7/11
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);

        let x = conjugate_gradient(&a, &b, None, 100, 1e-10).unwrap();

        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-8);
        assert!((x[0] - 1.0 / 11.0).abs() < 1e-8);
        assert!((x[1] - 7.0 / 11.0).abs() < 1e-8);
    }

    #[test]
    fn test_cg_larger_system() {
        // 4x4 symmetric positive definite matrix (diagonally dominant)
        let triplets = vec![
            (0, 0, 10.0),
            (0, 1, 1.0),
            (0, 2, 2.0),
            (1, 0, 1.0),
            (1, 1, 10.0),
            (1, 2, 1.0),
            (2, 0, 2.0),
            (2, 1, 1.0),
            (2, 2, 10.0),
            (2, 3, 1.0),
            (3, 2, 1.0),
            (3, 3, 10.0),
        ];
        let a = CsrMatrix::from_triplets(4, 4, triplets);
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);

        let x = conjugate_gradient(&a, &b, None, 100, 1e-10).unwrap();
        let residual = a.mul_vec(&x) - &b;
        assert!(residual.norm() < 1e-8);
    }

    #[test]
    fn test_cg_with_initial_guess() {
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0]);

        let x0 = DVector::from_vec(vec![0.1, 0.6]);
        let x = conjugate_gradient(&a, &b, Some(&x0), 100, 1e-10).unwrap();

        let residual = a.mul_vec(&x) - b;
        assert!(residual.norm() < 1e-8);
    }

    #[test]
    fn test_cg_dimension_mismatch() {
        let a = spd_2x2();
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert!(conjugate_gradient(&a, &b, None, 10, 1e-10).is_err());
    }

    #[test]
    fn test_condition_number() {
        let a = CsrMatrix::from_triplets(2, 2, vec![(0, 0, 4.0), (1, 1, 2.0)]);
        let cond = symmetric_condition_number(&a).unwrap();
        assert!((cond - 2.0).abs() < 1e-10);
    }
}
