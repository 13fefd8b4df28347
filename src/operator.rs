//! This module defines the operator interface shared by all Hamiltonian
//! representations.
//!
//! Iterative algorithms such as the Lanczos process never look at individual
//! matrix elements; they only need the action of the operator on a vector. The
//! sector Hamiltonians of this crate are therefore exposed as
//! [`faer::matrix_free::LinOp`] implementations, which lets the Lanczos routines
//! run on them exactly as they would on a faer dense or sparse matrix.
//!
//! Small sectors are diagonalized densely, so every many-body operator must also
//! be able to materialize itself as a dense matrix. [`ManyBodyOperator`] adds
//! that requirement on top of `LinOp`, together with a convenience
//! matrix-vector product that manages its own workspace.

use faer::{
    Mat, MatRef, Par,
    dyn_stack::{MemBuffer, MemStack},
    matrix_free::LinOp,
};

/// A real symmetric many-body operator acting on the basis of one sector.
///
/// Rows and columns are indexed by the composite basis index `iup + idw * dup`
/// of the sector. Implementors provide the matrix-free action through
/// [`LinOp::apply`] and a dense materialization through [`Self::to_dense`].
pub trait ManyBodyOperator: LinOp<f64> {
    /// Materializes the operator as a dense `d x d` matrix.
    fn to_dense(&self) -> Mat<f64>;

    /// Applies the operator to `rhs` and returns the owned result.
    ///
    /// # Panics
    ///
    /// Panics if the operator dimension does not match the number of rows of `rhs`.
    fn matvec(&self, rhs: MatRef<'_, f64>) -> Mat<f64> {
        assert_eq!(
            self.ncols(),
            rhs.nrows(),
            "Dimension mismatch: operator columns ({}) do not match vector rows ({}).",
            self.ncols(),
            rhs.nrows(),
        );
        let mut out = Mat::zeros(self.nrows(), rhs.ncols());
        let mut mem = MemBuffer::new(self.apply_scratch(rhs.ncols(), Par::Seq));
        self.apply(out.as_mut(), rhs, Par::Seq, MemStack::new(&mut mem));
        out
    }
}
