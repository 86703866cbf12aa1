// vim: tw=80

//! Field-and-storage-agnostic matrix algorithms.
//!
//! Everything in this module is written once against [`MatrixOps`] and used
//! by both `matrix::byte::View` (GF(256)) and `matrix::bit::View` (GF(2)).
//! The elementary, storage-specific primitives (word-packed vs. byte-packed
//! rows) live on the concrete views; this module only ever calls through
//! that trait, which is the "generic code across fields" seam described for
//! this codebase's matrix layer.

/// The primitives [`generic`](self) needs from a matrix view. Elementary
/// operations (`swap_rows`, `multadd_row_from`, ...) are implemented
/// per-storage for speed; everything else in this module is built from them.
pub trait MatrixOps: Sized {
    type Elem: Copy + Eq + Default;

    fn zero() -> Self::Elem;
    fn one() -> Self::Elem;
    fn fadd(a: Self::Elem, b: Self::Elem) -> Self::Elem;
    fn fmul(a: Self::Elem, b: Self::Elem) -> Self::Elem;
    fn finv(a: Self::Elem) -> Self::Elem;

    fn n_row(&self) -> usize;
    fn n_col(&self) -> usize;

    fn get_el(&self, r: usize, c: usize) -> Self::Elem;
    fn set_el(&mut self, r: usize, c: usize, v: Self::Elem);

    fn swap_rows(&mut self, r1: usize, r2: usize);
    fn swap_cols(&mut self, c1: usize, c2: usize);
    fn clear_row(&mut self, r: usize);
    fn mult_row(&mut self, r: usize, alpha: Self::Elem);

    /// `row(dst_r) += alpha * row(src_r)`, restricted to columns `offs..`.
    /// `src_r` and `dst_r` are rows of the *same* matrix; this is the
    /// primitive the elimination step of [`lu_decomp_inplace`] rides on.
    fn multadd_row_from(&mut self, src_r: usize, offs: usize, alpha: Self::Elem, dst_r: usize);

    /// Scale column `c` from row `offs` downward by `alpha`.
    fn mult_col_from(&mut self, c: usize, offs: usize, alpha: Self::Elem);

    /// Copy row `src_r` to row `dst_r` within the same matrix.
    fn copy_row_internal(&mut self, src_r: usize, dst_r: usize);
    /// Copy column `src_c` to column `dst_c` within the same matrix.
    fn copy_col_internal(&mut self, src_c: usize, dst_c: usize);

    fn row_iszero(&self, r: usize) -> bool;

    /// `row(dst_r) += alpha * row(src_r)`, same matrix, offset 0.
    fn multadd_row(&mut self, src_r: usize, alpha: Self::Elem, dst_r: usize) {
        self.multadd_row_from(src_r, 0, alpha, dst_r)
    }

    /// Copy row `src_r` of `src` into row `dst_r` of `self`. `src` may be a
    /// different matrix of the same concrete type.
    fn copy_row_from(&mut self, dst_r: usize, src: &Self, src_r: usize) {
        for c in 0..self.n_col() {
            let v = src.get_el(src_r, c);
            self.set_el(dst_r, c, v);
        }
    }

    /// `row(dst_r) += alpha * src.row(src_r)`, `src` possibly a different
    /// matrix of the same concrete type.
    fn multadd_row_other(&mut self, dst_r: usize, alpha: Self::Elem, src: &Self, src_r: usize) {
        if alpha == Self::zero() {
            return;
        }
        for c in 0..self.n_col() {
            let v = src.get_el(src_r, c);
            let cur = self.get_el(dst_r, c);
            self.set_el(dst_r, c, Self::fadd(cur, Self::fmul(alpha, v)));
        }
    }
}

/// Whether `m` has every element zero.
pub fn iszero<M: MatrixOps>(m: &M) -> bool {
    (0..m.n_row()).all(|r| m.row_iszero(r))
}

/// Set every element of `m` to zero.
pub fn clear<M: MatrixOps>(m: &mut M) {
    for r in 0..m.n_row() {
        m.clear_row(r);
    }
}

/// Copy `src` into `dst`. Both must have the same shape.
pub fn copy<M: MatrixOps>(src: &M, dst: &mut M) {
    assert_eq!(src.n_row(), dst.n_row());
    assert_eq!(src.n_col(), dst.n_col());
    for r in 0..src.n_row() {
        dst.copy_row_from(r, src, r);
    }
}

/// Copy the `n_row` x `n_col` submatrix of `src` starting at
/// `(src_row, src_col)` into `dst`, placed at `(dst_row, dst_col)`. Elements
/// of `dst` outside that region are unchanged. Element-by-element, so not
/// especially fast.
#[allow(clippy::too_many_arguments)]
pub fn copy_submat<M: MatrixOps>(
    src: &M,
    src_row: usize,
    src_col: usize,
    n_row: usize,
    n_col: usize,
    dst: &mut M,
    dst_row: usize,
    dst_col: usize,
) {
    assert!(src_row + n_row <= src.n_row());
    assert!(src_col + n_col <= src.n_col());
    assert!(dst_row + n_row <= dst.n_row());
    assert!(dst_col + n_col <= dst.n_col());

    for r in 0..n_row {
        for c in 0..n_col {
            let v = src.get_el(src_row + r, src_col + c);
            dst.set_el(dst_row + r, dst_col + c, v);
        }
    }
}

/// Permute the rows of `m` in place, restricted to the first `bound` rows.
/// `rowperm` is in "from" form: row `rowperm[i]` moves to row `i`. Handles
/// an arbitrary permutation of the bound in a single pass via cycle
/// decomposition, using one row of scratch space. Self-cycles are no-ops.
pub fn permute_rows_bounded<M: MatrixOps>(m: &mut M, bound: usize, rowperm: &[usize]) {
    assert_eq!(rowperm.len(), bound);
    let mut visited = vec![false; bound];
    let mut rowbuf = vec![M::zero(); m.n_col()];

    for i in 0..bound {
        if visited[i] {
            continue;
        }
        if rowperm[i] == i {
            visited[i] = true;
            continue;
        }

        for (c, slot) in rowbuf.iter_mut().enumerate() {
            *slot = m.get_el(i, c);
        }
        let mut e = i;
        let mut e_next = rowperm[i];
        while e_next != i {
            debug_assert!(!visited[e_next]);
            visited[e_next] = true;
            m.copy_row_internal(e_next, e);
            e = e_next;
            e_next = rowperm[e_next];
        }
        visited[i] = true;
        for (c, slot) in rowbuf.iter().enumerate() {
            m.set_el(e, c, *slot);
        }
    }
}

/// Permute the rows of the whole matrix `m`. See [`permute_rows_bounded`].
pub fn permute_rows<M: MatrixOps>(m: &mut M, rowperm: &[usize]) {
    let n = m.n_row();
    permute_rows_bounded(m, n, rowperm);
}

/// Permute the columns of `m` in place. Same cycle-decomposition scheme as
/// [`permute_rows`], mirrored onto columns with one column of scratch space.
pub fn permute_cols<M: MatrixOps>(m: &mut M, colperm: &[usize]) {
    let n = m.n_col();
    assert_eq!(colperm.len(), n);
    let mut visited = vec![false; n];
    let mut colbuf = vec![M::zero(); m.n_row()];

    for i in 0..n {
        if visited[i] {
            continue;
        }
        if colperm[i] == i {
            visited[i] = true;
            continue;
        }

        for (r, slot) in colbuf.iter_mut().enumerate() {
            *slot = m.get_el(r, i);
        }
        let mut e = i;
        let mut e_next = colperm[i];
        while e_next != i {
            debug_assert!(!visited[e_next]);
            visited[e_next] = true;
            m.copy_col_internal(e_next, e);
            e = e_next;
            e_next = colperm[e_next];
        }
        visited[i] = true;
        for (r, slot) in colbuf.iter().enumerate() {
            m.set_el(e, i, *slot);
        }
    }
}

/// `out := a + b`.
pub fn add<M: MatrixOps>(a: &M, b: &M, out: &mut M) {
    assert_eq!(a.n_row(), b.n_row());
    assert_eq!(a.n_col(), b.n_col());
    assert_eq!(a.n_row(), out.n_row());
    assert_eq!(a.n_col(), out.n_col());

    for r in 0..a.n_row() {
        out.copy_row_from(r, a, r);
        out.multadd_row_other(r, M::one(), b, r);
    }
}

/// `b += a`, in place.
pub fn add_inplace<M: MatrixOps>(a: &M, b: &mut M) {
    assert_eq!(a.n_row(), b.n_row());
    assert_eq!(a.n_col(), b.n_col());

    for r in 0..b.n_row() {
        b.multadd_row_other(r, M::one(), a, r);
    }
}

/// `out := a * b`, the ordinary triple-loop matrix product.
pub fn mul<M: MatrixOps>(a: &M, b: &M, out: &mut M) {
    assert_eq!(a.n_col(), b.n_row());
    assert_eq!(a.n_row(), out.n_row());
    assert_eq!(b.n_col(), out.n_col());

    for i in 0..out.n_row() {
        for j in 0..out.n_col() {
            let mut x = M::zero();
            for e in 0..a.n_col() {
                x = M::fadd(x, M::fmul(a.get_el(i, e), b.get_el(e, j)));
            }
            out.set_el(i, j, x);
        }
    }
}

/// In-place PLUQ factorization: `P*A*Q = L*U`, `L` unit lower triangular,
/// `U` upper triangular, `P`/`Q` permutations in "from" form. `A` need not
/// be square; one of `L`/`U` is rectangular when it isn't. `A` need not be
/// full rank either: the returned rank is `< min(n_row, n_col)` when it
/// isn't, and the remainder of the matrix reflects the partial elimination.
///
/// Pivoting prefers rows over columns: columns are the outer loop, rows the
/// inner, so that when `A` has at least as many rows as columns and is full
/// rank, no column permutation occurs at all — `InterCompile` depends on
/// this.
pub fn lu_decomp_inplace<M: MatrixOps>(a: &mut M, rowperm: &mut [usize], colperm: &mut [usize]) -> usize {
    assert_eq!(rowperm.len(), a.n_row());
    assert_eq!(colperm.len(), a.n_col());
    for (i, slot) in rowperm.iter_mut().enumerate() {
        *slot = i;
    }
    for (i, slot) in colperm.iter_mut().enumerate() {
        *slot = i;
    }

    let mut i = 0;
    while i < a.n_row().min(a.n_col()) {
        let mut pivot = None;
        'search: for pcol in i..a.n_col() {
            for prow in i..a.n_row() {
                if a.get_el(prow, pcol) != M::zero() {
                    pivot = Some((prow, pcol));
                    break 'search;
                }
            }
        }
        let (prow, pcol) = match pivot {
            Some(p) => p,
            None => break,
        };

        if prow != i {
            rowperm.swap(i, prow);
            a.swap_rows(i, prow);
        }
        if pcol != i {
            colperm.swap(i, pcol);
            a.swap_cols(pcol, i);
        }

        let uii_inv = M::finv(a.get_el(i, i));
        a.mult_col_from(i, i + 1, uii_inv);

        for j in i + 1..a.n_row() {
            let lji = a.get_el(j, i);
            a.multadd_row_from(i, i + 1, lji, j);
        }

        i += 1;
    }

    i
}

/// Determinant of a square LU-factored matrix. Row/column permutations over
/// a field of characteristic 2 have sign 1, so they never enter the product.
pub fn lu_det<M: MatrixOps>(lu: &M) -> M::Elem {
    assert_eq!(lu.n_row(), lu.n_col());
    let mut det = M::one();
    for i in 0..lu.n_col() {
        det = M::fmul(det, lu.get_el(i, i));
    }
    det
}

/// `y_out := P*L*U*Q * x`, out of place.
pub fn lu_mult<M: MatrixOps>(lu: &M, rowperm: &[usize], colperm: &[usize], x: &M, y_out: &mut M) {
    assert_eq!(lu.n_col(), x.n_row());
    assert_eq!(lu.n_row(), y_out.n_row());
    assert_eq!(x.n_col(), y_out.n_col());

    for i in 0..y_out.n_row() {
        y_out.clear_row(i);
    }

    // Multiply with U.
    for i in 0..lu.n_row() {
        let t = rowperm[i];
        for j in (i..lu.n_col()).rev() {
            let alpha = lu.get_el(i, j);
            y_out.multadd_row_other(t, alpha, x, colperm[j]);
        }
    }

    // Multiply with L.
    for i in (0..lu.n_row()).rev() {
        if i >= lu.n_col() {
            for j in (0..lu.n_col()).rev() {
                let alpha = lu.get_el(i, j);
                y_out.multadd_row(rowperm[j], alpha, rowperm[i]);
            }
        } else {
            for j in (0..i).rev() {
                let alpha = lu.get_el(i, j);
                y_out.multadd_row(rowperm[j], alpha, rowperm[i]);
            }
        }
    }
}

/// Solve `P*L*U*Q * x_out = y` for `x_out`, out of place. When `rank` is
/// less than `min(n_row, n_col)`, the components of `x_out` beyond the rank
/// are zeroed, giving one specific representative of the solution set.
pub fn lu_invmult<M: MatrixOps>(
    lu: &M,
    rank: Option<usize>,
    rowperm: &[usize],
    colperm: &[usize],
    y: &M,
    x_out: &mut M,
) {
    assert_eq!(lu.n_col(), x_out.n_row());
    assert_eq!(lu.n_row(), y.n_row());
    assert_eq!(x_out.n_col(), y.n_col());

    let rank = rank.unwrap_or_else(|| lu.n_col().min(lu.n_row()));

    for i in rank..x_out.n_row() {
        x_out.clear_row(colperm[i]);
    }

    // L^-1
    for i in 0..rank {
        x_out.copy_row_from(colperm[i], y, rowperm[i]);
        for j in 0..i {
            let alpha = lu.get_el(i, j);
            x_out.multadd_row(colperm[j], alpha, colperm[i]);
        }
    }

    // U^-1
    for i in (0..rank).rev() {
        for j in i + 1..lu.n_col() {
            let alpha = lu.get_el(i, j);
            x_out.multadd_row(colperm[j], alpha, colperm[i]);
        }
        x_out.mult_row(colperm[i], M::finv(lu.get_el(i, i)));
    }
}

/// `U*x_inout := x_inout`, restricted to the first `min(n_row, n_col)` rows.
pub fn u_mult_inplace<M: MatrixOps>(lu: &M, x_inout: &mut M) {
    for i in 0..lu.n_col().min(lu.n_row()) {
        x_inout.mult_row(i, lu.get_el(i, i));
        for j in i + 1..lu.n_col() {
            let alpha = lu.get_el(i, j);
            x_inout.multadd_row(j, alpha, i);
        }
    }
}

/// `L*x_inout := x_inout`. Requires `x_inout` to have `max(n_row, n_col)`
/// rows: rows `n_col..n_row` are the rectangular remainder below the
/// triangular part when `L` isn't square, and the product spills into them.
pub fn l_mult_inplace<M: MatrixOps>(lu: &M, x_inout: &mut M) {
    for i in (0..lu.n_row()).rev() {
        if i >= lu.n_col() {
            x_inout.clear_row(i);
            for j in (0..lu.n_col()).rev() {
                let alpha = lu.get_el(i, j);
                x_inout.multadd_row(j, alpha, i);
            }
        } else {
            for j in (0..i).rev() {
                let alpha = lu.get_el(i, j);
                x_inout.multadd_row(j, alpha, i);
            }
        }
    }
}

/// `x_inout := U^-1 * x_inout` on the first `rank` rows, honoring an
/// optional `placements` map from logical row `i` to the physical row the
/// codec actually stores it in. `placements = None` means the identity map.
pub fn u_invmult_inplace_p<M: MatrixOps>(lu: &M, rank: usize, x_inout: &mut M, placements: Option<&[usize]>) {
    let p = |i: usize| placements.map_or(i, |pl| pl[i]);
    for i in (0..rank).rev() {
        let pi = p(i);
        for j in i + 1..lu.n_col() {
            let alpha = lu.get_el(i, j);
            x_inout.multadd_row(p(j), alpha, pi);
        }
        x_inout.mult_row(pi, M::finv(lu.get_el(i, i)));
    }
}

/// `x_inout := L^-1 * x_inout` on the first `rank` rows, with the same
/// `placements` convention as [`u_invmult_inplace_p`].
pub fn l_invmult_inplace_p<M: MatrixOps>(lu: &M, rank: usize, x_inout: &mut M, placements: Option<&[usize]>) {
    let p = |i: usize| placements.map_or(i, |pl| pl[i]);
    for i in 0..rank {
        let pi = p(i);
        for j in 0..i {
            let alpha = lu.get_el(i, j);
            x_inout.multadd_row(p(j), alpha, pi);
        }
    }
}

pub fn u_invmult_inplace<M: MatrixOps>(lu: &M, rank: usize, x_inout: &mut M) {
    u_invmult_inplace_p(lu, rank, x_inout, None)
}

pub fn l_invmult_inplace<M: MatrixOps>(lu: &M, rank: usize, x_inout: &mut M) {
    l_invmult_inplace_p(lu, rank, x_inout, None)
}

/// `x_inout := P*L*U*Q * x_inout`, in place. `x_inout` must have at least
/// `max(lu.n_row(), lu.n_col())` rows: the first `lu.n_col()` rows are read
/// as `X`, the first `lu.n_row()` rows of the (post-multiply) result are
/// `Y` — the same backing storage serves both roles, one phase at a time,
/// never as two simultaneously live views.
pub fn lu_mult_inplace<M: MatrixOps>(
    lu: &M,
    inv_rowperm: Option<&[usize]>,
    colperm: Option<&[usize]>,
    x_inout: &mut M,
) {
    assert!(lu.n_col() <= x_inout.n_row());
    assert!(lu.n_row() <= x_inout.n_row());

    if let Some(cp) = colperm {
        permute_rows_bounded(x_inout, lu.n_col(), cp);
    }
    u_mult_inplace(lu, x_inout);
    l_mult_inplace(lu, x_inout);
    if let Some(irp) = inv_rowperm {
        permute_rows_bounded(x_inout, lu.n_row(), irp);
    }
}

/// Solve `P*L*U*Q * x_inout = x_inout` in place; see [`lu_mult_inplace`] for
/// the storage-sharing convention.
pub fn lu_invmult_inplace<M: MatrixOps>(
    lu: &M,
    rank: Option<usize>,
    rowperm: Option<&[usize]>,
    inv_colperm: Option<&[usize]>,
    x_inout: &mut M,
) {
    assert!(lu.n_col() <= x_inout.n_row());
    assert!(lu.n_row() <= x_inout.n_row());
    let rank = rank.unwrap_or_else(|| lu.n_col().min(lu.n_row()));

    if let Some(rp) = rowperm {
        permute_rows_bounded(x_inout, lu.n_row(), rp);
    }
    l_invmult_inplace(lu, rank, x_inout);
    u_invmult_inplace(lu, rank, x_inout);
    if let Some(icp) = inv_colperm {
        permute_rows_bounded(x_inout, lu.n_col(), icp);
    }
}

#[cfg(test)]
mod tests {
    use permutohedron::Heap;

    use super::*;
    use crate::matrix::byte;

    /// Every permutation of a small index set, followed by its inverse,
    /// must restore the matrix exactly -- exhaustively, not just for one
    /// sampled permutation, since `permute_rows`'s cycle decomposition is
    /// the kind of code whose bugs only show up on specific cycle shapes
    /// (fixed points, a single big cycle, several disjoint small ones) that
    /// a handful of hand-picked test permutations can easily miss.
    #[test]
    fn permutation_roundtrip_is_exhaustive_over_small_n() {
        for n in [1usize, 2, 3, 4, 5] {
            let mut idx: Vec<usize> = (0..n).collect();
            for perm in Heap::new(&mut idx) {
                let mut m = byte::Matrix::new(n, 3);
                {
                    let mut v = m.view_mut();
                    for r in 0..n {
                        for c in 0..3 {
                            v.set_el(r, c, (r * 3 + c + 1) as u8);
                        }
                    }
                }
                let before = m.clone();

                let mut inverse = vec![0usize; n];
                for (i, &p) in perm.iter().enumerate() {
                    inverse[p] = i;
                }

                let mut v = m.view_mut();
                permute_rows(&mut v, &perm);
                permute_rows(&mut v, &inverse);

                for r in 0..n {
                    assert_eq!(m.row(r), before.row(r), "perm={:?} n={}", perm, n);
                }
            }
        }
    }
}
