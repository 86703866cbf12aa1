// vim: tw=80

//! Builds the constraint matrix `A` (RFC 6330 §5.3.3), the linear
//! relationship between the intermediate symbols and the source/repair
//! symbols: `A = [LT; LDPC; HDPC]`, stacked row bands.

use crate::gf256;
use crate::matrix::byte::View;
use crate::matrix::generic::MatrixOps;
use crate::rq::params::Params;
use crate::rq::rand::rand;
use crate::rq::tuple::generate_from_isi;

/// Writes one LT row per entry of `isis` into `m` (`isis.len()` x `p.l`).
/// RFC 6330 §5.3.5.3.
pub fn lt_rows(m: &mut View<'_>, p: &Params, isis: &[u32]) {
    assert_eq!(m.n_row(), isis.len());
    assert_eq!(m.n_col(), p.l);
    crate::matrix::generic::clear(m);

    for (i, &isi) in isis.iter().enumerate() {
        let mut t = generate_from_isi(isi, p);
        m.set_el(i, t.b as usize, 1);
        for _ in 1..t.d {
            t.b = (t.b + t.a) % p.w;
            m.set_el(i, t.b as usize, 1);
        }
        while t.b1 >= p.p {
            t.b1 = (t.b1 + t.a1) % p.p1;
        }
        m.set_el(i, (p.w + t.b1) as usize, 1);
        for _ in 1..t.d1 {
            t.b1 = (t.b1 + t.a1) % p.p1;
            while t.b1 >= p.p {
                t.b1 = (t.b1 + t.a1) % p.p1;
            }
            m.set_el(i, (p.w + t.b1) as usize, 1);
        }
    }
}

/// Writes the `S` LDPC rows (`p.s` x `p.l`) into `m`. RFC 6330 §5.3.3.3.
pub fn ldpc_rows(m: &mut View<'_>, p: &Params) {
    assert_eq!(m.n_row(), p.s as usize);
    assert_eq!(m.n_col(), p.l);
    crate::matrix::generic::clear(m);

    for i in 0..p.b {
        let a = 1 + i / p.s;
        let mut b = i % p.s;
        m.set_el(b as usize, i as usize, 1);
        b = (b + a) % p.s;
        m.set_el(b as usize, i as usize, 1);
        b = (b + a) % p.s;
        m.set_el(b as usize, i as usize, 1);
    }

    for i in 0..p.s {
        m.set_el(i as usize, (i + p.b) as usize, 1);
    }

    for i in 0..p.s {
        let a = i % p.p;
        let b = (i + 1) % p.p;
        m.set_el(i as usize, (p.w + a) as usize, 1);
        m.set_el(i as usize, (p.w + b) as usize, 1);
    }
}

/// The "spec-exact" HDPC construction (RFC 6330 §5.3.3.3): builds `MT` and
/// `GAMMA` explicitly and multiplies them. `O(H * (K'+S)^2)` work and
/// `O((K'+S)^2)` extra storage, but it's the clearest statement of what the
/// HDPC rows actually are; kept alongside [`hdpc_rows`] (the faster,
/// equivalent construction) with a test that the two agree.
pub fn hdpc_rows_specexact(m: &mut View<'_>, p: &Params) {
    assert_eq!(m.n_row(), p.h as usize);
    assert_eq!(m.n_col(), p.l);

    let d = (p.kprime + p.s) as usize;
    let mut mt = crate::matrix::byte::Matrix::new(p.h as usize, d);
    {
        let mut mtv = mt.view_mut();
        for j in 0..d - 1 {
            let a = rand(j as u32 + 1, 6, p.h);
            let b = (a + rand(j as u32 + 1, 7, p.h - 1) + 1) % p.h;
            mtv.set_el(a as usize, j, 1);
            mtv.set_el(b as usize, j, 1);
        }
        let mut val = 1u8;
        for j in 0..p.h as usize {
            mtv.set_el(j, d - 1, val);
            val = gf256::mul(val, 2);
        }
    }

    let mut gamma = crate::matrix::byte::Matrix::new(d, d);
    {
        let mut gv = gamma.view_mut();
        let mut val = 1u8;
        for i in 0..d {
            for j in i..d {
                gv.set_el(j, j - i, val);
            }
            val = gf256::mul(val, 2);
        }
    }

    let mut g_hdpc = m.subview_mut(0, 0, p.h as usize, d);
    crate::matrix::generic::mul(&mt.view_mut(), &gamma.view_mut(), &mut g_hdpc);

    let mut i_h = m.subview_mut(0, d, p.h as usize, p.h as usize);
    crate::matrix::generic::clear(&mut i_h);
    for i in 0..p.h as usize {
        i_h.set_el(i, i, 1);
    }
}

/// The faster, column-by-column HDPC construction (RFC 6330 §5.3.3.3),
/// built right-to-left: column `j` is column `j+1` scaled by `alpha=2`
/// with two bit flips added in, which is
/// algebraically identical to reading the corresponding column out of
/// `MT * GAMMA` but touches each output element once instead of summing a
/// row of up to `K'+S` products.
pub fn hdpc_rows(m: &mut View<'_>, p: &Params) {
    assert_eq!(m.n_row(), p.h as usize);
    assert_eq!(m.n_col(), p.l);

    let d = (p.kprime + p.s) as usize;
    let mut g_hdpc = m.subview_mut(0, 0, p.h as usize, d);

    let mut val = 1u8;
    for j in 0..p.h as usize {
        g_hdpc.set_el(j, d - 1, val);
        val = gf256::mul(val, 2);
    }

    for j in (0..d - 1).rev() {
        for i in 0..p.h as usize {
            let v = gf256::mul(2, g_hdpc.get_el(i, j + 1));
            g_hdpc.set_el(i, j, v);
        }

        let mut a = rand(j as u32 + 1, 6, p.h) as usize;
        let v = g_hdpc.get_el(a, j);
        g_hdpc.set_el(a, j, gf256::add(1, v));
        a = (a + rand(j as u32 + 1, 7, p.h - 1) as usize + 1) % p.h as usize;
        let v = g_hdpc.get_el(a, j);
        g_hdpc.set_el(a, j, gf256::add(1, v));
    }

    let mut i_h = m.subview_mut(0, d, p.h as usize, p.h as usize);
    crate::matrix::generic::clear(&mut i_h);
    for i in 0..p.h as usize {
        i_h.set_el(i, i, 1);
    }
}

/// `(n_rows, n_cols)` of the constraint matrix for `n_esis` encoding
/// symbol IDs. RFC 6330 §5.3.3.
pub fn constraint_matrix_dim(p: &Params, n_esis: usize) -> (usize, usize) {
    let n_rows = n_esis + (p.kprime - p.k) as usize + p.s as usize + p.h as usize;
    (n_rows, p.l)
}

/// Builds the full constraint matrix `A = [LT; LDPC; HDPC]` into `m`, whose
/// shape must match [`constraint_matrix_dim`]. `esis` are converted to
/// ISIs and padded up to `K'` the way `InterCompile` always does (the
/// padding symbols are implicit zero source symbols, never transmitted).
/// Takes `m` by value since assembling the three row bands needs to split
/// it into disjoint, independently-mutable sub-views; the backing storage
/// is the caller's and outlives this call.
pub fn build_constraint_matrix(m: View<'_>, p: &Params, esis: &[u32]) {
    let (n_rows, n_cols) = constraint_matrix_dim(p, esis.len());
    assert_eq!(m.n_row(), n_rows);
    assert_eq!(m.n_col(), n_cols);

    let n_pad = (p.kprime - p.k) as usize;
    let mut isis = Vec::with_capacity(esis.len() + n_pad);
    for &esi in esis {
        isis.push(if esi >= p.k { esi + p.kprime - p.k } else { esi });
    }
    for i in 0..n_pad {
        isis.push(p.k + i as u32);
    }

    let (mut lt_and_ldpc, mut hdpc) = m.split_rows_mut(isis.len() + p.s as usize);
    let (mut lt, mut ldpc) = lt_and_ldpc.split_rows_mut(isis.len());
    lt_rows(&mut lt, p, &isis);
    ldpc_rows(&mut ldpc, p);
    hdpc_rows(&mut hdpc, p);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::byte::Matrix;

    #[test]
    fn ldpc_shape_and_double_diagonal() {
        let p = Params::for_k(50).unwrap();
        let mut m = Matrix::new(p.s as usize, p.l);
        ldpc_rows(&mut m.view_mut(), &p);
        for i in 0..p.s {
            let a = i % p.p;
            let b = (i + 1) % p.p;
            assert_eq!(m.view_mut().get_el(i as usize, (p.w + a) as usize), 1);
            assert_eq!(m.view_mut().get_el(i as usize, (p.w + b) as usize), 1);
        }
    }

    #[test]
    fn hdpc_fast_matches_specexact() {
        let p = Params::for_k(30).unwrap();
        let mut fast = Matrix::new(p.h as usize, p.l);
        let mut exact = Matrix::new(p.h as usize, p.l);
        hdpc_rows(&mut fast.view_mut(), &p);
        hdpc_rows_specexact(&mut exact.view_mut(), &p);
        for r in 0..p.h as usize {
            assert_eq!(fast.row(r), exact.row(r));
        }
    }

    #[test]
    fn constraint_matrix_has_expected_shape() {
        let p = Params::for_k(20).unwrap();
        let esis: Vec<u32> = (0..p.k).collect();
        let (n_rows, n_cols) = constraint_matrix_dim(&p, esis.len());
        let mut m = Matrix::new(n_rows, n_cols);
        build_constraint_matrix(m.view_mut(), &p, &esis);
        assert_eq!(n_rows, p.kprime as usize + p.s as usize + p.h as usize);
        assert_eq!(n_cols, p.l as usize);
    }
}
