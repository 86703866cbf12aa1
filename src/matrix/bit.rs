// vim: tw=80

//! Row-major GF(2) matrix views, packed one bit per element into `u32`
//! words.
//!
//! Shape- and aliasing-wise this mirrors [`crate::matrix::byte`] exactly;
//! what differs is the element addressing (`word = r*stride + c/32`,
//! `bit = c % 32`) and that every row operation must mask the partial word
//! at the tail (and, for [`View::multadd_row_from`], the partial word at
//! the head) so that bits outside `0..n_col` are never touched.

use crate::matrix::field::{FieldOps, Gf2};
use crate::matrix::generic::MatrixOps;

const BITS: usize = u32::BITS as usize;

fn word_of(c: usize) -> usize {
    c / BITS
}

fn bit_of(c: usize) -> usize {
    c % BITS
}

fn mask(bit: usize) -> u32 {
    1u32 << bit
}

/// Number of `u32` words needed to hold `n_col` bits.
pub fn row_words(n_col: usize) -> usize {
    (n_col + BITS - 1) / BITS
}

/// An owned, zero-initialized GF(2) matrix.
#[derive(Clone, Debug)]
pub struct Matrix {
    n_row: usize,
    n_col: usize,
    stride: usize, // words per row
    data: Vec<u32>,
}

impl Matrix {
    pub fn new(n_row: usize, n_col: usize) -> Self {
        let stride = row_words(n_col);
        Matrix { n_row, n_col, stride, data: vec![0u32; n_row * stride] }
    }

    pub fn n_row(&self) -> usize {
        self.n_row
    }

    pub fn n_col(&self) -> usize {
        self.n_col
    }

    pub fn view_mut(&mut self) -> View<'_> {
        View { n_row: self.n_row, n_col: self.n_col, stride: self.stride, data: &mut self.data }
    }
}

pub struct View<'a> {
    n_row: usize,
    n_col: usize,
    stride: usize,
    data: &'a mut [u32],
}

impl<'a> View<'a> {
    fn word_offset(&self, r: usize, c: usize) -> usize {
        debug_assert!(r < self.n_row);
        r * self.stride + word_of(c)
    }

    /// Mask covering bits `[offs % BITS, BITS)` of the word that contains
    /// column `offs` — the partial first word a `_from`-suffixed op starts
    /// at.
    fn head_mask(offs: usize) -> u32 {
        !(mask(bit_of(offs)).wrapping_sub(1))
    }

    /// Mask covering bits `[0, (last_col % BITS) + 1)` — the tail mask for
    /// a row whose last valid column is `last_col`.
    fn tail_mask(last_col: usize) -> u32 {
        let b = bit_of(last_col);
        if b == BITS - 1 {
            u32::MAX
        } else {
            (mask(b) << 1) - 1
        }
    }

    pub fn subview_mut(&mut self, row_offs: usize, col_offs: usize, n_row: usize, n_col: usize) -> View<'_> {
        assert_eq!(col_offs, 0, "GF(2) subviews may only narrow rows, not columns");
        assert_eq!(n_col, self.n_col);
        assert!(row_offs + n_row <= self.n_row);
        let start = row_offs * self.stride;
        let len = n_row * self.stride;
        View { n_row, n_col, stride: self.stride, data: &mut self.data[start..start + len] }
    }

    pub fn split_rows_mut(self, at: usize) -> (View<'a>, View<'a>) {
        assert!(at <= self.n_row);
        let (top, bottom) = self.data.split_at_mut(at * self.stride);
        (
            View { n_row: at, n_col: self.n_col, stride: self.stride, data: top },
            View { n_row: self.n_row - at, n_col: self.n_col, stride: self.stride, data: bottom },
        )
    }

    pub fn toggle_el(&mut self, r: usize, c: usize) {
        let w = self.word_offset(r, c);
        self.data[w] ^= mask(bit_of(c));
    }
}

impl<'a> MatrixOps for View<'a> {
    type Elem = u8;

    fn zero() -> u8 {
        0
    }
    fn one() -> u8 {
        1
    }
    fn fadd(a: u8, b: u8) -> u8 {
        Gf2::add(a, b)
    }
    fn fmul(a: u8, b: u8) -> u8 {
        Gf2::mul(a, b)
    }
    fn finv(a: u8) -> u8 {
        Gf2::inv(a)
    }

    fn n_row(&self) -> usize {
        self.n_row
    }
    fn n_col(&self) -> usize {
        self.n_col
    }

    fn get_el(&self, r: usize, c: usize) -> u8 {
        debug_assert!(c < self.n_col);
        let w = self.word_offset(r, c);
        ((self.data[w] & mask(bit_of(c))) != 0) as u8
    }

    fn set_el(&mut self, r: usize, c: usize, v: u8) {
        debug_assert!(c < self.n_col);
        let w = self.word_offset(r, c);
        let m = mask(bit_of(c));
        if v != 0 {
            self.data[w] |= m;
        } else {
            self.data[w] &= !m;
        }
    }

    fn swap_rows(&mut self, r1: usize, r2: usize) {
        if r1 == r2 {
            return;
        }
        let o1 = self.word_offset(r1, 0);
        let o2 = self.word_offset(r2, 0);
        for i in 0..self.stride {
            self.data.swap(o1 + i, o2 + i);
        }
    }

    fn swap_cols(&mut self, c1: usize, c2: usize) {
        if c1 == c2 {
            return;
        }
        for r in 0..self.n_row {
            let v1 = self.get_el(r, c1);
            let v2 = self.get_el(r, c2);
            self.set_el(r, c1, v2);
            self.set_el(r, c2, v1);
        }
    }

    fn clear_row(&mut self, r: usize) {
        let o = self.word_offset(r, 0);
        self.data[o..o + self.stride].fill(0);
    }

    fn mult_row(&mut self, r: usize, alpha: u8) {
        // alpha in {0, 1} by construction; 1 is the identity.
        if alpha == 0 {
            self.clear_row(r);
        }
    }

    fn multadd_row_from(&mut self, src_r: usize, offs: usize, alpha: u8, dst_r: usize) {
        if alpha == 0 || self.n_col == 0 {
            return;
        }
        let src_row = src_r * self.stride;
        let dst_row = dst_r * self.stride;
        let first_word = word_of(offs);

        // Partial first word, masked to [offs % BITS, BITS).
        let m = Self::head_mask(offs);
        let sv = self.data[src_row + first_word];
        self.data[dst_row + first_word] ^= sv & m;

        // Remaining whole words.
        for w in first_word + 1..self.stride {
            self.data[dst_row + w] ^= self.data[src_row + w];
        }
    }

    fn mult_col_from(&mut self, c: usize, offs: usize, alpha: u8) {
        // Only alpha == 0 performs any work here. alpha == 1 ("scale by the
        // identity") is a no-op, and any other nonzero value is *silently*
        // treated the same as 1 -- intentional (see DESIGN.md), not a bug
        // to "fix", since callers never pass anything but 0 or 1.
        if alpha != 0 {
            return;
        }
        let m = !mask(bit_of(c));
        for r in offs..self.n_row {
            let w = self.word_offset(r, c);
            self.data[w] &= m;
        }
    }

    fn copy_row_internal(&mut self, src_r: usize, dst_r: usize) {
        if src_r == dst_r {
            return;
        }
        let src = src_r * self.stride;
        let dst = dst_r * self.stride;
        self.data.copy_within(src..src + self.stride, dst);
    }

    fn copy_col_internal(&mut self, src_c: usize, dst_c: usize) {
        if src_c == dst_c {
            return;
        }
        for r in 0..self.n_row {
            let v = self.get_el(r, src_c);
            self.set_el(r, dst_c, v);
        }
    }

    fn row_iszero(&self, r: usize) -> bool {
        if self.n_col == 0 {
            return true;
        }
        let o = r * self.stride;
        let last_word = word_of(self.n_col - 1);
        for w in &self.data[o..o + last_word] {
            if *w != 0 {
                return false;
            }
        }
        let m = Self::tail_mask(self.n_col - 1);
        self.data[o + last_word] & m == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::generic;

    #[test]
    fn tail_masking_ignores_padding_bits() {
        let mut m = Matrix::new(1, 3);
        {
            let mut v = m.view_mut();
            // Set a bit beyond n_col, in the same backing word.
            v.data[0] |= 1 << 5;
        }
        assert!(m.view_mut().row_iszero(0));
    }

    #[test]
    fn permutation_roundtrip() {
        let mut m = Matrix::new(4, 4);
        {
            let mut v = m.view_mut();
            for i in 0..4 {
                v.set_el(i, i, 1);
            }
            v.set_el(0, 2, 1);
            v.set_el(3, 1, 1);
        }
        let before = m.clone();
        let perm = [2usize, 0, 3, 1];
        let inverse = {
            let mut inv = [0usize; 4];
            for (i, &p) in perm.iter().enumerate() {
                inv[p] = i;
            }
            inv
        };

        let mut v = m.view_mut();
        generic::permute_rows(&mut v, &perm);
        generic::permute_rows(&mut v, &inverse);

        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(m.view_mut().get_el(r, c), before.clone().view_mut().get_el(r, c));
            }
        }
    }

    #[test]
    fn lu_decomp_matches_byte_variant() {
        use crate::matrix::byte;

        let bits: [[u8; 3]; 3] = [[1, 1, 0], [0, 1, 1], [1, 0, 1]];

        let mut bm = Matrix::new(3, 3);
        let mut ym = byte::Matrix::new(3, 3);
        {
            let mut bv = bm.view_mut();
            let mut yv = ym.view_mut();
            for r in 0..3 {
                for c in 0..3 {
                    bv.set_el(r, c, bits[r][c]);
                    yv.set_el(r, c, bits[r][c]);
                }
            }
        }

        let mut brp = vec![0usize; 3];
        let mut bcp = vec![0usize; 3];
        let brank = generic::lu_decomp_inplace(&mut bm.view_mut(), &mut brp, &mut bcp);

        let mut yrp = vec![0usize; 3];
        let mut ycp = vec![0usize; 3];
        let yrank = generic::lu_decomp_inplace(&mut ym.view_mut(), &mut yrp, &mut ycp);

        assert_eq!(brank, yrank);
        assert_eq!(brp, yrp);
        assert_eq!(bcp, ycp);
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(bm.view_mut().get_el(r, c), ym.view_mut().get_el(r, c) & 1);
            }
        }
    }
}
