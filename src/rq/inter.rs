// vim: tw=80

//! The intermediate-block half of the codec pipeline: turns a set of
//! received (source or repair) symbols into the `L` intermediate symbols
//! RFC 6330 builds everything else from.
//!
//! Four-call lifecycle, each type owning the storage it needs rather than
//! writing into a caller-managed arena: [`InterWorkMem::new`] collects
//! received symbol IDs via [`InterWorkMem::add_ids`],
//! [`InterWorkMem::compile`] builds and LU-factors the constraint matrix
//! into an [`InterProgram`], and [`InterProgram::execute`] runs the actual
//! symbol data through it.

use crate::error::{fail, Error};
use crate::matrix::byte::{self, View};
use crate::matrix::generic::{self, MatrixOps};
use crate::rq::generators;
use crate::rq::params::Params;

/// Advisory size estimate for the buffers an `InterWorkMem`/`InterProgram`
/// pair would need. Since both types here own their storage and size
/// themselves, nothing actually has to be pre-allocated against this
/// estimate; it exists for callers who want to budget memory or report
/// usage up front.
///
/// Returns `(work_mem_bytes, prog_mem_bytes, intermediate_symbol_count)`.
pub fn inter_mem_sizes(k: u32, max_extra: u32) -> Result<(usize, usize, usize), Error> {
    let p = match Params::for_k(k) {
        Some(p) => p,
        None => return fail(Error::Edom, "unsupported K value"),
    };
    let max_isi_count = (max_extra + p.kprime) as usize;
    let work_mem_bytes = max_isi_count * std::mem::size_of::<u32>();

    let n_rows = max_isi_count + p.s as usize + p.h as usize;
    let n_cols = p.l as usize;
    let prog_mem_bytes = std::mem::size_of::<usize>() * n_rows + n_rows * n_cols;

    Ok((work_mem_bytes, prog_mem_bytes, n_cols))
}

/// Accumulates the ESIs of received symbols for one source block, ready to
/// be compiled into an [`InterProgram`].
pub struct InterWorkMem {
    params: Params,
    esi_max: usize,
    esis: Vec<u32>,
}

impl InterWorkMem {
    pub fn new(k: u32, max_extra: u32) -> Result<Self, Error> {
        let params = match Params::for_k(k) {
            Some(p) => p,
            None => return fail(Error::Edom, "unsupported K value"),
        };
        let esi_max = (k + max_extra) as usize;
        Ok(InterWorkMem { params, esi_max, esis: Vec::with_capacity(esi_max) })
    }

    /// Registers `count` consecutive ESIs starting at `begin`. If fewer
    /// than `count` fit under this work-mem's capacity, as many as fit are
    /// still added and `Err(Error::MaxIdsReached)` is returned -- a partial
    /// success, not an all-or-nothing failure.
    pub fn add_ids(&mut self, begin: u32, count: u32) -> Result<(), Error> {
        let mut count = count as usize;
        let mut result = Ok(());
        if self.esis.len() + count > self.esi_max {
            count = self.esi_max.saturating_sub(self.esis.len());
            result = fail(Error::MaxIdsReached, "maximum number of ESIs reached");
        }
        for i in 0..count {
            self.esis.push(begin + i as u32);
        }
        result
    }

    pub fn n_esi(&self) -> usize {
        self.esis.len()
    }

    /// Builds the constraint matrix from the registered ESIs and
    /// PLUQ-factors it. `Err(Error::InsuffIds)` if too few distinct
    /// symbols were registered to recover all `L` intermediate symbols.
    pub fn compile(&self) -> Result<InterProgram, Error> {
        let p = &self.params;
        let n_pad = (p.kprime - p.k) as usize;
        let n_rows = self.esis.len() + n_pad + p.s as usize + p.h as usize;
        let n_cols = p.l as usize;

        let mut lu = byte::Matrix::new(n_rows, n_cols);
        generators::build_constraint_matrix(lu.view_mut(), p, &self.esis);

        let mut rowperm = vec![0usize; n_rows];
        let mut colperm = vec![0usize; n_cols];
        let rank = {
            let mut view = lu.view_mut();
            generic::lu_decomp_inplace(&mut view, &mut rowperm, &mut colperm)
        };
        if rank < n_cols {
            return fail(Error::InsuffIds, "not enough symbols to recover the source block");
        }

        // The pivoting strategy never permutes columns when the matrix has
        // at least as many rows as columns and is full rank;
        // `lu_decomp_inplace`'s doc comment commits to this.
        debug_assert!((0..n_cols).all(|i| colperm[i] == i));

        Ok(InterProgram { lu, rowperm, rank, n_esi: self.esis.len() })
    }
}

/// A compiled, LU-factored constraint matrix ready to turn received symbol
/// data into the intermediate block.
pub struct InterProgram {
    lu: byte::Matrix,
    rowperm: Vec<usize>,
    rank: usize,
    n_esi: usize,
}

impl InterProgram {
    /// Number of intermediate symbols (`L`) this program produces.
    pub fn intermediate_symbol_count(&self) -> usize {
        self.lu.n_col()
    }

    /// Solves for the `L` intermediate symbols given the `n_esi` received
    /// symbols' payloads (`in_syms`, `n_esi * sym_size` bytes, in the same
    /// order the ESIs were registered in) and writes them into
    /// `inter_syms` (at least `L * sym_size` bytes).
    ///
    /// Validates `in_syms`'s length: a too-small input buffer returns
    /// `Error::Enomem` rather than reading out of bounds.
    pub fn execute(&mut self, sym_size: usize, in_syms: &[u8], inter_syms: &mut [u8]) -> Result<(), Error> {
        let n_col = self.lu.n_col();
        if in_syms.len() < self.n_esi * sym_size {
            return fail(Error::Enomem, "too little symbol data provided");
        }
        if inter_syms.len() < n_col * sym_size {
            return fail(Error::Enomem, "not enough space for the intermediate block");
        }

        let mut ib = View::from_slice_mut(inter_syms, n_col, sym_size);
        for i in 0..self.rank {
            let l = self.rowperm[i];
            if l >= self.n_esi {
                // Padding, LDPC, or HDPC row: the right-hand side is zero.
                ib.clear_row(i);
            } else {
                ib.row_mut(i).copy_from_slice(&in_syms[l * sym_size..(l + 1) * sym_size]);
            }
        }

        let rank = self.rank;
        let mut lu_view = self.lu.view_mut();
        let lu_sub = lu_view.subview_mut(0, 0, rank, n_col);
        generic::lu_invmult_inplace(&lu_sub, None, None, None, &mut ib);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_k() {
        assert!(InterWorkMem::new(0, 10).is_err());
        assert!(InterWorkMem::new(crate::rq::RQ_MAX_K + 1, 10).is_err());
    }

    #[test]
    fn add_ids_clamps_at_capacity() {
        let mut wm = InterWorkMem::new(5, 2).unwrap();
        assert!(wm.add_ids(0, 5).is_ok());
        let err = wm.add_ids(5, 10);
        assert_eq!(err, Err(Error::MaxIdsReached));
        assert_eq!(wm.n_esi(), 7);
    }

    #[test]
    fn compile_fails_with_too_few_symbols() {
        let mut wm = InterWorkMem::new(20, 5).unwrap();
        wm.add_ids(0, 3).unwrap();
        assert_eq!(wm.compile().err(), Some(Error::InsuffIds));
    }

    #[test]
    fn solving_with_exactly_k_symbols_succeeds() {
        let k = 10u32;
        let sym_size = 4usize;
        let mut wm = InterWorkMem::new(k, 5).unwrap();
        wm.add_ids(0, k).unwrap();
        let mut prog = wm.compile().unwrap();

        let in_syms: Vec<u8> = (0..k as usize * sym_size).map(|i| i as u8).collect();
        let mut inter_syms = vec![0u8; prog.intermediate_symbol_count() * sym_size];
        prog.execute(sym_size, &in_syms, &mut inter_syms).unwrap();
        assert_eq!(inter_syms.len(), prog.intermediate_symbol_count() * sym_size);
    }

    #[test]
    fn execute_rejects_undersized_buffers() {
        let k = 10u32;
        let mut wm = InterWorkMem::new(k, 5).unwrap();
        wm.add_ids(0, k).unwrap();
        let mut prog = wm.compile().unwrap();

        let sym_size = 4;
        let in_syms = vec![0u8; (k as usize - 1) * sym_size];
        let mut inter_syms = vec![0u8; prog.intermediate_symbol_count() * sym_size];
        assert_eq!(prog.execute(sym_size, &in_syms, &mut inter_syms), Err(Error::Enomem));
    }
}
