// vim: tw=80

//! The output-symbol half of the codec pipeline: turns the intermediate
//! block back into source or repair symbols for any requested set of
//! ESIs. RFC 6330 §5.3.5.3.
//!
//! [`OutWorkMem::new`] collects the ESIs to generate via
//! [`OutWorkMem::add_ids`], [`OutWorkMem::compile`] freezes them into an
//! [`OutProgram`], and [`OutProgram::execute`] reads the intermediate block
//! and writes out the requested symbols.

use crate::error::{fail, Error};
use crate::rq::params::Params;
use crate::rq::tuple;

/// Advisory size estimate for the buffers an `OutWorkMem`/`OutProgram`
/// pair would need. Returns `(work_mem_bytes, prog_mem_bytes)`; neither is
/// load-bearing since [`OutWorkMem`]/[`OutProgram`] own their storage.
pub fn out_mem_sizes(n_out_sym_num: usize) -> (usize, usize) {
    let sz = n_out_sym_num * std::mem::size_of::<u32>();
    (sz, sz)
}

/// Accumulates the ESIs of symbols to generate from one intermediate
/// block.
pub struct OutWorkMem {
    params: Params,
    esi_max: usize,
    esis: Vec<u32>,
}

impl OutWorkMem {
    pub fn new(k: u32, esi_capacity: usize) -> Result<Self, Error> {
        let params = match Params::for_k(k) {
            Some(p) => p,
            None => return fail(Error::Edom, "unsupported K value"),
        };
        Ok(OutWorkMem { params, esi_max: esi_capacity, esis: Vec::with_capacity(esi_capacity) })
    }

    /// See [`crate::rq::inter::InterWorkMem::add_ids`] for the
    /// partial-success contract.
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

    /// Freezes the registered ESIs into an executable program. There is no
    /// caller-sized buffer to validate here -- `OutProgram` allocates what
    /// it needs -- so this step can't fail; see `OutProgram::execute` for
    /// the size checks that matter (the output buffer actually being long
    /// enough for the requested symbols).
    pub fn compile(&self) -> OutProgram {
        OutProgram { params: self.params, esis: self.esis.clone() }
    }
}

/// A frozen list of ESIs to generate, ready to execute against an
/// intermediate block.
pub struct OutProgram {
    params: Params,
    esis: Vec<u32>,
}

impl OutProgram {
    pub fn n_esi(&self) -> usize {
        self.esis.len()
    }

    /// Reads the `L`-symbol intermediate block (`inter_syms`, at least
    /// `L * sym_size` bytes) and writes the requested symbols into
    /// `out_syms` (at least `n_esi * sym_size` bytes), in the order their
    /// ESIs were registered.
    pub fn execute(&self, sym_size: usize, inter_syms: &[u8], out_syms: &mut [u8]) -> Result<(), Error> {
        let p = &self.params;
        let l = p.l as usize;
        if inter_syms.len() < l * sym_size {
            return fail(Error::Enomem, "intermediate block too small");
        }
        if out_syms.len() < self.esis.len() * sym_size {
            return fail(Error::Enomem, "not enough space for generated symbols");
        }

        let row = |r: usize| -> &[u8] { &inter_syms[r * sym_size..(r + 1) * sym_size] };

        for (i, &esi) in self.esis.iter().enumerate() {
            let mut t = tuple::generate_from_esi(esi, p);
            let out = &mut out_syms[i * sym_size..(i + 1) * sym_size];
            out.copy_from_slice(row(t.b as usize));

            for _ in 1..t.d {
                t.b = (t.b + t.a) % p.w;
                xor_into(out, row(t.b as usize));
            }

            while t.b1 >= p.p {
                t.b1 = (t.b1 + t.a1) % p.p1;
            }
            xor_into(out, row((p.w + t.b1) as usize));

            for _ in 1..t.d1 {
                loop {
                    t.b1 = (t.b1 + t.a1) % p.p1;
                    if t.b1 < p.p {
                        break;
                    }
                }
                xor_into(out, row((p.w + t.b1) as usize));
            }
        }

        Ok(())
    }
}

fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}
