// vim: tw=80

//! The RaptorQ triple generator, RFC 6330 §5.3.5.4.
//!
//! [`generate_from_esi`] maps an encoding symbol ID to the six values that
//! identify which intermediate symbols an LT row touches: `(d, a, b, d1,
//! a1, b1)`.

use crate::rq::degree::deg;
use crate::rq::params::Params;
use crate::rq::rand::rand;

/// The six values RFC 6330 §5.3.5.4 derives for one encoding symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuple {
    pub d: u32,
    pub a: u32,
    pub b: u32,
    pub d1: u32,
    pub a1: u32,
    pub b1: u32,
}

/// Generates the tuple for internal symbol ID `x` (used directly during
/// constraint matrix construction, where rows are already indexed by ISI).
pub fn generate_from_isi(x: u32, p: &Params) -> Tuple {
    let a_mix = (53591 + p.j * 997) | 1;
    let b_mix = 10267 * (p.j + 1);
    let y = b_mix.wrapping_add(x.wrapping_mul(a_mix));
    let v = rand(y, 0, 1 << 20);

    let d = deg(v, p.w);
    let a = 1 + rand(y, 1, p.w - 1);
    let b = rand(y, 2, p.w);
    let d1 = if d < 4 { 2 + rand(x, 3, 2) } else { 2 };
    let a1 = 1 + rand(x, 4, p.p1 - 1);
    let b1 = rand(x, 5, p.p1);

    Tuple { d, a, b, d1, a1, b1 }
}

/// Generates the tuple for encoding symbol ID `x`, which for repair
/// symbols (`x >= K`) is first remapped to the corresponding ISI by
/// skipping the padding symbols between `K` and `K'`.
pub fn generate_from_esi(x: u32, p: &Params) -> Tuple {
    let isi = if x >= p.k { x + p.kprime - p.k } else { x };
    generate_from_isi(isi, p)
}
