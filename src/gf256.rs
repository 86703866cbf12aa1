// vim: tw=80

//! Arithmetic over GF(2^8), the field RFC 6330 builds its symbol algebra on.
//!
//! The field is generated by the irreducible polynomial `x^8+x^4+x^3+x^2+1`
//! (0x11D) with `alpha = 2` as a generator of the multiplicative group.
//! Addition is XOR; multiplication and inversion go through a pair of
//! log/exp tables built once, lazily, the first time either is needed.

use lazy_static::lazy_static;

/// The field's reduction polynomial, RFC 6330 section 5.7.
const POLY: u16 = 0x11D;

struct Tables {
    /// `exp[i] = alpha^i`.  Sized to `2*255` so that `exp[log(a)+log(b)]`
    /// never needs a modulo: the two logs are each at most 254, so their sum
    /// never exceeds 508.
    exp: [u8; 510],
    /// `log[v]` is the discrete log of `v` base `alpha`, for `v` in `1..=255`.
    /// `log[0]` is a sentinel that must never be read.
    log: [u8; 256],
}

impl Tables {
    fn build() -> Self {
        let mut exp = [0u8; 510];
        let mut log = [0u8; 256];

        let mut val: u16 = 1;
        for i in 0..255usize {
            exp[i] = val as u8;
            log[val as usize] = i as u8;
            val <<= 1;
            if val & 0x100 != 0 {
                val ^= POLY;
            }
        }
        // Extend so that exp[i] for i in 255..510 repeats the cycle, which is
        // what lets multiplication skip the modulo on the table index.
        for i in 255..510usize {
            exp[i] = exp[i - 255];
        }
        log[0] = u8::MAX; // never read; see module docs.

        Tables { exp, log }
    }
}

lazy_static! {
    static ref TABLES: Tables = Tables::build();
}

/// GF(2^8) addition (and subtraction: the field has characteristic 2).
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Discrete logarithm of `val` base `alpha`.  `val` must be nonzero.
pub fn log(val: u8) -> u8 {
    debug_assert_ne!(val, 0, "log(0) is undefined");
    TABLES.log[val as usize]
}

/// `alpha^e`, where `e` may range up to twice the field's order without
/// wrapping (see [`Tables::exp`]).
pub fn exp(e: usize) -> u8 {
    TABLES.exp[e]
}

/// GF(2^8) multiplication.
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        0
    } else {
        exp(log(a) as usize + log(b) as usize)
    }
}

/// GF(2^8) multiplicative inverse.  `v` must be nonzero.
pub fn inv(v: u8) -> u8 {
    debug_assert_ne!(v, 0, "0 has no multiplicative inverse");
    exp(255 - log(v) as usize)
}
