// vim: tw=80

//! Dense matrix views over GF(2) and GF(256), and the linear algebra
//! (PLUQ factorization, permutation, triangular solves) the RaptorQ codec
//! builds on.

pub mod bit;
pub mod byte;
pub mod field;
pub mod generic;

pub use field::{FieldOps, Gf2, Gf256};
pub use generic::MatrixOps;
