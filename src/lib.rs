// vim: tw=80

//! RFC 6330 RaptorQ forward error correction: GF(2)/GF(256) matrix
//! algebra, the RaptorQ constraint matrix construction, and the
//! intermediate-block/output-symbol codec pipeline.

pub mod error;
pub mod gf256;
pub mod matrix;
pub mod rq;

pub use error::Error;
pub use rq::inter::{inter_mem_sizes, InterProgram, InterWorkMem};
pub use rq::outer::{out_mem_sizes, OutProgram, OutWorkMem};
pub use rq::params::Params;
pub use rq::{RQ_DEFAULT_MAX_EXTRA, RQ_MAX_K};
