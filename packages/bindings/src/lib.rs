pub mod msg;

pub use msg::{CcvMsg, CcvQuery, CcvSudoMsg};
