mod multitest;

pub use multitest::{CcvApp, CcvAppWrapped, CcvError, CcvModule, BLOCK_TIME};
