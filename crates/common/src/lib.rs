//! Pieces shared by every crate in the workspace: logging setup and the
//! small serialisable types returned by infrastructure endpoints.

pub mod types;
pub mod utils;
