use thiserror::Error;

use crate::runtime::UnitId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("render unit {0:?} is not mounted")]
    UnknownUnit(UnitId),
    #[error("flush stopped after {0} renders; a unit keeps requesting re-renders")]
    FlushOverflow(usize),
}
