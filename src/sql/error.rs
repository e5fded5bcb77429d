use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClauseError {
    #[error("no data supplied")]
    NoData,
}
