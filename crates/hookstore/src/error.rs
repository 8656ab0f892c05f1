use thiserror::Error;

use crate::listener::ListenerKey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store hook called outside a render unit")]
    OutsideRender,
    #[error("listener {0:?} is not registered with this store")]
    ListenerNotRegistered(ListenerKey),
}
