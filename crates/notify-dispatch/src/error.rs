//! Errors raised by the dispatch fabric and its notifier adapters.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no adapter registered for notifier {0}")]
    UnknownNotifier(String),

    #[error("failed to decode notifier settings: {0}")]
    SettingsDecode(String),

    #[error("notifier transport error: {0}")]
    Transport(String),

    #[error("fabric is shutting down")]
    Closing,

    #[error("failed to look up notifier bindings: {0}")]
    BindingLookup(String),
}
