use std::fmt::Display;

use thiserror::Error;

/// Errors produced while lowering a value through serde.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("serialization error: {0}")]
    Custom(String),

    #[error("map value serialized before its key")]
    MissingKey,

    /// Two distinct map keys rendered to the same text.
    #[error("map keys collide on {0:?}")]
    DuplicateKey(String),
}

impl serde::ser::Error for ValueError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}
