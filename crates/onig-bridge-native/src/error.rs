//! Error types raised inside the native library

use std::any::Any;
use std::str::Utf8Error;

use thiserror::Error;

/// Failures reported across the C ABI as error strings
#[derive(Debug, Error)]
pub enum NativeError {
    /// Oniguruma rejected the pattern
    #[error("{0}")]
    Oniguruma(#[from] onig::Error),

    /// Pattern or text bytes were not UTF-8
    #[error("Unable to read UTF-8 input: {0}")]
    Utf8(#[from] Utf8Error),

    /// A required pointer argument was null
    #[error("Null pointer passed for {0}")]
    NullPointer(&'static str),

    /// Search start lies past the end of the text
    #[error("Byte offset {offset} is out of bounds for text of {len} bytes")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// Offsets would not fit the i32 capture encoding
    #[error("Text of {len} bytes exceeds the supported size")]
    TextTooLarge { len: usize },

    /// A panic was caught at the boundary
    #[error("Panic happened: {0}")]
    Panic(String),
}

impl NativeError {
    /// Convert a caught panic payload into an error
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(message) = payload.downcast_ref::<String>() {
            NativeError::Panic(message.clone())
        } else if let Some(message) = payload.downcast_ref::<&str>() {
            NativeError::Panic((*message).to_string())
        } else {
            NativeError::Panic("Unknown".to_string())
        }
    }
}

/// Result type for native operations
pub type Result<T> = std::result::Result<T, NativeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("boom"));
        assert_eq!(NativeError::from_panic(owned).to_string(), "Panic happened: boom");

        let borrowed: Box<dyn Any + Send> = Box::new("static boom");
        assert_eq!(
            NativeError::from_panic(borrowed).to_string(),
            "Panic happened: static boom"
        );

        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(NativeError::from_panic(other).to_string(), "Panic happened: Unknown");
    }
}
