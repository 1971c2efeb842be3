//! Stream shape - arity and item width of the sample streams
//!
//! Input and output share the same shape; the node is transparent to bulk data.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Maximum number of sample streams
pub const MAX_STREAMS: usize = 4;

/// Per-stream item widths in bytes, identical for input and output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StreamShape {
    #[validate(
        length(max = 4, message = "at most 4 streams are supported"),
        custom(function = "validate_item_sizes")
    )]
    pub item_sizes: Vec<usize>,
}

impl StreamShape {
    pub fn new(item_sizes: Vec<usize>) -> Self {
        Self { item_sizes }
    }

    /// Shape with no sample streams (message-only node)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of streams
    pub fn stream_count(&self) -> usize {
        self.item_sizes.len()
    }

    /// Item width of stream `index`
    pub fn item_size(&self, index: usize) -> Option<usize> {
        self.item_sizes.get(index).copied()
    }

    /// Bytes occupied by `items` items on stream `index`.
    ///
    /// `None` for an unknown stream or on overflow.
    pub fn bytes_for(&self, index: usize, items: usize) -> Option<usize> {
        self.item_size(index)?.checked_mul(items)
    }
}

fn validate_item_sizes(sizes: &[usize]) -> Result<(), ValidationError> {
    if sizes.contains(&0) {
        let mut err = ValidationError::new("item_size");
        err.message = Some("item size must be > 0".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_for() {
        let shape = StreamShape::new(vec![8, 2]);
        assert_eq!(shape.stream_count(), 2);
        assert_eq!(shape.bytes_for(0, 10), Some(80));
        assert_eq!(shape.bytes_for(1, 10), Some(20));
        assert_eq!(shape.bytes_for(2, 10), None);
        assert_eq!(shape.bytes_for(0, usize::MAX), None);
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let shape = StreamShape::new(vec![4, 0]);
        assert!(shape.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_too_many_streams() {
        let shape = StreamShape::new(vec![1; MAX_STREAMS + 1]);
        assert!(shape.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_empty_and_full() {
        assert!(StreamShape::empty().validate().is_ok());
        assert!(StreamShape::new(vec![4; MAX_STREAMS]).validate().is_ok());
    }
}
