//! Dummy implementation of `Fancy`.
//!
//! Useful for evaluating the circuits produced by `Fancy` without actually
//! creating any circuits.

use crate::{
    errors::{DummyError, FancyError},
    fancy::{Fancy, FancyBinary, FancyInput},
};

/// Simple struct that performs the fancy computation over plain booleans.
#[derive(Default)]
pub struct Dummy {}

impl Dummy {
    /// Create a new Dummy.
    pub fn new() -> Dummy {
        Dummy {}
    }
}

impl FancyInput for Dummy {
    type Item = bool;
    type Error = DummyError;

    /// Dummy values encode to themselves.
    fn encode_many(&mut self, values: &[bool]) -> Result<Vec<bool>, DummyError> {
        Ok(values.to_vec())
    }

    /// A dummy has no peer to receive values from.
    fn receive_many(&mut self, _n: usize) -> Result<Vec<bool>, DummyError> {
        Err(DummyError::FancyError(FancyError::InvalidArg(
            "dummy cannot receive values".to_string(),
        )))
    }
}

impl FancyBinary for Dummy {
    fn xor(&mut self, x: &bool, y: &bool) -> Result<bool, DummyError> {
        Ok(x ^ y)
    }

    fn and(&mut self, x: &bool, y: &bool) -> Result<bool, DummyError> {
        Ok(x & y)
    }

    fn negate(&mut self, x: &bool) -> Result<bool, DummyError> {
        Ok(!x)
    }
}

impl Fancy for Dummy {
    type Item = bool;
    type Error = DummyError;

    fn constant(&mut self, val: bool) -> Result<bool, DummyError> {
        Ok(val)
    }

    fn output(&mut self, x: &bool) -> Result<Option<bool>, DummyError> {
        Ok(Some(*x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryGadgets;

    #[test]
    fn test_gates() {
        let mut d = Dummy::new();
        for x in [false, true] {
            for y in [false, true] {
                assert_eq!(d.and(&x, &y).unwrap(), x && y);
                assert_eq!(d.or(&x, &y).unwrap(), x || y);
                assert_eq!(d.xor(&x, &y).unwrap(), x ^ y);
                for b in [false, true] {
                    assert_eq!(d.mux(&b, &x, &y).unwrap(), if b { y } else { x });
                }
            }
        }
        assert!(d.and_many(&[]).is_err());
    }

    #[test]
    fn test_encode_bundles() {
        let mut d = Dummy::new();
        let xs = d.bin_encode_many(&[3, 250, 0], 8).unwrap();
        assert_eq!(xs.len(), 3);
        assert_eq!(d.bin_outputs(&xs).unwrap(), Some(vec![3, 250, 0]));
        assert!(d.receive_many(1).is_err());
    }
}
