use super::*;
use crate::util;

/// Convenience functions for encoding input to Fancy objects.
pub trait FancyInput {
    /// The type that this Fancy object operates over.
    type Item: Clone;

    /// The type of error that this Fancy object emits.
    type Error: From<FancyError>;

    ////////////////////////////////////////////////////////////////////////////////
    // required methods

    /// Encode many values where the actual input is known.
    ///
    /// When writing a garbler, the return value must correspond to the zero
    /// wire label.
    fn encode_many(&mut self, values: &[bool]) -> Result<Vec<Self::Item>, Self::Error>;

    /// Receive many values where the input is not known.
    fn receive_many(&mut self, n: usize) -> Result<Vec<Self::Item>, Self::Error>;

    ////////////////////////////////////////////////////////////////////////////////
    // optional methods

    /// Encode many `nbits`-wide integers as binary bundles.
    fn bin_encode_many(
        &mut self,
        values: &[u128],
        nbits: usize,
    ) -> Result<Vec<BinaryBundle<Self::Item>>, Self::Error> {
        let bits = values
            .iter()
            .flat_map(|x| util::u128_to_bits(*x, nbits))
            .collect::<Vec<bool>>();
        let wires = self.encode_many(&bits)?;
        Ok(chunk_bundles(wires, nbits))
    }

    /// Receive `n` binary bundles of `nbits` bits each.
    fn bin_receive_many(
        &mut self,
        n: usize,
        nbits: usize,
    ) -> Result<Vec<BinaryBundle<Self::Item>>, Self::Error> {
        let wires = self.receive_many(n * nbits)?;
        Ok(chunk_bundles(wires, nbits))
    }
}

fn chunk_bundles<W: Clone>(wires: Vec<W>, nbits: usize) -> Vec<BinaryBundle<W>> {
    if nbits == 0 {
        return Vec::new();
    }
    wires
        .chunks(nbits)
        .map(|ws| BinaryBundle::new(ws.to_vec()))
        .collect()
}
