use crate::{errors::FancyError, util, FancyBinary};
use itertools::Itertools;

/// Bundle of binary wires, least significant bit first.
#[derive(Clone, Debug)]
pub struct BinaryBundle<W>(Vec<W>);

impl<W: Clone> BinaryBundle<W> {
    /// Create a new binary bundle from a vector of wires.
    pub fn new(ws: Vec<W>) -> BinaryBundle<W> {
        BinaryBundle(ws)
    }

    /// Return the wires of this bundle.
    pub fn wires(&self) -> &[W] {
        &self.0
    }

    /// Number of wires in the bundle.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Extract the wires from this bundle.
    pub fn extract(self) -> Vec<W> {
        self.0
    }
}

impl<F: FancyBinary> BinaryGadgets for F {}

fn check_widths(x: usize, y: usize) -> Result<(), FancyError> {
    if x != y {
        return Err(FancyError::UnequalBundleLengths { left: x, right: y });
    }
    Ok(())
}

/// Extension trait for `Fancy` providing gadgets that operate over bundles of binary wires.
pub trait BinaryGadgets: FancyBinary {
    /// Create a constant bundle holding the low `nbits` bits of `val`.
    fn bin_constant_bundle(
        &mut self,
        val: u128,
        nbits: usize,
    ) -> Result<BinaryBundle<Self::Item>, Self::Error> {
        util::u128_to_bits(val, nbits)
            .into_iter()
            .map(|b| self.constant(b))
            .collect::<Result<Vec<Self::Item>, Self::Error>>()
            .map(BinaryBundle::new)
    }

    /// Output a binary bundle and interpret the result as a `u128`.
    fn bin_output(&mut self, x: &BinaryBundle<Self::Item>) -> Result<Option<u128>, Self::Error> {
        Ok(self.outputs(x.wires())?.map(|bs| util::u128_from_bits(&bs)))
    }

    /// Output a slice of binary bundles and interpret the results as a `u128`.
    fn bin_outputs(
        &mut self,
        xs: &[BinaryBundle<Self::Item>],
    ) -> Result<Option<Vec<u128>>, Self::Error> {
        let mut zs = Vec::with_capacity(xs.len());
        for x in xs.iter() {
            let z = self.bin_output(x)?;
            zs.push(z);
        }
        Ok(zs.into_iter().collect())
    }

    /// Xor the bits of two bundles together pairwise.
    fn bin_xor(
        &mut self,
        x: &BinaryBundle<Self::Item>,
        y: &BinaryBundle<Self::Item>,
    ) -> Result<BinaryBundle<Self::Item>, Self::Error> {
        check_widths(x.size(), y.size())?;
        x.wires()
            .iter()
            .zip(y.wires().iter())
            .map(|(x, y)| self.xor(x, y))
            .collect::<Result<Vec<Self::Item>, Self::Error>>()
            .map(BinaryBundle::new)
    }

    /// And the bits of two bundles together pairwise.
    fn bin_and(
        &mut self,
        x: &BinaryBundle<Self::Item>,
        y: &BinaryBundle<Self::Item>,
    ) -> Result<BinaryBundle<Self::Item>, Self::Error> {
        check_widths(x.size(), y.size())?;
        x.wires()
            .iter()
            .zip(y.wires().iter())
            .map(|(x, y)| self.and(x, y))
            .collect::<Result<Vec<Self::Item>, Self::Error>>()
            .map(BinaryBundle::new)
    }

    /// And every bit of `x` with the single wire `b`: `x` if `b` is set, zero otherwise.
    fn bin_and_bit(
        &mut self,
        x: &BinaryBundle<Self::Item>,
        b: &Self::Item,
    ) -> Result<BinaryBundle<Self::Item>, Self::Error> {
        x.wires()
            .iter()
            .map(|x| self.and(x, b))
            .collect::<Result<Vec<Self::Item>, Self::Error>>()
            .map(BinaryBundle::new)
    }

    /// Binary addition modulo `2^n`. Avoids creating extra gates for the final carry.
    fn bin_addition_no_carry(
        &mut self,
        xs: &BinaryBundle<Self::Item>,
        ys: &BinaryBundle<Self::Item>,
    ) -> Result<BinaryBundle<Self::Item>, Self::Error> {
        check_widths(xs.size(), ys.size())?;
        let xwires = xs.wires();
        let ywires = ys.wires();
        let n = xwires.len();
        if n == 0 {
            return Ok(BinaryBundle::new(Vec::new()));
        }
        if n == 1 {
            let z = self.xor(&xwires[0], &ywires[0])?;
            return Ok(BinaryBundle::new(vec![z]));
        }
        let (mut z, mut c) = self.adder(&xwires[0], &ywires[0], None)?;
        let mut bs = vec![z];
        for i in 1..n - 1 {
            let res = self.adder(&xwires[i], &ywires[i], Some(&c))?;
            z = res.0;
            c = res.1;
            bs.push(z);
        }
        // xor instead of add
        z = self.xor_many(&[xwires[n - 1].clone(), ywires[n - 1].clone(), c])?;
        bs.push(z);
        Ok(BinaryBundle::new(bs))
    }

    /// Add the single bit `b` to `x`, modulo `2^n`.
    fn bin_add_bit(
        &mut self,
        x: &BinaryBundle<Self::Item>,
        b: &Self::Item,
    ) -> Result<BinaryBundle<Self::Item>, Self::Error> {
        let n = x.size();
        let mut carry = b.clone();
        let mut bs = Vec::with_capacity(n);
        for (i, w) in x.wires().iter().enumerate() {
            bs.push(self.xor(w, &carry)?);
            if i + 1 < n {
                carry = self.and(w, &carry)?;
            }
        }
        Ok(BinaryBundle::new(bs))
    }

    /// Multiplex gadget for binary bundles: `x` if `b = 0`, else `y`.
    fn bin_multiplex(
        &mut self,
        b: &Self::Item,
        x: &BinaryBundle<Self::Item>,
        y: &BinaryBundle<Self::Item>,
    ) -> Result<BinaryBundle<Self::Item>, Self::Error> {
        check_widths(x.size(), y.size())?;
        x.wires()
            .iter()
            .zip(y.wires().iter())
            .map(|(xwire, ywire)| self.mux(b, xwire, ywire))
            .collect::<Result<Vec<Self::Item>, Self::Error>>()
            .map(BinaryBundle::new)
    }

    /// Compute `x == y` for binary bundles.
    fn bin_eq_bundles(
        &mut self,
        x: &BinaryBundle<Self::Item>,
        y: &BinaryBundle<Self::Item>,
    ) -> Result<Self::Item, Self::Error> {
        check_widths(x.size(), y.size())?;
        // compute (x^y == 0) for each bit
        let zs = x
            .wires()
            .iter()
            .zip_eq(y.wires().iter())
            .map(|(x, y)| {
                let xy = self.xor(x, y)?;
                self.negate(&xy)
            })
            .collect::<Result<Vec<Self::Item>, Self::Error>>()?;
        // and_many will return 1 only if all outputs of xnor are 1
        // indicating equality
        self.and_many(&zs)
    }
}
