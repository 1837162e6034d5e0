use crate::{
    errors::GarblerError,
    fancy::{Fancy, FancyBinary},
    garble::GarbledCircuit,
    util::tweak2,
    wire::WireMod2,
};
use rand::{CryptoRng, RngCore};
use setops_primitives::Block;
use subtle::{Choice, ConditionallySelectable};

/// Garbles a circuit into an in-memory table.
pub struct Garbler<RNG> {
    delta: WireMod2,
    circuit_id: u64,
    current_gate: u64,
    gates: Vec<Block>,
    decoding: Vec<bool>,
    rng: RNG,
}

impl<RNG: CryptoRng + RngCore> Garbler<RNG> {
    /// Create a new garbler for circuit `circuit_id` under the global offset `delta`.
    pub fn new(delta: WireMod2, circuit_id: u64, rng: RNG) -> Self {
        Garbler {
            delta,
            circuit_id,
            current_gate: 0,
            gates: Vec::new(),
            decoding: Vec::new(),
            rng,
        }
    }

    /// The global offset between the two labels of every wire.
    pub fn delta(&self) -> WireMod2 {
        self.delta
    }

    /// The current non-free gate index of the garbling computation.
    fn current_gate(&mut self) -> u64 {
        let current = self.current_gate;
        self.current_gate += 1;
        current
    }

    /// Encode a wire, producing the zero wire as well as the encoded value.
    pub fn encode_wire(&mut self, val: bool) -> (WireMod2, WireMod2) {
        let zero = WireMod2::rand(&mut self.rng);
        let enc = zero.plus(&self.delta.cmul(val));
        (zero, enc)
    }

    /// Consume the garbler, returning the garbled tables and output decoding.
    pub fn finish(self) -> GarbledCircuit {
        GarbledCircuit {
            gates: self.gates,
            decoding: self.decoding,
        }
    }

    /// Garbles an 'and' gate given two input wires, using half gates
    /// (<https://eprint.iacr.org/2014/756>).
    ///
    /// Pushes the two ciphertexts to the table and returns the zero label of the output.
    fn garble_and_gate(&mut self, A: &WireMod2, B: &WireMod2) -> WireMod2 {
        let D = self.delta;
        let gate_num = self.current_gate();
        let g0 = tweak2(self.circuit_id, 2 * gate_num);
        let g1 = tweak2(self.circuit_id, 2 * gate_num + 1);

        let pa = Choice::from(A.color() as u8);
        let pb = Choice::from(B.color() as u8);

        let hashA0 = A.hash(g0);
        let hashA1 = A.plus(&D).hash(g0);
        let hashB0 = B.hash(g1);
        let hashB1 = B.plus(&D).hash(g1);

        // garbler's half gate: computes a & pb
        let TG = WireMod2::from_block(hashA0 ^ hashA1)
            .plus(&WireMod2::conditional_select(&WireMod2::default(), &D, pb));
        let WG = WireMod2::from_block(hashA0)
            .plus(&WireMod2::conditional_select(&WireMod2::default(), &TG, pa));

        // evaluator's half gate: computes a & (b ^ pb)
        let TE = WireMod2::from_block(hashB0 ^ hashB1).plus(A);
        let WE = WireMod2::from_block(hashB0).plus(&WireMod2::conditional_select(
            &WireMod2::default(),
            &TE.plus(A),
            pb,
        ));

        self.gates.push(TG.as_block());
        self.gates.push(TE.as_block());
        WG.plus(&WE)
    }
}

impl<RNG: CryptoRng + RngCore> FancyBinary for Garbler<RNG> {
    fn xor(&mut self, x: &WireMod2, y: &WireMod2) -> Result<WireMod2, GarblerError> {
        Ok(x.plus(y))
    }

    fn and(&mut self, x: &WireMod2, y: &WireMod2) -> Result<WireMod2, GarblerError> {
        Ok(self.garble_and_gate(x, y))
    }

    fn negate(&mut self, x: &WireMod2) -> Result<WireMod2, GarblerError> {
        Ok(x.plus(&self.delta))
    }
}

impl<RNG: CryptoRng + RngCore> Fancy for Garbler<RNG> {
    type Item = WireMod2;
    type Error = GarblerError;

    fn constant(&mut self, x: bool) -> Result<WireMod2, GarblerError> {
        let (zero, wire) = self.encode_wire(x);
        self.gates.push(wire.as_block());
        Ok(zero)
    }

    fn output(&mut self, x: &WireMod2) -> Result<Option<bool>, GarblerError> {
        self.decoding.push(x.color());
        Ok(None)
    }
}
