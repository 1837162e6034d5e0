// -*- mode: rust; -*-
//
// This file is part of `setops-garble`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use crate::{
    errors::EvaluatorError,
    fancy::{Fancy, FancyBinary},
    garble::GarbledCircuit,
    util::tweak2,
    wire::WireMod2,
};
use setops_primitives::Block;

/// Evaluates one garbled circuit from its table.
///
/// The circuit must be replayed with exactly the gate sequence the garbler used.
pub struct Evaluator<'a> {
    circuit: &'a GarbledCircuit,
    circuit_id: u64,
    current_gate: u64,
    current_output: usize,
    cursor: usize,
}

impl<'a> Evaluator<'a> {
    /// Create a new `Evaluator` for circuit `circuit_id`.
    pub fn new(circuit: &'a GarbledCircuit, circuit_id: u64) -> Self {
        Evaluator {
            circuit,
            circuit_id,
            current_gate: 0,
            current_output: 0,
            cursor: 0,
        }
    }

    /// The current non-free gate index of the garbling computation.
    fn current_gate(&mut self) -> u64 {
        let current = self.current_gate;
        self.current_gate += 1;
        current
    }

    fn next_ciphertext(&mut self) -> Result<Block, EvaluatorError> {
        let ct = self
            .circuit
            .gates
            .get(self.cursor)
            .copied()
            .ok_or(EvaluatorError::TableExhausted {
                len: self.circuit.gates.len(),
            })?;
        self.cursor += 1;
        Ok(ct)
    }

    /// Check that the whole table and every decoding bit have been consumed.
    pub fn finish(self) -> Result<(), EvaluatorError> {
        if self.cursor != self.circuit.gates.len() {
            return Err(EvaluatorError::TrailingTable {
                used: self.cursor,
                len: self.circuit.gates.len(),
            });
        }
        if self.current_output != self.circuit.decoding.len() {
            return Err(EvaluatorError::DecodingFailed);
        }
        Ok(())
    }
}

impl<'a> FancyBinary for Evaluator<'a> {
    fn xor(&mut self, x: &WireMod2, y: &WireMod2) -> Result<WireMod2, EvaluatorError> {
        Ok(x.plus(y))
    }

    fn and(&mut self, A: &WireMod2, B: &WireMod2) -> Result<WireMod2, EvaluatorError> {
        let TG = self.next_ciphertext()?;
        let TE = self.next_ciphertext()?;
        let gate_num = self.current_gate();
        let g0 = tweak2(self.circuit_id, 2 * gate_num);
        let g1 = tweak2(self.circuit_id, 2 * gate_num + 1);

        // garbler's half gate
        let WG = A.hash(g0) ^ TG.select(A.color());
        // evaluator's half gate
        let WE = B.hash(g1) ^ (TE ^ A.as_block()).select(B.color());
        Ok(WireMod2::from_block(WG ^ WE))
    }

    fn negate(&mut self, x: &WireMod2) -> Result<WireMod2, EvaluatorError> {
        Ok(*x)
    }
}

impl<'a> Fancy for Evaluator<'a> {
    type Item = WireMod2;
    type Error = EvaluatorError;

    fn constant(&mut self, _: bool) -> Result<WireMod2, EvaluatorError> {
        self.next_ciphertext().map(WireMod2::from_block)
    }

    fn output(&mut self, x: &WireMod2) -> Result<Option<bool>, EvaluatorError> {
        let d = self
            .circuit
            .decoding
            .get(self.current_output)
            .copied()
            .ok_or(EvaluatorError::DecodingFailed)?;
        self.current_output += 1;
        Ok(Some(x.color() ^ d))
    }
}
