use crate::{errors::TwopacError, FancyInput, GarbledCircuit, WireMod2};
use rand::{CryptoRng, Rng};
use setops_ot::ot::Receiver as OtReceiver;
use setops_primitives::{AbstractChannel, Block, SemiHonest};

/// Semi-honest evaluator.
pub struct Evaluator<C, RNG, OT> {
    channel: C,
    ot: OT,
    rng: RNG,
}

impl<C: AbstractChannel, RNG: CryptoRng + Rng, OT: OtReceiver<Msg = Block> + SemiHonest>
    Evaluator<C, RNG, OT>
{
    /// Make a new `Evaluator`.
    pub fn new(mut channel: C, mut rng: RNG) -> Result<Self, TwopacError> {
        let ot = OT::init(&mut channel, &mut rng)?;
        Ok(Self { channel, ot, rng })
    }

    /// Get a reference to the internal channel.
    pub fn get_channel(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Give back the internal channel.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Receive one garbled circuit of at most `max` ciphertexts.
    pub fn receive_circuit(&mut self, max: usize) -> Result<GarbledCircuit, TwopacError> {
        Ok(GarbledCircuit::read(&mut self.channel, max)?)
    }
}

impl<C: AbstractChannel, RNG: CryptoRng + Rng, OT: OtReceiver<Msg = Block> + SemiHonest>
    FancyInput for Evaluator<C, RNG, OT>
{
    type Item = WireMod2;
    type Error = TwopacError;

    /// Perform OT and obtain wires for the evaluator's inputs.
    fn encode_many(&mut self, values: &[bool]) -> Result<Vec<WireMod2>, TwopacError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let wires = self.ot.receive(&mut self.channel, values, &mut self.rng)?;
        Ok(wires.into_iter().map(WireMod2::from_block).collect())
    }

    /// Receive garbler input wires.
    fn receive_many(&mut self, n: usize) -> Result<Vec<WireMod2>, TwopacError> {
        let blocks = self.channel.read_blocks(n)?;
        Ok(blocks.into_iter().map(WireMod2::from_block).collect())
    }
}

impl<C, RNG, OT> SemiHonest for Evaluator<C, RNG, OT> {}
