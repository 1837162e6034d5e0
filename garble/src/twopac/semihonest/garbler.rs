use crate::{errors::TwopacError, FancyInput, GarbledCircuit, Garbler as Gb, WireMod2};
use rand::{CryptoRng, Rng, SeedableRng};
use setops_ot::ot::Sender as OtSender;
use setops_primitives::{AbstractChannel, AesRng, Block, SemiHonest};

/// Semi-honest garbler.
///
/// Owns the global offset and the input transfer; the circuits themselves are
/// garbled by independent [`Garbler`](crate::Garbler)s obtained from
/// `garbler`, which may run on other threads.
pub struct Garbler<C, RNG, OT> {
    channel: C,
    ot: OT,
    rng: RNG,
    delta: WireMod2,
}

impl<C: AbstractChannel, RNG: CryptoRng + Rng, OT: OtSender<Msg = Block> + SemiHonest>
    Garbler<C, RNG, OT>
{
    /// Make a new `Garbler`.
    pub fn new(mut channel: C, mut rng: RNG) -> Result<Self, TwopacError> {
        let ot = OT::init(&mut channel, &mut rng)?;
        let delta = WireMod2::rand_delta(&mut rng);
        Ok(Garbler {
            channel,
            ot,
            rng,
            delta,
        })
    }

    /// Get a reference to the internal channel.
    pub fn get_channel(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Give back the internal channel.
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// A garbler for circuit `circuit_id`, sharing this party's offset.
    pub fn garbler(&mut self, circuit_id: u64) -> Gb<AesRng> {
        Gb::new(self.delta, circuit_id, AesRng::from_seed(self.rng.gen()))
    }

    /// Send a garbled circuit to the evaluator. Does not flush.
    pub fn send_circuit(&mut self, circuit: &GarbledCircuit) -> Result<(), TwopacError> {
        circuit.write(&mut self.channel)?;
        Ok(())
    }
}

impl<C: AbstractChannel, RNG: CryptoRng + Rng, OT: OtSender<Msg = Block> + SemiHonest>
    FancyInput for Garbler<C, RNG, OT>
{
    type Item = WireMod2;
    type Error = TwopacError;

    fn encode_many(&mut self, values: &[bool]) -> Result<Vec<WireMod2>, TwopacError> {
        let mut zeros = Vec::with_capacity(values.len());
        for v in values.iter() {
            let zero = WireMod2::rand(&mut self.rng);
            let wire = zero.plus(&self.delta.cmul(*v));
            self.channel.write_block(&wire.as_block())?;
            zeros.push(zero);
        }
        self.channel.flush()?;
        Ok(zeros)
    }

    fn receive_many(&mut self, n: usize) -> Result<Vec<WireMod2>, TwopacError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let zeros = (0..n)
            .map(|_| WireMod2::rand(&mut self.rng))
            .collect::<Vec<WireMod2>>();
        let inputs = zeros
            .iter()
            .map(|zero| (zero.as_block(), zero.plus(&self.delta).as_block()))
            .collect::<Vec<(Block, Block)>>();
        self.ot.send(&mut self.channel, &inputs, &mut self.rng)?;
        Ok(zeros)
    }
}

impl<C, RNG, OT> SemiHonest for Garbler<C, RNG, OT> {}
