//! Oblivious switching network ("permute + share") built from a Beneš network
//! (cf. Mohassel-Sadeghian, <https://eprint.iacr.org/2013/239>).
//!
//! One party, the *vector holder*, owns a vector `x` of `n` rows of `u64`
//! words. The other party, the *permutation holder*, owns a mapping `π` from
//! output rows to input rows. After the protocol the permutation holder owns
//! `x[π(j)] - r_j` and the vector holder owns `r_j` for every output row `j`,
//! with all arithmetic modulo `2^64`. Neither party learns anything else.
//!
//! Every switch of the network costs one oblivious transfer of a 128-bit key;
//! the key encrypts the switch message under `AesRng`.

use crate::{
    errors::Error,
    ot::{Receiver as OtReceiver, Sender as OtSender},
};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use setops_primitives::{AbstractChannel, AesRng, Block, SemiHonest};

/// Vector holder over ALSZ OT extension.
pub type OsnSender = Sender<crate::ot::AlszSender>;
/// Permutation holder over ALSZ OT extension.
pub type OsnReceiver = Receiver<crate::ot::AlszReceiver>;

/// A row of words.
pub type Row = Vec<u64>;

/// Number of switches of a Beneš network on `n` wires (`n` a power of two).
pub fn nswitches(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        n * (n.trailing_zeros() as usize) - n / 2
    }
}

/// Compute the switch settings (`true` = cross) realizing `out[j] = in[perm[j]]`.
///
/// `perm.len()` must be a power of two. Settings are listed input layer first,
/// then the upper and lower sub-networks recursively, then the output layer.
pub fn route(perm: &[usize]) -> Result<Vec<bool>, Error> {
    let n = perm.len();
    if n == 0 || !n.is_power_of_two() {
        return Err(Error::InvalidInputLength);
    }
    let mut seen = vec![false; n];
    for &p in perm {
        if p >= n || seen[p] {
            return Err(Error::InvalidPermutation);
        }
        seen[p] = true;
    }
    let mut bits = Vec::with_capacity(nswitches(n));
    route_into(perm, &mut bits);
    Ok(bits)
}

fn route_into(perm: &[usize], bits: &mut Vec<bool>) {
    let n = perm.len();
    if n == 1 {
        return;
    }
    if n == 2 {
        bits.push(perm[0] == 1);
        return;
    }
    let half = n / 2;
    let mut inv = vec![0; n];
    for (j, &i) in perm.iter().enumerate() {
        inv[i] = j;
    }
    // `false` routes through the upper sub-network, `true` through the lower.
    let mut out_lower: Vec<Option<bool>> = vec![None; n];
    let mut in_lower: Vec<Option<bool>> = vec![None; n];
    for start in 0..half {
        let mut j = 2 * start;
        if out_lower[j].is_some() {
            continue;
        }
        loop {
            out_lower[j] = Some(false);
            out_lower[j ^ 1] = Some(true);
            let i = perm[j];
            in_lower[i] = Some(false);
            in_lower[i ^ 1] = Some(true);
            let next = inv[i ^ 1] ^ 1;
            if out_lower[next].is_some() {
                break;
            }
            j = next;
        }
    }
    let mut upper = vec![0; half];
    let mut lower = vec![0; half];
    for k in 0..half {
        let (top, bottom) = if out_lower[2 * k] == Some(false) {
            (2 * k, 2 * k + 1)
        } else {
            (2 * k + 1, 2 * k)
        };
        upper[k] = perm[top] / 2;
        lower[k] = perm[bottom] / 2;
    }
    for i in 0..half {
        bits.push(in_lower[2 * i] == Some(true));
    }
    route_into(&upper, bits);
    route_into(&lower, bits);
    for k in 0..half {
        bits.push(out_lower[2 * k] == Some(true));
    }
}

/// Push `values` through a Beneš network, calling `switch(index, top, bottom)`
/// for every switch in routing order; `switch` returns the two outputs.
pub fn evaluate<T, F>(values: Vec<T>, switch: &mut F) -> Vec<T>
where
    F: FnMut(usize, T, T) -> (T, T),
{
    let mut counter = 0;
    evaluate_inner(values, switch, &mut counter)
}

fn evaluate_inner<T, F>(values: Vec<T>, switch: &mut F, counter: &mut usize) -> Vec<T>
where
    F: FnMut(usize, T, T) -> (T, T),
{
    let n = values.len();
    if n <= 1 {
        return values;
    }
    let half = n / 2;
    let mut upper = Vec::with_capacity(half);
    let mut lower = Vec::with_capacity(half);
    let mut it = values.into_iter();
    while let (Some(a), Some(b)) = (it.next(), it.next()) {
        let (c, d) = switch(*counter, a, b);
        *counter += 1;
        if n == 2 {
            return vec![c, d];
        }
        upper.push(c);
        lower.push(d);
    }
    let upper = evaluate_inner(upper, switch, counter);
    let lower = evaluate_inner(lower, switch, counter);
    let mut out = Vec::with_capacity(n);
    for (a, b) in upper.into_iter().zip(lower.into_iter()) {
        let (c, d) = switch(*counter, a, b);
        *counter += 1;
        out.push(c);
        out.push(d);
    }
    out
}

/// Apply the permutation described by `bits` to `values` in the clear.
pub fn permute<T>(values: Vec<T>, bits: &[bool]) -> Vec<T> {
    evaluate(values, &mut |i, a, b| if bits[i] { (b, a) } else { (a, b) })
}

fn sub(a: &[u64], b: &[u64]) -> Row {
    a.iter().zip(b.iter()).map(|(x, y)| x.wrapping_sub(*y)).collect()
}

fn add(a: &[u64], b: &[u64]) -> Row {
    a.iter().zip(b.iter()).map(|(x, y)| x.wrapping_add(*y)).collect()
}

fn pad(key: Block, nwords: usize) -> Row {
    let mut rng = AesRng::from_seed(key);
    (0..nwords).map(|_| rng.next_u64()).collect()
}

fn xor_words(a: &[u64], b: &[u64]) -> Row {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

/// Permute-and-share, vector holder side.
pub struct Sender<OT: OtSender<Msg = Block> + SemiHonest> {
    ot: OT,
}

impl<OT: OtSender<Msg = Block> + SemiHonest> Sender<OT> {
    /// Runs the base and extension OT setup.
    pub fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let ot = OT::init(channel, rng)?;
        Ok(Self { ot })
    }

    /// Obliviously permute `rows` (a power-of-two count of rows of `width`
    /// words), returning this party's share of every output row.
    pub fn send<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        rows: Vec<Row>,
        width: usize,
        rng: &mut RNG,
    ) -> Result<Vec<Row>, Error> {
        let n = rows.len();
        if n == 0 || !n.is_power_of_two() || rows.iter().any(|r| r.len() != width) {
            return Err(Error::InvalidInputLength);
        }
        let mut messages = Vec::with_capacity(nswitches(n));
        // Our share of a wire starts as the input itself; the peer's starts at zero.
        let shares = evaluate(rows, &mut |_, a: Row, b: Row| {
            let c = (0..width).map(|_| rng.gen::<u64>()).collect::<Row>();
            let d = (0..width).map(|_| rng.gen::<u64>()).collect::<Row>();
            let straight = [sub(&a, &c), sub(&b, &d)].concat();
            let cross = [sub(&b, &c), sub(&a, &d)].concat();
            messages.push((straight, cross));
            (c, d)
        });
        if messages.is_empty() {
            return Ok(shares);
        }
        let keys = (0..messages.len())
            .map(|_| (rng.gen::<Block>(), rng.gen::<Block>()))
            .collect::<Vec<(Block, Block)>>();
        self.ot.send(channel, &keys, rng)?;
        for ((m0, m1), (k0, k1)) in messages.iter().zip(keys.iter()) {
            for w in xor_words(m0, &pad(*k0, 2 * width)) {
                channel.write_u64(w)?;
            }
            for w in xor_words(m1, &pad(*k1, 2 * width)) {
                channel.write_u64(w)?;
            }
        }
        channel.flush()?;
        Ok(shares)
    }
}

/// Permute-and-share, permutation holder side.
pub struct Receiver<OT: OtReceiver<Msg = Block> + SemiHonest> {
    ot: OT,
}

impl<OT: OtReceiver<Msg = Block> + SemiHonest> Receiver<OT> {
    /// Runs the base and extension OT setup.
    pub fn init<C: AbstractChannel, RNG: CryptoRng + Rng>(
        channel: &mut C,
        rng: &mut RNG,
    ) -> Result<Self, Error> {
        let ot = OT::init(channel, rng)?;
        Ok(Self { ot })
    }

    /// Obliviously apply `perm` (output row `j` takes input row `perm[j]`) to
    /// the peer's vector of rows of `width` words, returning this party's
    /// share of every output row.
    pub fn receive<C: AbstractChannel, RNG: CryptoRng + Rng>(
        &mut self,
        channel: &mut C,
        perm: &[usize],
        width: usize,
        rng: &mut RNG,
    ) -> Result<Vec<Row>, Error> {
        let bits = route(perm)?;
        let zeros = vec![vec![0u64; width]; perm.len()];
        if bits.is_empty() {
            return Ok(zeros);
        }
        let keys = self.ot.receive(channel, &bits, rng)?;
        let mut messages = Vec::with_capacity(bits.len());
        for (b, k) in bits.iter().zip(keys.iter()) {
            let m0 = (0..2 * width)
                .map(|_| channel.read_u64())
                .collect::<Result<Row, _>>()?;
            let m1 = (0..2 * width)
                .map(|_| channel.read_u64())
                .collect::<Result<Row, _>>()?;
            let chosen = if *b { m1 } else { m0 };
            messages.push(xor_words(&chosen, &pad(*k, 2 * width)));
        }
        Ok(evaluate(zeros, &mut |i, a: Row, b: Row| {
            let (a, b) = if bits[i] { (b, a) } else { (a, b) };
            let m = &messages[i];
            (add(&a, &m[..width]), add(&b, &m[width..]))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ot::{AlszReceiver, AlszSender};
    use proptest::prelude::*;
    use rand::seq::SliceRandom;
    use setops_primitives::unix_channel_pair;

    fn random_perm(n: usize, seed: u64) -> Vec<usize> {
        let mut rng = AesRng::from_seed(Block::from(seed as u128));
        let mut perm = (0..n).collect::<Vec<usize>>();
        perm.shuffle(&mut rng);
        perm
    }

    #[test]
    fn test_switch_counts() {
        assert_eq!(nswitches(1), 0);
        assert_eq!(nswitches(2), 1);
        assert_eq!(nswitches(4), 6);
        assert_eq!(nswitches(8), 20);
        for logn in 0..8 {
            let n = 1 << logn;
            assert_eq!(route(&random_perm(n, 7)).unwrap().len(), nswitches(n));
        }
    }

    #[test]
    fn test_route_rejects_bad_input() {
        assert!(matches!(route(&[0, 1, 2]), Err(Error::InvalidInputLength)));
        assert!(matches!(route(&[0, 0]), Err(Error::InvalidPermutation)));
        assert!(matches!(route(&[0, 4, 1, 2]), Err(Error::InvalidPermutation)));
    }

    proptest! {
        #[test]
        fn test_routing_realizes_permutation(logn in 0usize..9, seed in any::<u64>()) {
            let n = 1 << logn;
            let perm = random_perm(n, seed);
            let bits = route(&perm).unwrap();
            let out = permute((0..n).collect::<Vec<usize>>(), &bits);
            prop_assert_eq!(out, perm);
        }
    }

    fn run_osn(n: usize, width: usize) {
        let perm = random_perm(n, 42);
        let rows = (0..n)
            .map(|_| (0..width).map(|_| rand::random::<u64>()).collect::<Row>())
            .collect::<Vec<Row>>();
        let rows_ = rows.clone();
        let (mut sender, mut receiver) = unix_channel_pair().unwrap();
        let handle = std::thread::spawn(move || {
            let mut rng = AesRng::new();
            let mut osn = Sender::<AlszSender>::init(&mut sender, &mut rng).unwrap();
            osn.send(&mut sender, rows_, width, &mut rng).unwrap()
        });
        let mut rng = AesRng::new();
        let mut osn = Receiver::<AlszReceiver>::init(&mut receiver, &mut rng).unwrap();
        let ours = osn.receive(&mut receiver, &perm, width, &mut rng).unwrap();
        let theirs = handle.join().unwrap();
        for j in 0..n {
            assert_eq!(add(&ours[j], &theirs[j]), rows[perm[j]]);
        }
    }

    #[test]
    fn test_permute_and_share() {
        run_osn(1, 2);
        run_osn(2, 1);
        run_osn(16, 3);
        run_osn(64, 1);
    }
}
