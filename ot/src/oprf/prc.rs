use setops_primitives::{Aes128, Block, Block512};

/// The pseudorandom code `C(x) = E_{k1}(x) || E_{k2}(x) || E_{k3}(x) || E_{k4}(x)`.
pub struct PseudorandomCode {
    ciphers: [Aes128; 4],
}

impl PseudorandomCode {
    pub fn new(k1: Block, k2: Block, k3: Block, k4: Block) -> Self {
        Self {
            ciphers: [
                Aes128::new(k1),
                Aes128::new(k2),
                Aes128::new(k3),
                Aes128::new(k4),
            ],
        }
    }

    #[inline]
    pub fn encode(&self, m: Block) -> Block512 {
        Block512([
            self.ciphers[0].encrypt(m),
            self.ciphers[1].encrypt(m),
            self.ciphers[2].encrypt(m),
            self.ciphers[3].encrypt(m),
        ])
    }
}
