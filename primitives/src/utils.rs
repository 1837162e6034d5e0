//! Useful utility functions.

/// Pack a bit slice into bytes, least significant bit first.
pub fn pack_bits(bits: &[bool]) -> Vec<u8> {
    let nbytes = (bits.len() + 7) / 8;
    let mut bytes = vec![0; nbytes];
    for (i, bit) in bits.iter().enumerate() {
        bytes[i / 8] |= (*bit as u8) << (i % 8);
    }
    bytes
}

/// Unpack a bit vector of length `size` from a slice of bytes.
pub fn unpack_bits(bytes: &[u8], size: usize) -> Vec<bool> {
    let mut bits = Vec::with_capacity(size);
    for (i, byte) in bytes.iter().enumerate() {
        for j in 0..8 {
            if 8 * i + j >= size {
                break;
            }
            bits.push(((byte >> j) & 1) != 0);
        }
    }
    bits
}

/// XOR two byte arrays in place.
pub fn xor_inplace(a: &mut [u8], b: &[u8]) {
    for (a, b) in a.iter_mut().zip(b.iter()) {
        *a ^= *b;
    }
}

/// AND two byte arrays in place.
pub fn and_inplace(a: &mut [u8], b: &[u8]) {
    for (a, b) in a.iter_mut().zip(b.iter()) {
        *a &= *b;
    }
}

/// Transpose a bit matrix with `nrows` rows of `ncols` bits each.
///
/// Rows are stored contiguously, each as `ncols / 8` bytes with the bits of
/// every byte ordered least significant first. The output has `ncols` rows of
/// `nrows` bits in the same layout. Both dimensions must be multiples of 8.
pub fn transpose(m: &[u8], nrows: usize, ncols: usize) -> Vec<u8> {
    assert_eq!(nrows % 8, 0);
    assert_eq!(ncols % 8, 0);
    assert_eq!(m.len(), nrows * ncols / 8);
    let in_row = ncols / 8;
    let out_row = nrows / 8;
    let mut out = vec![0u8; nrows * ncols / 8];
    // Work on 8x8 bit tiles so every input byte is read once.
    for rb in 0..out_row {
        for cb in 0..in_row {
            let mut tile = 0u64;
            for k in 0..8 {
                tile |= (m[(rb * 8 + k) * in_row + cb] as u64) << (8 * k);
            }
            let tile = transpose8x8(tile);
            for k in 0..8 {
                out[(cb * 8 + k) * out_row + rb] = (tile >> (8 * k)) as u8;
            }
        }
    }
    out
}

// Transpose an 8x8 bit matrix whose row `k` is byte `k` (bit `j` of row `k`
// is bit `8k + j`).
#[inline]
fn transpose8x8(mut x: u64) -> u64 {
    let t = (x ^ (x >> 7)) & 0x00aa_00aa_00aa_00aa;
    x ^= t ^ (t << 7);
    let t = (x ^ (x >> 14)) & 0x0000_cccc_0000_cccc;
    x ^= t ^ (t << 14);
    let t = (x ^ (x >> 28)) & 0x0000_0000_f0f0_f0f0;
    x ^= t ^ (t << 28);
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naive_transpose(m: &[u8], nrows: usize, ncols: usize) -> Vec<u8> {
        let bits = unpack_bits(m, nrows * ncols);
        let mut out = vec![false; nrows * ncols];
        for i in 0..nrows {
            for j in 0..ncols {
                out[j * nrows + i] = bits[i * ncols + j];
            }
        }
        pack_bits(&out)
    }

    #[test]
    fn test_xor_inplace() {
        let mut v = (0..128).map(|_| rand::random::<u8>()).collect::<Vec<u8>>();
        let goal = v.clone();
        let v_ = (0..128).map(|_| rand::random::<u8>()).collect::<Vec<u8>>();
        xor_inplace(&mut v, &v_);
        xor_inplace(&mut v, &v_);
        assert_eq!(v, goal);
    }

    #[test]
    fn test_and_inplace() {
        let mut v = (0..128).map(|_| rand::random::<u8>()).collect::<Vec<u8>>();
        let goal = v.clone();
        and_inplace(&mut v, &[0xff; 128]);
        assert_eq!(v, goal);
        and_inplace(&mut v, &[0; 128]);
        assert_eq!(v, vec![0; 128]);
    }

    #[test]
    fn test_pack_unpack() {
        let bits = vec![true, false, true, true, false, false, false, false, true];
        let bytes = pack_bits(&bits);
        assert_eq!(bytes, vec![0b1101, 1]);
        assert_eq!(unpack_bits(&bytes, bits.len()), bits);
    }

    proptest! {
        #[test]
        fn test_transpose_matches_naive(
            rows in 1usize..6,
            cols in 1usize..6,
            seed in any::<u64>(),
        ) {
            let (nrows, ncols) = (rows * 8, cols * 8);
            let m = (0..nrows * ncols / 8)
                .map(|i| (seed.wrapping_mul(i as u64 + 1) >> 13) as u8)
                .collect::<Vec<u8>>();
            let t = transpose(&m, nrows, ncols);
            prop_assert_eq!(&t, &naive_transpose(&m, nrows, ncols));
            prop_assert_eq!(transpose(&t, ncols, nrows), m);
        }
    }
}
