// -*- mode: rust; -*-
//
// This file is part of `setops-primitives`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Block-oriented wrappers around the `aes` crate.

use crate::Block;
use aes::cipher::{BlockEncrypt, KeyInit};
use generic_array::GenericArray;

/// AES-128, encryption only.
#[derive(Clone)]
pub struct Aes128(aes::Aes128);

impl Aes128 {
    /// Create a new `Aes128` object, using `key` as the AES key.
    #[inline]
    pub fn new(key: Block) -> Self {
        let key: [u8; 16] = key.into();
        Aes128(aes::Aes128::new(GenericArray::from_slice(&key)))
    }

    /// Encrypt a block, outputting the ciphertext.
    #[inline(always)]
    pub fn encrypt(&self, m: Block) -> Block {
        let mut c = GenericArray::from(<[u8; 16]>::from(m));
        self.0.encrypt_block(&mut c);
        Block::from(<[u8; 16]>::from(c))
    }

    /// Encrypt every block of `blocks` in place.
    #[inline]
    pub fn encrypt_many(&self, blocks: &mut [Block]) {
        for b in blocks.iter_mut() {
            *b = self.encrypt(*b);
        }
    }
}

/// AES-256, encryption only.
#[derive(Clone)]
pub struct Aes256(aes::Aes256);

impl Aes256 {
    /// Create a new `Aes256` object, using `key` as the AES key.
    #[inline]
    pub fn new(key: &[u8; 32]) -> Self {
        Aes256(aes::Aes256::new(GenericArray::from_slice(key)))
    }

    /// Encrypt a block, outputting the ciphertext.
    #[inline(always)]
    pub fn encrypt(&self, m: Block) -> Block {
        let mut c = GenericArray::from(<[u8; 16]>::from(m));
        self.0.encrypt_block(&mut c);
        Block::from(<[u8; 16]>::from(c))
    }
}
