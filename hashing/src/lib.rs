//! SHA-256 over the small fixed-size inputs used by shuffling and seed derivation.
//!
//! Every fixed-size input fits in a single 64 byte block once padded, so the functions below
//! fill a block with precomputed padding and run the compression function directly instead of
//! going through the streaming [`Sha256`] interface.

use ethereum_types::H256;
use generic_array::GenericArray;
use sha2::{
    digest::{core_api::BlockSizeUser, generic_array::typenum::Unsigned as _},
    Digest as _, Sha256,
};

type Sha256BlockSize = <Sha256 as BlockSizeUser>::BlockSize;
type Sha256Block = [u8; Sha256BlockSize::USIZE];

const BLOCK_SIZE: usize = Sha256BlockSize::USIZE;
const LENGTH_SIZE: usize = size_of::<u64>();

// Padding for messages that leave room for the `0x80` marker and the length in the same block.
const PADDED_FOR_32_BYTES: Sha256Block = padded_block(32);
const PADDED_FOR_33_BYTES: Sha256Block = padded_block(33);
const PADDED_FOR_37_BYTES: Sha256Block = padded_block(37);
const PADDED_FOR_40_BYTES: Sha256Block = padded_block(40);
const PADDED_FOR_44_BYTES: Sha256Block = padded_block(44);

// Messages of exactly one block need a second block containing nothing but padding.
const PADDING_AFTER_64_BYTES: Sha256Block = padding_only_block(BLOCK_SIZE);

const fn padded_block(message_length: usize) -> Sha256Block {
    assert!(message_length + 1 + LENGTH_SIZE <= BLOCK_SIZE);

    let mut block = [0; BLOCK_SIZE];
    block[message_length] = 0x80;
    write_bit_length(&mut block, message_length);
    block
}

const fn padding_only_block(message_length: usize) -> Sha256Block {
    let mut block = [0; BLOCK_SIZE];
    block[0] = 0x80;
    write_bit_length(&mut block, message_length);
    block
}

const fn write_bit_length(block: &mut Sha256Block, message_length: usize) {
    let bits = ((message_length * 8) as u64).to_be_bytes();
    let mut index = 0;

    while index < LENGTH_SIZE {
        block[BLOCK_SIZE - LENGTH_SIZE + index] = bits[index];
        index += 1;
    }
}

struct Sha256State([u32; 8]);

impl Default for Sha256State {
    #[rustfmt::skip]
    fn default() -> Self {
        Self([
            0x6a09_e667, 0xbb67_ae85, 0x3c6e_f372, 0xa54f_f53a,
            0x510e_527f, 0x9b05_688c, 0x1f83_d9ab, 0x5be0_cd19,
        ])
    }
}

impl Sha256State {
    fn compress(mut self, blocks: &[GenericArray<u8, Sha256BlockSize>]) -> Self {
        sha2::compress256(&mut self.0, blocks);
        self
    }

    fn finish(self) -> H256 {
        let mut output = H256::zero();

        for (bytes, word) in output.as_bytes_mut().chunks_exact_mut(4).zip(self.0) {
            bytes.copy_from_slice(&word.to_be_bytes());
        }

        output
    }
}

fn hash_block(block: Sha256Block) -> H256 {
    Sha256State::default()
        .compress(core::slice::from_ref(GenericArray::from_slice(&block)))
        .finish()
}

#[inline]
#[must_use]
pub fn hash_256(value: H256) -> H256 {
    let mut block = PADDED_FOR_32_BYTES;
    block[..32].copy_from_slice(value.as_bytes());
    hash_block(block)
}

/// Used to compute shuffling pivots.
#[inline]
#[must_use]
pub fn hash_256_8(seed: H256, round: u8) -> H256 {
    let mut block = PADDED_FOR_33_BYTES;
    block[..32].copy_from_slice(seed.as_bytes());
    block[32] = round;
    hash_block(block)
}

/// Used to compute the source of shuffling bits for a window of 256 positions.
#[inline]
#[must_use]
pub fn hash_256_8_32(seed: H256, round: u8, window: u32) -> H256 {
    let mut block = PADDED_FOR_37_BYTES;
    block[..32].copy_from_slice(seed.as_bytes());
    block[32] = round;
    block[33..37].copy_from_slice(&window.to_le_bytes());
    hash_block(block)
}

#[inline]
#[must_use]
pub fn hash_256_64(value: H256, number: u64) -> H256 {
    let mut block = PADDED_FOR_40_BYTES;
    block[..32].copy_from_slice(value.as_bytes());
    block[32..40].copy_from_slice(&number.to_le_bytes());
    hash_block(block)
}

#[inline]
#[must_use]
pub fn hash_32_64_256(domain: [u8; 4], number: u64, value: H256) -> H256 {
    let mut block = PADDED_FOR_44_BYTES;
    block[..4].copy_from_slice(&domain);
    block[4..12].copy_from_slice(&number.to_le_bytes());
    block[12..44].copy_from_slice(value.as_bytes());
    hash_block(block)
}

#[inline]
#[must_use]
pub fn hash_256_256(left: H256, right: H256) -> H256 {
    let mut block = GenericArray::default();
    block[..32].copy_from_slice(left.as_bytes());
    block[32..].copy_from_slice(right.as_bytes());

    let padding = *GenericArray::from_slice(&PADDING_AFTER_64_BYTES);

    Sha256State::default().compress(&[block, padding]).finish()
}

/// Hashes input of arbitrary length. Slower than the fixed-size functions.
#[must_use]
pub fn hash_bytes(bytes: impl AsRef<[u8]>) -> H256 {
    H256(Sha256::digest(bytes).into())
}
