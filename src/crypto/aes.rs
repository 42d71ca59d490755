//! AES block cipher, encryption direction only.
//!
//! The round function is the classic table-driven formulation: four
//! 256-entry tables fold SubBytes, ShiftRows and MixColumns into lookups,
//! and a plain S-box lookup handles the final round (which has no
//! MixColumns).  Tables depend only on the S-box, so they are built once at
//! compile time into an immutable [`Tables`] value that any number of
//! [`Aes`] instances may borrow concurrently.
//!
//! Only encryption is provided; counter mode never needs the inverse cipher.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::CipherError;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Largest key schedule (AES-256: 4 * (14 + 1) words).
const MAX_SCHEDULE_WORDS: usize = 60;

/// FIPS-197 substitution box.
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

/// Round constants, indexed by `i / Nk` during key expansion.
const RCON: [u32; 11] = [
    0x0000_0000,
    0x0100_0000,
    0x0200_0000,
    0x0400_0000,
    0x0800_0000,
    0x1000_0000,
    0x2000_0000,
    0x4000_0000,
    0x8000_0000,
    0x1b00_0000,
    0x3600_0000,
];

/// Precomputed round-transform tables.
///
/// `t0..t3` hold `S[x]` multiplied in GF(2^8) by the MixColumns column
/// `(2, 1, 1, 3)` rotated once per table; `sbox` is the substitution-only
/// table for the last round and the key schedule.
pub struct Tables {
    t0: [u32; 256],
    t1: [u32; 256],
    t2: [u32; 256],
    t3: [u32; 256],
    sbox: [u8; 256],
}

impl Tables {
    /// Derive every table from the S-box.
    pub const fn build() -> Self {
        let mut t0 = [0u32; 256];
        let mut t1 = [0u32; 256];
        let mut t2 = [0u32; 256];
        let mut t3 = [0u32; 256];

        let mut x = 0;
        while x < 256 {
            let s = SBOX[x] as u32;
            let mut s2 = s << 1;
            if s2 & 0x100 != 0 {
                s2 ^= 0x11b;
            }
            let s3 = s2 ^ s;

            t0[x] = (s2 << 24) | (s << 16) | (s << 8) | s3;
            t1[x] = (s3 << 24) | (s2 << 16) | (s << 8) | s;
            t2[x] = (s << 24) | (s3 << 16) | (s2 << 8) | s;
            t3[x] = (s << 24) | (s << 16) | (s3 << 8) | s2;
            x += 1;
        }

        Self {
            t0,
            t1,
            t2,
            t3,
            sbox: SBOX,
        }
    }

    fn sub_word(&self, word: u32) -> u32 {
        (u32::from(self.sbox[(word >> 24) as usize]) << 24)
            | (u32::from(self.sbox[((word >> 16) & 0xff) as usize]) << 16)
            | (u32::from(self.sbox[((word >> 8) & 0xff) as usize]) << 8)
            | u32::from(self.sbox[(word & 0xff) as usize])
    }

    /// One full round for output column `c`: ShiftRows picks byte `r` of
    /// column `c + r`, and each table applies SubBytes + MixColumns.
    fn round_column(&self, s: &[u32; 4], c: usize) -> u32 {
        self.t0[(s[c] >> 24) as usize]
            ^ self.t1[((s[(c + 1) % 4] >> 16) & 0xff) as usize]
            ^ self.t2[((s[(c + 2) % 4] >> 8) & 0xff) as usize]
            ^ self.t3[(s[(c + 3) % 4] & 0xff) as usize]
    }

    /// Final-round column: SubBytes + ShiftRows only.
    fn final_column(&self, s: &[u32; 4], c: usize) -> u32 {
        (u32::from(self.sbox[(s[c] >> 24) as usize]) << 24)
            | (u32::from(self.sbox[((s[(c + 1) % 4] >> 16) & 0xff) as usize]) << 16)
            | (u32::from(self.sbox[((s[(c + 2) % 4] >> 8) & 0xff) as usize]) << 8)
            | u32::from(self.sbox[(s[(c + 3) % 4] & 0xff) as usize])
    }
}

/// Process-wide table set.  Immutable, so sharing it needs no locking.
pub static TABLES: Tables = Tables::build();

/// Expanded round keys for one AES key.  Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeySchedule {
    words: [u32; MAX_SCHEDULE_WORDS],
    rounds: usize,
}

impl KeySchedule {
    /// Expand a 16, 24 or 32 byte key into `4 * (rounds + 1)` words.
    pub fn expand(key: &[u8], tables: &Tables) -> Result<Self, CipherError> {
        let rounds = match key.len() {
            16 => 10,
            24 => 12,
            32 => 14,
            n => return Err(CipherError::InvalidKeySize(n)),
        };
        let nk = key.len() / 4;
        let total = 4 * (rounds + 1);

        let mut words = [0u32; MAX_SCHEDULE_WORDS];
        for (word, chunk) in words.iter_mut().zip(key.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        for i in nk..total {
            let mut temp = words[i - 1];
            if i % nk == 0 {
                temp = tables.sub_word(temp.rotate_left(8)) ^ RCON[i / nk];
            } else if nk == 8 && i % nk == 4 {
                temp = tables.sub_word(temp);
            }
            words[i] = words[i - nk] ^ temp;
        }

        Ok(Self { words, rounds })
    }

    /// Number of cipher rounds (10, 12 or 14).
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// The four words of round key `round`.
    fn round_key(&self, round: usize) -> &[u32] {
        &self.words[4 * round..4 * round + 4]
    }

    /// Every generated word, in schedule order.
    pub fn words(&self) -> &[u32] {
        &self.words[..4 * (self.rounds + 1)]
    }
}

/// An AES instance bound to one key and a borrowed table set.
#[derive(Clone)]
pub struct Aes<'t> {
    schedule: KeySchedule,
    tables: &'t Tables,
}

impl Aes<'static> {
    /// Build a cipher over the process-wide [`TABLES`].
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        Self::with_tables(key, &TABLES)
    }
}

impl<'t> Aes<'t> {
    /// Build a cipher that reads from `tables` instead of the shared set.
    pub fn with_tables(key: &[u8], tables: &'t Tables) -> Result<Self, CipherError> {
        let schedule = KeySchedule::expand(key, tables)?;
        Ok(Self { schedule, tables })
    }

    /// The expanded round keys.
    pub fn schedule(&self) -> &KeySchedule {
        &self.schedule
    }

    /// Encrypt one 16-byte block.
    pub fn encrypt_block(&self, block: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let t = self.tables;
        let k0 = self.schedule.round_key(0);

        let mut state = [0u32; 4];
        for (c, word) in state.iter_mut().enumerate() {
            let b = &block[4 * c..4 * c + 4];
            *word = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) ^ k0[c];
        }

        let rounds = self.schedule.rounds;
        for round in 1..rounds {
            let rk = self.schedule.round_key(round);
            state = [
                t.round_column(&state, 0) ^ rk[0],
                t.round_column(&state, 1) ^ rk[1],
                t.round_column(&state, 2) ^ rk[2],
                t.round_column(&state, 3) ^ rk[3],
            ];
        }

        let rk = self.schedule.round_key(rounds);
        let mut out = [0u8; BLOCK_SIZE];
        for c in 0..4 {
            let word = t.final_column(&state, c) ^ rk[c];
            out[4 * c..4 * c + 4].copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// Like [`Aes::encrypt_block`], for callers holding an unchecked slice.
    pub fn encrypt_slice(&self, block: &[u8]) -> Result<[u8; BLOCK_SIZE], CipherError> {
        let block: &[u8; BLOCK_SIZE] = block
            .try_into()
            .map_err(|_| CipherError::InvalidBlockSize(block.len()))?;
        Ok(self.encrypt_block(block))
    }
}
