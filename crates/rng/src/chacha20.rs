//! RFC 7539 ChaCha20 cipher stream generator.
//!
//! Provides a deterministic, cryptographically-strong source of uniform
//! bits. The simulator never reads entropy straight off this type —
//! everything above it in this crate treats it as an abstract bitstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ChaCha20Rng {
    key: [u32; 8],
    nonce: [u32; 3],
    counter: u64,
    block_index: usize,
    current_block: [u32; 16],
}

impl ChaCha20Rng {
    /// Initialize from a 256-bit key and 96-bit nonce.
    pub fn new(key: [u8; 32], nonce: [u8; 12]) -> Self {
        let key_bytes: arrayvec::ArrayVec<[u8; 4], 8> = key
            .chunks_exact(4)
            .map(|chunk| {
                let mut arr = [0u8; 4];
                arr.copy_from_slice(chunk);
                arr
            })
            .collect();

        let key: [u32; 8] = match key_bytes.into_inner() {
            Ok(bytes) => bytes.map(u32::from_le_bytes),
            Err(_) => [0u32; 8],
        };

        let nonce_bytes: arrayvec::ArrayVec<[u8; 4], 3> = nonce
            .chunks_exact(4)
            .map(|chunk| {
                let mut arr = [0u8; 4];
                arr.copy_from_slice(chunk);
                arr
            })
            .collect();

        let nonce: [u32; 3] = match nonce_bytes.into_inner() {
            Ok(bytes) => bytes.map(u32::from_le_bytes),
            Err(_) => [0u32; 3],
        };

        Self {
            key,
            nonce,
            counter: 0,
            block_index: 64, // force generation of the first block
            current_block: [0u32; 16],
        }
    }

    /// Generate the next 32-bit word from the stream.
    pub fn next_u32(&mut self) -> u32 {
        if self.block_index >= 64 {
            self.generate_block();
            self.block_index = 0;
        }

        let value = self.current_block[self.block_index / 4];
        self.block_index += 4;
        value
    }

    /// Generate the next 64-bit word from the stream.
    pub fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    /// Generate the next value in the half-open interval `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / 9007199254740992.0)
    }

    /// RFC 7539 block function.
    fn generate_block(&mut self) {
        let mut state = [0u32; 16];

        state[0] = 0x6170_7865;
        state[1] = 0x3320_646e;
        state[2] = 0x7962_2d32;
        state[3] = 0x6b20_6574;

        state[4] = self.key[0];
        state[5] = self.key[1];
        state[6] = self.key[2];
        state[7] = self.key[3];
        state[8] = self.key[4];
        state[9] = self.key[5];
        state[10] = self.key[6];
        state[11] = self.key[7];

        state[12] = (self.counter & 0xffff_ffff) as u32;
        state[13] = ((self.counter >> 32) & 0xffff_ffff) as u32;
        state[14] = self.nonce[0];
        state[15] = self.nonce[1];

        let mut working = state;

        for _ in 0..10 {
            Self::quarter_round(&mut working, 0, 4, 8, 12);
            Self::quarter_round(&mut working, 1, 5, 9, 13);
            Self::quarter_round(&mut working, 2, 6, 10, 14);
            Self::quarter_round(&mut working, 3, 7, 11, 15);

            Self::quarter_round(&mut working, 0, 5, 10, 15);
            Self::quarter_round(&mut working, 1, 6, 11, 12);
            Self::quarter_round(&mut working, 2, 7, 8, 13);
            Self::quarter_round(&mut working, 3, 4, 9, 14);
        }

        for i in 0..16 {
            self.current_block[i] = working[i].wrapping_add(state[i]);
        }

        self.counter += 1;
    }

    #[inline]
    fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
        state[a] = state[a].wrapping_add(state[b]);
        state[d] ^= state[a];
        state[d] = state[d].rotate_left(16);

        state[c] = state[c].wrapping_add(state[d]);
        state[b] ^= state[c];
        state[b] = state[b].rotate_left(12);

        state[a] = state[a].wrapping_add(state[b]);
        state[d] ^= state[a];
        state[d] = state[d].rotate_left(8);

        state[c] = state[c].wrapping_add(state[d]);
        state[b] ^= state[c];
        state[b] = state[b].rotate_left(7);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_given_same_key_and_nonce() {
        let key = [42u8; 32];
        let nonce = [0u8; 12];

        let mut rng1 = ChaCha20Rng::new(key, nonce);
        let mut rng2 = ChaCha20Rng::new(key, nonce);

        for _ in 0..10 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn diverges_on_different_keys() {
        let key1 = [42u8; 32];
        let key2 = [43u8; 32];
        let nonce = [0u8; 12];

        let mut rng1 = ChaCha20Rng::new(key1, nonce);
        let mut rng2 = ChaCha20Rng::new(key2, nonce);

        assert_ne!(rng1.next_u32(), rng2.next_u32());
    }

    #[test]
    fn f64_stays_in_unit_interval() {
        let key = [7u8; 32];
        let nonce = [0u8; 12];
        let mut rng = ChaCha20Rng::new(key, nonce);

        for _ in 0..200 {
            let val = rng.next_f64();
            assert!((0.0..1.0).contains(&val));
        }
    }
}
