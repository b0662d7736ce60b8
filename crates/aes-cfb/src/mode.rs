//! CFB-128 over the forward AES-128 cipher.
//!
//! Each chunk of up to 16 bytes is XORed with the encryption of the current
//! feedback block. The feedback starts as the IV and is then always the most
//! recent ciphertext chunk, in both directions.

use aes_core::{
    encrypt_block_traced, expand_key, xor_in_place, Aes128Key, Block, Direction, ExpandedKey,
    TraceEvent, TraceSink, BLOCK_LEN,
};
use tracing::debug;

use crate::error::{Error, Result};

/// A CFB-128 session: one expanded key and one IV.
#[derive(Clone)]
pub struct Cfb128 {
    expanded: ExpandedKey,
    iv: Block,
}

impl Cfb128 {
    /// Validates raw key and IV buffers and expands the key.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        let key = Aes128Key::try_from(key)?;
        let iv: Block = iv
            .try_into()
            .map_err(|_| Error::InvalidIvLength { got: iv.len() })?;
        Ok(Self::with_key(&key, iv))
    }

    /// Builds a session from already-typed inputs.
    pub fn with_key(key: &Aes128Key, iv: Block) -> Self {
        let expanded = expand_key(key);
        debug!("cfb session initialised");
        Self { expanded, iv }
    }

    /// The IV seeding the feedback chain.
    pub fn iv(&self) -> &Block {
        &self.iv
    }

    /// The key schedule shared by every chunk of the session.
    pub fn expanded_key(&self) -> &ExpandedKey {
        &self.expanded
    }

    /// Encrypts `plaintext` of any length.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        self.encrypt_traced(plaintext, &mut ())
    }

    /// Decrypts `ciphertext` of any length.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8> {
        self.decrypt_traced(ciphertext, &mut ())
    }

    /// Encrypts while reporting every intermediate value to `sink`.
    pub fn encrypt_traced<S>(&self, plaintext: &[u8], sink: &mut S) -> Vec<u8>
    where
        S: TraceSink + ?Sized,
    {
        self.run(Direction::Encrypt, plaintext, sink)
    }

    /// Decrypts while reporting every intermediate value to `sink`.
    pub fn decrypt_traced<S>(&self, ciphertext: &[u8], sink: &mut S) -> Vec<u8>
    where
        S: TraceSink + ?Sized,
    {
        self.run(Direction::Decrypt, ciphertext, sink)
    }

    fn run<S>(&self, direction: Direction, input: &[u8], sink: &mut S) -> Vec<u8>
    where
        S: TraceSink + ?Sized,
    {
        let mut output = Vec::with_capacity(input.len());
        let mut chain = Chain::new(&self.expanded, self.iv);
        for chunk in input.chunks(BLOCK_LEN) {
            chain.step(direction, chunk, &mut output, sink);
        }
        debug!(
            ?direction,
            bytes = input.len(),
            chunks = chain.chunks(),
            "cfb stream done"
        );
        output
    }
}

/// The feedback recurrence shared by one-shot and incremental streams.
pub(crate) struct Chain<'k> {
    expanded: &'k ExpandedKey,
    feedback: Block,
    index: usize,
}

impl<'k> Chain<'k> {
    pub(crate) fn new(expanded: &'k ExpandedKey, iv: Block) -> Self {
        Self {
            expanded,
            feedback: iv,
            index: 0,
        }
    }

    pub(crate) fn chunks(&self) -> usize {
        self.index
    }

    /// Processes one chunk of 1..=16 bytes, appending the result to `out`.
    pub(crate) fn step<S>(
        &mut self,
        direction: Direction,
        chunk: &[u8],
        out: &mut Vec<u8>,
        sink: &mut S,
    ) where
        S: TraceSink + ?Sized,
    {
        debug_assert!(!chunk.is_empty() && chunk.len() <= BLOCK_LEN);
        let traced = sink.enabled();
        let index = self.index;

        if traced {
            if index == 0 {
                sink.record(TraceEvent::ExpandedKey(self.expanded));
            }
            sink.record(TraceEvent::Feedback {
                index,
                block: &self.feedback,
            });
        }

        let keystream = encrypt_block_traced(&self.feedback, self.expanded, sink);
        if traced {
            sink.record(TraceEvent::Keystream {
                index,
                block: &keystream,
            });
        }

        let start = out.len();
        out.extend_from_slice(chunk);
        xor_in_place(&mut out[start..], &keystream);
        let produced = &out[start..];
        if traced {
            sink.record(TraceEvent::Output {
                index,
                direction,
                chunk: produced,
            });
        }

        let ciphertext = match direction {
            Direction::Encrypt => produced,
            Direction::Decrypt => chunk,
        };
        // Only the last chunk can be short, so a short one never feeds the cipher.
        if let Ok(next) = <Block>::try_from(ciphertext) {
            self.feedback = next;
        }
        self.index += 1;
    }
}

/// One-shot CFB-128 encryption from raw key and IV buffers.
pub fn encrypt_stream(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    Ok(Cfb128::new(key, iv)?.encrypt(plaintext))
}

/// One-shot CFB-128 decryption from raw key and IV buffers.
pub fn decrypt_stream(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    Ok(Cfb128::new(key, iv)?.decrypt(ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Recorder;
    use aes_core::encrypt_block;
    use rand::{Rng, RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn unhex(s: &str) -> Vec<u8> {
        hex::decode(s).expect("valid hex")
    }

    // NIST SP 800-38A, F.3.13 CFB128-AES128.Encrypt
    const SP800_KEY: &str = "2b7e151628aed2a6abf7158809cf4f3c";
    const SP800_IV: &str = "000102030405060708090a0b0c0d0e0f";
    const SP800_PLAIN: &str = concat!(
        "6bc1bee22e409f96e93d7e117393172a",
        "ae2d8a571e03ac9c9eb76fac45af8e51",
        "30c81c46a35ce411e5fbc1191a0a52ef",
        "f69f2445df4f9b17ad2b417be66c3710",
    );
    const SP800_CIPHER: &str = concat!(
        "3b3fd92eb72dad20333449f8e83cfb4a",
        "c8a64537a0b3a93fcde3cdad9f1ce58b",
        "26751f67a3cbb140b1808cf187a4f4df",
        "c04b05357c5d1c0eeac4c66f9ff7f2e6",
    );

    fn sp800_session() -> Cfb128 {
        Cfb128::new(&unhex(SP800_KEY), &unhex(SP800_IV)).expect("valid lengths")
    }

    #[test]
    fn matches_sp800_38a_vectors() {
        let cfb = sp800_session();
        assert_eq!(cfb.encrypt(&unhex(SP800_PLAIN)), unhex(SP800_CIPHER));
        assert_eq!(cfb.decrypt(&unhex(SP800_CIPHER)), unhex(SP800_PLAIN));
    }

    #[test]
    fn rejects_bad_key_and_iv_lengths() {
        assert!(matches!(
            Cfb128::new(&[0u8; 15], &[0u8; 16]),
            Err(Error::InvalidKeyLength { got: 15 })
        ));
        assert!(matches!(
            Cfb128::new(&[0u8; 32], &[0u8; 16]),
            Err(Error::InvalidKeyLength { got: 32 })
        ));
        assert!(matches!(
            Cfb128::new(&[0u8; 16], &[0u8; 8]),
            Err(Error::InvalidIvLength { got: 8 })
        ));
        assert!(matches!(
            encrypt_stream(b"data", &[0u8; 16], &[]),
            Err(Error::InvalidIvLength { got: 0 })
        ));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let cfb = Cfb128::new(&[1u8; 16], &[2u8; 16]).expect("valid lengths");
        assert!(cfb.encrypt(&[]).is_empty());
        assert!(cfb.decrypt(&[]).is_empty());

        let mut recorder = Recorder::default();
        assert!(cfb.encrypt_traced(&[], &mut recorder).is_empty());
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn partial_final_block_uses_keystream_prefix() {
        let key = [0x42u8; 16];
        let iv = [0x24u8; 16];
        let plaintext: Vec<u8> = (0u8..20).collect();
        let cfb = Cfb128::new(&key, &iv).expect("valid lengths");
        let ciphertext = cfb.encrypt(&plaintext);
        assert_eq!(ciphertext.len(), 20);

        let expanded = expand_key(&Aes128Key::from(key));
        let first_ks = encrypt_block(&iv, &expanded);
        for j in 0..16 {
            assert_eq!(ciphertext[j], plaintext[j] ^ first_ks[j]);
        }
        let mut feedback = [0u8; 16];
        feedback.copy_from_slice(&ciphertext[..16]);
        let second_ks = encrypt_block(&feedback, &expanded);
        for j in 0..4 {
            assert_eq!(ciphertext[16 + j], plaintext[16 + j] ^ second_ks[j]);
        }
        assert_eq!(cfb.decrypt(&ciphertext), plaintext);
    }

    #[test]
    fn feedback_is_previous_ciphertext_chunk_in_both_directions() {
        let cfb = sp800_session();
        let plaintext: Vec<u8> = (0..75u8).map(|b| b.wrapping_mul(37)).collect();

        let mut enc_trace = Recorder::default();
        let ciphertext = cfb.encrypt_traced(&plaintext, &mut enc_trace);
        let mut dec_trace = Recorder::default();
        let recovered = cfb.decrypt_traced(&ciphertext, &mut dec_trace);
        assert_eq!(recovered, plaintext);

        for trace in [&enc_trace, &dec_trace] {
            let feedbacks = trace.feedbacks();
            assert_eq!(feedbacks.len(), 5);
            assert_eq!(feedbacks[0], cfb.iv().as_slice());
            for i in 1..feedbacks.len() {
                assert_eq!(feedbacks[i], &ciphertext[(i - 1) * 16..i * 16]);
            }
        }
        assert_eq!(enc_trace.keystreams(), dec_trace.keystreams());
    }

    #[test]
    fn random_round_trips() {
        let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
        for _ in 0..64 {
            let mut key = [0u8; 16];
            let mut iv = [0u8; 16];
            rng.fill_bytes(&mut key);
            rng.fill_bytes(&mut iv);
            let len = rng.gen_range(0..200);
            let mut plaintext = vec![0u8; len];
            rng.fill_bytes(&mut plaintext);

            let ciphertext = encrypt_stream(&plaintext, &key, &iv).expect("valid lengths");
            assert_eq!(ciphertext.len(), len);
            let recovered = decrypt_stream(&ciphertext, &key, &iv).expect("valid lengths");
            assert_eq!(recovered, plaintext);
        }
    }

    #[test]
    fn encryption_is_deterministic() {
        let cfb = sp800_session();
        let plaintext = b"the same input gives the same output";
        assert_eq!(cfb.encrypt(plaintext), cfb.encrypt(plaintext));
    }

    #[test]
    fn tracing_does_not_change_results() {
        let cfb = sp800_session();
        let plaintext = unhex(SP800_PLAIN);
        let mut recorder = Recorder::default();
        assert_eq!(
            cfb.encrypt_traced(&plaintext[..40], &mut recorder),
            cfb.encrypt(&plaintext[..40])
        );
    }
}
