//! Driver token generation.

use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use rand::rngs::OsRng;

use labcon_types::DriverToken;

/// Number of random bytes in a token (160 bits).
pub const TOKEN_BYTES: usize = 20;

/// Source of fresh driver tokens.
pub trait TokenGenerator: Send + Sync {
    /// Produces a new token. Every call must return an unpredictable value.
    fn generate(&self) -> DriverToken;
}

/// Generates tokens from the operating system's CSPRNG.
///
/// Each token is [`TOKEN_BYTES`] random bytes rendered as unpadded base-32,
/// so it is safe to carry in headers, URLs, and JSON strings alike.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> DriverToken {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        DriverToken::new(BASE32_NOPAD.encode(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tokens_use_the_base32_alphabet() {
        let token = RandomTokenGenerator.generate();
        // 160 bits in 5-bit symbols.
        assert_eq!(token.as_str().len(), 32);
        assert!(
            token
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
        );
    }

    #[test]
    fn tokens_do_not_repeat() {
        let tokens: HashSet<_> = (0..64).map(|_| RandomTokenGenerator.generate()).collect();
        assert_eq!(tokens.len(), 64);
    }
}
