//! Fixed-width project name codec.
//!
//! Names are stored as `BytesN<32>`: the UTF-8 bytes right-padded with
//! zeros. Decoding stops at the first zero byte, so names containing a NUL
//! are rejected at encode time to keep the round trip lossless.

use soroban_sdk::{BytesN, Env, String};

use crate::Error;

/// Maximum encoded length of a project name, in bytes.
pub const NAME_CAPACITY: u32 = 32;

pub fn encode(env: &Env, name: &String) -> Result<BytesN<32>, Error> {
    let len = name.len();
    if len > NAME_CAPACITY {
        return Err(Error::InvalidInput);
    }

    let mut buf = [0u8; 32];
    name.copy_into_slice(&mut buf[..len as usize]);
    if buf[..len as usize].contains(&0) {
        return Err(Error::InvalidInput);
    }

    Ok(BytesN::from_array(env, &buf))
}

pub fn decode(env: &Env, raw: &BytesN<32>) -> String {
    let buf = raw.to_array();
    let len = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
    String::from_bytes(env, &buf[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_is_zero_padded() {
        let env = Env::default();
        let raw = encode(&env, &String::from_str(&env, "DAO")).unwrap();
        let bytes = raw.to_array();
        assert_eq!(&bytes[..3], b"DAO");
        assert!(bytes[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn full_width_name_round_trips() {
        let env = Env::default();
        let name = String::from_str(&env, "0123456789abcdef0123456789abcdef");
        let raw = encode(&env, &name).unwrap();
        assert_eq!(decode(&env, &raw), name);
    }

    #[test]
    fn multibyte_name_round_trips() {
        let env = Env::default();
        let name = String::from_str(&env, "Vot\u{103}ri \u{219}i propuneri");
        let raw = encode(&env, &name).unwrap();
        assert_eq!(decode(&env, &raw), name);
    }

    #[test]
    fn oversized_name_is_rejected() {
        let env = Env::default();
        let name = String::from_str(&env, "this project name is far too long to fit");
        assert_eq!(encode(&env, &name), Err(Error::InvalidInput));
    }

    #[test]
    fn embedded_nul_is_rejected() {
        let env = Env::default();
        let name = String::from_str(&env, "bad\0name");
        assert_eq!(encode(&env, &name), Err(Error::InvalidInput));
    }

    #[test]
    fn empty_name_round_trips() {
        let env = Env::default();
        let name = String::from_str(&env, "");
        let raw = encode(&env, &name).unwrap();
        assert_eq!(raw.to_array(), [0u8; 32]);
        assert_eq!(decode(&env, &raw), name);
    }
}
