const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over the name bytes. Zero means "no name" elsewhere, so it is never returned.
pub fn name_hash(name: &[u8]) -> u32 {
    let hash = name.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    if hash == 0 {
        1
    } else {
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_known_vectors() {
        assert_eq!(name_hash(b""), FNV_OFFSET);
        assert_eq!(name_hash(b"a"), 0xe40c_292c);
    }

    #[rstest::rstest]
    fn test_order_dependent() {
        assert_ne!(name_hash(b"ab"), name_hash(b"ba"));
    }

    #[rstest::rstest]
    fn test_never_zero() {
        for name in ["level", "tutorial", "objects", "x", "0"] {
            assert_ne!(name_hash(name.as_bytes()), 0);
        }
    }
}
