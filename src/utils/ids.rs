use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub const PEER_ID_LEN: usize = 7;
pub const OBJECT_ID_LEN: usize = 26;

// Collisions are possible (birthday bound) and are not checked anywhere.
fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Opaque peer id, short enough to show next to a display name.
pub fn generate_peer_id() -> String {
    random_token(PEER_ID_LEN)
}

/// Opaque id for streams, blocks, messages, sessions and scratchpad items.
pub fn generate_id() -> String {
    random_token(OBJECT_ID_LEN)
}

/// Default display name for a peer that did not configure one.
pub fn generate_peer_name() -> String {
    format!("Dev-{}", rand::thread_rng().gen_range(0..1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_expected_shape() {
        let peer = generate_peer_id();
        let object = generate_id();
        assert_eq!(peer.len(), PEER_ID_LEN);
        assert_eq!(object.len(), OBJECT_ID_LEN);
        assert!(object.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn peer_name_is_prefixed() {
        let name = generate_peer_name();
        let suffix: u32 = name.strip_prefix("Dev-").unwrap().parse().unwrap();
        assert!(suffix < 1000);
    }
}
