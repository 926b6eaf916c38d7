use proptest::prelude::*;
use std::vec::Vec;

use super::*;
use crate::aes::Cipher;

fn oneshot(path: Path, key: &[u8], iv: &[u8], aad: &[u8], plain: &[u8]) -> (Vec<u8>, [u8; 16]) {
    let mut s = GcmSession::with_path(Cipher::new(key).unwrap(), path).unwrap();
    s.set_iv(iv).unwrap();
    s.set_aad(aad).unwrap();
    let mut out = vec![0u8; plain.len()];
    s.encrypt_update(plain, &mut out).unwrap();
    let mut tag = [0u8; 16];
    s.get_tag(&mut tag).unwrap();
    (out, tag)
}

fn available_paths() -> Vec<Path> {
    Path::ALL.into_iter().filter(|p| p.is_available()).collect()
}

proptest! {
    #[test]
    fn gcm_paths_agree(
        key in proptest::collection::vec(any::<u8>(), 16),
        iv in proptest::collection::vec(any::<u8>(), 1..=40),
        aad in proptest::collection::vec(any::<u8>(), 0..=100),
        plain in proptest::collection::vec(any::<u8>(), 0..=1100),
    ) {
        let expected = oneshot(Path::Scalar, &key, &iv, &aad, &plain);
        for path in available_paths() {
            prop_assert_eq!(&oneshot(path, &key, &iv, &aad, &plain), &expected);
        }
    }

    #[test]
    fn gcm_streaming_and_round_trip(
        key in proptest::collection::vec(any::<u8>(), 32),
        aad in proptest::collection::vec(any::<u8>(), 0..=100),
        plain in proptest::collection::vec(any::<u8>(), 0..=1100),
        split in any::<usize>(),
        chunk in 1usize..=300,
    ) {
        let iv = [7u8; 12];
        let (expected_ct, expected_tag) = oneshot(Path::Scalar, &key, &iv, &aad, &plain);

        let split = split % (plain.len() + 1);
        let (a, b) = plain.split_at(split);
        let mut s = GcmSession::new(Cipher::new(&key).unwrap());
        s.set_iv(&iv).unwrap();
        for part in aad.chunks(chunk) {
            s.set_aad(part).unwrap();
        }
        let mut ct = Vec::with_capacity(plain.len());
        for part in a.chunks(chunk).chain(b.chunks(chunk)) {
            let mut out = part.to_vec();
            s.encrypt_update_inplace(&mut out).unwrap();
            ct.extend_from_slice(&out);
        }
        let mut tag = [0u8; 16];
        s.get_tag(&mut tag).unwrap();
        prop_assert_eq!(&ct, &expected_ct);
        prop_assert_eq!(tag, expected_tag);

        s.set_iv(&iv).unwrap();
        s.set_aad(&aad).unwrap();
        let mut back = vec![0u8; ct.len()];
        s.decrypt_update(&ct, &mut back).unwrap();
        prop_assert_eq!(&back, &plain);
        prop_assert!(s.verify_tag(&tag).is_ok());
    }
}
