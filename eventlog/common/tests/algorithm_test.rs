/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

use eventlog_common::algorithm::{hash, hash_id, lookup, Digest, DigestAlgorithm};
use eventlog_common::error::{DecodeError, RegistryError};

#[test]
fn test_lookup_known_algorithms() {
    let expected = [(0x0004u16, 20usize), (0x000B, 32), (0x000C, 48), (0x000D, 64), (0x0012, 32)];
    for (id, size) in expected {
        let spec = lookup(id).unwrap();
        assert_eq!(spec.output_length, size, "size of algorithm 0x{:04x}", id);
        assert_eq!(spec.algorithm.id(), id);
    }
}

#[test]
fn test_lookup_unknown_algorithm() {
    let result = lookup(0x0010);
    assert!(matches!(result, Err(RegistryError::UnknownAlgorithm(_))), "{:?}", result);
}

#[test]
fn test_hash_known_vectors() {
    let sha1 = hash(DigestAlgorithm::Sha1, b"abc").unwrap();
    assert_eq!(sha1.to_hex(), "a9993e364706816aba3e25717850c26c9cd0d89d");

    let sha256 = hash_id(0x000B, b"abc").unwrap();
    assert_eq!(sha256.to_hex(), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    assert_eq!(sha256.algorithm(), DigestAlgorithm::Sha256);
}

#[test]
fn test_hash_id_unknown() {
    assert!(hash_id(0x9999, b"abc").is_err());
}

#[test]
fn test_names_round_trip() {
    for algorithm in DigestAlgorithm::all() {
        assert_eq!(DigestAlgorithm::from_name(algorithm.name()).unwrap(), algorithm);
    }
    assert_eq!(DigestAlgorithm::from_name("SM3").unwrap(), DigestAlgorithm::Sm3_256);
    assert!(DigestAlgorithm::from_name("md5").is_err());
}

#[test]
fn test_digest_rejects_wrong_length() {
    let result = Digest::new(DigestAlgorithm::Sha256, vec![0u8; 20]);
    assert_eq!(
        result,
        Err(DecodeError::DigestLengthMismatch {
            algorithm: "sha256".to_string(),
            expected: 32,
            actual: 20
        })
    );
}

#[test]
fn test_algorithm_serde_uses_names() {
    let json = serde_json::to_string(&DigestAlgorithm::Sha384).unwrap();
    assert_eq!(json, "\"sha384\"");
    let parsed: DigestAlgorithm = serde_json::from_str("\"sm3_256\"").unwrap();
    assert_eq!(parsed, DigestAlgorithm::Sm3_256);
}

#[test]
fn test_digest_from_hex() {
    let hex = "a9993e364706816aba3e25717850c26c9cd0d89d";
    let digest = Digest::from_hex(DigestAlgorithm::Sha1, hex).unwrap();
    assert_eq!(digest, hash(DigestAlgorithm::Sha1, b"abc").unwrap());

    let bad_hex = Digest::from_hex(DigestAlgorithm::Sha1, "zz");
    assert!(matches!(bad_hex, Err(DecodeError::InvalidEventData(_))));
    let short = Digest::from_hex(DigestAlgorithm::Sha256, "a9993e36");
    assert!(matches!(
        short,
        Err(DecodeError::DigestLengthMismatch { expected: 32, actual: 4, .. })
    ));
}
