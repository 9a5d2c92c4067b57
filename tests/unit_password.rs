use practia_core::{hash_password, verify_password};

#[test]
fn test_hash_password_produces_a_salted_hash() {
    let hash1 = hash_password("secure_password").unwrap();
    let hash2 = hash_password("secure_password").unwrap();

    assert_ne!(hash1, "secure_password");
    // different salts, different hashes
    assert_ne!(hash1, hash2);
}

#[test]
fn test_verify_password_distinguishes_wrong_from_broken() {
    let hash = hash_password("secure_password").unwrap();

    // wrong password is a clean `false`
    assert!(!verify_password("other_password", &hash).unwrap());
    assert!(verify_password("secure_password", &hash).unwrap());

    // a broken hash is an error, never `false`
    assert!(verify_password("secure_password", "garbage").is_err());
}
