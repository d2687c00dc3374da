#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use universe_vault::{decrypt_payload, Aad, KeyEnvelope, SessionKey};

static KEY: Lazy<SessionKey> = Lazy::new(|| SessionKey::from_bytes(&[0x42; 32]).unwrap());

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let a = (data[0] as usize) % (data.len() + 1);
    let b = (data[1] as usize) % (data.len() + 1);
    let (i, j) = if a <= b { (a, b) } else { (b, a) };

    let iv = data[..i].to_vec();
    let tag = data[i..j].to_vec();
    let payload = data[j..].to_vec();

    let envelope = KeyEnvelope::new(None, iv, Vec::new(), tag, payload);
    // Must never panic, and random input must never authenticate.
    assert!(decrypt_payload(&KEY, &envelope, &Aad::for_message("a", "b")).is_err());
});
