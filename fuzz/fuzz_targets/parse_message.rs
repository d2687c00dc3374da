#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(env) = universe_vault::KeyEnvelope::from_json(text) {
        let again = universe_vault::KeyEnvelope::from_json(&env.to_json().unwrap()).unwrap();
        assert_eq!(again, env);
    }
    let _ = universe_vault::EncryptedMessage::from_json(text);
});
