#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let _ = universe_vault::keys::pem_body(text);
    let _ = universe_vault::RecipientPublicKey::from_pem(text);
});
