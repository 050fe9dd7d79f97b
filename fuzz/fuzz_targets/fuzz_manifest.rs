#![no_main]

use libfuzzer_sys::fuzz_target;
use paybridge::{PaymentManifest, Session};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(manifest) = PaymentManifest::from_json(text) else {
        return;
    };
    let session = Session::default();
    for code in manifest.codes() {
        let entry = manifest.get(code).expect("listed code resolves");
        let _ = entry.transfer_decimals();
        let _ = entry.expected_chain_id();
        assert!(!manifest.is_network_valid(code, &session));
    }
});
