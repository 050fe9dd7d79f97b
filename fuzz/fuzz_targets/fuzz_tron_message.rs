#![no_main]

use libfuzzer_sys::fuzz_target;
use paybridge_tron::protocol::TronLinkMessage;
use paybridge_tron::address::validate_address;

fuzz_target!(|data: &[u8]| {
    // window.postMessage payloads come from any frame on the page
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        if let Some(message) = TronLinkMessage::from_window_data(&value) {
            let _ = message.action();
        }
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = validate_address(text);
    }
});
