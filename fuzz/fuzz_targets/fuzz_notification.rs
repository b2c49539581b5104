#![no_main]

use gathering_client::notification::{Notification, DEFAULT_ISSUER_PREFIX};
use gathering_client::protocol::NotificationMessage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Whole push frames, as the listener decodes them.
    if let Ok(message) = serde_json::from_slice::<NotificationMessage>(data) {
        let _ = Notification::classify(&message, DEFAULT_ISSUER_PREFIX);
    }

    // Arbitrary payloads under each recognized issuer.
    if let Ok(payload) = std::str::from_utf8(data) {
        for issuer in [
            "Gs2Matchmaking:Join",
            "Gs2Matchmaking:Leave",
            "Gs2Matchmaking:Complete",
        ] {
            let message = NotificationMessage::new(issuer, payload);
            let _ = Notification::classify(&message, DEFAULT_ISSUER_PREFIX);
        }
    }
});
