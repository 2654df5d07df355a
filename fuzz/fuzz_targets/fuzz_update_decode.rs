#![no_main]

use libfuzzer_sys::fuzz_target;

use botprobe::bot::envelope;
use botprobe::updates::{Originators, Update, UpdateFilter, UpdateKind};

fuzz_target!(|data: &str| {
    // Server bodies are untrusted: decoding and classifying a getUpdates
    // response must return Ok/Err, never panic.
    let Ok(updates) = envelope::decode::<Vec<Update>>("getUpdates", 200, data) else {
        return;
    };

    let Ok(filter) = UpdateFilter::new(
        [UpdateKind::Poll, UpdateKind::Message],
        Originators::default(),
    ) else {
        return;
    };

    for update in &updates {
        let _ = update.kind();
        let _ = update.originator();
        let _ = filter.matches(update);
    }
});
