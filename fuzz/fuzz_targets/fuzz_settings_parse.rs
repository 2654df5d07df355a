#![no_main]

use libfuzzer_sys::fuzz_target;

use botprobe::config::Settings;

fuzz_target!(|data: &str| {
    // Arbitrary JSON5 must parse or fail cleanly, and whatever parses must
    // validate and redact without panicking.
    let Ok(settings) = Settings::from_json5(data) else {
        return;
    };
    let _ = settings.validate();
    let _ = settings.receiver_config();
    let _ = settings.redacted();
});
