#![no_main]

use atribuir::channel_map::ChannelMap;
use atribuir::path_parser::parse_path;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert arbitrary bytes to UTF-8 string (lossy conversion)
    if let Ok(input) = std::str::from_utf8(data) {
        let map = ChannelMap::from_pairs([("A_SA", "Awareness Search Ads"), ("C_OLV", "Video")]);
        // Attempt to decode the encoded path
        // This should not panic regardless of input
        let _ = parse_path(input, &map);
    }
});
