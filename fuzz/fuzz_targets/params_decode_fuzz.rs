#![no_main]
use ibc_ante::Params;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(params) = Params::decode(data) else {
        return;
    };

    // Re-encoding is canonical, so it must decode to the same params.
    let encoded = params.encode_to_vec();
    assert_eq!(encoded.len(), params.encoded_len());
    assert!(encoded.len() <= 2);
    assert_eq!(Params::decode(&encoded).expect("canonical encoding decodes"), params);
});
