// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use gif2bmp::Decoder;

fuzz_target!(|data: &[u8]| {
    let mut bmp = vec![];
    let _ = Decoder::new_unbuffered(data)
        .max_image_sz(Some(1 << 20))
        .convert(&mut bmp);
});
