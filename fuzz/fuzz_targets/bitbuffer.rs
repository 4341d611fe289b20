#![no_main]

use bitstream::{BitBuffer, Endian};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(mut buffer) = BitBuffer::from_bytes(data) else {
        return;
    };
    let mut idx = 0usize;

    // Use input bytes to drive a bounded sequence of operations.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 6;
        let arg = usize::from(data[idx] >> 3);
        idx += 1;

        match op {
            0 => {
                let _ = buffer.read_bit();
            }
            1 => {
                let mut bits = vec![false; arg];
                let _ = buffer.read_bits(&mut bits);
            }
            2 => {
                let mut bytes = vec![0u8; arg % 9];
                let _ = buffer.read_bytes(&mut bytes);
            }
            3 => {
                let _ = buffer.read_uint(arg % 10, Endian::Big);
            }
            4 => {
                let _ = buffer.write_uint(u64::from(data[idx - 1]), arg % 10, Endian::Little);
            }
            _ => buffer.reset_to_start(),
        }
    }
    let _ = buffer.to_bytes();
});
