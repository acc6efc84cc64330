#![no_main]

use bytecircuit::{
    metadata::{MethodBody, TryBlock},
    translate,
};
use libfuzzer_sys::fuzz_target;

// First byte: local register count. Inputs longer than the trailer end with
// three little-endian u16 values: try start, try end and handler.
fuzz_target!(|data: &[u8]| {
    let Some((&num_vregs, rest)) = data.split_first() else {
        return;
    };
    let num_vregs = u16::from(num_vregs & 0x0F);
    let method = if rest.len() > 6 {
        let (code, table) = rest.split_at(rest.len() - 6);
        let read = |i: usize| u32::from(u16::from_le_bytes([table[i], table[i + 1]]));
        MethodBody::new(code.to_vec(), num_vregs, 1)
            .with_try_block(TryBlock::new(read(0), read(2), vec![read(4)]))
    } else {
        MethodBody::new(rest.to_vec(), num_vregs, 1)
    };
    let _ = translate(&method);
});
