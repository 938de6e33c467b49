// test_utils.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Helpers for assembling GIF streams in tests

/// Pack color indices as LZW literal codes (no repeated sequences used)
pub fn lzw_literals(min_code_size: u8, indices: &[u8]) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let end = clear + 1;
    let mut bytes = vec![];
    let mut acc = 0u32;
    let mut n_bits = 0;
    let mut pack = |code: u16, bits: u8, bytes: &mut Vec<u8>| {
        acc |= u32::from(code) << n_bits;
        n_bits += bits;
        while n_bits >= 8 {
            bytes.push(acc as u8);
            acc >>= 8;
            n_bits -= 8;
        }
    };
    let mut bits = min_code_size + 1;
    let mut next_code = None;
    pack(clear, bits, &mut bytes);
    for idx in indices {
        pack(u16::from(*idx), bits, &mut bytes);
        // decoder adds an entry for every code after the first
        next_code = match next_code {
            None => Some(end + 1),
            Some(code) if code < 4095 => {
                let code = code + 1;
                if code == 1 << bits && bits < 12 {
                    bits += 1;
                }
                Some(code)
            }
            Some(_) => {
                pack(clear, bits, &mut bytes);
                bits = min_code_size + 1;
                None
            }
        };
    }
    pack(end, bits, &mut bytes);
    pack(0, 7, &mut bytes);
    bytes
}

/// Split data into sub-blocks, with terminator
pub fn sub_blocks(data: &[u8]) -> Vec<u8> {
    let mut bytes = vec![];
    for chunk in data.chunks(255) {
        bytes.push(chunk.len() as u8);
        bytes.extend_from_slice(chunk);
    }
    bytes.push(0);
    bytes
}

/// Get the size field for a color table with a number of entries
fn size_bits(n_colors: usize) -> u8 {
    let mut bits = 0;
    while (2 << bits) < n_colors && bits < 7 {
        bits += 1;
    }
    bits
}

/// GIF stream builder
pub struct GifBuilder {
    bytes: Vec<u8>,
}

impl GifBuilder {
    /// Start a GIF89a stream with an optional global color table
    pub fn new(width: u16, height: u16, global: Option<&[[u8; 3]]>) -> Self {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        match global {
            Some(colors) => {
                let bits = size_bits(colors.len());
                bytes.push(0x80 | (bits << 4) | bits);
                bytes.extend_from_slice(&[0, 0]);
                for c in colors {
                    bytes.extend_from_slice(c);
                }
            }
            None => bytes.extend_from_slice(&[0, 0, 0]),
        }
        GifBuilder { bytes }
    }

    /// Append raw bytes
    pub fn raw(mut self, raw: &[u8]) -> Self {
        self.bytes.extend_from_slice(raw);
        self
    }

    /// Append a Graphic Control extension
    pub fn graphic_control(self, flags: u8, delay: u16, transparent: u8) -> Self {
        let d = delay.to_le_bytes();
        self.raw(&[0x21, 0xF9, 0x04, flags, d[0], d[1], transparent, 0x00])
    }

    /// Append a Comment extension
    pub fn comment(self, text: &[u8]) -> Self {
        self.raw(&[0x21, 0xFE]).raw(&sub_blocks(text))
    }

    /// Append a Plain Text extension
    pub fn plain_text(self, text: &[u8]) -> Self {
        self.raw(&[0x21, 0x01, 0x0C])
            .raw(&[0, 0, 0, 0, 8, 0, 8, 0, 8, 8, 1, 0])
            .raw(&sub_blocks(text))
    }

    /// Append an Application extension
    pub fn application(self, id: &[u8; 11], data: &[u8]) -> Self {
        self.raw(&[0x21, 0xFF, 0x0B]).raw(id).raw(&sub_blocks(data))
    }

    /// Append an image block
    #[allow(clippy::too_many_arguments)]
    pub fn image(
        self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        interlaced: bool,
        local: Option<&[[u8; 3]]>,
        indices: &[u8],
    ) -> Self {
        let mut bytes = vec![0x2C];
        for v in [left, top, width, height] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut flags = if interlaced { 0x40 } else { 0x00 };
        if let Some(colors) = local {
            flags |= 0x80 | size_bits(colors.len());
        }
        bytes.push(flags);
        if let Some(colors) = local {
            for c in colors {
                bytes.extend_from_slice(c);
            }
        }
        let max_idx = indices.iter().max().copied().unwrap_or(0);
        let mut min_code_size = 2;
        while (1u16 << min_code_size) <= u16::from(max_idx) {
            min_code_size += 1;
        }
        bytes.push(min_code_size);
        bytes.extend(sub_blocks(&lzw_literals(min_code_size, indices)));
        self.raw(&bytes)
    }

    /// Append the trailer and get the stream
    pub fn trailer(self) -> Vec<u8> {
        self.raw(&[0x3B]).bytes
    }
}
