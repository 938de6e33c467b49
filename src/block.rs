// block.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF blocks and descriptors
use pix::rgb::SRgb8;

/// Number of bytes per color table entry
const CHANNELS: usize = 3;

/// Color table existence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableExistence {
    Absent,
    Present,
}

/// Color table ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableOrdering {
    NotSorted,
    Sorted,
}

/// Color table configuration, from a descriptor's packed flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    existence: ColorTableExistence,
    ordering: ColorTableOrdering,
    table_len: usize, // must be between 2...256
}

impl Default for ColorTableConfig {
    fn default() -> Self {
        let existence = ColorTableExistence::Absent;
        let ordering = ColorTableOrdering::NotSorted;
        let table_len = 2;
        ColorTableConfig {
            existence,
            ordering,
            table_len,
        }
    }
}

impl ColorTableConfig {
    /// Create a color table config from the 3-bit size exponent field
    fn with_size_bits(
        existence: ColorTableExistence,
        ordering: ColorTableOrdering,
        size_bits: u8,
    ) -> Self {
        let table_len = 2 << (size_bits & 0b0111);
        ColorTableConfig {
            existence,
            ordering,
            table_len,
        }
    }
    pub fn existence(&self) -> ColorTableExistence {
        self.existence
    }
    pub fn ordering(&self) -> ColorTableOrdering {
        self.ordering
    }
    /// Number of entries (zero when absent)
    pub fn len(&self) -> usize {
        match self.existence {
            ColorTableExistence::Absent => 0,
            ColorTableExistence::Present => self.table_len,
        }
    }
    /// Number of entries declared by the size field, even when absent
    pub fn declared_len(&self) -> usize {
        self.table_len
    }
    pub fn size_bytes(&self) -> usize {
        self.len() * CHANNELS
    }
}

/// Color table (global or local)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTable {
    colors: Vec<SRgb8>,
}

impl ColorTable {
    /// Create a color table from packed RGB triples
    pub fn with_colors(colors: &[u8]) -> Self {
        let colors = colors
            .chunks_exact(CHANNELS)
            .map(|c| SRgb8::new(c[0], c[1], c[2]))
            .collect();
        ColorTable { colors }
    }
    pub fn len(&self) -> usize {
        self.colors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
    /// Get the color at an index
    pub fn entry(&self, idx: u8) -> Option<SRgb8> {
        self.colors.get(usize::from(idx)).copied()
    }
}

/// Frame disposal method (parsed, not applied)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    #[default]
    NoAction,
    Keep,
    Background,
    Previous,
    Reserved(u8),
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            _ => Reserved(n & 0b0111),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    ImageDesc_,
    Extension_,
    Trailer_,
}

impl BlockCode {
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_), // (0x2C) Image separator
            b'!' => Some(Extension_), // (0x21) Extension introducer
            b';' => Some(Trailer_),   // (0x3B) GIF trailer
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    PlainText_,
    GraphicControl_,
    Comment_,
    Application_,
    Unknown_(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x01 => PlainText_,
            0xF9 => GraphicControl_,
            0xFE => Comment_,
            0xFF => Application_,
            _ => Unknown_(n),
        }
    }
}

/// Logical Screen Descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8, // index into global color table
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_TABLE_ORDERING: u8 = 0b0000_1000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    /// Color resolution, in bits per primary color (1-8)
    pub fn color_resolution(&self) -> u8 {
        ((self.flags & Self::COLOR_RESOLUTION) >> 4) + 1
    }
    fn color_table_existence(&self) -> ColorTableExistence {
        if self.flags & Self::COLOR_TABLE_PRESENT != 0 {
            ColorTableExistence::Present
        } else {
            ColorTableExistence::Absent
        }
    }
    fn color_table_ordering(&self) -> ColorTableOrdering {
        if self.flags & Self::COLOR_TABLE_ORDERING != 0 {
            ColorTableOrdering::Sorted
        } else {
            ColorTableOrdering::NotSorted
        }
    }
    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::with_size_bits(
            self.color_table_existence(),
            self.color_table_ordering(),
            self.flags & Self::COLOR_TABLE_SIZE,
        )
    }
    pub fn with_background_color_idx(mut self, background_color_idx: u8) -> Self {
        self.background_color_idx = background_color_idx;
        self
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }
    pub fn with_pixel_aspect_ratio(mut self, pixel_aspect_ratio: u8) -> Self {
        self.pixel_aspect_ratio = pixel_aspect_ratio;
        self
    }
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
    /// Size of a 24-bit raster covering the screen, in bytes
    pub fn image_sz(&self) -> usize {
        usize::from(self.screen_width) * usize::from(self.screen_height) * CHANNELS
    }
}

/// Graphic Control extension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const USER_INPUT: u8 = 0b0000_0010;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }
    pub fn user_input(&self) -> bool {
        (self.flags & Self::USER_INPUT) != 0
    }
    pub fn with_delay_time_cs(mut self, delay_time_cs: u16) -> Self {
        self.delay_time_cs = delay_time_cs;
        self
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn with_transparent_color_idx(mut self, idx: u8) -> Self {
        self.transparent_color_idx = idx;
        self
    }
    pub fn transparent_color_idx(&self) -> u8 {
        self.transparent_color_idx
    }
    /// Get the transparent color index, if enabled
    pub fn transparent_color(&self) -> Option<u8> {
        if self.flags & Self::TRANSPARENT_COLOR != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }
}

/// Image Descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const INTERLACED: u8 = 0b0100_0000;
    const COLOR_TABLE_ORDERING: u8 = 0b0010_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }
    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn interlaced(&self) -> bool {
        (self.flags & Self::INTERLACED) != 0
    }
    fn color_table_existence(&self) -> ColorTableExistence {
        if self.flags & Self::COLOR_TABLE_PRESENT != 0 {
            ColorTableExistence::Present
        } else {
            ColorTableExistence::Absent
        }
    }
    fn color_table_ordering(&self) -> ColorTableOrdering {
        if self.flags & Self::COLOR_TABLE_ORDERING != 0 {
            ColorTableOrdering::Sorted
        } else {
            ColorTableOrdering::NotSorted
        }
    }
    pub fn color_table_config(&self) -> ColorTableConfig {
        ColorTableConfig::with_size_bits(
            self.color_table_existence(),
            self.color_table_ordering(),
            self.flags & Self::COLOR_TABLE_SIZE,
        )
    }
    /// Number of pixels in the image rectangle
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// Text grid of a Plain Text extension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextGrid {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub cell_width: u8,
    pub cell_height: u8,
    pub foreground_color_idx: u8,
    pub background_color_idx: u8,
}

/// Identity of an Application extension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationId {
    pub identifier: [u8; 8],
    pub auth_code: [u8; 3],
}

impl ApplicationId {
    /// Check for a looping animation extension
    pub fn is_looping(&self) -> bool {
        let id = (&self.identifier, &self.auth_code);
        id == (b"NETSCAPE", b"2.0") || id == (b"ANIMEXTS", b"1.0")
    }
}
