use glam::Mat4;
use serde::{Deserialize, Serialize};

/// One float2 vertex attribute as the input assembler reads it
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Float2 {
    pub x: f32,
    pub y: f32,
}

impl Float2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Four triangle-strip corners: top-left, top-right, bottom-left, bottom-right
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadCorners {
    pub corners: [Float2; 4],
}

impl QuadCorners {
    /// Unit quad centred on the origin, y up
    pub const UNIT: Self = Self {
        corners: [
            Float2::new(-0.5, 0.5),
            Float2::new(0.5, 0.5),
            Float2::new(-0.5, -0.5),
            Float2::new(0.5, -0.5),
        ],
    };

    pub fn from_rect(rect: Rect) -> Self {
        let (left, top) = (rect.left as f32, rect.top as f32);
        let (right, bottom) = (rect.right as f32, rect.bottom as f32);

        Self {
            corners: [
                Float2::new(left, top),
                Float2::new(right, top),
                Float2::new(left, bottom),
                Float2::new(right, bottom),
            ],
        }
    }
}

/// 4x4 transform in the column-major layout the constant buffers hold
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub columns: [[f32; 4]; 4],
}

impl From<Mat4> for TransformUniform {
    fn from(matrix: Mat4) -> Self {
        Self {
            columns: matrix.to_cols_array_2d(),
        }
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Tightly packed BGRA8 row pitch
    pub fn row_pitch(&self) -> u32 {
        self.width * 4
    }

    /// Byte length of a tightly packed BGRA8 image of this size
    pub fn bgra8_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Signed pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Edge rectangle in pixels, right and bottom exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle of `size` centred on `center`, halving with integer division
    ///
    /// Edges saturate at the `i32` range.
    pub fn centered(center: Point, size: Extent) -> Self {
        let half_width = saturating_i32(size.width / 2);
        let half_height = saturating_i32(size.height / 2);

        Self {
            left: center.x.saturating_sub(half_width),
            top: center.y.saturating_sub(half_height),
            right: center.x.saturating_add(half_width),
            bottom: center.y.saturating_add(half_height),
        }
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Pixel count as a signed coordinate, clamped to `i32::MAX`
pub fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// 8-bit RGB colour, as GDI text colours are expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed 0x00BBGGRR value
    pub fn to_colorref(self) -> u32 {
        self.r as u32 | (self.g as u32) << 8 | (self.b as u32) << 16
    }
}

/// Output-merger viewport covering a region of the render target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn covering(size: Extent) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.width as f32,
            height: size.height as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// GPU read-only, contents fixed at creation
    Immutable,
    /// CPU write, GPU read; updated with discard-on-map
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u32,
    pub usage: BufferUsage,
    pub kind: BufferKind,
}

/// Immutable single-mip, single-slice BGRA8 texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub size: Extent,
}

impl TextureDesc {
    pub const MIP_LEVELS: u32 = 1;
    pub const ARRAY_SIZE: u32 = 1;
    pub const BYTES_PER_PIXEL: u32 = 4;

    pub fn row_pitch(&self) -> u32 {
        self.size.width * Self::BYTES_PER_PIXEL
    }
}

/// float2 per-vertex attribute read from a vertex stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputElement {
    pub semantic: &'static str,
    pub stream: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    InvSrcAlpha,
}

/// Additive blend equation for colour and alpha, all channels written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendDesc {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendDesc {
    /// Source-over for colour; destination alpha preserved
    pub const ALPHA: Self = Self {
        src_color: BlendFactor::SrcAlpha,
        dst_color: BlendFactor::InvSrcAlpha,
        src_alpha: BlendFactor::Zero,
        dst_alpha: BlendFactor::One,
    };
}

/// GDI text layout flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFormat {
    pub word_break: bool,
    pub no_prefix: bool,
    pub edit_control: bool,
    pub no_full_width_char_break: bool,
}

impl TextFormat {
    /// Word-wrapped, `&` drawn literally, edit-control line spacing
    pub const DIALOGUE: Self = Self {
        word_break: true,
        no_prefix: true,
        edit_control: true,
        no_full_width_char_break: true,
    };
}

/// Logical GDI font request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontDesc {
    pub face: String,
    pub height: i32,
    #[serde(default = "FontDesc::default_weight")]
    pub weight: i32,
}

impl FontDesc {
    fn default_weight() -> i32 {
        400
    }
}

impl Default for FontDesc {
    fn default() -> Self {
        Self {
            face: "Malgun Gothic".to_string(),
            height: 28,
            weight: Self::default_weight(),
        }
    }
}
