//! minitel-vt: wire protocol of the Minitel videotex terminal.
//!
//! Pure encoders and decoders with no I/O of their own: the character set
//! codec, keyboard decoding over any blocking byte source, text attributes,
//! and the mosaic image encoder. The serial link that carries these bytes
//! lives in `minitel-link`.

pub mod attr;
pub mod codec;
pub mod control;
pub mod graphics;
pub mod keys;

pub use attr::{CharSize, Color, MosaicCell};
pub use codec::CodecError;
pub use graphics::{AttributeState, LumaImage, PixelBlock};
pub use keys::{FunctionKey, KeyDecoder, KeyEvent};
