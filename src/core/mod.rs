pub mod canvas;
pub mod clock;
pub mod color;
pub mod display_context;
pub mod frame;
pub mod layer;
pub mod timer;

pub use canvas::{blend, Canvas, DrawOp};
pub use clock::{FixedClock, LocalClock, WallClock};
pub use color::{hsv_to_rgb, Color};
pub use display_context::DisplayContext;
pub use frame::{Frame, FrameInfo, FrameIterator};
pub use layer::{Layer, LayerStack};
pub use timer::{FixedInterval, PlaybackClock, Throttled, MAX_TICK_GAP_MS};
