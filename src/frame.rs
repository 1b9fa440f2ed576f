/// Per-frame state handed by reference into update and render calls, instead
/// of ambient globals on an app object.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    /// Seconds since startup.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    pub number: u64,
    /// Smoothed frames per second, for the overlay.
    pub fps: f32,
    pub menu_open: bool,
    /// Draw per-object axis gizmos this frame.
    pub debug_overlay: bool,
}
