pub mod camera;
pub mod cli;
pub mod clock;
pub mod collider;
pub mod frame;
pub mod gpu;
pub mod input;
pub mod light;
pub mod math;
pub mod mode;
pub mod model;
pub mod player;
pub mod recording;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use camera::Camera;
pub use frame::FrameContext;
pub use light::Light;
pub use mode::{ControlMode, ModeState};
pub use model::{SceneObject, Transform};
pub use player::PlayerController;
pub use renderer::{OverlayState, RenderBackend, RenderCommand, SceneRenderer};
pub use scene::Scene;
