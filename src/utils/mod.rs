pub mod javascript;
pub mod screenshot;

pub use screenshot::ScreenshotRecorder;
