mod fake_canvas_client;

pub use fake_canvas_client::{Call, FakeCanvasClient};
