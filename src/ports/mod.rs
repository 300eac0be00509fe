mod canvas_client;

pub use canvas_client::CanvasClient;
