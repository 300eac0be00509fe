mod canvas_client_http;

pub use canvas_client_http::HttpCanvasClient;
