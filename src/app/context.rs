use crate::ports::CanvasClient;

/// Application context holding dependencies for command execution.
pub struct AppContext<C: CanvasClient> {
    client: C,
}

impl<C: CanvasClient> AppContext<C> {
    /// Create a new application context.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Get a reference to the platform client.
    pub fn client(&self) -> &C {
        &self.client
    }
}
