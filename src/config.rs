/// Options for building a [`RouterHandler`](crate::RouterHandler).
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub(crate) serverless: bool,
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    /// Use a matcher which is quick to build but slower to query.
    /// Enable this when a new handler is created for every request, like in serverless functions.
    pub fn serverless(mut self, serverless: bool) -> Self {
        self.serverless = serverless;
        self
    }
}
