use axum::{extract::FromRef, Router};
use tower_http::compression::CompressionLayer;

use crate::html_state::HtmlState;

pub struct RouterFactory<S> {
    public_routers: Vec<Router<S>>,
    compression_enabled: bool,
}

impl<S> RouterFactory<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    pub fn new() -> Self {
        Self {
            public_routers: Vec::new(),
            compression_enabled: false,
        }
    }

    // Add a public router that will be merged at the root level
    pub fn add_public_routes(mut self, routes: Router<S>) -> Self {
        self.public_routers.push(routes);
        self
    }

    /// Enables response compression when building the router.
    pub const fn with_compression(mut self) -> Self {
        self.compression_enabled = true;
        self
    }

    pub fn build(self) -> Router<S> {
        let mut router = Router::new();

        for routes in self.public_routers {
            router = router.merge(routes);
        }

        // Negotiates encoding from the request's Accept-Encoding header
        if self.compression_enabled {
            router = router.layer(CompressionLayer::new());
        }

        router
    }
}

impl<S> Default for RouterFactory<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    fn default() -> Self {
        Self::new()
    }
}
