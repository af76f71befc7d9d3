use std::sync::Arc;

use userauth_core::AuthPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AuthPipeline>,
}
