use std::sync::Arc;

use crate::roster::RosterReconciler;

#[derive(Clone)]
pub struct AppState {
    pub roster: Arc<RosterReconciler>,
}
