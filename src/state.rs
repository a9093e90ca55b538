use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::db::Db;
use crate::models::Comment;
use crate::services::ai::Skills;
use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingStore;
use crate::services::dialogue::IntentClassifier;
use crate::services::messaging::MessagingProvider;

pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub skills: Box<dyn Skills>,
    pub messaging: Box<dyn MessagingProvider>,
    pub classifier: Box<dyn IntentClassifier>,
    pub store: Arc<dyn BookingStore>,
    pub availability: AvailabilityService,
    pub comments_tx: broadcast::Sender<Comment>,
}
