pub mod api;
pub mod app_state;
pub mod classifier;
pub mod config;
pub mod error;
pub mod inference;
pub mod layers;
pub mod model;
pub mod status;

pub use api::server::create_router;
pub use app_state::{AppState, ModelInfo, ModelState};
pub use classifier::{Classifier, ClassifierError, Prediction};
pub use config::ServiceConfig;
pub use error::ApiError;
