use crate::errors::AppError;
use crate::models::AppData;
use crate::storage::persist_data;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Writes the locked tables through to disk.
    pub async fn persist(&self, data: &AppData) -> Result<(), AppError> {
        persist_data(&self.data_path, data).await
    }
}
