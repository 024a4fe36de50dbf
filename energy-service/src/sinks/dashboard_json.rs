use std::path::PathBuf;

use crate::{
    analytics::DashboardDocument,
    pipeline::{PipelineError, Sink},
};

/// Writes the dashboard document as pretty-printed JSON.
pub struct DashboardJsonSink {
    path: PathBuf,
}

impl DashboardJsonSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Sink<DashboardDocument> for DashboardJsonSink {
    async fn write(&self, item: &DashboardDocument) -> Result<(), PipelineError> {
        let io_err = |e: std::io::Error| PipelineError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        };
        let json = serde_json::to_vec_pretty(item).map_err(|e| PipelineError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&self.path, json).await.map_err(io_err)?;
        tracing::info!(path = %self.path.display(), "dashboard document written");
        Ok(())
    }
}
