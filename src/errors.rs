#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Cannot spawn manager worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}
