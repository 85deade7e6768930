use tokio::task::JoinHandle;

use crate::result::{LMResult, LMRuntimeErr};

pub struct JoinHandleWrapper {
    name: &'static str,
    handle: Option<JoinHandle<LMResult<()>>>,
}

impl JoinHandleWrapper {
    pub fn new(name: &'static str, handle: JoinHandle<LMResult<()>>) -> Self {
        Self {
            name,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Waits for the task, a second call returns immediately.
    pub async fn join(&mut self) -> LMResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match handle.await {
            Ok(res) => res,
            Err(err) => Err(LMRuntimeErr::TokioJoin {
                err,
                context: format!("task {}", self.name),
            }
            .into()),
        }
    }

    #[cfg(test)]
    pub fn abort(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
