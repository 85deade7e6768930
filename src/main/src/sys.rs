use crate::{
    config::ServiceConfig,
    general::{
        m_metric_observor::MetricObservor,
        m_telemetry_store::TelemetryStore,
        metrics::MetricsAggregator,
        network::http_handler::{self, ApiHandlerImpl},
    },
    result::LMResult,
    util::JoinHandleWrapper,
};
use std::sync::Arc;

/// Every long lived piece of the service, built once at startup.
pub struct LogicalModules {
    pub config: ServiceConfig,
    pub telemetry_store: Arc<TelemetryStore>,
    pub metric_observor: Arc<MetricObservor>,
}

impl LogicalModules {
    pub fn new(config: ServiceConfig, telemetry_store: TelemetryStore) -> Self {
        Self {
            config,
            telemetry_store: Arc::new(telemetry_store),
            metric_observor: Arc::new(MetricObservor::new()),
        }
    }

    pub fn api_handler(&self) -> ApiHandlerImpl {
        ApiHandlerImpl::new(
            MetricsAggregator::new(
                self.telemetry_store.clone(),
                self.config.default_threshold_ms,
            ),
            self.metric_observor.clone(),
        )
    }
}

pub struct Sys {
    logical_modules: LogicalModules,
    sub_tasks: Vec<JoinHandleWrapper>,
}

impl Drop for Sys {
    fn drop(&mut self) {
        tracing::info!("drop sys");
    }
}

impl Sys {
    /// Loads the telemetry file, any failure here is fatal for the process.
    pub fn new(config: ServiceConfig) -> LMResult<Sys> {
        let telemetry_store = TelemetryStore::load(&config.data_file)?;
        if telemetry_store.is_empty() {
            tracing::warn!("telemetry file {:?} holds no records", config.data_file);
        }
        tracing::info!(
            "telemetry ready: {} records over regions {:?}",
            telemetry_store.len(),
            telemetry_store.regions()
        );
        Ok(Self::with_store(config, telemetry_store))
    }

    pub fn with_store(config: ServiceConfig, telemetry_store: TelemetryStore) -> Sys {
        Sys {
            logical_modules: LogicalModules::new(config, telemetry_store),
            sub_tasks: Vec::new(),
        }
    }

    pub fn logical_modules(&self) -> &LogicalModules {
        &self.logical_modules
    }

    pub fn start(&mut self) -> LMResult<()> {
        let modules = &self.logical_modules;
        let app = http_handler::build_router(modules.api_handler(), modules.config.metrics_enabled);
        let task = http_handler::start_http_handler(modules.config.addr, app)?;
        self.sub_tasks.push(task);
        Ok(())
    }

    pub async fn wait_for_end(&mut self) -> LMResult<()> {
        self.start()?;
        tracing::info!("modules all started, waiting for end");
        for task in self.sub_tasks.iter_mut() {
            task.join().await?;
            tracing::info!("{} ended", task.name());
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn shutdown(&mut self) {
        for task in self.sub_tasks.drain(..) {
            task.abort();
        }
    }
}
