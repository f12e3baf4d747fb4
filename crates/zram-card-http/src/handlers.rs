//! Route handlers.
//!
//! Every handler answers with JSON the dashboard can render; failures
//! degrade to the empty status payload or a failed operation result, never
//! to an error status.

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use zram_card_core::zram::DEFAULT_SIZE_SPEC;
use zram_card_core::{CardConfig, LifecycleManager, OperationResult, StatusReport, ZramctlOps};

use crate::blocking::run_blocking;
use crate::AppState;

/// Message for management requests without a recognised action.
pub const INVALID_ACTION_MESSAGE: &str = "Invalid action";

/// Form body of `POST /swap`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwapRequest {
    /// `create` or `remove`.
    pub action: Option<String>,
    /// Size spec for `create`, default `1G`.
    pub size: Option<String>,
    /// Device for `remove`; empty or absent removes all.
    pub device: Option<String>,
}

/// Management action requested by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapAction {
    /// Create a device of the given size spec.
    Create(String),
    /// Remove the named device, or all when empty.
    Remove(String),
}

impl SwapRequest {
    /// The requested action, `None` when missing or unknown.
    #[must_use]
    pub fn action(self) -> Option<SwapAction> {
        match self.action.as_deref().map(str::trim)? {
            "create" => Some(SwapAction::Create(
                self.size.unwrap_or_else(|| DEFAULT_SIZE_SPEC.to_string()),
            )),
            "remove" => Some(SwapAction::Remove(self.device.unwrap_or_default())),
            _ => None,
        }
    }
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// `GET /status`: collect and aggregate, empty payload on any failure.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    let report = run_blocking(move || {
        if !state.settings.load().enabled {
            debug!("card disabled, reporting no devices");
            return StatusReport::empty();
        }
        StatusReport::collect(&ZramctlOps::new(state.runner.as_ref()))
    })
    .await;

    Json(report.unwrap_or_default())
}

/// `GET /config`: settings the tile needs before polling.
pub async fn config(State(state): State<Arc<AppState>>) -> Json<CardConfig> {
    let config = run_blocking(move || state.settings.load())
        .await
        .unwrap_or_default();
    Json(CardConfig::from(&config))
}

/// `POST /swap`: create or remove a swap device.
pub async fn swap(
    State(state): State<Arc<AppState>>,
    form: Result<Form<SwapRequest>, FormRejection>,
) -> Json<OperationResult> {
    let action = match form {
        Ok(Form(request)) => request.action(),
        Err(e) => {
            warn!(error = %e, "unreadable swap request");
            None
        }
    };
    let Some(action) = action else {
        return Json(OperationResult::failed(INVALID_ACTION_MESSAGE));
    };
    debug!(?action, "swap request");

    let guard = Arc::clone(&state.manage_lock).lock_owned().await;
    let worker = Arc::clone(&state);
    let result = run_blocking(move || {
        let _guard = guard;
        let ops = ZramctlOps::new(worker.runner.as_ref());
        let manager = LifecycleManager::new(&ops, &worker.settings);
        match action {
            SwapAction::Create(size) => manager.create_device(&size),
            SwapAction::Remove(device) => manager.remove_device(&device),
        }
    })
    .await;

    Json(result.unwrap_or_else(|| OperationResult::failed("Swap operation did not complete")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use zram_card_core::testing::FakeKernel;
    use zram_card_core::{Invocation, PersistedConfig, SettingsStore, ToolOutput, ToolRunner};

    /// Fake pool whose device allocation takes a while, counting overlapping
    /// tool runs.
    #[derive(Default)]
    struct SlowKernel {
        inner: FakeKernel,
        running: AtomicUsize,
        max_running: AtomicUsize,
    }

    impl ToolRunner for SlowKernel {
        fn run(&self, invocation: &Invocation) -> zram_card_core::Result<ToolOutput> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_running.fetch_max(now, Ordering::SeqCst);
            let finding = invocation.args.first().is_some_and(|a| a == "--find");
            if invocation.program == "zramctl" && finding {
                std::thread::sleep(Duration::from_millis(400));
            }
            let output = self.inner.run(invocation);
            self.running.fetch_sub(1, Ordering::SeqCst);
            output
        }
    }

    fn state_with(kernel: FakeKernel) -> (tempfile::TempDir, Arc<FakeKernel>, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let kernel = Arc::new(kernel);
        let runner: Arc<dyn ToolRunner> = kernel.clone();
        let state = AppState::new(SettingsStore::new(dir.path().join("settings.ini")), runner);
        (dir, kernel, Arc::new(state))
    }

    fn request(
        action: &str,
        size: Option<&str>,
        device: Option<&str>,
    ) -> Result<Form<SwapRequest>, FormRejection> {
        Ok(Form(SwapRequest {
            action: Some(action.to_string()),
            size: size.map(str::to_string),
            device: device.map(str::to_string),
        }))
    }

    #[test]
    fn test_swap_request_action() {
        let create = SwapRequest {
            action: Some("create".to_string()),
            ..SwapRequest::default()
        };
        assert_eq!(create.action(), Some(SwapAction::Create("1G".to_string())));

        let remove = SwapRequest {
            action: Some("remove".to_string()),
            device: Some("zram1".to_string()),
            ..SwapRequest::default()
        };
        assert_eq!(remove.action(), Some(SwapAction::Remove("zram1".to_string())));

        assert_eq!(SwapRequest::default().action(), None);
        let unknown = SwapRequest {
            action: Some("explode".to_string()),
            ..SwapRequest::default()
        };
        assert_eq!(unknown.action(), None);
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_status_reports_devices() {
        let (_dir, kernel, state) = state_with(FakeKernel::new());
        kernel.add_device(1 << 30, 2_147_483_648, 536_870_912, 600_000_000);

        let Json(report) = status(State(state)).await;

        assert_eq!(report.memory_saved, "1.44 GB");
        assert!((report.ratio - 4.0).abs() < f64::EPSILON);
        assert_eq!(report.devices.len(), 1);
        assert_eq!(report.devices[0].name, "/dev/zram0");
    }

    #[tokio::test]
    async fn test_status_degrades_to_empty() {
        let (_dir, _kernel, state) = state_with(FakeKernel::new().unavailable());
        let Json(report) = status(State(state)).await;
        assert_eq!(report, StatusReport::empty());
    }

    #[tokio::test]
    async fn test_status_disabled_card() {
        let (_dir, kernel, state) = state_with(FakeKernel::new());
        kernel.add_device(1 << 30, 4096, 1024, 2048);
        state.settings.update(|c| c.enabled = false).unwrap();

        let Json(report) = status(State(state)).await;
        assert_eq!(report, StatusReport::empty());
        assert!(kernel.calls().is_empty());
    }

    #[tokio::test]
    async fn test_config_defaults() {
        let (_dir, _kernel, state) = state_with(FakeKernel::new());
        let Json(config) = config(State(state)).await;
        assert_eq!(CardConfig::from(&PersistedConfig::default()), config);
        assert_eq!(config.poll_interval, 3000);
    }

    #[tokio::test]
    async fn test_swap_create_then_remove() {
        let (_dir, kernel, state) = state_with(FakeKernel::new());

        let form = request("create", Some("2G"), None);
        let Json(created) = swap(State(Arc::clone(&state)), form).await;
        assert!(created.success, "{}", created.message);
        assert_eq!(kernel.live_devices(), ["/dev/zram0"]);
        assert_eq!(state.settings.load().requested_sizes(), ["2G"]);

        let form = request("remove", None, Some("zram0"));
        let Json(removed) = swap(State(Arc::clone(&state)), form).await;
        assert!(removed.success, "{}", removed.message);
        assert!(kernel.live_devices().is_empty());
        assert!(state.settings.load().requested_devices.is_empty());
    }

    #[tokio::test]
    async fn test_swap_invalid_action() {
        let (_dir, kernel, state) = state_with(FakeKernel::new());

        let Json(result) = swap(State(state), request("explode", None, None)).await;

        assert!(!result.success);
        assert_eq!(result.message, INVALID_ACTION_MESSAGE);
        assert!(kernel.calls().is_empty());
    }

    #[tokio::test]
    async fn test_swap_failure_is_reported_in_body() {
        let kernel = FakeKernel::new().fail_on("zramctl --find", "zramctl: no free zram device found");
        let (_dir, _kernel, state) = state_with(kernel);

        let Json(result) = swap(State(state), request("create", None, None)).await;

        assert!(!result.success);
        assert!(result.message.contains("no free zram device found"), "{}", result.message);
    }

    #[tokio::test]
    async fn test_swap_lock_outlives_dropped_request() {
        let dir = tempfile::tempdir().unwrap();
        let kernel = Arc::new(SlowKernel::default());
        let runner: Arc<dyn ToolRunner> = kernel.clone();
        let state = Arc::new(AppState::new(
            SettingsStore::new(dir.path().join("settings.ini")),
            runner,
        ));

        let first = swap(State(Arc::clone(&state)), request("create", None, None));
        assert!(tokio::time::timeout(Duration::from_millis(50), first).await.is_err());

        let Json(second) = swap(State(Arc::clone(&state)), request("create", None, None)).await;

        assert!(second.success, "{}", second.message);
        assert_eq!(kernel.max_running.load(Ordering::SeqCst), 1);
        assert_eq!(kernel.inner.live_devices(), ["/dev/zram0", "/dev/zram1"]);
        assert_eq!(state.settings.load().requested_devices.len(), 2);
    }
}
