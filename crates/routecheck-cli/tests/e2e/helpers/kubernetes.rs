//! Kubernetes client helpers for e2e tests
#![cfg(feature = "provider-e2e")]

use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, DeleteParams, PostParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client,
};
use routecheck_common::retry::{retry_transient, retry_with_backoff, RetryConfig};
use routecheck_common::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Create a kube client from `$KUBECONFIG`, or the default config if unset.
///
/// Retries on transient connection failures (up to 10 attempts with exponential backoff).
pub async fn client_from_env() -> Result<Client, String> {
    let path = std::env::var("KUBECONFIG").ok();
    retry_with_backoff(
        &RetryConfig::with_max_attempts(10),
        "create_kube_client",
        || {
            let path = path.clone();
            async move { client_from_env_inner(path.as_deref()).await }
        },
    )
    .await
}

async fn client_from_env_inner(path: Option<&str>) -> Result<Client, String> {
    let kubeconfig = match path {
        Some(path) => Kubeconfig::read_from(path)
            .map_err(|e| format!("Failed to read kubeconfig {}: {}", path, e))?,
        None => Kubeconfig::read().map_err(|e| format!("Failed to read kubeconfig: {}", e))?,
    };

    let mut config =
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| format!("Failed to create kube config: {}", e))?;

    config.connect_timeout = Some(Duration::from_secs(5));
    config.read_timeout = Some(Duration::from_secs(30));

    Client::try_from(config).map_err(|e| format!("Failed to create client: {}", e))
}

/// Create a Kubernetes resource, retrying transient API failures.
///
/// If a transient error caused the resource to be created server-side but the
/// response was lost, the retry gets `AlreadyExists` (409); the existing
/// resource is fetched instead. Other 4xx answers fail at once.
pub async fn create_with_retry<K>(api: &Api<K>, resource: &K, name: &str) -> Result<K, String>
where
    K: kube::Resource + Clone + serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug,
{
    let op_name = format!("create_{}", name);
    retry_transient(&RetryConfig::default(), &op_name, || {
        let api = api.clone();
        let resource = resource.clone();
        async move {
            match api.create(&PostParams::default(), &resource).await {
                Ok(created) => Ok(created),
                Err(kube::Error::Api(ref err_resp)) if err_resp.code == 409 => {
                    api.get(name).await.map_err(Error::from)
                }
                Err(e) => Err(Error::from(e)),
            }
        }
    })
    .await
    .map_err(|e| format!("Failed to create {}: {}", name, e))
}

/// Delete a resource immediately, treating 404 as already deleted.
pub async fn delete_ignore_missing<K>(api: &Api<K>, name: &str) -> Result<(), String>
where
    K: kube::Resource + Clone + serde::de::DeserializeOwned + std::fmt::Debug,
{
    let params = DeleteParams {
        grace_period_seconds: Some(0),
        ..DeleteParams::default()
    };
    match api.delete(name, &params).await.map_err(Error::from) {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(format!("Failed to delete {}: {}", name, e)),
    }
}

/// Poll an async condition until it returns `true` or the timeout expires.
///
/// The `condition` closure returns `Ok(true)` when done, `Ok(false)` to keep
/// polling, or `Err` to abort immediately.
pub async fn wait_for_condition<F, Fut>(
    description: &str,
    timeout: Duration,
    poll_interval: Duration,
    condition: F,
) -> Result<(), String>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<bool, String>>,
{
    let start = Instant::now();
    loop {
        if start.elapsed() > timeout {
            return Err(format!(
                "Timeout after {:?} waiting for: {}",
                timeout, description
            ));
        }
        match condition().await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => return Err(e),
        }
        sleep(poll_interval).await;
    }
}

/// Wait until the Pod reports phase `Running`; a `Failed` Pod aborts the wait.
pub async fn wait_for_pod_running(
    api: &Api<Pod>,
    name: &str,
    timeout: Duration,
) -> Result<(), String> {
    wait_for_condition(
        &format!("pod {} running", name),
        timeout,
        Duration::from_secs(2),
        move || async move {
            let pod = match api.get_opt(name).await {
                Ok(pod) => pod,
                Err(e) => {
                    debug!(pod = %name, error = %e, "pod read failed, retrying");
                    return Ok(false);
                }
            };
            let phase = pod
                .and_then(|p| p.status)
                .and_then(|s| s.phase)
                .unwrap_or_default();
            match phase.as_str() {
                "Running" => Ok(true),
                "Failed" => Err(format!("pod {} failed to start", name)),
                _ => Ok(false),
            }
        },
    )
    .await
}
