//! Background health monitoring against live mock backends.

mod common;

use std::time::Duration;

use common::*;

#[tokio::test]
async fn test_backend_is_evicted_and_restored() {
    let a = start_mock_backend(200, "aa").await;
    let b = start_mock_backend(200, "bb").await;

    let mut config = config_for(&[a.address(), b.address()]);
    config.forwarding.trace = true;
    let proxy = start_proxy(config).await;
    assert!(wait_for_health(&proxy.pool, &[true, true]).await);

    a.set_healthy(false);
    assert!(wait_for_health(&proxy.pool, &[false, true]).await);

    let client = client();
    for _ in 0..3 {
        let resp = client.get(proxy.url("/")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("lb-from").unwrap().to_str().unwrap(),
            b.address()
        );
        resp.bytes().await.unwrap();
    }
    assert_eq!(a.hits(), 0);

    a.set_healthy(true);
    assert!(wait_for_health(&proxy.pool, &[true, true]).await);

    // `a` has relayed nothing so far, so it is preferred again.
    let resp = client.get(proxy.url("/")).send().await.unwrap();
    assert_eq!(
        resp.headers().get("lb-from").unwrap().to_str().unwrap(),
        a.address()
    );
}

#[tokio::test]
async fn test_only_200_counts_as_healthy() {
    let no_content = start_programmable_backend(|_| async { MockResponse::new(204, "") }).await;
    let not_found = start_programmable_backend(|_| async { MockResponse::new(404, "") }).await;
    let ok = start_programmable_backend(|_| async { MockResponse::new(200, "fine") }).await;

    let proxy = start_proxy(config_for(&[
        no_content.to_string(),
        not_found.to_string(),
        ok.to_string(),
    ]))
    .await;

    assert!(wait_for_health(&proxy.pool, &[false, false, true]).await);
}

#[tokio::test]
async fn test_unreachable_backend_stays_unhealthy() {
    let live = start_mock_backend(200, "OK").await;
    let proxy = start_proxy(config_for(&[dead_address().to_string(), live.address()])).await;

    assert!(wait_for_health(&proxy.pool, &[false, true]).await);
    // Another cycle does not change the verdict.
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(wait_for_health(&proxy.pool, &[false, true]).await);
}

#[tokio::test]
async fn test_slow_health_endpoint_is_unhealthy() {
    let slow = start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        MockResponse::new(200, "")
    })
    .await;

    let mut config = config_for(&[slow.to_string()]);
    config.health_check.timeout_secs = Some(1);
    let proxy = start_proxy(config).await;

    // Still unknown (unhealthy) after the probe gives up.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!proxy.pool.snapshot()[0].is_healthy());

    let resp = client().get(proxy.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn test_health_monitor_stops_on_shutdown() {
    let backend = start_mock_backend(200, "OK").await;
    let proxy = start_proxy(config_for(&[backend.address()])).await;
    assert!(wait_for_health(&proxy.pool, &[true]).await);

    let pool = proxy.pool.clone();
    proxy.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // With the monitor gone the flag is frozen even though the backend changed.
    backend.set_healthy(false);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(pool.snapshot()[0].is_healthy());
}
