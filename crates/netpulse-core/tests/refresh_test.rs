// Refresh controller scenarios against a wiremock server.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netpulse_api::{DashboardClient, TransportConfig};
use netpulse_core::{
    AlertSeverity, AssumeYes, CoreError, DeviceId, DevicePatch, DeviceStatus, FleetStats,
    MetricsQuery, Monitor, MonitorConfig, NewDevice, StatsSource,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn monitor_for(api: &str) -> Monitor {
    let api_url = Url::parse(api).unwrap();
    let mut config = MonitorConfig::new(api_url.clone(), Url::parse("ws://127.0.0.1:9/ws").unwrap());
    config.push_enabled = false;
    let client = DashboardClient::new(api_url, &TransportConfig::default()).unwrap();
    Monitor::with_client(config, client)
}

async fn setup() -> (MockServer, Monitor) {
    let server = MockServer::start().await;
    let monitor = monitor_for(&format!("{}/api", server.uri()));
    (server, monitor)
}

async fn mount_list(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn messages(monitor: &Monitor) -> Vec<(AlertSeverity, String, bool)> {
    monitor
        .alerts_snapshot()
        .iter()
        .map(|a| (a.severity, a.message.clone(), a.dismissible))
        .collect()
}

// ── Pull and replace ────────────────────────────────────────────────

#[tokio::test]
async fn pull_replaces_registry_and_derives_stats() {
    let (server, monitor) = setup().await;
    mount_list(&server, json!([{ "id": 1, "status": "warning" }])).await;

    let stats = monitor.refresh().pull_and_replace().await.unwrap();

    assert_eq!(
        stats,
        FleetStats {
            total: 1,
            online: 0,
            offline: 0,
            warning: 1
        }
    );
    let devices = monitor.devices_snapshot();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id, DeviceId::Number(1));
    assert_eq!(devices[0].status, DeviceStatus::Warning);
    assert_eq!(monitor.stats_snapshot().stats, stats);
    assert_eq!(monitor.stats_snapshot().source, StatsSource::Derived);
    assert!(monitor.alerts_snapshot().is_empty());
}

#[tokio::test]
async fn failed_pull_leaves_state_alone() {
    let (server, monitor) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db locked" })))
        .mount(&server)
        .await;

    let err = monitor.refresh().pull_and_replace().await.unwrap_err();

    assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    assert!(monitor.devices_snapshot().is_empty());
    assert_eq!(monitor.stats_snapshot().source, StatsSource::Initial);
    // Pull failures always use the generic text.
    assert_eq!(
        messages(&monitor),
        [(AlertSeverity::Error, "Failed to refresh devices".to_owned(), true)]
    );
}

#[tokio::test]
async fn unreachable_server_raises_connection_error() {
    let monitor = monitor_for("http://127.0.0.1:9/api");

    let err = monitor.refresh().pull_and_replace().await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(
        messages(&monitor),
        [(
            AlertSeverity::Error,
            "Connection error: server unreachable".to_owned(),
            true
        )]
    );
}

// ── Create ──────────────────────────────────────────────────────────

fn new_device() -> NewDevice {
    NewDevice {
        name: "core-sw".into(),
        ip_address: "10.0.0.1".into(),
        device_type: "switch".into(),
        snmp_community: None,
        snmp_version: None,
    }
}

#[tokio::test]
async fn create_rejected_uses_server_message() {
    let (server, monitor) = setup().await;
    mount_list(&server, json!([{ "id": 7, "status": "online" }])).await;
    monitor.refresh().pull_and_replace().await.unwrap();
    let before = monitor.devices_snapshot();

    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "duplicate IP" })))
        .mount(&server)
        .await;

    let err = monitor.refresh().create_device(new_device()).await.unwrap_err();

    assert_eq!(err.server_message(), Some("duplicate IP"));
    assert_eq!(
        messages(&monitor),
        [(AlertSeverity::Error, "duplicate IP".to_owned(), true)]
    );
    assert_eq!(monitor.devices_snapshot(), before);
}

#[tokio::test]
async fn create_without_error_body_uses_fallback() {
    let (server, monitor) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    monitor.refresh().create_device(new_device()).await.unwrap_err();

    assert_eq!(
        messages(&monitor),
        [(AlertSeverity::Error, "Failed to add device".to_owned(), true)]
    );
}

#[tokio::test]
async fn create_success_announces_and_refreshes() {
    let (server, monitor) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .and(body_partial_json(json!({
            "name": "core-sw",
            "ip_address": "10.0.0.1",
            "snmp_community": "public"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3, "name": "core-sw", "ip_address": "10.0.0.1", "status": "unknown"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_list(
        &server,
        json!([{ "id": 3, "name": "core-sw", "ip_address": "10.0.0.1", "status": "unknown" }]),
    )
    .await;

    let created = monitor.refresh().create_device(new_device()).await.unwrap();

    assert_eq!(created.unwrap().id, DeviceId::Number(3));
    assert_eq!(
        messages(&monitor),
        [(
            AlertSeverity::Success,
            "Device core-sw added successfully".to_owned(),
            true
        )]
    );
    assert_eq!(monitor.devices_snapshot().len(), 1);
    assert_eq!(monitor.stats_snapshot().stats.total, 1);
}

#[tokio::test]
async fn create_acknowledged_with_message_only() {
    let (server, monitor) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "message": "Device created" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_list(
        &server,
        json!([
            { "id": 1, "status": "online", "ip_address": "10.0.0.9" },
            { "id": 2, "name": "core-sw", "ip_address": "10.0.0.1", "status": "unknown" }
        ]),
    )
    .await;

    let created = monitor.refresh().create_device(new_device()).await.unwrap();

    // Placed by IP address in the refreshed list.
    assert_eq!(created.unwrap().id, DeviceId::Number(2));
    assert_eq!(
        messages(&monitor),
        [(
            AlertSeverity::Success,
            "Device core-sw added successfully".to_owned(),
            true
        )]
    );
    assert_eq!(monitor.devices_snapshot().len(), 2);
    assert_eq!(monitor.stats_snapshot().source, StatsSource::Derived);
}

#[tokio::test]
async fn create_with_empty_reply_still_succeeds() {
    let (server, monitor) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    mount_list(&server, json!([{ "id": 1, "status": "online" }])).await;

    let created = monitor.refresh().create_device(new_device()).await.unwrap();

    assert!(created.is_none());
    assert_eq!(messages(&monitor)[0].0, AlertSeverity::Success);
    assert_eq!(monitor.devices_snapshot().len(), 1);
}

// ── Update ──────────────────────────────────────────────────────────

#[tokio::test]
async fn update_announces_new_name() {
    let (server, monitor) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/devices/3"))
        .and(body_partial_json(json!({ "name": "dist-sw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "name": "dist-sw", "ip_address": "10.0.0.1", "status": "online"
        })))
        .mount(&server)
        .await;
    mount_list(&server, json!([])).await;

    let patch = DevicePatch {
        name: Some("dist-sw".into()),
        ..DevicePatch::default()
    };
    let device = monitor
        .refresh()
        .update_device(&DeviceId::Number(3), patch)
        .await
        .unwrap();

    assert_eq!(device.unwrap().name, "dist-sw");
    assert_eq!(messages(&monitor)[0].1, "Device dist-sw updated");
}

#[tokio::test]
async fn update_acknowledged_with_message_uses_refreshed_record() {
    let (server, monitor) = setup().await;
    mount_list(
        &server,
        json!([{ "id": 3, "name": "edge-rtr", "ip_address": "10.0.0.3", "status": "online" }]),
    )
    .await;
    monitor.refresh().pull_and_replace().await.unwrap();
    Mock::given(method("PUT"))
        .and(path("/api/devices/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Device updated" })))
        .expect(1)
        .mount(&server)
        .await;

    let patch = DevicePatch {
        snmp_community: Some("private".into()),
        ..DevicePatch::default()
    };
    let device = monitor
        .refresh()
        .update_device(&DeviceId::Number(3), patch)
        .await
        .unwrap();

    assert_eq!(device.unwrap().name, "edge-rtr");
    assert_eq!(
        messages(&monitor),
        [(AlertSeverity::Success, "Device edge-rtr updated".to_owned(), true)]
    );
}

#[tokio::test]
async fn empty_patch_is_rejected_locally() {
    let (_server, monitor) = setup().await;
    let err = monitor
        .refresh()
        .update_device(&DeviceId::Number(3), DevicePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let (server, monitor) = setup().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let asked = std::sync::atomic::AtomicBool::new(false);
    let decline = |prompt: &str| {
        asked.store(prompt.contains("delete"), std::sync::atomic::Ordering::Relaxed);
        false
    };
    let err = monitor
        .refresh()
        .delete_device(&DeviceId::Number(3), &decline)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Cancelled));
    assert!(asked.load(std::sync::atomic::Ordering::Relaxed));
    assert!(monitor.alerts_snapshot().is_empty());
}

#[tokio::test]
async fn confirmed_delete_announces_and_refreshes() {
    let (server, monitor) = setup().await;
    mount_list(&server, json!([])).await;
    Mock::given(method("DELETE"))
        .and(path("/api/devices/3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Device deleted" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    monitor
        .refresh()
        .delete_device(&DeviceId::Number(3), &AssumeYes)
        .await
        .unwrap();

    assert_eq!(
        messages(&monitor),
        [(
            AlertSeverity::Success,
            "Device deleted successfully".to_owned(),
            true
        )]
    );
    assert_eq!(monitor.stats_snapshot().source, StatsSource::Derived);
}

// ── Test / detail / metrics ─────────────────────────────────────────

#[tokio::test]
async fn test_device_surfaces_server_message_verbatim() {
    let (server, monitor) = setup().await;
    mount_list(&server, json!([{ "id": 3, "status": "online" }])).await;
    monitor.refresh().pull_and_replace().await.unwrap();
    let before = monitor.devices_snapshot();

    Mock::given(method("POST"))
        .and(path("/api/devices/3/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "SNMP reachable: Cisco IOS",
            "system_name": "core-sw"
        })))
        .mount(&server)
        .await;

    let message = monitor
        .refresh()
        .test_device(&DeviceId::Number(3))
        .await
        .unwrap();

    assert_eq!(message, "SNMP reachable: Cisco IOS");
    assert_eq!(
        messages(&monitor),
        [(AlertSeverity::Success, message.clone(), true)]
    );
    assert_eq!(monitor.devices_snapshot(), before);
}

#[tokio::test]
async fn text_id_with_separators_targets_only_that_device() {
    let (server, monitor) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/devices/7/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "probed device 7" })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/devices/7%2Ftest%3F/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "probed rack 7/test?" })))
        .expect(1)
        .mount(&server)
        .await;

    let message = monitor
        .refresh()
        .test_device(&DeviceId::Text("7/test?".into()))
        .await
        .unwrap();

    assert_eq!(message, "probed rack 7/test?");
}

#[tokio::test]
async fn dot_segment_id_is_refused_locally() {
    let (_server, monitor) = setup().await;
    let err = monitor
        .refresh()
        .delete_device(&DeviceId::Text("..".into()), &AssumeYes)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert_eq!(
        messages(&monitor),
        [(AlertSeverity::Error, "Failed to delete device".to_owned(), true)]
    );
}

#[tokio::test]
async fn failed_test_uses_server_error() {
    let (server, monitor) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/devices/3/test"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "SNMP timeout" })))
        .mount(&server)
        .await;

    monitor
        .refresh()
        .test_device(&DeviceId::Number(3))
        .await
        .unwrap_err();

    assert_eq!(
        messages(&monitor),
        [(AlertSeverity::Error, "SNMP timeout".to_owned(), true)]
    );
}

#[tokio::test]
async fn detail_is_read_only() {
    let (server, monitor) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/devices/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4, "name": "ap-1", "ip_address": "10.0.0.4", "status": "offline"
        })))
        .mount(&server)
        .await;

    let device = monitor
        .refresh()
        .fetch_device_detail(&DeviceId::Number(4))
        .await
        .unwrap();

    assert_eq!(device.name, "ap-1");
    assert_eq!(device.status, DeviceStatus::Offline);
    assert!(monitor.devices_snapshot().is_empty());
}

#[tokio::test]
async fn missing_device_detail() {
    let (server, monitor) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/devices/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = monitor
        .refresh()
        .fetch_device_detail(&DeviceId::Number(99))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::DeviceNotFound { .. }));
    assert_eq!(
        messages(&monitor),
        [(
            AlertSeverity::Error,
            "Failed to load device details".to_owned(),
            true
        )]
    );
}

#[tokio::test]
async fn metrics_query_is_forwarded() {
    let (server, monitor) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/devices/4/metrics"))
        .and(query_param("hours", "6"))
        .and(query_param("type", "cpu_usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "device_id": 4, "metric_type": "cpu_usage", "value": 12.5,
              "unit": "%", "timestamp": "2024-05-01T10:00:00" }
        ])))
        .mount(&server)
        .await;

    let query = MetricsQuery {
        hours: Some(6),
        metric_type: Some("cpu_usage".into()),
    };
    let points = monitor
        .refresh()
        .device_metrics(&DeviceId::Number(4), &query)
        .await
        .unwrap();

    assert_eq!(points.len(), 1);
    assert_eq!(points[0].metric_type, "cpu_usage");
    assert!((points[0].value - 12.5).abs() < f64::EPSILON);
    assert!(points[0].timestamp.is_some());
}

// ── Periodic refresh ────────────────────────────────────────────────

#[tokio::test]
async fn periodic_refresh_pulls_without_commands() {
    let server = MockServer::start().await;
    mount_list(&server, json!([{ "id": 4, "status": "online" }])).await;

    let api_url = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let mut config =
        MonitorConfig::new(api_url.clone(), Url::parse("ws://127.0.0.1:9/ws").unwrap());
    config.push_enabled = false;
    config.refresh_interval_secs = 1;
    let client = DashboardClient::new(api_url, &TransportConfig::default()).unwrap();
    let monitor = Monitor::with_client(config, client);
    monitor.start().await.unwrap();
    assert!(monitor.devices_snapshot().is_empty());

    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while monitor.devices_snapshot().is_empty() {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(monitor.stats_snapshot().source, StatsSource::Derived);
    monitor.shutdown().await;
}
