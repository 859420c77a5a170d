// Device endpoints
//
// CRUD, connectivity test, and historical metrics under `/devices`.

use tracing::debug;

use crate::client::DashboardClient;
use crate::error::Error;
use crate::models::{
    CreateDeviceRequest, DeviceRecord, DeviceTestResult, MessageBody, MetricSample,
    UpdateDeviceRequest, WireId, WriteAck,
};

impl DashboardClient {
    /// List every monitored device.
    ///
    /// `GET /devices`
    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>, Error> {
        let url = self.api_url("devices")?;
        debug!("listing devices");
        self.get(url).await
    }

    /// Fetch one device.
    ///
    /// `GET /devices/{id}`
    pub async fn get_device(&self, id: &WireId) -> Result<DeviceRecord, Error> {
        let url = self.device_url(id, None)?;
        self.get(url).await
    }

    /// Register a new device. Any 2xx is success; the server usually
    /// answers `201 {message}`, some also echo the stored record.
    ///
    /// `POST /devices`
    pub async fn create_device(&self, body: &CreateDeviceRequest) -> Result<WriteAck, Error> {
        let url = self.api_url("devices")?;
        debug!(name = %body.name, ip = %body.ip_address, "creating device");
        self.post_ack(url, body).await
    }

    /// Change fields of an existing device. Any 2xx is success.
    ///
    /// `PUT /devices/{id}`
    pub async fn update_device(
        &self,
        id: &WireId,
        body: &UpdateDeviceRequest,
    ) -> Result<WriteAck, Error> {
        let url = self.device_url(id, None)?;
        debug!(%id, "updating device");
        self.put_ack(url, body).await
    }

    /// Remove a device.
    ///
    /// `DELETE /devices/{id}`
    pub async fn delete_device(&self, id: &WireId) -> Result<MessageBody, Error> {
        let url = self.device_url(id, None)?;
        debug!(%id, "deleting device");
        self.delete(url).await
    }

    /// Ask the server to probe a device over SNMP.
    ///
    /// `POST /devices/{id}/test`
    pub async fn test_device(&self, id: &WireId) -> Result<DeviceTestResult, Error> {
        let url = self.device_url(id, Some("test"))?;
        debug!(%id, "testing device connectivity");
        self.post_empty(url).await
    }

    /// Historical samples, newest first.
    ///
    /// `GET /devices/{id}/metrics?hours=&type=`. The server defaults to
    /// the last 24 hours of every metric type.
    pub async fn device_metrics(
        &self,
        id: &WireId,
        hours: Option<u32>,
        metric_type: Option<&str>,
    ) -> Result<Vec<MetricSample>, Error> {
        let mut url = self.device_url(id, Some("metrics"))?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(hours) = hours {
                query.append_pair("hours", &hours.to_string());
            }
            if let Some(metric_type) = metric_type {
                query.append_pair("type", metric_type);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.get(url).await
    }
}
