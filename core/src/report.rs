//! Reporting pipeline: encode, compose, deliver
//!
//! One [`Reporter`] per node. Each call to [`Reporter::report`] runs to
//! completion before returning: the reading is encoded, the device id is
//! looked up, the JSON payload is composed and POSTed to the backend over a
//! fresh connection that is closed before the call returns.
//!
//! Every network step is bounded by a timeout from [`ReporterConfig`], so a
//! hung backend delays the caller by at most the configured amount.

use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{Connect, ConnectError, Connection, DeviceId, DeviceIdentity, TransportMode};
use heapless::Vec;

use crate::config::ReporterConfig;
use crate::error::{EncodeError, PayloadError, ReportError};
use crate::http::{drain_response, write_request, ResponseSummary};
use crate::payload::{build_payload, FieldValue, Fields, MAX_FIELDS};
use crate::reading::{encode, SensorReading, SensorSource};

/// Where a payload is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Endpoint<'a> {
    pub host: &'a str,
    pub path: &'a str,
    pub port: u16,
    pub transport: TransportMode,
}

/// One reporting request
///
/// The primary reading is mandatory. Up to two extra, already-stringified
/// fields may follow it; extras with an empty value are left out of the
/// payload. Host, port and transport fall back to the reporter's
/// configuration unless overridden.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<'a> {
    pub key: &'a str,
    pub reading: SensorReading,
    pub path: &'a str,
    pub host: Option<&'a str>,
    pub port: Option<u16>,
    pub transport: Option<TransportMode>,
    extra: Vec<(&'a str, FieldValue<'a>), { MAX_FIELDS - 1 }>,
}

impl<'a> Report<'a> {
    pub fn new(key: &'a str, reading: SensorReading, path: &'a str) -> Self {
        Self {
            key,
            reading,
            path,
            host: None,
            port: None,
            transport: None,
            extra: Vec::new(),
        }
    }

    /// Send to `host` instead of the configured backend
    pub fn with_host(mut self, host: &'a str) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_transport(mut self, transport: TransportMode) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Append an extra field after the primary reading
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::TooManyFields` if two extras are already present.
    pub fn with_field(mut self, key: &'a str, value: FieldValue<'a>) -> Result<Self, PayloadError> {
        self.extra
            .push((key, value))
            .map_err(|_| PayloadError::TooManyFields)?;
        Ok(self)
    }

    /// Extra fields in insertion order
    pub fn extra_fields(&self) -> impl Iterator<Item = &(&'a str, FieldValue<'a>)> {
        self.extra.iter()
    }
}

/// Successful delivery of one report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Delivered {
    /// Bytes of JSON sent as the request body
    pub payload_len: usize,
    /// What the backend answered
    pub response: ResponseSummary,
}

/// Encodes, composes and delivers sensor reports
pub struct Reporter<C, I, D> {
    config: ReporterConfig,
    connector: C,
    identity: I,
    delay: D,
}

impl<C, I, D> Reporter<C, I, D>
where
    C: Connect,
    I: DeviceIdentity,
    D: DelayNs,
{
    pub fn new(config: ReporterConfig, connector: C, identity: I, delay: D) -> Self {
        Self {
            config,
            connector,
            identity,
            delay,
        }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    /// Resolve the endpoint for a report against the configuration
    pub fn endpoint<'a>(&self, report: &Report<'a>) -> Endpoint<'a> {
        let transport = report.transport.unwrap_or(self.config.transport);
        let port = match (report.port, report.transport) {
            (Some(port), _) => port,
            // Switching transport without a port picks that transport's default
            (None, Some(t)) if t != self.config.transport => ReporterConfig::default_port(t),
            (None, _) => self.config.port,
        };

        Endpoint {
            host: report.host.unwrap_or(self.config.host),
            path: report.path,
            port,
            transport,
        }
    }

    /// Encode, compose and deliver one report
    ///
    /// The device id is looked up for every report. If the identity source
    /// fails the report is still sent, with an empty `device_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] saying why the report was not delivered.
    /// Nothing is sent when encoding or composition fails.
    pub async fn report(&mut self, report: &Report<'_>) -> Result<Delivered, ReportError> {
        let value = encode(&report.reading).map_err(|e| {
            warn!("{}", e);
            e
        })?;
        if value.is_empty() {
            warn!("Empty reading for {}, not reporting", report.key);
            return Err(EncodeError::Empty.into());
        }

        let device_id = self.identity.device_id().unwrap_or_else(|| {
            warn!("Device ID unavailable, reporting with empty id");
            DeviceId::new()
        });

        let mut fields = Fields::new(report.key, FieldValue::from(&value));
        for (key, value) in report.extra_fields() {
            fields.push(*key, *value)?;
        }
        let json = build_payload(&device_id, &fields).map_err(|e| {
            warn!("{}", e);
            e
        })?;

        let endpoint = self.endpoint(report);
        self.deliver(&endpoint, &json).await
    }

    /// Read one value from `source` and report it
    ///
    /// # Errors
    ///
    /// `ReportError::SensorUnavailable` if the source produced no reading,
    /// otherwise as [`report`](Self::report).
    pub async fn report_source<S: SensorSource>(
        &mut self,
        source: &mut S,
    ) -> Result<Delivered, ReportError> {
        let reading = source.read().await.ok_or_else(|| {
            warn!("No reading from {} sensor", source.key());
            ReportError::SensorUnavailable
        })?;
        self.report(&Report::new(source.key(), reading, source.path()))
            .await
    }

    /// Fire-and-forget variant of [`report`](Self::report)
    ///
    /// Failures are logged and swallowed; the return value only says whether
    /// the report went out.
    pub async fn report_best_effort(&mut self, report: &Report<'_>) -> bool {
        match self.report(report).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Report dropped: {}", e);
                false
            }
        }
    }

    /// Fire-and-forget variant of [`report_source`](Self::report_source)
    pub async fn report_source_best_effort<S: SensorSource>(&mut self, source: &mut S) -> bool {
        match self.report_source(source).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Report dropped: {}", e);
                false
            }
        }
    }

    /// POST `body` to `endpoint` over a fresh connection
    ///
    /// The connection is closed once the exchange ends, whether it completed,
    /// failed or timed out.
    ///
    /// # Errors
    ///
    /// - `ReportError::ConnectFailed` / `ConnectTimeout` if no stream could be
    ///   opened in time
    /// - `ReportError::Io` if the request could not be written
    /// - `ReportError::ExchangeTimeout` if the request could not be written in time
    ///
    /// Once the request is written the report is delivered. A response that
    /// does not end in time is cut short and reported as incomplete in
    /// [`ResponseSummary::complete`].
    pub async fn deliver(
        &mut self,
        endpoint: &Endpoint<'_>,
        body: &str,
    ) -> Result<Delivered, ReportError> {
        let connect = self
            .connector
            .connect(endpoint.host, endpoint.port, endpoint.transport);
        let timeout = self.delay.delay_ms(self.config.connect_timeout_ms);

        let mut conn = match select(connect, timeout).await {
            Either::First(Ok(conn)) => conn,
            Either::First(Err(e)) => {
                error!("Failed to connect to backend: {}", e.kind());
                error!("Host: {}", endpoint.host);
                error!("Port: {}", endpoint.port);
                return Err(ReportError::ConnectFailed(e.kind()));
            }
            Either::Second(()) => {
                error!(
                    "Connect to {}:{} timed out after {} ms",
                    endpoint.host,
                    endpoint.port,
                    self.config.connect_timeout_ms
                );
                return Err(ReportError::ConnectTimeout);
            }
        };

        let send = async {
            write_request(&mut conn, endpoint.host, endpoint.path, body)
                .await
                .map_err(|_| ReportError::Io)
        };
        let timeout = self.delay.delay_ms(self.config.exchange_timeout_ms);

        let sent = match select(send, timeout).await {
            Either::First(Ok(())) => {
                info!("Sent to {}: {}", endpoint.path, body);
                Ok(())
            }
            Either::First(Err(e)) => {
                error!("{}", e);
                Err(e)
            }
            Either::Second(()) => {
                warn!(
                    "Sending to {} timed out after {} ms",
                    endpoint.host, self.config.exchange_timeout_ms
                );
                Err(ReportError::ExchangeTimeout)
            }
        };

        // Once the request is out the report counts as delivered
        let outcome = match sent {
            Ok(()) => {
                let mut response = ResponseSummary::default();
                let timeout = self.delay.delay_ms(self.config.exchange_timeout_ms);
                if let Either::Second(()) =
                    select(drain_response(&mut conn, &mut response), timeout).await
                {
                    warn!(
                        "No end of response from {} after {} ms, closing",
                        endpoint.host, self.config.exchange_timeout_ms
                    );
                }
                Ok(Delivered {
                    payload_len: body.len(),
                    response,
                })
            }
            Err(e) => Err(e),
        };

        let timeout = self.delay.delay_ms(self.config.exchange_timeout_ms);
        if let Either::Second(()) = select(conn.close(), timeout).await {
            warn!("Connection close timed out");
        }

        outcome
    }
}
