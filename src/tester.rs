use std::{collections::BTreeMap, sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{sleep, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    AppConfig, LineFault, PortConfig, ResultStats, SerialChannel, SerialError, SerialInterface,
};

/// What a listening session observed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ListenReport {
    pub bytes_received: usize,
    pub faults: BTreeMap<LineFault, u64>,
}

impl ListenReport {
    pub fn fault_count(&self, fault: LineFault) -> u64 {
        self.faults.get(&fault).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FramingReport {
    pub matched_writes: u32,
    pub mismatched_writes: u32,
    pub mismatched_baud_rate: u32,
}

/// Drives a port through the interactive and line-fault scenarios.
pub struct LineTester {
    channel: Arc<SerialChannel>,
    config: AppConfig,
    shutdown: watch::Sender<bool>,
}

impl LineTester {
    const RX_CHUNK: usize = 256;

    pub fn new(port: Box<dyn SerialInterface>, config: AppConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            channel: Arc::new(SerialChannel::new(port)),
            config,
            shutdown,
        }
    }

    pub fn channel(&self) -> Arc<SerialChannel> {
        Arc::clone(&self.channel)
    }

    pub async fn open(&self) -> Result<(), SerialError> {
        self.channel.open(&self.config.port).await
    }

    pub async fn close(&self) -> Result<(), SerialError> {
        if self.channel.is_open().await {
            self.channel.close().await?;
        }
        Ok(())
    }

    /// Stops a running `listen` at its next poll.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown.clone()
    }

    pub async fn stats(&self) -> ResultStats {
        self.channel.stats().await
    }

    /// Writes `payload` in chunks no larger than the configured write limit.
    pub async fn send(&self, payload: &[u8]) -> Result<(), SerialError> {
        if payload.is_empty() {
            return self.channel.write_all(payload).await;
        }
        for chunk in payload.chunks(self.config.port.max_write_len) {
            self.channel.write_all(chunk).await?;
        }
        debug!("Sent {} bytes", payload.len());
        Ok(())
    }

    /// Sends `payload` and waits up to `read_timeout` for the reply frame.
    pub async fn request(&self, payload: &[u8]) -> Result<Vec<u8>, SerialError> {
        self.send(payload).await?;

        let port = &self.config.port;
        let mut reply = vec![0u8; port.rx_buffer_capacity];
        let count = self
            .channel
            .read_frame(&mut reply, port.read_timeout, port.inter_byte_timeout())
            .await?;
        reply.truncate(count);

        debug!("Reply: {} bytes", count);
        Ok(reply)
    }

    /// Reads until `duration` elapses (forever when `None`) or shutdown is requested.
    ///
    /// Line faults are tallied, not returned. Any other failure ends the session.
    pub async fn listen(&self, duration: Option<Duration>) -> Result<ListenReport, SerialError> {
        let mut shutdown_rx = self.shutdown.subscribe();
        let deadline = duration.map(|duration| Instant::now() + duration);
        let mut report = ListenReport::default();
        let mut buf = [0u8; Self::RX_CHUNK];

        info!("Listening on {}", self.channel.name().await);

        loop {
            if *shutdown_rx.borrow() {
                debug!("Listener received shutdown signal");
                break;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }

            match self.channel.read_available(&mut buf).await {
                Ok(count) => {
                    report.bytes_received += count;
                    info!(
                        "RX {} bytes: {} {:?}",
                        count,
                        hex::encode(&buf[..count]),
                        String::from_utf8_lossy(&buf[..count])
                    );
                }
                Err(SerialError::LineFault { fault, .. }) => {
                    warn!("Line fault: {} ({})", fault, fault.result());
                    *report.faults.entry(fault).or_default() += 1;
                }
                Err(e) if e.is_no_data() => {
                    tokio::select! {
                        _ = sleep(SerialChannel::DEFAULT_POLL_INTERVAL) => {}
                        _ = shutdown_rx.changed() => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Floods the device so its receiver overruns, then listens for the reported faults.
    pub async fn stress_overrun(&self) -> Result<ListenReport, SerialError> {
        let stress = &self.config.stress;
        info!(
            "Overrun test started: sending {} bytes of {:#04x}",
            stress.overrun_bytes, stress.overrun_fill
        );

        let blast = vec![stress.overrun_fill; stress.overrun_bytes];
        self.send(&blast).await?;

        info!("Blasting done, listening to device");
        let report = self.listen(Some(stress.listen_duration)).await?;
        info!(
            "Overrun test finished: {} bytes back, {} overruns",
            report.bytes_received,
            report.fault_count(LineFault::Overrun)
        );
        Ok(report)
    }

    /// Writes the payload repeatedly at the configured baud rate, then at a
    /// rate lowered by `framing_baud_offset` so the receiver sees broken frames.
    pub async fn stress_framing(&self) -> Result<FramingReport, SerialError> {
        let stress = &self.config.stress;
        let base = self.config.port.clone();
        let mismatched = PortConfig {
            baud_rate: base.baud_rate.saturating_sub(stress.framing_baud_offset),
            ..base.clone()
        };

        info!("Framing error test started");
        let mut report = FramingReport {
            mismatched_baud_rate: mismatched.baud_rate,
            ..Default::default()
        };

        for _ in 0..stress.framing_cycles {
            debug!("baud: {}", base.baud_rate);
            self.channel.reopen(&base).await?;
            self.channel.write_all(stress.payload.as_bytes()).await?;
            report.matched_writes += 1;
        }

        for _ in 0..stress.framing_cycles {
            debug!("next baud: {}", mismatched.baud_rate);
            self.channel.reopen(&mismatched).await?;
            self.channel.write_all(stress.payload.as_bytes()).await?;
            report.mismatched_writes += 1;
        }

        self.channel.reopen(&base).await?;
        info!("Framing error test done");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SerialResult, StressConfig, VirtualPort};

    fn config(device: &str) -> AppConfig {
        AppConfig {
            port: PortConfig {
                device: device.to_string(),
                rx_buffer_capacity: 64,
                max_write_len: 100,
                ..Default::default()
            },
            stress: StressConfig {
                overrun_bytes: 300,
                listen_duration: Duration::from_millis(30),
                framing_cycles: 3,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_send_chunks_by_write_limit() {
        let (port, line) = VirtualPort::new("vt0");
        let tester = LineTester::new(Box::new(port), config("vt0"));
        tester.open().await.unwrap();

        tester.send(&[7u8; 250]).await.unwrap();
        assert_eq!(line.take_transmitted().len(), 250);
        assert_eq!(tester.stats().await.count(SerialResult::Success), 4);
    }

    #[tokio::test]
    async fn test_send_rejects_empty_payload() {
        let (port, line) = VirtualPort::new("vt5");
        let tester = LineTester::new(Box::new(port), config("vt5"));
        tester.open().await.unwrap();

        let err = tester.send(&[]).await.unwrap_err();
        assert_eq!(err.result(), SerialResult::InvalidParameter);
        assert!(line.take_transmitted().is_empty());
        assert_eq!(tester.stats().await.count(SerialResult::InvalidParameter), 1);
    }

    #[tokio::test]
    async fn test_request_reads_reply_on_loopback() {
        let (port, _line) = VirtualPort::loopback("vloop2");
        let tester = LineTester::new(Box::new(port), config("vloop2"));
        tester.open().await.unwrap();

        let reply = tester.request(b"ping").await.unwrap();
        assert_eq!(reply, b"ping".to_vec());
    }

    #[tokio::test]
    async fn test_request_times_out_after_read_timeout() {
        let (port, line) = VirtualPort::new("vt6");
        let mut config = config("vt6");
        config.port.read_timeout = Duration::from_millis(20);
        let tester = LineTester::new(Box::new(port), config);
        tester.open().await.unwrap();

        let err = tester.request(b"ping").await.unwrap_err();
        match err {
            SerialError::Timeout { limit, .. } => assert_eq!(limit, Duration::from_millis(20)),
            other => panic!("Expected timeout, got: {:?}", other),
        }
        assert_eq!(line.take_transmitted(), b"ping".to_vec());
    }

    #[tokio::test]
    async fn test_listen_counts_bytes_and_faults() {
        let (port, line) = VirtualPort::new("vt1");
        let tester = LineTester::new(Box::new(port), config("vt1"));
        tester.open().await.unwrap();

        line.inject(b"hello");
        line.inject_fault(LineFault::Parity);
        line.inject_fault(LineFault::LineBreak);

        let report = tester.listen(Some(Duration::from_millis(30))).await.unwrap();
        assert_eq!(report.bytes_received, 5);
        assert_eq!(report.fault_count(LineFault::Parity), 1);
        assert_eq!(report.fault_count(LineFault::LineBreak), 1);
        assert_eq!(report.fault_count(LineFault::Noise), 0);
    }

    #[tokio::test]
    async fn test_listen_stops_on_shutdown() {
        let (port, _line) = VirtualPort::new("vt2");
        let tester = Arc::new(LineTester::new(Box::new(port), config("vt2")));
        tester.open().await.unwrap();

        let handle = tester.shutdown_handle();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            let _ = handle.send(true);
        });

        let report = tokio::time::timeout(Duration::from_secs(2), tester.listen(None))
            .await
            .expect("listener should stop on shutdown")
            .unwrap();
        assert_eq!(report, ListenReport::default());
    }

    #[tokio::test]
    async fn test_listen_on_closed_port_fails() {
        let (port, _line) = VirtualPort::new("vt3");
        let tester = LineTester::new(Box::new(port), config("vt3"));

        let err = tester.listen(Some(Duration::from_millis(10))).await.unwrap_err();
        assert_eq!(err.result(), SerialResult::Closed);
    }

    #[tokio::test]
    async fn test_overrun_scenario_on_loopback() {
        let (port, _line) = VirtualPort::loopback("vloop");
        let tester = LineTester::new(Box::new(port), config("vloop"));
        tester.open().await.unwrap();

        let report = tester.stress_overrun().await.unwrap();
        assert!(report.fault_count(LineFault::Overrun) >= 1);
        assert_eq!(report.bytes_received, 64);
    }

    #[tokio::test]
    async fn test_framing_scenario_reopens_at_both_rates() {
        let (port, line) = VirtualPort::new("vt4");
        let tester = LineTester::new(Box::new(port), config("vt4"));
        tester.open().await.unwrap();

        let report = tester.stress_framing().await.unwrap();
        assert_eq!(report.matched_writes, 3);
        assert_eq!(report.mismatched_writes, 3);
        assert_eq!(report.mismatched_baud_rate, 115_100);
        assert_eq!(line.take_transmitted(), b"error".repeat(6));
        assert!(tester.channel().is_open().await);

        tester.close().await.unwrap();
        assert!(!line.is_open());
    }
}
