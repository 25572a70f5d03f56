use std::time::Duration;

use tokio::{
    sync::Mutex,
    time::{sleep, Instant},
};
use tracing::{debug, trace, warn};

use crate::{PortConfig, ResultStats, SerialError, SerialInterface, SerialResult};

/// Async front end for a [`SerialInterface`].
///
/// The port is only locked for the duration of each non-blocking call, so a
/// writer is never starved by a reader waiting for a frame.
#[derive(Debug)]
pub struct SerialChannel {
    port: Mutex<Box<dyn SerialInterface>>,
    stats: Mutex<ResultStats>,
    poll_interval: Duration,
}

impl SerialChannel {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2);

    pub fn new(port: Box<dyn SerialInterface>) -> Self {
        Self {
            port: Mutex::new(port),
            stats: Mutex::new(ResultStats::default()),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn name(&self) -> String {
        self.port.lock().await.name().to_string()
    }

    pub async fn is_open(&self) -> bool {
        self.port.lock().await.is_open()
    }

    async fn record<T>(&self, result: &Result<T, SerialError>) {
        self.stats.lock().await.record(SerialResult::from(result));
    }

    pub async fn open(&self, config: &PortConfig) -> Result<(), SerialError> {
        let result = self.port.lock().await.open(config);
        self.record(&result).await;
        result
    }

    pub async fn close(&self) -> Result<(), SerialError> {
        let result = self.port.lock().await.close();
        self.record(&result).await;
        result
    }

    /// Closes the port if needed and opens it again with `config`.
    pub async fn reopen(&self, config: &PortConfig) -> Result<(), SerialError> {
        let mut port = self.port.lock().await;
        if port.is_open() {
            let closed = port.close();
            if closed.is_err() {
                drop(port);
                self.record(&closed).await;
                return closed;
            }
        }
        let result = port.open(config);
        drop(port);

        self.record(&result).await;
        result
    }

    pub async fn write_all(&self, data: &[u8]) -> Result<(), SerialError> {
        let result = self.port.lock().await.write(data);
        self.record(&result).await;
        if result.is_ok() {
            self.stats.lock().await.record_written(data.len());
        }
        result
    }

    /// Single non-blocking read, `NoData` when nothing is pending.
    pub async fn read_available(&self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let result = self.port.lock().await.read(buf);
        self.record(&result).await;
        if let Ok(count) = result {
            self.stats.lock().await.record_read(count);
        }
        result
    }

    /// Collects bytes into `buf` until it is full, the line stays quiet for
    /// `inter_byte_timeout` after the first byte, or `timeout` elapses.
    ///
    /// Fails with `Timeout` when nothing arrived at all. A line fault aborts
    /// the frame and is returned as is.
    pub async fn read_frame(
        &self,
        buf: &mut [u8],
        timeout: Duration,
        inter_byte_timeout: Duration,
    ) -> Result<usize, SerialError> {
        let result = self.collect_frame(buf, timeout, inter_byte_timeout).await;
        self.record(&result).await;
        if let Ok(count) = result {
            self.stats.lock().await.record_read(count);
        }
        result
    }

    async fn collect_frame(
        &self,
        buf: &mut [u8],
        timeout: Duration,
        inter_byte_timeout: Duration,
    ) -> Result<usize, SerialError> {
        // Let the port reject a closed channel or an empty buffer
        if buf.is_empty() {
            return self.port.lock().await.read(buf);
        }

        let started = Instant::now();
        let deadline = started + timeout;
        let mut total = 0usize;
        let mut last_byte_at = started;

        while total < buf.len() {
            let outcome = self.port.lock().await.read(&mut buf[total..]);
            match outcome {
                Ok(count) => {
                    total += count;
                    last_byte_at = Instant::now();
                    trace!("Frame progress: {}/{} bytes", total, buf.len());
                }
                Err(e) if e.is_no_data() => {
                    let now = Instant::now();
                    if total > 0 && now.duration_since(last_byte_at) >= inter_byte_timeout {
                        trace!("Inter-byte timeout reached with {} bytes", total);
                        break;
                    }
                    if now >= deadline {
                        if total > 0 {
                            debug!("Frame deadline reached with {} bytes", total);
                            break;
                        }
                        return Err(SerialError::Timeout {
                            port: self.name().await,
                            elapsed: started.elapsed(),
                            limit: timeout,
                        });
                    }
                    sleep(self.poll_interval).await;
                }
                Err(e) => {
                    if let SerialError::LineFault { fault, .. } = &e {
                        warn!("Frame aborted by {} after {} bytes", fault, total);
                    }
                    return Err(e);
                }
            }
        }

        Ok(total)
    }

    pub async fn stats(&self) -> ResultStats {
        self.stats.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{LineFault, VirtualLine, VirtualPort};

    async fn open_channel() -> (SerialChannel, VirtualLine) {
        let (port, line) = VirtualPort::new("vtty-channel");
        let channel = SerialChannel::new(Box::new(port)).with_poll_interval(Duration::from_millis(1));
        channel
            .open(&PortConfig::with_device("vtty-channel"))
            .await
            .unwrap();
        (channel, line)
    }

    #[tokio::test]
    async fn test_read_frame_fills_buffer() {
        let (channel, line) = open_channel().await;
        line.inject(b"0123456789");

        let mut buf = [0u8; 4];
        let count = channel
            .read_frame(&mut buf, Duration::from_millis(200), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(count, 4);
        assert_eq!(&buf, b"0123");
    }

    #[tokio::test]
    async fn test_read_frame_stops_on_inter_byte_gap() {
        let (channel, line) = open_channel().await;
        line.inject(b"abc");

        let mut buf = [0u8; 16];
        let count = channel
            .read_frame(&mut buf, Duration::from_secs(2), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(&buf[..count], b"abc");
    }

    #[tokio::test]
    async fn test_read_frame_assembles_late_bytes() {
        let (channel, line) = open_channel().await;
        let channel = Arc::new(channel);

        let feeder = tokio::spawn(async move {
            line.inject(b"he");
            sleep(Duration::from_millis(5)).await;
            line.inject(b"llo");
        });

        let mut buf = [0u8; 5];
        let count = channel
            .read_frame(&mut buf, Duration::from_secs(1), Duration::from_millis(200))
            .await
            .unwrap();
        feeder.await.unwrap();
        assert_eq!(&buf[..count], b"hello");
    }

    #[tokio::test]
    async fn test_read_frame_times_out_without_data() {
        let (channel, _line) = open_channel().await;

        let mut buf = [0u8; 4];
        let err = channel
            .read_frame(&mut buf, Duration::from_millis(20), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SerialError::Timeout { .. }));
        assert_eq!(err.result(), SerialResult::Fail);
    }

    #[tokio::test]
    async fn test_line_fault_aborts_frame() {
        let (channel, line) = open_channel().await;
        line.inject_fault(LineFault::Framing);
        line.inject(b"xyz");

        let mut buf = [0u8; 3];
        let err = channel
            .read_frame(&mut buf, Duration::from_millis(100), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(err.result(), SerialResult::FramingError);

        // Fault was reported once, data is still there
        let count = channel
            .read_frame(&mut buf, Duration::from_millis(100), Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..count], b"xyz");
    }

    #[tokio::test]
    async fn test_stats_track_outcomes() {
        let (channel, line) = open_channel().await;
        line.inject(b"ok");

        let mut buf = [0u8; 2];
        channel.read_available(&mut buf).await.unwrap();
        channel.write_all(b"reply").await.unwrap();
        assert!(channel.read_available(&mut buf).await.is_err());
        channel.close().await.unwrap();
        assert!(channel.close().await.is_err());

        let stats = channel.stats().await;
        // open, read, write, close
        assert_eq!(stats.count(SerialResult::Success), 4);
        assert_eq!(stats.count(SerialResult::NoData), 1);
        assert_eq!(stats.count(SerialResult::Closed), 1);
        assert_eq!(stats.bytes_read, 2);
        assert_eq!(stats.bytes_written, 5);
        assert_eq!(line.take_transmitted(), b"reply".to_vec());
    }

    #[tokio::test]
    async fn test_read_frame_checks_state_and_buffer() {
        let (port, _line) = VirtualPort::new("vtty-frame-checks");
        let channel = SerialChannel::new(Box::new(port));

        let err = channel
            .read_frame(&mut [], Duration::from_millis(10), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert_eq!(err.result(), SerialResult::Closed);

        channel
            .open(&PortConfig::with_device("vtty-frame-checks"))
            .await
            .unwrap();
        let err = channel
            .read_frame(&mut [], Duration::from_millis(10), Duration::from_millis(5))
            .await
            .unwrap_err();
        assert_eq!(err.result(), SerialResult::InvalidParameter);

        let stats = channel.stats().await;
        assert_eq!(stats.count(SerialResult::Success), 1);
        assert_eq!(stats.count(SerialResult::Closed), 1);
        assert_eq!(stats.count(SerialResult::InvalidParameter), 1);
    }

    /// Port that opens fine but refuses to close.
    #[derive(Debug, Default)]
    struct StuckPort {
        open: bool,
    }

    impl SerialInterface for StuckPort {
        fn name(&self) -> &str {
            "stuck"
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn open(&mut self, config: &PortConfig) -> Result<(), SerialError> {
            config.validate()?;
            self.open = true;
            Ok(())
        }

        fn close(&mut self) -> Result<(), SerialError> {
            Err(SerialError::fail(
                crate::IoOperation::Close,
                "stuck",
                "device busy",
            ))
        }

        fn read(&mut self, _buf: &mut [u8]) -> Result<usize, SerialError> {
            Err(SerialError::no_data("stuck"))
        }

        fn write(&mut self, _buf: &[u8]) -> Result<(), SerialError> {
            Ok(())
        }

        fn has_data(&mut self) -> Result<bool, SerialError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_reopen_records_failed_close() {
        let channel = SerialChannel::new(Box::new(StuckPort::default()));
        let config = PortConfig::with_device("stuck");
        channel.open(&config).await.unwrap();

        let err = channel.reopen(&config).await.unwrap_err();
        assert_eq!(err.result(), SerialResult::Fail);

        let stats = channel.stats().await;
        assert_eq!(stats.count(SerialResult::Success), 1);
        assert_eq!(stats.count(SerialResult::Fail), 1);
        assert_eq!(stats.last_error, Some(SerialResult::Fail));
    }

    #[tokio::test]
    async fn test_reopen_changes_configuration() {
        let (channel, _line) = open_channel().await;
        let config = PortConfig {
            device: "vtty-channel".into(),
            baud_rate: 9600,
            ..Default::default()
        };
        channel.reopen(&config).await.unwrap();
        assert!(channel.is_open().await);
        assert_eq!(channel.name().await, "vtty-channel");
    }
}
