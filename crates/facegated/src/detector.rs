//! Client for the face detection/embedding sidecar.
//!
//! The sidecar owns the camera and the models; this daemon only consumes
//! per-frame reports over a Unix socket. Wire format is length-prefixed
//! bincode: 4-byte little-endian length, then the payload. One
//! `NextFrame` request yields one `FrameReport`.

use facegate_core::Detection;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Reports larger than this are rejected as corrupt framing.
const MAX_REPORT_BYTES: usize = 16 * 1024 * 1024;

const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector socket not found: {0} (is the detector sidecar running?)")]
    SocketMissing(String),
    #[error("failed to connect to detector: {0}")]
    Connect(#[source] std::io::Error),
    #[error("detector i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("detector codec: {0}")]
    Codec(#[from] bincode::Error),
    #[error("frame report too large: {0} bytes")]
    Oversized(usize),
}

#[derive(Serialize, Deserialize)]
enum DetectorRequest {
    NextFrame,
}

/// One captured frame with its detected faces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    pub width: u32,
    pub height: u32,
    /// 8-bit grayscale pixels, row-major, `width * height` bytes.
    pub gray: Vec<u8>,
    pub faces: Vec<Detection>,
}

/// Per-frame capture capability for the recognition loop. The trait seam
/// lets tests drive the loop with scripted frames.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<FrameReport, DetectorError>;
}

/// Unix-socket detector client. Reconnects lazily after any transport
/// error; a failed frame is a transient capture failure, never fatal.
#[derive(Debug)]
pub struct DetectorClient {
    socket_path: String,
    read_timeout: Duration,
    stream: Option<UnixStream>,
}

impl DetectorClient {
    /// Connect at startup, retrying a few times to ride out sidecar boot.
    /// Exhausting the retries is a startup failure.
    pub fn connect(
        socket_path: &str,
        read_timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, DetectorError> {
        let mut client = Self {
            socket_path: socket_path.to_string(),
            read_timeout,
            stream: None,
        };

        let mut attempt = 0;
        loop {
            match client.reconnect() {
                Ok(()) => return Ok(client),
                Err(e) if attempt + 1 >= max_retries => return Err(e),
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "detector connect failed; retrying");
                    std::thread::sleep(CONNECT_RETRY_DELAY);
                }
            }
        }
    }

    fn reconnect(&mut self) -> Result<(), DetectorError> {
        if !Path::new(&self.socket_path).exists() {
            return Err(DetectorError::SocketMissing(self.socket_path.clone()));
        }
        let stream = UnixStream::connect(&self.socket_path).map_err(DetectorError::Connect)?;
        stream.set_read_timeout(Some(self.read_timeout))?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;
        self.stream = Some(stream);
        tracing::debug!(socket = %self.socket_path, "connected to detector");
        Ok(())
    }

    fn request_frame(stream: &mut UnixStream) -> Result<FrameReport, DetectorError> {
        let payload = bincode::serialize(&DetectorRequest::NextFrame)?;
        stream.write_all(&(payload.len() as u32).to_le_bytes())?;
        stream.write_all(&payload)?;
        stream.flush()?;

        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf)?;
        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_REPORT_BYTES {
            return Err(DetectorError::Oversized(len));
        }

        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf)?;
        Ok(bincode::deserialize(&buf)?)
    }
}

impl FrameSource for DetectorClient {
    fn next_frame(&mut self) -> Result<FrameReport, DetectorError> {
        if self.stream.is_none() {
            self.reconnect()?;
        }
        let stream = self.stream.as_mut().ok_or_else(|| {
            DetectorError::SocketMissing(self.socket_path.clone())
        })?;

        match Self::request_frame(stream) {
            Ok(report) => Ok(report),
            Err(e) => {
                // Drop the connection so the next call starts fresh.
                self.stream = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facegate_core::{Embedding, FaceBox};

    fn sample_report() -> FrameReport {
        FrameReport {
            width: 4,
            height: 2,
            gray: vec![0, 64, 128, 255, 1, 2, 3, 4],
            faces: vec![Detection {
                bbox: FaceBox { x: 1.0, y: 0.0, width: 2.0, height: 2.0 },
                embedding: Embedding { values: vec![0.25, -0.5] },
            }],
        }
    }

    /// Serve one framed request/response over a socketpair, like the
    /// sidecar would.
    #[test]
    fn test_framing_round_trip() {
        let (mut server, client_end) = UnixStream::pair().unwrap();
        let report = sample_report();
        let served = report.clone();

        let server_thread = std::thread::spawn(move || {
            let mut len_buf = [0u8; 4];
            server.read_exact(&mut len_buf).unwrap();
            let mut req = vec![0u8; u32::from_le_bytes(len_buf) as usize];
            server.read_exact(&mut req).unwrap();
            let request: DetectorRequest = bincode::deserialize(&req).unwrap();
            assert!(matches!(request, DetectorRequest::NextFrame));

            let payload = bincode::serialize(&served).unwrap();
            server.write_all(&(payload.len() as u32).to_le_bytes()).unwrap();
            server.write_all(&payload).unwrap();
        });

        let mut client_end = client_end;
        let received = DetectorClient::request_frame(&mut client_end).unwrap();
        server_thread.join().unwrap();

        assert_eq!(received.width, report.width);
        assert_eq!(received.gray, report.gray);
        assert_eq!(received.faces.len(), 1);
        assert_eq!(received.faces[0].embedding.values, vec![0.25, -0.5]);
    }

    #[test]
    fn test_oversized_report_is_rejected() {
        let (mut server, client_end) = UnixStream::pair().unwrap();

        let server_thread = std::thread::spawn(move || {
            let mut len_buf = [0u8; 4];
            server.read_exact(&mut len_buf).unwrap();
            let mut req = vec![0u8; u32::from_le_bytes(len_buf) as usize];
            server.read_exact(&mut req).unwrap();
            // Advertise an absurd payload length
            server.write_all(&(u32::MAX).to_le_bytes()).unwrap();
        });

        let mut client_end = client_end;
        let err = DetectorClient::request_frame(&mut client_end).unwrap_err();
        server_thread.join().unwrap();
        assert!(matches!(err, DetectorError::Oversized(_)));
    }

    #[test]
    fn test_missing_socket_is_reported() {
        let err = DetectorClient::connect("/nonexistent/detector.sock", Duration::from_secs(1), 1)
            .unwrap_err();
        assert!(matches!(err, DetectorError::SocketMissing(_)));
    }
}
