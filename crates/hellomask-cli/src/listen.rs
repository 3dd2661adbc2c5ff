use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use hellomask_core::hello::consts::{CONTENT_TYPE_HANDSHAKE, MAX_RECORD_FRAGMENT};
use hellomask_core::hello::inspect::{handshake_complete, parse_client_hello};

use crate::output::{print_info, OutputFormat};

/// How long a client gets to deliver its ClientHello.
const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

/// Read TLS records from `stream` until they hold a complete handshake
/// message, and return the raw record bytes.
async fn read_hello_records<S: AsyncRead + Unpin>(stream: &mut S) -> std::io::Result<Vec<u8>> {
    let mut raw = Vec::new();
    // Record bodies only; the handshake header may span several records.
    let mut handshake = Vec::new();
    loop {
        // Record header: content_type(1) + version(2) + length(2)
        let mut header = [0u8; 5];
        stream.read_exact(&mut header).await?;
        if header[0] != CONTENT_TYPE_HANDSHAKE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("not a TLS handshake (got 0x{:02x})", header[0]),
            ));
        }
        let record_len = u16::from_be_bytes([header[3], header[4]]) as usize;
        if record_len > MAX_RECORD_FRAGMENT {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("record too large: {} bytes", record_len),
            ));
        }
        let mut body = vec![0u8; record_len];
        stream.read_exact(&mut body).await?;

        raw.extend_from_slice(&header);
        raw.extend_from_slice(&body);
        handshake.extend_from_slice(&body);

        if handshake_complete(&handshake) {
            return Ok(raw);
        }
    }
}

/// [`read_hello_records`] bounded by `limit`.
async fn read_hello_within<S: AsyncRead + Unpin>(
    stream: &mut S,
    limit: Duration,
) -> std::io::Result<Vec<u8>> {
    tokio::time::timeout(limit, read_hello_records(stream))
        .await
        .map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("no ClientHello within {:?}", limit),
            )
        })?
}

pub async fn run(port: u16, format: OutputFormat) -> anyhow::Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let listener = TcpListener::bind(addr).await?;

    info!("hellomask listening on {}", addr);
    info!("Press Ctrl+C to stop");

    loop {
        let (mut stream, peer) = listener.accept().await?;

        tokio::spawn(async move {
            let raw = match read_hello_within(&mut stream, HELLO_TIMEOUT).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("[{}] failed to read ClientHello: {}", peer, e);
                    return;
                }
            };

            match parse_client_hello(&raw) {
                Ok(hello) => {
                    info!("[{}] ClientHello received", peer);
                    if let Err(e) = print_info(&hello, format) {
                        error!("[{}] output error: {}", peer, e);
                    }
                }
                Err(e) => error!("[{}] parse error: {}", peer, e),
            }

            // Connection drops here; the client sees a TLS error.
        });
    }
}
