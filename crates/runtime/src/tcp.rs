//! TCP transport.

use std::io;
use std::net::SocketAddr;

use rrepl::{InputSource, OutputSink};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;
use tracing::{debug, trace, warn};

use crate::event::SessionEvent;
use crate::transport::{Endpoints, Transport};

const READ_BUFFER: usize = 4096;

pub struct TcpTransport {
	stream: TcpStream,
	peer: SocketAddr,
}

impl TcpTransport {
	pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
		Self { stream, peer }
	}
}

impl Transport for TcpTransport {
	fn attach(self: Box<Self>, events: UnboundedSender<SessionEvent>) -> Endpoints {
		let peer = self.peer;
		let (reader, writer) = self.stream.into_split();
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

		let reading = tokio::spawn(read_loop(reader, peer, events));
		tokio::spawn(write_loop(writer, peer, outbound_rx));

		Endpoints {
			input: Box::new(TcpInput {
				reader: reading.abort_handle(),
			}),
			output: Box::new(TcpOutput { outbound: outbound_tx }),
		}
	}
}

enum Outbound {
	Text(String),
	Close,
}

struct TcpInput {
	reader: AbortHandle,
}

impl InputSource for TcpInput {
	fn close(&mut self) {
		self.reader.abort();
	}
}

struct TcpOutput {
	outbound: UnboundedSender<Outbound>,
}

impl OutputSink for TcpOutput {
	fn write(&mut self, text: &str) -> io::Result<()> {
		self.outbound
			.send(Outbound::Text(text.to_string()))
			.map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "connection writer has stopped"))
	}

	fn close(&mut self) {
		let _ = self.outbound.send(Outbound::Close);
	}
}

async fn read_loop(mut reader: OwnedReadHalf, peer: SocketAddr, events: UnboundedSender<SessionEvent>) {
	let mut buf = vec![0u8; READ_BUFFER];
	let mut decoder = Utf8Decoder::default();
	loop {
		match reader.read(&mut buf).await {
			Ok(0) => {
				debug!(target = "rrepl.transport", %peer, "peer closed connection");
				break;
			}
			Ok(n) => {
				let text = decoder.decode(&buf[..n]);
				trace!(target = "rrepl.transport", %peer, bytes = n, "read");
				if !text.is_empty() && events.send(SessionEvent::Input(text)).is_err() {
					return;
				}
			}
			Err(err) => {
				warn!(target = "rrepl.transport", %peer, %err, "read failed");
				break;
			}
		}
	}
	let _ = events.send(SessionEvent::PeerClosed);
}

async fn write_loop(mut writer: OwnedWriteHalf, peer: SocketAddr, mut outbound: UnboundedReceiver<Outbound>) {
	while let Some(message) = outbound.recv().await {
		match message {
			Outbound::Text(text) => {
				if let Err(err) = writer.write_all(text.as_bytes()).await {
					warn!(target = "rrepl.transport", %peer, %err, "write failed");
					return;
				}
			}
			Outbound::Close => break,
		}
	}
	if let Err(err) = writer.shutdown().await {
		debug!(target = "rrepl.transport", %peer, %err, "shutdown failed");
	}
}

/// Turns a byte stream into text, holding back a multi-byte character that
/// is split across reads.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
	pending: Vec<u8>,
}

impl Utf8Decoder {
	/// Invalid sequences become U+FFFD; an incomplete character at the end
	/// stays pending for the next read.
	pub(crate) fn decode(&mut self, bytes: &[u8]) -> String {
		self.pending.extend_from_slice(bytes);
		let mut text = String::new();
		loop {
			match std::str::from_utf8(&self.pending) {
				Ok(valid) => {
					text.push_str(valid);
					self.pending.clear();
					return text;
				}
				Err(err) => {
					let valid = err.valid_up_to();
					text.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
					match err.error_len() {
						Some(invalid) => {
							text.push(char::REPLACEMENT_CHARACTER);
							self.pending.drain(..valid + invalid);
						}
						None => {
							self.pending.drain(..valid);
							return text;
						}
					}
				}
			}
		}
	}
}
