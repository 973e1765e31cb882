//! Recording fakes for the native engine and the conventional transport.
//!
//! `FakeEngine` plays back a scripted response through the `TransferIo`
//! callbacks and records, per handle, every option it was given and every
//! request body byte it pulled. Handles report themselves released on drop.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use h3_transport_core::{
    Body, EngineError, HttpRequest, HttpResponse, InitGuard, OptionKind, RoundTrip,
    TransferEngine, TransferHandle, TransferIo, TransferOption, TransportError,
};

/// What a fake transfer does when performed.
#[derive(Debug, Clone)]
pub struct Script {
    pub status: u16,
    pub header_lines: Vec<String>,
    pub body_chunks: Vec<Vec<u8>>,
    pub fail_init: Option<EngineError>,
    pub fail_handle: Option<EngineError>,
    pub reject_option: Option<OptionKind>,
    pub fail_perform: Option<EngineError>,
    pub read_chunk: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            status: 200,
            header_lines: Vec::new(),
            body_chunks: Vec::new(),
            fail_init: None,
            fail_handle: None,
            reject_option: None,
            fail_perform: None,
            read_chunk: 16,
        }
    }
}

impl Script {
    /// Status line, the given headers, the blank terminator line, and a body.
    pub fn respond(status: u16, headers: &[&str], body: &[u8]) -> Self {
        let mut header_lines = vec![format!("HTTP/3 {status}\r\n")];
        header_lines.extend(headers.iter().map(|h| format!("{h}\r\n")));
        header_lines.push("\r\n".to_string());
        Self {
            status,
            header_lines,
            body_chunks: body.chunks(3).map(<[u8]>::to_vec).collect(),
            ..Self::default()
        }
    }
}

/// Everything one handle saw, captured when it was released.
#[derive(Debug, Clone, Default)]
pub struct Transfer {
    pub options: Vec<TransferOption>,
    pub uploaded: Vec<u8>,
    pub performed: bool,
}

impl Transfer {
    pub fn has_kind(&self, kind: OptionKind) -> bool {
        self.options.iter().any(|o| o.kind() == kind)
    }

    pub fn header_lines(&self) -> Vec<String> {
        self.options
            .iter()
            .find_map(|o| match o {
                TransferOption::HttpHeaders(lines) => Some(lines.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct State {
    guard: InitGuard,
    init_calls: AtomicUsize,
    handles_created: AtomicUsize,
    transfers: Mutex<Vec<Transfer>>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    script: Script,
    state: Arc<State>,
}

impl FakeEngine {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            state: Arc::default(),
        }
    }

    pub fn init_calls(&self) -> usize {
        self.state.init_calls.load(Ordering::SeqCst)
    }

    pub fn handles_created(&self) -> usize {
        self.state.handles_created.load(Ordering::SeqCst)
    }

    /// Released handles, in release order.
    pub fn transfers(&self) -> Vec<Transfer> {
        self.state.transfers.lock().unwrap().clone()
    }

    pub fn only_transfer(&self) -> Transfer {
        let transfers = self.transfers();
        assert_eq!(transfers.len(), 1, "expected exactly one transfer");
        transfers.into_iter().next().unwrap()
    }
}

impl TransferEngine for FakeEngine {
    type Handle = FakeHandle;

    fn init_guard(&self) -> &InitGuard {
        &self.state.guard
    }

    fn global_init(&self) -> Result<(), EngineError> {
        self.state.init_calls.fetch_add(1, Ordering::SeqCst);
        match &self.script.fail_init {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn create_handle(&self) -> Result<FakeHandle, EngineError> {
        if let Some(err) = &self.script.fail_handle {
            return Err(err.clone());
        }
        self.state.handles_created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeHandle {
            script: self.script.clone(),
            state: Arc::clone(&self.state),
            transfer: Transfer::default(),
        })
    }
}

pub struct FakeHandle {
    script: Script,
    state: Arc<State>,
    transfer: Transfer,
}

impl TransferHandle for FakeHandle {
    fn set_option(&mut self, option: &TransferOption) -> Result<(), EngineError> {
        if self.script.reject_option == Some(option.kind()) {
            return Err(EngineError::new(48, "An unknown option was passed in"));
        }
        self.transfer.options.push(option.clone());
        Ok(())
    }

    fn perform(&mut self, io: &mut dyn TransferIo) -> Result<(), EngineError> {
        self.transfer.performed = true;

        if self.transfer.options.iter().any(TransferOption::sends_body) {
            let mut buf = vec![0u8; self.script.read_chunk];
            loop {
                let n = io.on_read(&mut buf);
                if n == 0 {
                    break;
                }
                self.transfer.uploaded.extend_from_slice(&buf[..n]);
            }
        }

        if let Some(err) = &self.script.fail_perform {
            return Err(err.clone());
        }
        for line in &self.script.header_lines {
            if !io.on_header(line.as_bytes()) {
                return Err(EngineError::new(23, "Failed writing header"));
            }
        }
        for chunk in &self.script.body_chunks {
            if !io.on_body(chunk) {
                return Err(EngineError::new(23, "Failed writing received data"));
            }
        }
        Ok(())
    }

    fn response_code(&mut self) -> Result<u16, EngineError> {
        Ok(self.script.status)
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        let transfer = std::mem::take(&mut self.transfer);
        if let Ok(mut transfers) = self.state.transfers.lock() {
            transfers.push(transfer);
        }
    }
}

/// Conventional transport that answers every request with a fixed response.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RoundTrip for RecordingTransport {
    fn round_trip(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, request.url));
        Ok(HttpResponse {
            status: 204,
            protocol: "HTTP/1.1".to_string(),
            headers: Default::default(),
            body: Body::empty(),
            content_length: 0,
        })
    }
}
