//! Native transfer engine collaborator.
//!
//! # Design
//! The HTTP/3 protocol work lives in an external native library. This module
//! describes the slice of it the adapter needs: a process-wide one-time
//! initialization, per-call handles, an option-setting call keyed by a fixed
//! enumeration, a blocking perform call that drives caller-supplied callbacks,
//! and a post-perform status query. Tests substitute a fake engine here.
//!
//! A handle maps 1:1 to one in-flight request. Dropping it releases the native
//! resources, so release happens on every exit path, including unwinding.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::error::{EngineError, OptionKind};

/// One configuration step applied to a transfer handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOption {
    CaPath(PathBuf),
    VerifyPeer(bool),
    /// Negotiate HTTP/3 only.
    ForceHttp3,
    Url(String),
    HttpGet,
    /// Send a request body supplied by the read callback.
    Post,
    /// Upload the read callback's data with PUT semantics.
    Upload,
    /// Skip the response body (HEAD).
    NoBody,
    CustomRequest(String),
    /// Serialized `name:value` lines, one per header value.
    HttpHeaders(Vec<String>),
    Timeout(Duration),
}

impl TransferOption {
    pub fn kind(&self) -> OptionKind {
        match self {
            TransferOption::CaPath(_) => OptionKind::CaPath,
            TransferOption::VerifyPeer(_) => OptionKind::VerifyPeer,
            TransferOption::ForceHttp3 => OptionKind::HttpVersion,
            TransferOption::Url(_) => OptionKind::Url,
            TransferOption::HttpGet => OptionKind::HttpGet,
            TransferOption::Post => OptionKind::Post,
            TransferOption::Upload => OptionKind::Upload,
            TransferOption::NoBody => OptionKind::NoBody,
            TransferOption::CustomRequest(_) => OptionKind::CustomRequest,
            TransferOption::HttpHeaders(_) => OptionKind::HttpHeaders,
            TransferOption::Timeout(_) => OptionKind::Timeout,
        }
    }

    /// Whether this option makes the engine pull a request body.
    pub fn sends_body(&self) -> bool {
        matches!(self, TransferOption::Post | TransferOption::Upload)
    }
}

/// Callbacks the engine drives while a transfer runs.
pub trait TransferIo {
    /// One raw header line, terminator included. Returning `false` aborts.
    fn on_header(&mut self, line: &[u8]) -> bool;

    /// One chunk of the response body. Returning `false` aborts.
    fn on_body(&mut self, chunk: &[u8]) -> bool;

    /// Fill `buf` with request body bytes; `0` means no more data.
    fn on_read(&mut self, buf: &mut [u8]) -> usize;
}

/// One transfer operation inside the native engine.
pub trait TransferHandle {
    fn set_option(&mut self, option: &TransferOption) -> Result<(), EngineError>;

    /// Run the transfer to completion on the calling thread.
    fn perform(&mut self, io: &mut dyn TransferIo) -> Result<(), EngineError>;

    /// Final HTTP status code of a completed transfer.
    fn response_code(&mut self) -> Result<u16, EngineError>;
}

/// Factory for transfer handles.
pub trait TransferEngine: Send + Sync {
    type Handle: TransferHandle;

    /// The guard serializing `global_init` for this engine.
    fn init_guard(&self) -> &InitGuard;

    /// Raw global initialization. Callers go through `initialize`.
    fn global_init(&self) -> Result<(), EngineError>;

    fn create_handle(&self) -> Result<Self::Handle, EngineError>;

    /// Run `global_init` once, however many threads race here.
    fn initialize(&self) -> Result<(), EngineError> {
        self.init_guard().ensure(|| self.global_init())
    }
}

/// Idempotent, thread-safe one-time initialization.
///
/// Unlike `std::sync::Once`, a failed initializer leaves the guard un-run so
/// the next caller retries, and `reset` lets a test harness start over.
#[derive(Debug, Default)]
pub struct InitGuard {
    done: Mutex<bool>,
}

impl InitGuard {
    pub const fn new() -> Self {
        Self {
            done: Mutex::new(false),
        }
    }

    /// Run `init` unless a previous call already succeeded.
    ///
    /// The lock is held across `init`, so concurrent callers wait for the
    /// first one and then observe its result.
    pub fn ensure<F>(&self, init: F) -> Result<(), EngineError>
    where
        F: FnOnce() -> Result<(), EngineError>,
    {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        if *done {
            return Ok(());
        }
        init()?;
        *done = true;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget a previous initialization.
    pub fn reset(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}
