//! libcurl transfer engine (feature-gated)
//!
//! Enable with: cargo build --features libcurl
//!
//! HTTP/3 only works when the linked libcurl was built with an HTTP/3 stack;
//! otherwise setting the protocol version fails with an `OptionError`.

use std::cell::RefCell;
use std::panic::catch_unwind;

use curl::easy::{Easy, HttpVersion, List};

use crate::engine::{InitGuard, TransferEngine, TransferHandle, TransferIo, TransferOption};
use crate::error::EngineError;

/// `curl_global_init` may run once per process, whichever engine value asks.
static CURL_INIT: InitGuard = InitGuard::new();

// CURLE_FAILED_INIT
const FAILED_INIT: i32 = 2;
// CURLE_WEIRD_SERVER_REPLY
const WEIRD_SERVER_REPLY: i32 = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct CurlEngine;

impl TransferEngine for CurlEngine {
    type Handle = CurlHandle;

    fn init_guard(&self) -> &InitGuard {
        &CURL_INIT
    }

    fn global_init(&self) -> Result<(), EngineError> {
        // curl::init asserts on failure; keep the panic inside this call.
        catch_unwind(curl::init)
            .map_err(|_| EngineError::new(FAILED_INIT, "curl_global_init failed"))
    }

    fn create_handle(&self) -> Result<CurlHandle, EngineError> {
        catch_unwind(Easy::new)
            .map(|easy| CurlHandle { easy })
            .map_err(|_| EngineError::new(FAILED_INIT, "curl_easy_init returned null"))
    }
}

/// One easy handle. Dropping it runs `curl_easy_cleanup`.
pub struct CurlHandle {
    easy: Easy,
}

impl From<curl::Error> for EngineError {
    fn from(err: curl::Error) -> Self {
        let message = match err.extra_description() {
            Some(extra) => format!("{}: {extra}", err.description()),
            None => err.description().to_string(),
        };
        EngineError::new(err.code() as i32, message)
    }
}

impl TransferHandle for CurlHandle {
    fn set_option(&mut self, option: &TransferOption) -> Result<(), EngineError> {
        let easy = &mut self.easy;
        match option {
            TransferOption::CaPath(path) => easy.capath(path),
            TransferOption::VerifyPeer(verify) => easy.ssl_verify_peer(*verify),
            TransferOption::ForceHttp3 => easy.http_version(HttpVersion::V3),
            TransferOption::Url(url) => easy.url(url),
            TransferOption::HttpGet => easy.get(true),
            TransferOption::Post => easy.post(true),
            TransferOption::Upload => easy.upload(true),
            TransferOption::NoBody => easy.nobody(true),
            TransferOption::CustomRequest(method) => easy.custom_request(method),
            TransferOption::HttpHeaders(lines) => {
                let mut list = List::new();
                for line in lines {
                    list.append(line)?;
                }
                easy.http_headers(list)
            }
            TransferOption::Timeout(timeout) => easy.timeout(*timeout),
        }?;
        Ok(())
    }

    fn perform(&mut self, io: &mut dyn TransferIo) -> Result<(), EngineError> {
        let io = RefCell::new(io);
        let mut transfer = self.easy.transfer();
        transfer.header_function(|line| io.borrow_mut().on_header(line))?;
        transfer.write_function(|chunk| {
            // A short count makes libcurl abort with CURLE_WRITE_ERROR.
            if io.borrow_mut().on_body(chunk) {
                Ok(chunk.len())
            } else {
                Ok(0)
            }
        })?;
        transfer.read_function(|buf| Ok(io.borrow_mut().on_read(buf)))?;
        transfer.perform()?;
        Ok(())
    }

    fn response_code(&mut self) -> Result<u16, EngineError> {
        let code = self.easy.response_code()?;
        u16::try_from(code).map_err(|_| {
            EngineError::new(WEIRD_SERVER_REPLY, format!("invalid status code {code}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OptionKind;

    #[test]
    fn engine_initializes_once() {
        let engine = CurlEngine;
        engine.initialize().unwrap();
        engine.initialize().unwrap();
        assert!(engine.init_guard().is_initialized());
    }

    #[test]
    fn plain_options_are_accepted() {
        let engine = CurlEngine;
        engine.initialize().unwrap();
        let mut handle = engine.create_handle().unwrap();
        for option in [
            TransferOption::VerifyPeer(true),
            TransferOption::Url("https://example.test/x".to_string()),
            TransferOption::HttpGet,
            TransferOption::HttpHeaders(vec!["accept:text/plain".to_string()]),
        ] {
            handle
                .set_option(&option)
                .unwrap_or_else(|err| panic!("{}: {err}", option.kind()));
        }
        assert_eq!(TransferOption::HttpGet.kind(), OptionKind::HttpGet);
    }

    #[test]
    fn curl_errors_keep_their_code() {
        let err = EngineError::from(curl::Error::new(7));
        assert_eq!(err.code, 7);
        assert!(!err.message.is_empty());
    }

    #[test]
    fn local_codes_match_libcurl() {
        assert!(curl::Error::new(FAILED_INIT).is_failed_init());
        assert!(curl::Error::new(WEIRD_SERVER_REPLY).is_weird_server_reply());
    }
}
