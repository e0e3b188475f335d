//! # tonlibjson Binding
//!
//! Loads `libtonlibjson` at runtime and exposes its JSON client as a
//! `SessionFactory`. Enabled with the `tonlibjson` feature.

use libloading::Library;
use std::ffi::{c_char, c_double, c_void, CStr, CString, OsStr};
use std::ptr::NonNull;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::QueryError;
use crate::ports::{NativeSession, SessionFactory};

type CreateFn = unsafe extern "C" fn() -> *mut c_void;
type SendFn = unsafe extern "C" fn(*mut c_void, *const c_char);
type ReceiveFn = unsafe extern "C" fn(*mut c_void, c_double) -> *const c_char;
type DestroyFn = unsafe extern "C" fn(*mut c_void);

struct TonlibJsonApi {
    create: CreateFn,
    send: SendFn,
    receive: ReceiveFn,
    destroy: DestroyFn,
    // Keeps the function pointers above valid.
    _library: Library,
}

/// Platform file name of the engine library.
pub fn default_library_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "libtonlibjson.dylib"
    } else if cfg!(target_os = "windows") {
        "tonlibjson.dll"
    } else {
        "libtonlibjson.so"
    }
}

/// Session factory backed by a loaded `libtonlibjson`.
#[derive(Clone)]
pub struct TonlibJsonFactory {
    api: Arc<TonlibJsonApi>,
}

impl TonlibJsonFactory {
    /// Load the library from `path` and resolve the client entry points.
    pub fn load(path: impl AsRef<OsStr>) -> Result<Self, QueryError> {
        let path = path.as_ref();
        let unavailable =
            |e: libloading::Error| QueryError::SessionUnavailable(format!("{:?}: {}", path, e));

        // SAFETY: loading runs the library's initialisers; libtonlibjson has
        // no load-time side effects beyond its own statics.
        let library = unsafe { Library::new(path) }.map_err(unavailable)?;

        // SAFETY: the signatures match tonlib_client_json.h.
        let api = unsafe {
            let create = *library
                .get::<CreateFn>("tonlib_client_json_create\0".as_bytes())
                .map_err(unavailable)?;
            let send = *library
                .get::<SendFn>("tonlib_client_json_send\0".as_bytes())
                .map_err(unavailable)?;
            let receive = *library
                .get::<ReceiveFn>("tonlib_client_json_receive\0".as_bytes())
                .map_err(unavailable)?;
            let destroy = *library
                .get::<DestroyFn>("tonlib_client_json_destroy\0".as_bytes())
                .map_err(unavailable)?;
            TonlibJsonApi {
                create,
                send,
                receive,
                destroy,
                _library: library,
            }
        };

        tracing::info!(library = ?path, "Loaded tonlibjson");
        Ok(Self { api: Arc::new(api) })
    }
}

impl SessionFactory for TonlibJsonFactory {
    fn create(&self) -> Result<Box<dyn NativeSession>, QueryError> {
        // SAFETY: create takes no arguments and returns an owned client.
        let client = unsafe { (self.api.create)() };
        let client = NonNull::new(client).ok_or_else(|| {
            QueryError::SessionUnavailable("tonlib_client_json_create returned null".to_string())
        })?;
        Ok(Box::new(TonlibJsonSession {
            api: Arc::clone(&self.api),
            client,
        }))
    }

    fn name(&self) -> &str {
        "tonlibjson"
    }
}

struct TonlibJsonSession {
    api: Arc<TonlibJsonApi>,
    client: NonNull<c_void>,
}

impl NativeSession for TonlibJsonSession {
    fn send(&mut self, query: &str) -> Result<(), QueryError> {
        let query = CString::new(query)
            .map_err(|e| QueryError::InvalidEnvelope(format!("request contains NUL: {}", e)))?;
        // SAFETY: client is live until drop; the engine copies the string.
        unsafe { (self.api.send)(self.client.as_ptr(), query.as_ptr()) };
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<String>, QueryError> {
        // SAFETY: the returned buffer stays valid until the next receive on
        // this client, and is copied out before returning.
        let text = unsafe {
            let raw = (self.api.receive)(self.client.as_ptr(), timeout.as_secs_f64());
            if raw.is_null() {
                return Ok(None);
            }
            CStr::from_ptr(raw).to_str().map(str::to_owned)
        };
        text.map(Some)
            .map_err(|e| QueryError::InvalidEnvelope(format!("response is not UTF-8: {}", e)))
    }
}

impl Drop for TonlibJsonSession {
    fn drop(&mut self) {
        // SAFETY: client was created by this library and is destroyed once.
        unsafe { (self.api.destroy)(self.client.as_ptr()) };
    }
}
