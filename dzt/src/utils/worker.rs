//! Blocking worker for one unit of batch work.
//!
//! The caller hands a closure to [`run_blocking`], which runs it on a named
//! thread and waits for the result. There is no cancellation: the unit runs
//! to completion or failure.

use std::any::Any;
use std::sync::mpsc;
use std::thread;

use anyhow::{Result, bail};

use crate::utils::errors::WorkerError;

pub fn run_blocking<T, F>(name: &str, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            // The receiver only disappears if the caller is gone.
            let _ = tx.send(work());
        })
        .map_err(|source| WorkerError::Spawn {
            name: name.to_string(),
            source,
        })?;

    log::debug!("Submitted unit of work to worker \"{name}\"");

    match handle.join() {
        Ok(()) => match rx.recv() {
            Ok(value) => Ok(value),
            Err(_) => bail!(WorkerError::Panicked {
                name: name.to_string(),
                message: "worker finished without a result".to_string(),
            }),
        },
        Err(payload) => bail!(WorkerError::Panicked {
            name: name.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
