//! Runs large fills off the caller's thread.
//!
//! The job owns a copy of the layer pixels; the filled copy comes back
//! through a oneshot channel. Nothing is shared with the layer while the job
//! runs, so the caller decides on completion whether the result still applies.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use image::Rgba;
use log::debug;

use crate::error::{EngineError, EngineResult};
use crate::layer::LayerId;
use crate::surface::Surface;

/// A fill to run on a worker
#[derive(Debug, Clone)]
pub struct FillJob {
    pub layer_id: LayerId,
    /// Layer revision the pixels were copied at
    pub revision: u64,
    pub pixels: Surface,
    pub x: u32,
    pub y: u32,
    pub color: Rgba<u8>,
}

impl FillJob {
    pub fn run(mut self) -> FillResult {
        let changed = super::flood_fill(&mut self.pixels, self.x, self.y, self.color);
        FillResult {
            layer_id: self.layer_id,
            revision: self.revision,
            pixels: self.pixels,
            changed,
        }
    }
}

/// Output of a [`FillJob`]
#[derive(Debug, Clone)]
pub struct FillResult {
    pub layer_id: LayerId,
    pub revision: u64,
    pub pixels: Surface,
    pub changed: bool,
}

/// Resolves to the [`FillResult`] once the worker is done.
#[derive(Debug)]
#[must_use = "the fill result must be handed back to the engine"]
pub struct FillTask {
    layer_id: LayerId,
    revision: u64,
    receiver: oneshot::Receiver<FillResult>,
}

impl FillTask {
    pub fn layer_id(&self) -> LayerId {
        self.layer_id
    }

    /// Layer revision the job started from
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Future for FillTask {
    type Output = EngineResult<FillResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| EngineError::FillCanceled))
    }
}

/// Starts `job` on a named background thread.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_fill(job: FillJob) -> EngineResult<FillTask> {
    let (sender, receiver) = oneshot::channel();
    let (layer_id, revision) = (job.layer_id, job.revision);
    debug!("Offloading fill on {} ({}x{})", layer_id, job.pixels.width(), job.pixels.height());

    std::thread::Builder::new()
        .name("flood-fill".to_owned())
        .spawn(move || {
            // The receiver may be gone if the caller dropped the task.
            let _ = sender.send(job.run());
        })?;

    Ok(FillTask {
        layer_id,
        revision,
        receiver,
    })
}

/// Starts `job` as a local task on the browser event loop.
#[cfg(target_arch = "wasm32")]
pub fn spawn_fill(job: FillJob) -> EngineResult<FillTask> {
    let (sender, receiver) = oneshot::channel();
    let (layer_id, revision) = (job.layer_id, job.revision);
    debug!("Offloading fill on {} ({}x{})", layer_id, job.pixels.width(), job.pixels.height());

    wasm_bindgen_futures::spawn_local(async move {
        let _ = sender.send(job.run());
    });

    Ok(FillTask {
        layer_id,
        revision,
        receiver,
    })
}
