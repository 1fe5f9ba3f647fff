//! Image-loading capability and the completion queue.
//!
//! Loads may finish synchronously inside [`ImageLoader::load`] or later on
//! another thread. Either way the result travels as a [`CompletedLoad`]
//! message over a crossbeam channel and is applied to the box tree by the
//! document between passes, never from the loader's thread.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use wombat_common::image::LoadedImage;

use crate::geometry::Rect;
use crate::tree::BoxId;

/// What a load is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    /// The replaced content of an `<img>` box.
    Content,
    /// The box's `background-image`.
    Background,
}

/// A request handed to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    /// Source locator as written in the markup.
    pub source: String,
    /// Attributes of the requesting element.
    pub attributes: BTreeMap<String, String>,
}

/// Outcome of a load. `image` is `None` on failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageLoadResult {
    /// Decoded image.
    pub image: Option<Arc<LoadedImage>>,
    /// Sub-rectangle of the image to draw, if only part of it is wanted.
    pub source_rect: Option<Rect>,
}

impl ImageLoadResult {
    /// A failed load.
    #[must_use]
    pub fn failed() -> Self {
        Self::default()
    }

    /// A successful load of the whole image.
    #[must_use]
    pub fn loaded(image: Arc<LoadedImage>) -> Self {
        Self {
            image: Some(image),
            source_rect: None,
        }
    }
}

/// Image-loading capability.
pub trait ImageLoader {
    /// Start loading `request`. The loader must call
    /// [`ImageCompletion::complete`] exactly once. With `sync` set it must
    /// do so before returning.
    fn load(&self, request: ImageRequest, sync: bool, completion: ImageCompletion);
}

impl<T: ImageLoader + ?Sized> ImageLoader for Arc<T> {
    fn load(&self, request: ImageRequest, sync: bool, completion: ImageCompletion) {
        (**self).load(request, sync, completion);
    }
}

/// Loader that fails every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullImageLoader;

impl ImageLoader for NullImageLoader {
    fn load(&self, _request: ImageRequest, _sync: bool, completion: ImageCompletion) {
        completion.complete(ImageLoadResult::failed());
    }
}

/// Loader over a fixed set of in-memory images, completing synchronously.
#[derive(Debug, Clone, Default)]
pub struct StaticImageLoader {
    images: HashMap<String, Arc<LoadedImage>>,
}

impl StaticImageLoader {
    /// Empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` under `source`.
    #[must_use]
    pub fn with_image(mut self, source: impl Into<String>, image: LoadedImage) -> Self {
        let _ = self.images.insert(source.into(), Arc::new(image));
        self
    }
}

impl ImageLoader for StaticImageLoader {
    fn load(&self, request: ImageRequest, _sync: bool, completion: ImageCompletion) {
        let result = self
            .images
            .get(&request.source)
            .map_or_else(ImageLoadResult::failed, |image| {
                ImageLoadResult::loaded(Arc::clone(image))
            });
        completion.complete(result);
    }
}

/// A finished load on its way back to the document.
#[derive(Debug, Clone)]
pub struct CompletedLoad {
    /// Box that asked for the image.
    pub box_id: BoxId,
    /// Slot the image is for.
    pub target: ImageTarget,
    /// Generation of the slot at request time.
    pub generation: u64,
    /// What the loader produced.
    pub result: ImageLoadResult,
}

/// One-shot completion handle given to an [`ImageLoader`].
///
/// Completing after the owning box was torn down is a no-op.
pub struct ImageCompletion {
    box_id: BoxId,
    target: ImageTarget,
    generation: u64,
    cancel: Arc<AtomicBool>,
    sender: Sender<CompletedLoad>,
}

impl fmt::Debug for ImageCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCompletion")
            .field("box_id", &self.box_id)
            .field("target", &self.target)
            .field("generation", &self.generation)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ImageCompletion {
    /// Whether the requesting box no longer wants the result.
    ///
    /// Loaders may poll this to abandon work early.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Deliver the result. Consumes the handle so it fires at most once.
    pub fn complete(self, result: ImageLoadResult) {
        if self.is_cancelled() {
            return;
        }
        // The receiver is gone once the document is dropped.
        let _ = self.sender.send(CompletedLoad {
            box_id: self.box_id,
            target: self.target,
            generation: self.generation,
            result,
        });
    }
}

/// The document's completion queue.
#[derive(Debug)]
pub struct ImageQueue {
    sender: Sender<CompletedLoad>,
    receiver: Receiver<CompletedLoad>,
}

impl Default for ImageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Create a completion handle for one request.
    #[must_use]
    pub fn completion(
        &self,
        box_id: BoxId,
        target: ImageTarget,
        generation: u64,
        cancel: Arc<AtomicBool>,
    ) -> ImageCompletion {
        ImageCompletion {
            box_id,
            target,
            generation,
            cancel,
            sender: self.sender.clone(),
        }
    }

    /// Take everything that has arrived so far.
    pub fn drain(&self) -> Vec<CompletedLoad> {
        self.receiver.try_iter().collect()
    }

    /// Block until one completion arrives or `timeout` passes.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<CompletedLoad> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

/// Load state of an image slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageState {
    /// No request made yet.
    #[default]
    NotRequested,
    /// Waiting for a completion.
    Loading,
    /// Image available.
    Loaded,
    /// The load failed; stays failed until the box is rebuilt.
    Failed,
}

/// Per-box image state for one [`ImageTarget`].
#[derive(Debug, Clone, Default)]
pub struct ImageSlot {
    state: ImageState,
    image: Option<Arc<LoadedImage>>,
    source_rect: Option<Rect>,
    cancel: Option<Arc<AtomicBool>>,
    generation: u64,
}

impl ImageSlot {
    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ImageState {
        self.state
    }

    /// Loaded image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<LoadedImage>> {
        self.image.as_ref()
    }

    /// Requested sub-rectangle of the image.
    #[must_use]
    pub const fn source_rect(&self) -> Option<Rect> {
        self.source_rect
    }

    /// Current generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new request: cancels any in-flight one and returns the new
    /// generation and cancel flag.
    pub fn begin(&mut self) -> (u64, Arc<AtomicBool>) {
        self.cancel();
        self.generation += 1;
        self.state = ImageState::Loading;
        let flag = Arc::new(AtomicBool::new(false));
        self.cancel = Some(Arc::clone(&flag));
        (self.generation, flag)
    }

    /// Abandon an in-flight request.
    pub fn cancel(&mut self) {
        if let Some(flag) = self.cancel.take() {
            flag.store(true, Ordering::Release);
        }
        if self.state == ImageState::Loading {
            self.state = ImageState::NotRequested;
        }
    }

    /// Apply a completion. Returns `false` for stale generations.
    pub fn apply(&mut self, generation: u64, result: ImageLoadResult) -> bool {
        if generation != self.generation || self.state != ImageState::Loading {
            return false;
        }
        self.cancel = None;
        let image = result.image.filter(|image| image.is_well_formed());
        self.state = if image.is_some() {
            ImageState::Loaded
        } else {
            ImageState::Failed
        };
        self.image = image;
        self.source_rect = result.source_rect;
        true
    }
}
