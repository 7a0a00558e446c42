//! Asset loading: the media-engine seam and the resolver that coordinates
//! asynchronous load completions through promises.

use std::{collections::BTreeMap, path::Path, rc::Rc};

use crate::{
    error::{ReelplanError, ReelplanResult},
    future::{Promise, Scheduler},
    script::Directive,
};

/// Native video stream metadata exposed by a loaded asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VideoStream {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Caps name of the stream, e.g. `video/x-vp9`. Opaque to the core.
    pub format: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioStream {
    pub format: String,
}

/// Opaque engine reference to a loaded media input, keyed by its source URI.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssetHandle {
    pub uri: String,
    pub video: VideoStream,
    pub audio: AudioStream,
}

/// The media engine's asset API, as the core relies on it.
///
/// `create_asset` is asynchronous: the engine later reports completion
/// through exactly one of [`AssetResolver::asset_added`] or
/// [`AssetResolver::asset_load_error`], routed by the embedding.
pub trait MediaEngine {
    fn create_asset(&mut self, uri: &str) -> ReelplanResult<()>;

    /// Synchronous lookup of an already-loaded asset.
    fn get_asset(&self, uri: &str) -> Option<AssetHandle>;
}

/// Issues load requests for declared inputs and resolves one promise per
/// input from the engine's completion notifications.
pub struct AssetResolver<E: MediaEngine> {
    engine: E,
    scheduler: Rc<dyn Scheduler>,
    /// Symbolic input name -> source URI.
    names: BTreeMap<String, String>,
    /// Source URI -> promise for the load still in flight. Entries are
    /// removed exactly when the engine reports completion.
    pending: BTreeMap<String, Promise<AssetHandle>>,
}

impl<E: MediaEngine> AssetResolver<E> {
    pub fn new(engine: E, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            engine,
            scheduler,
            names: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Issues a load for one `input` directive (`input <name> { path <p> }`)
    /// and returns the promise that settles when the engine reports back.
    pub fn load(&mut self, input: &Directive) -> ReelplanResult<Promise<AssetHandle>> {
        let name = input
            .param(0)
            .ok_or_else(|| ReelplanError::config("input directive is missing a name"))?;
        let path = input
            .prop("path")
            .ok_or_else(|| ReelplanError::config(format!("input '{name}': missing property: path")))?;

        let uri = path_to_uri(path)?;
        let promise = Promise::new(Rc::clone(&self.scheduler));

        self.names.insert(name.to_string(), uri.clone());
        self.pending.insert(uri.clone(), promise.clone());
        self.engine.create_asset(&uri)?;

        tracing::debug!(name, %uri, "asset load requested");
        Ok(promise)
    }

    /// Engine handle for a previously resolved input name.
    ///
    /// `Config` for a name never declared, `NotReady` for one whose load has
    /// not completed yet (a usage error: compile only runs after the gather).
    pub fn lookup(&self, name: &str) -> ReelplanResult<AssetHandle> {
        let uri = self
            .names
            .get(name)
            .ok_or_else(|| ReelplanError::config(format!("unknown input: '{name}'")))?;
        self.engine.get_asset(uri).ok_or(ReelplanError::NotReady)
    }

    /// Success notification from the engine.
    pub fn asset_added(&mut self, uri: &str, handle: AssetHandle) {
        tracing::info!(
            %uri,
            width = handle.video.width,
            height = handle.video.height,
            frame_rate = handle.video.frame_rate,
            video = %handle.video.format,
            audio = %handle.audio.format,
            "asset added"
        );
        let Some(promise) = self.pending.remove(uri) else {
            tracing::error!(%uri, "asset-added notification with no pending load");
            return;
        };
        if promise.resolve(handle).is_err() {
            tracing::error!(%uri, "pending load promise was already settled");
        }
    }

    /// Failure notification from the engine.
    pub fn asset_load_error(&mut self, uri: &str, message: &str) {
        let Some(promise) = self.pending.remove(uri) else {
            tracing::error!(%uri, message, "load-error notification with no pending load");
            return;
        };
        if promise
            .fail(ReelplanError::asset_load(format!("{uri}: {message}")))
            .is_err()
        {
            tracing::error!(%uri, "pending load promise was already settled");
        }
    }
}

/// Canonical `file://` identifier for a source path. Lexical only: the path
/// is absolutized against the working directory but never touched on disk.
pub fn path_to_uri(path: &str) -> ReelplanResult<String> {
    let abs = std::path::absolute(Path::new(path))
        .map_err(|e| ReelplanError::config(format!("cannot resolve path '{path}': {e}")))?;
    Ok(format!("file://{}", abs.display()))
}
