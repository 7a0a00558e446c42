#![forbid(unsafe_code)]

pub mod asset;
pub mod compile;
pub mod error;
pub mod future;
pub mod pipeline;
pub mod profile;
pub mod script;
pub mod time;

pub use asset::{AssetHandle, AssetResolver, AudioStream, MediaEngine, VideoStream};
pub use compile::{ClipPlacement, EffectDescriptor, TimelinePlan, Track, compile};
pub use error::{ReelplanError, ReelplanResult};
pub use future::{Promise, Scheduler, TaskQueue};
pub use pipeline::compile_script;
pub use profile::Profile;
pub use script::{Directive, Script};
pub use time::Millis;
