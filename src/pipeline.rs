//! End-to-end orchestration: issue every asset load, gather the completions,
//! then compile the timeline plan.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use crate::{
    asset::{AssetResolver, MediaEngine},
    compile::{TimelinePlan, compile},
    error::ReelplanError,
    future::{Promise, Scheduler},
    profile::Profile,
    script::Script,
};

/// Compiles `script` into a [`TimelinePlan`] promise.
///
/// Stage one issues one load per `input` directive through `resolver` and
/// fans the promises in with [`Promise::gather`]; stage two runs the
/// synchronous compiler over the resolved handles. The embedding keeps the
/// resolver to route engine notifications into it while loads are in flight.
/// Any error while issuing loads fails the returned promise immediately.
pub fn compile_script<E: MediaEngine + 'static>(
    scheduler: Rc<dyn Scheduler>,
    resolver: &Rc<RefCell<AssetResolver<E>>>,
    script: Rc<Script>,
) -> Promise<TimelinePlan> {
    let profile = match Profile::from_output(script.first("output")) {
        Ok(profile) => profile,
        Err(err) => return Promise::failed(scheduler, err),
    };

    let mut names = Vec::new();
    let mut loads = Vec::new();
    for input in script.all("input") {
        let Some(name) = input.param(0) else {
            return Promise::failed(
                scheduler,
                ReelplanError::config("input directive is missing a name"),
            );
        };
        match resolver.borrow_mut().load(input) {
            Ok(promise) => {
                names.push(name.to_string());
                loads.push(promise);
            }
            Err(err) => return Promise::failed(scheduler, err),
        }
    }

    Promise::gather(scheduler, loads).then(move |handles| {
        let assets: BTreeMap<_, _> = names.into_iter().zip(handles).collect();
        compile(&profile, &assets, &script)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        asset::{AssetHandle, AudioStream, VideoStream},
        error::ReelplanResult,
        future::TaskQueue,
        script::Directive,
        time::Millis,
    };

    /// Remembers requested URIs so tests can deliver completions.
    #[derive(Default)]
    struct QueuedEngine {
        requested: Vec<String>,
    }

    impl MediaEngine for QueuedEngine {
        fn create_asset(&mut self, uri: &str) -> ReelplanResult<()> {
            self.requested.push(uri.to_string());
            Ok(())
        }

        fn get_asset(&self, _uri: &str) -> Option<AssetHandle> {
            None
        }
    }

    fn handle(uri: &str) -> AssetHandle {
        AssetHandle {
            uri: uri.to_string(),
            video: VideoStream {
                width: 1920,
                height: 1080,
                frame_rate: 30,
                format: "video/x-vp9".to_string(),
            },
            audio: AudioStream {
                format: "audio/x-opus".to_string(),
            },
        }
    }

    fn script() -> Script {
        Script::new(vec![
            Directive::new("input")
                .param_value("a")
                .prop_value("path", "/media/a.webm"),
            Directive::new("input")
                .param_value("b")
                .prop_value("path", "/media/b.webm"),
            Directive::new("track")
                .child(Directive::new("clip").prop_value("input", "a"))
                .child(Directive::new("clip").prop_value("input", "b")),
        ])
    }

    #[test]
    fn plan_promise_resolves_after_all_loads_complete() {
        let queue = TaskQueue::new();
        let resolver = Rc::new(RefCell::new(AssetResolver::new(
            QueuedEngine::default(),
            queue.clone(),
        )));

        let plan = compile_script(queue.clone(), &resolver, Rc::new(script()));
        queue.run_until_idle();
        assert!(!plan.is_settled());

        let requested = resolver.borrow().engine().requested.clone();
        assert_eq!(requested, ["file:///media/a.webm", "file:///media/b.webm"]);

        // Completion order is the engine's business; reversed here.
        for uri in requested.iter().rev() {
            resolver.borrow_mut().asset_added(uri, handle(uri));
        }
        queue.run_until_idle();

        let plan = plan.result().unwrap();
        assert_eq!(plan.tracks.len(), 1);
        let starts: Vec<_> = plan.tracks[0].placements.iter().map(|p| p.start).collect();
        assert_eq!(starts, [Millis(0), Millis(2_000)]);
        assert_eq!(plan.tracks[0].placements[0].asset, "file:///media/a.webm");
    }

    #[test]
    fn one_failed_load_fails_the_plan() {
        let queue = TaskQueue::new();
        let resolver = Rc::new(RefCell::new(AssetResolver::new(
            QueuedEngine::default(),
            queue.clone(),
        )));

        let plan = compile_script(queue.clone(), &resolver, Rc::new(script()));
        resolver
            .borrow_mut()
            .asset_added("file:///media/a.webm", handle("file:///media/a.webm"));
        resolver
            .borrow_mut()
            .asset_load_error("file:///media/b.webm", "no such file");
        queue.run_until_idle();

        assert!(matches!(plan.result(), Err(ReelplanError::AssetLoad(_))));
    }

    #[test]
    fn load_issue_error_fails_the_plan_immediately() {
        let queue = TaskQueue::new();
        let resolver = Rc::new(RefCell::new(AssetResolver::new(
            QueuedEngine::default(),
            queue.clone(),
        )));
        let bad = Script::new(vec![Directive::new("input").param_value("a")]);

        let plan = compile_script(queue.clone(), &resolver, Rc::new(bad));
        assert!(matches!(plan.result(), Err(ReelplanError::Config(_))));
    }

    #[test]
    fn script_without_inputs_compiles_an_empty_plan() {
        let queue = TaskQueue::new();
        let resolver = Rc::new(RefCell::new(AssetResolver::new(
            QueuedEngine::default(),
            queue.clone(),
        )));
        let empty = Script::new(vec![Directive::new("track")]);

        let plan = compile_script(queue.clone(), &resolver, Rc::new(empty));
        queue.run_until_idle();
        let plan = plan.result().unwrap();
        assert_eq!(plan.tracks.len(), 1);
        assert!(plan.tracks[0].placements.is_empty());
    }
}
