//! Single-threaded promise primitive used to coordinate asset loads.
//!
//! A [`Promise`] is a single-assignment result container: it moves from
//! pending to exactly one of resolved or failed, once. It is also
//! single-consumer: it holds at most one registered continuation, and a later
//! registration replaces the earlier one. A promise is not an event bus; when
//! several consumers need one result, compose with [`Promise::then`] or
//! [`Promise::gather`] instead of registering twice.
//!
//! Continuations are never invoked inline. Every settle and every
//! registration-after-settle goes through the [`Scheduler`] hook, so the call
//! stack stays bounded for arbitrarily long chains and a continuation always
//! observes a stable, settled promise.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::error::{ReelplanError, ReelplanResult};

/// Deferred-execution hook: "run this soon, outside the current call stack".
///
/// Supplied by the embedding single-threaded event loop; [`TaskQueue`] is the
/// crate's own implementation for the CLI and tests.
pub trait Scheduler {
    fn run_soon(&self, task: Box<dyn FnOnce()>);
}

/// FIFO task queue implementing [`Scheduler`] for single-threaded embeddings.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl TaskQueue {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Runs queued tasks, including ones they enqueue, until none remain.
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must end before the task runs; tasks enqueue more tasks.
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Scheduler for TaskQueue {
    fn run_soon(&self, task: Box<dyn FnOnce()>) {
        self.tasks.borrow_mut().push_back(task);
    }
}

enum State<T> {
    Pending,
    Resolved(T),
    Failed(ReelplanError),
}

impl<T> State<T> {
    fn is_settled(&self) -> bool {
        !matches!(self, State::Pending)
    }
}

type Continuation<T> = Box<dyn FnOnce(Promise<T>)>;

struct Shared<T> {
    scheduler: Rc<dyn Scheduler>,
    state: State<T>,
    continuation: Option<Continuation<T>>,
}

/// Single-assignment asynchronous result container.
pub struct Promise<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: Clone + 'static> Promise<T> {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                scheduler,
                state: State::Pending,
                continuation: None,
            })),
        }
    }

    /// A promise already settled with `value`.
    pub fn resolved(scheduler: Rc<dyn Scheduler>, value: T) -> Self {
        let p = Self::new(scheduler);
        let _ = p.resolve(value);
        p
    }

    /// A promise already settled with `err`.
    pub fn failed(scheduler: Rc<dyn Scheduler>, err: ReelplanError) -> Self {
        let p = Self::new(scheduler);
        let _ = p.fail(err);
        p
    }

    pub fn is_settled(&self) -> bool {
        self.shared.borrow().state.is_settled()
    }

    /// Transitions to `Resolved`. Settling an already-settled promise is a
    /// programming error and is reported as [`ReelplanError::DuplicateResolution`].
    pub fn resolve(&self, value: T) -> ReelplanResult<()> {
        self.settle(State::Resolved(value))
    }

    /// Transitions to `Failed`. Same single-assignment contract as
    /// [`Promise::resolve`].
    pub fn fail(&self, err: ReelplanError) -> ReelplanResult<()> {
        self.settle(State::Failed(err))
    }

    fn settle(&self, outcome: State<T>) -> ReelplanResult<()> {
        let fire = {
            let mut shared = self.shared.borrow_mut();
            if shared.state.is_settled() {
                return Err(ReelplanError::DuplicateResolution);
            }
            shared.state = outcome;
            shared.continuation.is_some()
        };
        if fire {
            self.schedule_fire();
        }
        Ok(())
    }

    /// The settled value. `NotReady` while pending; a clone of the stored
    /// error after a failure.
    pub fn result(&self) -> ReelplanResult<T> {
        match &self.shared.borrow().state {
            State::Pending => Err(ReelplanError::NotReady),
            State::Resolved(value) => Ok(value.clone()),
            State::Failed(err) => Err(err.clone()),
        }
    }

    /// The stored error, if the promise has failed.
    pub fn error(&self) -> Option<ReelplanError> {
        match &self.shared.borrow().state {
            State::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Registers the continuation, replacing any previous one. If the promise
    /// is already settled, the continuation is scheduled immediately (still
    /// deferred, never called inline).
    pub fn on_settled(&self, continuation: impl FnOnce(Promise<T>) + 'static) {
        let fire = {
            let mut shared = self.shared.borrow_mut();
            shared.continuation = Some(Box::new(continuation));
            shared.state.is_settled()
        };
        if fire {
            self.schedule_fire();
        }
    }

    fn schedule_fire(&self) {
        let promise = self.clone();
        let scheduler = Rc::clone(&self.shared.borrow().scheduler);
        scheduler.run_soon(Box::new(move || {
            // take() keeps a re-registered slot from firing twice for one settle.
            let continuation = promise.shared.borrow_mut().continuation.take();
            if let Some(continuation) = continuation {
                continuation(promise.clone());
            }
        }));
    }

    /// Chains a computation onto a successful result.
    ///
    /// The returned promise resolves with `f(value)` once `self` resolves;
    /// it fails with `self`'s error without invoking `f`, or with `f`'s own
    /// error if the computation fails.
    pub fn then<V, F>(&self, f: F) -> Promise<V>
    where
        V: Clone + 'static,
        F: FnOnce(T) -> ReelplanResult<V> + 'static,
    {
        let next = Promise::new(Rc::clone(&self.shared.borrow().scheduler));
        let out = next.clone();
        self.on_settled(move |settled| {
            // `next` has no other producer, so these settles cannot collide.
            let _ = match settled.result() {
                Ok(value) => match f(value) {
                    Ok(mapped) => next.resolve(mapped),
                    Err(err) => next.fail(err),
                },
                Err(err) => next.fail(err),
            };
        });
        out
    }

    /// Fans in a list of promises into one.
    ///
    /// The result resolves with every input's value in input order (not
    /// completion order) once all inputs have settled successfully. If any
    /// input fails, the result fails with the first failed entry found by
    /// re-scanning the whole list on each completion; completions arriving
    /// after the result has settled are no-ops.
    pub fn gather(scheduler: Rc<dyn Scheduler>, inputs: Vec<Promise<T>>) -> Promise<Vec<T>> {
        let result = Promise::new(Rc::clone(&scheduler));

        if inputs.is_empty() {
            let empty = result.clone();
            scheduler.run_soon(Box::new(move || {
                let _ = empty.resolve(Vec::new());
            }));
            return result;
        }

        for input in &inputs {
            let result = result.clone();
            let inputs = inputs.clone();
            input.on_settled(move |_| {
                if result.is_settled() {
                    return;
                }
                if let Some(err) = inputs.iter().find_map(Promise::error) {
                    let _ = result.fail(err);
                    return;
                }
                if inputs.iter().all(Promise::is_settled) {
                    let values: ReelplanResult<Vec<T>> =
                        inputs.iter().map(Promise::result).collect();
                    let _ = match values {
                        Ok(values) => result.resolve(values),
                        Err(err) => result.fail(err),
                    };
                }
            });
        }

        result
    }

    /// Cancellation does not exist; always reports "not cancellable".
    pub fn cancel(&self) -> bool {
        false
    }

    pub fn is_cancelled(&self) -> bool {
        false
    }
}
