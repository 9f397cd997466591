//! Scene resolution: turns a scene descriptor into a render-ready scene graph.

use crate::scene::context::{Phase, RenderContext};
use crate::scene::graph::SceneGraph;
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Built-in builder without parameters.
pub type InitScene = Arc<dyn Fn(&mut SceneGraph) + Send + Sync>;
/// Built-in builder taking the free-form text parameter.
pub type InitSceneParam = Arc<dyn Fn(&mut SceneGraph, &str) + Send + Sync>;

/// Where external scene-builder code comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalSource {
    Path(PathBuf),
    Text(String),
}

/// How a named scene is produced.
#[derive(Clone)]
pub enum SceneDescriptor {
    Builtin(InitScene),
    BuiltinWithParam(InitSceneParam),
    External(ExternalSource),
}

impl SceneDescriptor {
    pub fn builtin<F>(f: F) -> Self
    where
        F: Fn(&mut SceneGraph) + Send + Sync + 'static,
    {
        Self::Builtin(Arc::new(f))
    }

    pub fn builtin_with_param<F>(f: F) -> Self
    where
        F: Fn(&mut SceneGraph, &str) + Send + Sync + 'static,
    {
        Self::BuiltinWithParam(Arc::new(f))
    }

    pub fn script_file<P: Into<PathBuf>>(path: P) -> Self {
        Self::External(ExternalSource::Path(path.into()))
    }
}

impl fmt::Debug for SceneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneDescriptor::Builtin(_) => f.write_str("Builtin"),
            SceneDescriptor::BuiltinWithParam(_) => f.write_str("BuiltinWithParam"),
            SceneDescriptor::External(src) => f.debug_tuple("External").field(src).finish(),
        }
    }
}

/// Receives human-readable progress strings. Failures inside the sink are its own business.
pub trait MessageSink {
    fn message(&self, msg: &str);
}

impl<F: Fn(&str)> MessageSink for F {
    fn message(&self, msg: &str) {
        self(msg)
    }
}

/// Forwards progress messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn message(&self, msg: &str) {
        info!("{}", msg);
    }
}

/// Cooperative cancellation flag shared with a running builder.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Errors out once cancellation was requested; builders call this between steps.
    pub fn check(&self) -> anyhow::Result<()> {
        if self.is_cancelled() {
            anyhow::bail!("scene build cancelled");
        }
        Ok(())
    }
}

/// Everything an external builder can see and change.
#[derive(Debug)]
pub struct ScriptGlobals {
    pub scene_name: String,
    pub scene: SceneGraph,
    pub param: String,
    /// The context without its scene; the scene travels in `scene`.
    pub context: RenderContext,
}

/// A compiled piece of external scene-builder code.
pub trait ExternalBuilder: Send {
    fn run(&self, globals: &mut ScriptGlobals, cancel: &CancelToken) -> anyhow::Result<()>;
}

/// Turns external source text into a runnable builder.
pub trait ScriptEngine: Send + Sync {
    fn compile(&self, source: &str) -> anyhow::Result<Box<dyn ExternalBuilder>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The script source could not be read.
    ResourceAccess,
    /// Compiling or running the script failed.
    Builder,
    /// The builder did not finish in time and was cancelled.
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ResolveFailure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FailureKind::ResourceAccess => "cannot read scene script",
            FailureKind::Builder => "scene script failed",
            FailureKind::Timeout => "scene script timed out",
        };
        write!(f, "{}: {}", kind, self.message)
    }
}

impl std::error::Error for ResolveFailure {}

/// What a resolution did. The scene is Ready after every variant except `Probed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// A built-in function built the scene.
    Builtin,
    /// External code ran its build pass.
    Script,
    /// External code ran its metadata pass; the scene is untouched.
    Probed,
    /// The external source was empty; the default builder ran.
    Default,
    /// External code failed; the default builder ran instead.
    Fallback(ResolveFailure),
}

impl ResolveOutcome {
    pub fn failure(&self) -> Option<&ResolveFailure> {
        match self {
            ResolveOutcome::Fallback(f) => Some(f),
            _ => None,
        }
    }
}

/// Drives scene builders against a shared [`RenderContext`].
///
/// External builders work on a staged copy of the context; their changes
/// are committed only if they finish successfully within the time box.
pub struct SceneResolver {
    engine: Arc<dyn ScriptEngine>,
    sink: Box<dyn MessageSink>,
    timeout: Option<Duration>,
    runs: usize,
}

impl SceneResolver {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(engine: Arc<dyn ScriptEngine>) -> Self {
        Self {
            engine,
            sink: Box::new(LogSink),
            timeout: Some(Self::DEFAULT_TIMEOUT),
            runs: 0,
        }
    }

    pub fn with_sink<S: MessageSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// `None` waits for external builders indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of builder invocations so far.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Populates `ctx.scene` (reusing the instance already in the context) from `descriptor`.
    ///
    /// Never fails: builder errors are reported to the sink and masked by
    /// `default_builder`. Unless the outcome is `Probed`, the scene is Ready
    /// on return provided `default_builder` publishes a background.
    pub fn resolve(
        &mut self,
        ctx: &mut RenderContext,
        name: &str,
        descriptor: &SceneDescriptor,
        param: &str,
        default_builder: &dyn Fn(&mut SceneGraph),
    ) -> ResolveOutcome {
        match descriptor {
            SceneDescriptor::Builtin(build) => {
                self.run_builtin(ctx, name, default_builder, |scene| build(scene))
            }
            SceneDescriptor::BuiltinWithParam(build) => {
                self.run_builtin(ctx, name, default_builder, |scene| build(scene, param))
            }
            SceneDescriptor::External(source) => {
                let text = match load_source(source) {
                    Ok(text) => text,
                    Err(failure) => return self.fall_back(ctx, name, default_builder, failure),
                };

                if text.trim().is_empty() {
                    self.run_default(ctx, name, default_builder);
                    return ResolveOutcome::Default;
                }

                let probing = ctx.phase() == Phase::Probing;
                self.runs += 1;
                self.sink.message(&format!(
                    "Compiling and running scene script '{}' ({})..",
                    name, self.runs
                ));

                match self.run_external(ctx, name, text, param) {
                    Ok(()) if probing => {
                        self.sink.message(&format!("Script '{}' published its metadata.", name));
                        ResolveOutcome::Probed
                    }
                    Ok(()) => {
                        self.sink.message(&format!("Script '{}' finished ok, rendering..", name));
                        self.ensure_ready(ctx, name, default_builder);
                        ResolveOutcome::Script
                    }
                    Err(failure) => self.fall_back(ctx, name, default_builder, failure),
                }
            }
        }
    }

    fn run_builtin(
        &mut self,
        ctx: &mut RenderContext,
        name: &str,
        default_builder: &dyn Fn(&mut SceneGraph),
        build: impl FnOnce(&mut SceneGraph),
    ) -> ResolveOutcome {
        self.runs += 1;
        self.sink
            .message(&format!("Building scene '{}' ({})..", name, self.runs));
        build(&mut ctx.scene);
        self.ensure_ready(ctx, name, default_builder);
        self.sink.message(&format!("Rendering '{}' ({})..", name, self.runs));
        ResolveOutcome::Builtin
    }

    /// Runs the external builder on a worker thread against a staged context.
    fn run_external(
        &self,
        ctx: &mut RenderContext,
        name: &str,
        source: String,
        param: &str,
    ) -> Result<(), ResolveFailure> {
        let mut staged = ctx.clone();
        let scene = std::mem::take(&mut staged.scene);
        let mut globals = ScriptGlobals {
            scene_name: name.to_string(),
            scene,
            param: param.to_string(),
            context: staged,
        };

        let engine = Arc::clone(&self.engine);
        let cancel = CancelToken::default();
        let worker_cancel = cancel.clone();
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name(format!("scene-builder:{}", name))
            .spawn(move || {
                let result = engine
                    .compile(&source)
                    .and_then(|builder| builder.run(&mut globals, &worker_cancel));
                // The resolver may have stopped waiting; nothing to do then.
                let _ = tx.send(result.map(|()| globals));
            })
            .map_err(|e| ResolveFailure::new(FailureKind::Builder, e.to_string()))?;

        let received = match self.timeout {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(globals)) => {
                let ScriptGlobals {
                    scene, mut context, ..
                } = globals;
                context.scene = scene;
                *ctx = context;
                debug!("Committed staged context of '{}'", name);
                Ok(())
            }
            Ok(Err(e)) => Err(ResolveFailure::new(FailureKind::Builder, format!("{:#}", e))),
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                Err(ResolveFailure::new(
                    FailureKind::Timeout,
                    format!("no result after {:?}", self.timeout.unwrap_or_default()),
                ))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ResolveFailure::new(
                FailureKind::Builder,
                "builder thread terminated without a result",
            )),
        }
    }

    fn fall_back(
        &mut self,
        ctx: &mut RenderContext,
        name: &str,
        default_builder: &dyn Fn(&mut SceneGraph),
        failure: ResolveFailure,
    ) -> ResolveOutcome {
        warn!("Scene '{}': {}", name, failure);
        self.sink
            .message(&format!("Error in scene '{}': {}", name, failure));
        self.run_default(ctx, name, default_builder);
        ResolveOutcome::Fallback(failure)
    }

    /// Runs the default builder with the usual progress notices around it.
    fn run_default(
        &self,
        ctx: &mut RenderContext,
        name: &str,
        default_builder: &dyn Fn(&mut SceneGraph),
    ) {
        self.sink.message("Using default scene..");
        default_builder(&mut ctx.scene);
        self.sink.message(&format!("Rendering '{}' ({})..", name, self.runs));
    }

    /// Builders that return without publishing a background are replaced by the default.
    fn ensure_ready(
        &self,
        ctx: &mut RenderContext,
        name: &str,
        default_builder: &dyn Fn(&mut SceneGraph),
    ) {
        if !ctx.scene.is_ready() {
            warn!("Scene '{}' was not published by its builder", name);
            self.run_default(ctx, name, default_builder);
        }
    }
}

fn load_source(source: &ExternalSource) -> Result<String, ResolveFailure> {
    match source {
        ExternalSource::Text(text) => Ok(text.clone()),
        ExternalSource::Path(path) => fs::read_to_string(path).map_err(|e| {
            ResolveFailure::new(
                FailureKind::ResourceAccess,
                format!("'{}': {}", path.display(), e),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::library::default_scene;
    use nalgebra::Vector3;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Engine whose builders do whatever the closure says.
    #[derive(Clone)]
    struct FnEngine<F>(F);

    struct FnBuilder<F>(F);

    impl<F> ExternalBuilder for FnBuilder<F>
    where
        F: Fn(&mut ScriptGlobals, &CancelToken) -> anyhow::Result<()> + Send,
    {
        fn run(&self, globals: &mut ScriptGlobals, cancel: &CancelToken) -> anyhow::Result<()> {
            (self.0)(globals, cancel)
        }
    }

    impl<F> ScriptEngine for FnEngine<F>
    where
        F: Fn(&mut ScriptGlobals, &CancelToken) -> anyhow::Result<()> + Clone + Send + Sync + 'static,
    {
        fn compile(&self, _source: &str) -> anyhow::Result<Box<dyn ExternalBuilder>> {
            Ok(Box::new(FnBuilder(self.0.clone())))
        }
    }

    fn script() -> SceneDescriptor {
        SceneDescriptor::External(ExternalSource::Text("anything".to_string()))
    }

    #[test]
    fn failed_script_is_rolled_back_before_fallback() {
        let engine = FnEngine(|g: &mut ScriptGlobals, _: &CancelToken| -> anyhow::Result<()> {
            g.context.tooltip = Some("half-done".to_string());
            g.scene.add_inner(Default::default());
            anyhow::bail!("boom")
        });
        let mut resolver = SceneResolver::new(Arc::new(engine));
        let mut ctx = RenderContext::new();
        ctx.tooltip = Some(String::new());

        let outcome = resolver.resolve(&mut ctx, "broken", &script(), "", &default_scene);

        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Builder);
        assert!(failure.message.contains("boom"));
        assert_eq!(ctx.tooltip.as_deref(), Some(""));
        assert!(ctx.scene.is_ready());
        // Only the default scene's nodes, nothing from the failed run.
        let mut reference = SceneGraph::new();
        default_scene(&mut reference);
        assert_eq!(ctx.scene.node_count(), reference.node_count());
    }

    #[test]
    fn slow_script_times_out_and_is_cancelled() {
        let engine = FnEngine(|_: &mut ScriptGlobals, cancel: &CancelToken| -> anyhow::Result<()> {
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            cancel.check()
        });
        let mut resolver =
            SceneResolver::new(Arc::new(engine)).with_timeout(Some(Duration::from_millis(50)));
        let mut ctx = RenderContext::new();
        ctx.tooltip = Some(String::new());

        let outcome = resolver.resolve(&mut ctx, "slow", &script(), "", &default_scene);

        assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::Timeout));
        assert!(ctx.scene.is_ready());
    }

    #[test]
    fn empty_source_uses_default_builder() {
        let engine = FnEngine(|_: &mut ScriptGlobals, _: &CancelToken| -> anyhow::Result<()> {
            anyhow::bail!("not called")
        });
        let mut resolver = SceneResolver::new(Arc::new(engine));
        let mut ctx = RenderContext::new();
        let empty = SceneDescriptor::External(ExternalSource::Text("  \n".to_string()));

        assert_eq!(
            resolver.resolve(&mut ctx, "empty", &empty, "", &default_scene),
            ResolveOutcome::Default
        );
        assert!(ctx.scene.is_ready());
    }

    #[test]
    fn builtin_reports_progress_around_invocation() {
        let log = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink_log = Rc::clone(&log);
        let engine = FnEngine(|_: &mut ScriptGlobals, _: &CancelToken| -> anyhow::Result<()> { Ok(()) });
        let mut resolver = SceneResolver::new(Arc::new(engine))
            .with_sink(move |m: &str| sink_log.borrow_mut().push(m.to_string()));
        let mut ctx = RenderContext::new();

        let outcome = resolver.resolve(
            &mut ctx,
            "plain",
            &SceneDescriptor::builtin(default_scene),
            "",
            &default_scene,
        );

        assert_eq!(outcome, ResolveOutcome::Builtin);
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert!(log[0].contains("plain") && log[1].starts_with("Rendering"));
    }

    #[test]
    fn default_builder_is_bracketed_by_progress_on_every_fallback() {
        let broken = FnEngine(|_: &mut ScriptGlobals, _: &CancelToken| -> anyhow::Result<()> {
            anyhow::bail!("boom")
        });
        let cases = [
            SceneDescriptor::script_file("no/such/scene.toml"),
            SceneDescriptor::External(ExternalSource::Text(" ".to_string())),
            script(),
        ];

        for descriptor in &cases {
            let log = Rc::new(RefCell::new(Vec::<String>::new()));
            let sink_log = Rc::clone(&log);
            let mut resolver = SceneResolver::new(Arc::new(broken.clone()))
                .with_sink(move |m: &str| sink_log.borrow_mut().push(m.to_string()));
            let mut ctx = RenderContext::new();
            ctx.tooltip = Some(String::new());

            resolver.resolve(&mut ctx, "x", descriptor, "", &default_scene);

            let log = log.borrow();
            let before = log.iter().position(|m| m == "Using default scene..");
            assert!(before.is_some(), "{:?}: {:?}", descriptor, log);
            assert!(log.last().unwrap().starts_with("Rendering 'x'"), "{:?}: {:?}", descriptor, log);
            assert!(before.unwrap() < log.len() - 1);
            assert!(ctx.scene.is_ready());
        }
    }

    #[test]
    fn builtin_that_forgets_background_is_replaced() {
        let engine = FnEngine(|_: &mut ScriptGlobals, _: &CancelToken| -> anyhow::Result<()> { Ok(()) });
        let mut resolver = SceneResolver::new(Arc::new(engine));
        let mut ctx = RenderContext::new();
        let lazy = SceneDescriptor::builtin(|_: &mut SceneGraph| {});

        resolver.resolve(&mut ctx, "lazy", &lazy, "", &default_scene);

        assert_eq!(ctx.scene.background, Some(Vector3::new(0.1, 0.2, 0.3)));
    }
}
