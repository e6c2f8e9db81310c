//! Operation spans started explicitly by handlers.
//!
//! [`OperationTracer`] is handed to handlers as part of the application state.
//! When no exporter is configured it is a no-op, so handler code never has to
//! check whether tracing is available.

use opentelemetry::{
    trace::{TraceContextExt, Tracer},
    Context, KeyValue,
};
use std::fmt;
use std::sync::Arc;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Backend that actually records spans.
pub trait SpanRecorder: Send + Sync {
    /// Start a span. With no explicit parent the span is attached to the
    /// current request span, if any.
    fn start(&self, name: &'static str, parent: Option<&Context>) -> Box<dyn RecordedSpan>;
}

/// A span opened by a [`SpanRecorder`].
pub trait RecordedSpan: Send {
    fn set_attribute(&mut self, attribute: KeyValue);
    fn end(&mut self);
    /// Context to use as the parent of nested spans.
    fn context(&self) -> Context;
}

/// Records spans through an OpenTelemetry tracer.
struct OtelRecorder<T> {
    tracer: T,
}

impl<T> SpanRecorder for OtelRecorder<T>
where
    T: Tracer + Send + Sync,
    T::Span: Send + Sync + 'static,
{
    fn start(&self, name: &'static str, parent: Option<&Context>) -> Box<dyn RecordedSpan> {
        let parent = match parent {
            Some(parent) => parent.clone(),
            None => tracing::Span::current().context(),
        };
        let span = self.tracer.start_with_context(name, &parent);
        Box::new(OtelSpan {
            cx: parent.with_span(span),
        })
    }
}

struct OtelSpan {
    cx: Context,
}

impl RecordedSpan for OtelSpan {
    fn set_attribute(&mut self, attribute: KeyValue) {
        self.cx.span().set_attribute(attribute);
    }

    fn end(&mut self) {
        self.cx.span().end();
    }

    fn context(&self) -> Context {
        self.cx.clone()
    }
}

/// Injected tracing capability for instrumented operations
#[derive(Clone, Default)]
pub struct OperationTracer {
    recorder: Option<Arc<dyn SpanRecorder>>,
}

impl OperationTracer {
    /// Tracer whose spans record nothing.
    pub fn noop() -> Self {
        Self::default()
    }

    /// Tracer backed by an OpenTelemetry tracer, typically the one returned
    /// by [`crate::observability::init_observability`].
    pub fn otel<T>(tracer: T) -> Self
    where
        T: Tracer + Send + Sync + 'static,
        T::Span: Send + Sync + 'static,
    {
        Self::with_recorder(Arc::new(OtelRecorder { tracer }))
    }

    pub fn with_recorder(recorder: Arc<dyn SpanRecorder>) -> Self {
        Self {
            recorder: Some(recorder),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.recorder.is_some()
    }

    /// Start a span named `name`. The span is closed by [`OperationSpan::end`]
    /// or, failing that, when it is dropped.
    pub fn start(&self, name: &'static str) -> OperationSpan {
        self.start_with_parent(name, None)
    }

    fn start_with_parent(&self, name: &'static str, parent: Option<&Context>) -> OperationSpan {
        OperationSpan {
            name,
            tracer: self.clone(),
            inner: self
                .recorder
                .as_ref()
                .map(|recorder| recorder.start(name, parent)),
            ended: false,
        }
    }
}

impl fmt::Debug for OperationTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationTracer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// An open operation span. Closed exactly once, on every exit path.
pub struct OperationSpan {
    name: &'static str,
    tracer: OperationTracer,
    inner: Option<Box<dyn RecordedSpan>>,
    ended: bool,
}

impl OperationSpan {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Attach an attribute. Ignored once the span has ended.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        if self.ended {
            return;
        }
        if let Some(inner) = self.inner.as_mut() {
            inner.set_attribute(attribute);
        }
    }

    /// Start a span nested under this one.
    pub fn child(&self, name: &'static str) -> OperationSpan {
        let parent = self.inner.as_ref().map(|inner| inner.context());
        self.tracer.start_with_parent(name, parent.as_ref())
    }

    pub fn end(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        if let Some(inner) = self.inner.as_mut() {
            inner.end();
        }
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        self.close();
    }
}
