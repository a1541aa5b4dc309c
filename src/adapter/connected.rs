use crate::registry::{Bindings, FieldMap, LivenessSource, Subscriber};
use crate::runtime::Binder;
use crate::store::Value;
use parking_lot::RwLock;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type RenderFn = Box<dyn Fn(&FieldMap) + Send + Sync>;

/// A component wrapper whose fields follow store keys.
///
/// `Connected` is the glue between a rendering engine and a [`Binder`]. The
/// engine calls [`on_attach`](Self::on_attach) when the component is mounted
/// and [`on_detach`](Self::on_detach) when it is removed. In between, every
/// patch the binder delivers is merged into the component's local state and
/// triggers one re-render through the `on_render` hook.
///
/// Rendered props are the owner props overlaid with the local state.
pub struct Connected {
    bindings: Bindings,
    props: FieldMap,
    state: RwLock<FieldMap>,
    live: AtomicBool,
    renders: AtomicU64,
    on_render: Option<RenderFn>,
}

impl Connected {
    /// Wrap a component bound through `bindings`. Not attached yet.
    pub fn new(bindings: Bindings) -> Arc<Self> {
        Self::builder(bindings).build()
    }

    /// Start configuring a wrapper with owner props or a render hook.
    pub fn builder(bindings: Bindings) -> ConnectedBuilder {
        ConnectedBuilder {
            bindings,
            props: FieldMap::new(),
            on_render: None,
        }
    }

    /// Mount hook: mark the component live, then register its bindings.
    ///
    /// Calling it again while attached re-sends the initial snapshot; fields
    /// already bound keep their first transform.
    pub fn on_attach(self: &Arc<Self>, binder: &Binder) {
        self.live.store(true, Ordering::SeqCst);
        binder.register(self, &self.bindings);
    }

    /// Unmount hook: mark the component stale, then prune if the binder is
    /// configured to.
    pub fn on_detach(&self, binder: &Binder) {
        self.live.store(false, Ordering::SeqCst);
        if binder.config().prune_on_detach {
            binder.prune();
        }
    }

    /// Snapshot of the bound local state.
    pub fn state(&self) -> FieldMap {
        self.state.read().clone()
    }

    /// Owner props overlaid with the bound local state.
    pub fn props(&self) -> FieldMap {
        let mut merged = self.props.clone();
        for (field, value) in self.state.read().iter() {
            merged.insert(field.clone(), value.clone());
        }
        merged
    }

    /// Current value of one rendered field; `None` if unset or absent.
    pub fn field(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.state.read().get(name) {
            return value.clone();
        }
        self.props.get(name).cloned().flatten()
    }

    /// Current value of one rendered field as a `T`.
    pub fn field_as<T: Any + Clone>(&self, name: &str) -> Option<T> {
        self.field(name)
            .and_then(|value| value.downcast_ref::<T>().cloned())
    }

    /// How many times the component re-rendered because of a patch.
    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::SeqCst)
    }

    /// The bindings this component registers on attach.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

impl LivenessSource for Connected {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Subscriber for Connected {
    fn apply_partial_state(&self, patch: FieldMap) {
        {
            let mut state = self.state.write();
            for (field, value) in patch {
                state.insert(field, value);
            }
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        if let Some(render) = &self.on_render {
            render(&self.props());
        }
    }
}

/// Builder for [`Connected`].
pub struct ConnectedBuilder {
    bindings: Bindings,
    props: FieldMap,
    on_render: Option<RenderFn>,
}

impl ConnectedBuilder {
    /// Set an owner prop. Bound fields of the same name take precedence.
    pub fn prop(mut self, name: impl Into<String>, value: Value) -> Self {
        self.props.insert(name.into(), Some(value));
        self
    }

    /// Called with the rendered props after every applied patch.
    pub fn on_render<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldMap) + Send + Sync + 'static,
    {
        self.on_render = Some(Box::new(f));
        self
    }

    /// Finish the wrapper. It starts detached.
    pub fn build(self) -> Arc<Connected> {
        Arc::new(Connected {
            bindings: self.bindings,
            props: self.props,
            state: RwLock::new(FieldMap::new()),
            live: AtomicBool::new(false),
            renders: AtomicU64::new(0),
            on_render: self.on_render,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Transform};
    use parking_lot::Mutex;

    #[test]
    fn starts_detached_and_unregistered() {
        let binder = Binder::new();
        let c = Connected::new(Bindings::new().bind("count", "count"));
        assert!(!c.is_live());
        assert_eq!(binder.registry().total_bindings(), 0);
    }

    #[test]
    fn attach_registers_and_snapshots() {
        let binder = Binder::new();
        binder.set("me.name", Value::new("Thomas".to_string()));

        let c = Connected::new(Bindings::new().bind("name", "me.name").bind("online", "me.online"));
        c.on_attach(&binder);

        assert!(c.is_live());
        assert_eq!(c.field_as::<String>("name").as_deref(), Some("Thomas"));
        assert!(c.field("online").is_none());
        assert_eq!(c.render_count(), 1);

        let state = c.state();
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["name", "online"]);
        assert!(matches!(state.get("online"), Some(None)));
        assert_eq!(c.bindings().len(), 2);
        assert_eq!(c.bindings().get("online").map(|b| b.key()), Some("me.online"));
    }

    #[test]
    fn patches_merge_over_state() {
        let binder = Binder::new();
        binder.set("me.name", Value::new("Thomas".to_string()));
        binder.set("me.online", Value::new(true));

        let c = Connected::new(Bindings::new().bind("name", "me.name").bind("online", "me.online"));
        c.on_attach(&binder);

        binder.set("me.online", Value::new(false));

        assert_eq!(c.field_as::<bool>("online"), Some(false));
        assert_eq!(c.field_as::<String>("name").as_deref(), Some("Thomas"));
        assert_eq!(c.render_count(), 2);
    }

    #[test]
    fn detach_prunes_by_default() {
        let binder = Binder::new();
        let c = Connected::new(Bindings::new().bind("count", "count"));
        c.on_attach(&binder);
        assert_eq!(binder.registry().subscriber_count("count"), 1);

        c.on_detach(&binder);
        assert_eq!(binder.registry().subscriber_count("count"), 0);
    }

    #[test]
    fn detach_without_prune_leaves_binding() {
        let binder = Binder::with_config(Config {
            prune_on_detach: false,
            ..Config::default()
        });
        let c = Connected::new(Bindings::new().bind("count", "count"));
        c.on_attach(&binder);
        c.on_detach(&binder);
        assert_eq!(binder.registry().subscriber_count("count"), 1);

        binder.set("count", Value::new(1_i64));
        assert_eq!(binder.registry().subscriber_count("count"), 0);
        assert_eq!(c.render_count(), 1);
    }

    #[test]
    fn rendered_props_prefer_state() {
        let binder = Binder::new();
        binder.set("users", Value::new(vec!["Pierre", "Paul"]));

        let rendered = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&rendered);
        let c = Connected::builder(
            Bindings::new().bind_with("count", "users", Transform::map(|v| {
                Value::new(v.downcast_ref::<Vec<&'static str>>().map_or(0, Vec::len))
            })),
        )
        .prop("idx", Value::new(0_usize))
        .prop("count", Value::new(99_usize))
        .on_render(move |props| {
            let count = props
                .get("count")
                .and_then(Option::as_ref)
                .and_then(|v| v.downcast_ref::<usize>().copied());
            sink.lock().push(count);
        })
        .build();

        assert_eq!(c.field_as::<usize>("count"), Some(99));
        c.on_attach(&binder);

        assert_eq!(c.field_as::<usize>("count"), Some(2));
        assert_eq!(c.field_as::<usize>("idx"), Some(0));
        assert_eq!(c.props().len(), 2);
        assert_eq!(*rendered.lock(), vec![Some(2)]);
    }

    #[test]
    fn duplicate_attach_is_tolerated() {
        let binder = Binder::new();
        let c = Connected::new(Bindings::new().bind("count", "count"));
        c.on_attach(&binder);
        c.on_attach(&binder);
        assert_eq!(binder.registry().subscriber_count("count"), 1);

        c.on_detach(&binder);
        c.on_detach(&binder);
        assert!(!c.is_live());
    }
}
