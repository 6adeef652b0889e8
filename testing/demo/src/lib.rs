//! End-to-end fixtures: declarations here go through the build script and
//! the generated bases are included back into the same modules.

use autodelegate::prelude::*;
use std::collections::BTreeMap;

// above the `_impl!` invocations; macro_rules scoping is textual
include_delegates!();

///
/// Named
///

pub trait Named {
    fn name(&self) -> String;
}

///
/// Counter
///

pub trait Counter: Named {
    fn count(&self) -> u32;

    fn increment(&mut self);

    fn describe(&self) -> String {
        format!("{} at {}", self.name(), self.count())
    }
}

///
/// Store
///

pub trait Store<V> {
    fn get(&self, key: &str) -> Option<&V>;

    fn put(&mut self, key: &str, value: V) -> Option<V>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

///
/// SimpleCounter
///

#[derive(Debug, Default)]
pub struct SimpleCounter {
    pub label: String,
    pub value: u32,
}

impl Named for SimpleCounter {
    fn name(&self) -> String {
        self.label.clone()
    }
}

impl Counter for SimpleCounter {
    fn count(&self) -> u32 {
        self.value
    }

    fn increment(&mut self) {
        self.value += 1;
    }

    fn describe(&self) -> String {
        format!("simple {} = {}", self.label, self.value)
    }
}

///
/// MapStore
///

#[derive(Debug)]
pub struct MapStore<V> {
    pub label: String,
    pub entries: BTreeMap<String, V>,
}

impl<V> MapStore<V> {
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            entries: BTreeMap::new(),
        }
    }
}

impl<V> Named for MapStore<V> {
    fn name(&self) -> String {
        self.label.clone()
    }
}

impl<V> Store<V> for MapStore<V> {
    fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    fn put(&mut self, key: &str, value: V) -> Option<V> {
        self.entries.insert(key.to_string(), value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

///
/// AuditedCounter
///
/// Forwards everything to the wrapped counter except `increment`, which
/// also records how often it was called, and `name`.
///

#[auto_delegate(value = "Counter", field = "inner")]
pub struct AuditedCounter {
    base: AutoDelegate_AuditedCounter,
    increments: u32,
}

impl AuditedCounter {
    #[must_use]
    pub fn new(inner: impl Counter + 'static) -> Self {
        Self {
            base: AutoDelegate_AuditedCounter::new(Box::new(inner)),
            increments: 0,
        }
    }

    #[must_use]
    pub const fn increments(&self) -> u32 {
        self.increments
    }
}

AutoDelegate_AuditedCounter_impl! {
    impl Named for AuditedCounter via base {
        fn name(&self) -> String {
            format!("audited {}", self.base.name())
        }
    }
}

AutoDelegate_AuditedCounter_impl! {
    impl Counter for AuditedCounter via base {
        fn increment(&mut self) {
            self.increments += 1;
            self.base.increment();
        }
    }
}

///
/// NamedStore
///
/// Store first, so the store lands in `target0` and the name in `target1`.
///

#[auto_delegate(to(Named, "Store<V>"))]
pub struct NamedStore<V> {
    base: AutoDelegate_NamedStore<V>,
}

impl<V> NamedStore<V> {
    #[must_use]
    pub fn new(store: impl Store<V> + 'static, name: impl Named + 'static) -> Self {
        Self {
            base: AutoDelegate_NamedStore::new(Box::new(store), Box::new(name)),
        }
    }
}

AutoDelegate_NamedStore_impl! {
    impl Store<V> for NamedStore<V> via base {}
}

AutoDelegate_NamedStore_impl! {
    impl Named for NamedStore<V> via base {
        fn name(&self) -> String {
            self.base.name().to_uppercase()
        }
    }
}

///
/// greeting
///

pub mod greeting {
    use autodelegate::prelude::*;

    include_delegates!("greeting");

    pub trait Greeter {
        fn greet(&self, who: &str) -> String;
    }

    pub struct English;

    impl Greeter for English {
        fn greet(&self, who: &str) -> String {
            format!("hello {who}")
        }
    }

    #[auto_delegate(value = Greeter)]
    pub struct Polite {
        base: AutoDelegate_Polite,
    }

    impl Polite {
        #[must_use]
        pub fn new(inner: impl Greeter + 'static) -> Self {
            Self {
                base: AutoDelegate_Polite::new(Box::new(inner)),
            }
        }
    }

    AutoDelegate_Polite_impl! {
        impl Greeter for Polite via base {
            fn greet(&self, who: &str) -> String {
                format!("{}, please", self.base.greet(who))
            }
        }
    }
}

///
/// TESTS
///
