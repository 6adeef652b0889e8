use autodelegate_macros::inherit_missing;

pub trait Counter {
    fn count(&self) -> u64;
    fn increment(&mut self);
    fn describe(&self) -> String {
        format!("count = {}", self.count())
    }
}

pub struct Base {
    value: u64,
}

impl Counter for Base {
    fn count(&self) -> u64 {
        self.value
    }

    fn increment(&mut self) {
        self.value += 1;
    }

    fn describe(&self) -> String {
        format!("base = {}", self.value)
    }
}

pub struct Audited {
    base: Base,
    calls: u32,
}

inherit_missing! {
    impl Counter for Audited {
        fn increment(&mut self) {
            self.calls += 1;
            self.base.increment();
        }
    }
    {
        fn count(&self) -> u64 {
            Counter::count(&self.base)
        }
        fn increment(&mut self) {
            Counter::increment(&mut self.base);
        }
        fn describe(&self) -> String {
            Counter::describe(&self.base)
        }
    }
}

fn main() {
    let mut audited = Audited {
        base: Base { value: 0 },
        calls: 0,
    };
    audited.increment();
    audited.increment();

    assert_eq!(audited.count(), 2);
    assert_eq!(audited.calls, 2);
    assert_eq!(audited.describe(), "base = 2");
}
