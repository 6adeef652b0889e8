use autodelegate_macros::auto_delegate;

pub trait Named {
    fn name(&self) -> String;
}

pub trait Store<V> {
    fn get(&self, key: &str) -> Option<&V>;
}

#[auto_delegate(to(Named, "Store<V>"))]
pub struct Shelf<V> {
    items: Vec<(String, V)>,
}

impl<V> Store<V> for Shelf<V> {
    fn get(&self, key: &str) -> Option<&V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<V> Named for Shelf<V> {
    fn name(&self) -> String {
        "shelf".to_string()
    }
}

fn main() {
    let shelf = Shelf {
        items: vec![("a".to_string(), 1)],
    };

    assert_eq!(shelf.get("a"), Some(&1));
    assert_eq!(shelf.name(), "shelf");
}
