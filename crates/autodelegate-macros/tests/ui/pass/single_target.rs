use autodelegate_macros::auto_delegate;

pub trait Named {
    fn name(&self) -> String;
}

#[auto_delegate(value = "Named", field = "inner")]
pub struct Tag;

impl Named for Tag {
    fn name(&self) -> String {
        "tag".to_string()
    }
}

fn main() {
    assert_eq!(Tag.name(), "tag");
}
