//! Forwarding base types for trait delegation.
//!
//! Mark a struct with `#[auto_delegate(...)]`, call
//! `autodelegate_build::build!("src/lib.rs")` from the build script, and
//! pull the generated `AutoDelegate_<Name>` types into each module with
//! [`include_delegates!`].
//!
//! Each generated type comes with an `AutoDelegate_<Name>_impl!` macro. It
//! writes `impl Trait for Name` with every operation you leave out forwarded
//! to the named field. The macro is textually scoped, so `include_delegates!`
//! goes above its first use.
//!
//! ```ignore
//! autodelegate::include_delegates!();
//!
//! pub trait Named {
//!     fn name(&self) -> String;
//!     fn shout(&self) -> String;
//! }
//!
//! #[auto_delegate(value = "Named", field = "inner")]
//! pub struct Tag {
//!     base: AutoDelegate_Tag,
//! }
//!
//! AutoDelegate_Tag_impl! {
//!     impl Named for Tag via base {
//!         fn name(&self) -> String {
//!             format!("tag:{}", self.base.name())
//!         }
//!     }
//! }
//! ```

pub use autodelegate_core::{
    DEFAULT_FIELD_BASE, DEFAULT_PREFIX, DelegationMetadata, DelegationTargetDescriptor, Error,
    Report,
};
pub use autodelegate_macros::auto_delegate;

#[doc(hidden)]
pub use autodelegate_macros::inherit_missing;

///
/// include_delegates
///
/// With no arguments, includes the types generated for the crate root.
/// With a module path such as `"shapes/round"`, includes the types
/// generated for `crate::shapes::round`.
///

#[macro_export]
macro_rules! include_delegates {
    () => {
        include!(concat!(env!("OUT_DIR"), "/autodelegate/crate.rs"));
    };
    ($namespace:literal) => {
        include!(concat!(env!("OUT_DIR"), "/autodelegate/", $namespace, ".rs"));
    };
}

pub mod prelude {
    pub use crate::{auto_delegate, include_delegates};
}
