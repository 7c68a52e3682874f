// Binding planner and record binder.

pub mod binder;
pub mod descriptor;
pub mod template;

pub use binder::{bind_row, BindResult};
pub use descriptor::{MemberDescriptor, ScalarType, ScalarValue, TypeDescriptor};
pub use template::{cached, plan, resolve_header, BindingTemplate, MemberBinding, ResolvedBinding};
