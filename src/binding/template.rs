// Binding templates, the planner, and the process-wide template cache.
// The cache is the one piece of shared mutable state this crate owns: a
// `DashMap<TypeId, ...>` with benign single-writer-wins races.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell_like_static::TemplateCache;

use crate::dialect::Strictness;
use crate::error::Error;
use crate::header::HeaderIndex;

use super::descriptor::{MemberDescriptor, TypeDescriptor};

/// One member's resolved binding plan: everything `bind_row` needs,
/// independent of any particular row.
pub struct MemberBinding<T> {
    pub name: String,
    pub scalar_type: super::descriptor::ScalarType,
    pub header_name: String,
    pub declared_column_index: Option<usize>,
    pub setter: Arc<dyn Fn(&mut T, super::descriptor::ScalarValue) + Send + Sync>,
}

/// An immutable, cached plan for binding rows of one dialect stream onto
/// `T`. Exactly one binding per target member. At most one binding per
/// column ordinal is not enforced here, so multiple members may resolve
/// to the same column.
pub struct BindingTemplate<T> {
    pub bindings: Vec<MemberBinding<T>>,
}

/// `plan`: collect one candidate binding per writable member, defaulting
/// `header_name` to the member name. Declared `column_index` is carried
/// through unresolved; resolution against an actual header row happens
/// per-stream in `resolve_header`, since the same cached template serves
/// streams with differently-ordered headers.
pub fn plan<T: 'static>(descriptor: TypeDescriptor<T>) -> Arc<BindingTemplate<T>> {
    let bindings = descriptor
        .members
        .into_iter()
        .map(|m: MemberDescriptor<T>| MemberBinding {
            header_name: m.header_name.clone().unwrap_or_else(|| m.name.clone()),
            name: m.name,
            scalar_type: m.scalar_type,
            declared_column_index: m.column_index,
            setter: m.setter,
        })
        .collect();
    let template = Arc::new(BindingTemplate { bindings });
    TemplateCache::global().insert::<T>(Arc::clone(&template));
    template
}

/// Fetch the cached template for `T` if `plan` has already built one in
/// this process, avoiding rebuilding the descriptor on every session.
pub fn cached<T: 'static>() -> Option<Arc<BindingTemplate<T>>> {
    TemplateCache::global().get::<T>()
}

/// A binding resolved against one stream's header row (or lack thereof):
/// which column ordinal (if any) feeds this member.
pub struct ResolvedBinding<'t, T> {
    pub member: &'t MemberBinding<T>,
    pub column: Option<usize>,
}

/// Header binding: resolve each member's column ordinal against
/// `header_index` (or against declared `column_index` alone, when there
/// is no header row). Unresolved members raise `UnmappedMember` in strict
/// mode, or are silently dropped (left unresolved, then skipped by the
/// binder) in lenient mode.
pub fn resolve_header<'t, T>(
    template: &'t BindingTemplate<T>,
    header_index: Option<&HeaderIndex>,
    strictness: Strictness,
) -> Result<Vec<ResolvedBinding<'t, T>>, Error> {
    let mut resolved = Vec::with_capacity(template.bindings.len());
    for member in &template.bindings {
        let column = if let Some(idx) = member.declared_column_index {
            Some(idx)
        } else if let Some(headers) = header_index {
            headers.ordinal(&member.header_name)
        } else {
            None
        };

        if column.is_none() && strictness == Strictness::Strict {
            return Err(Error::UnmappedMember {
                member: member.name.clone(),
            });
        }

        resolved.push(ResolvedBinding { member, column });
    }
    Ok(resolved)
}

/// Tiny `TypeId`-keyed cache wrapper. Kept in its own module purely so the
/// `Any` downcast boilerplate doesn't clutter `plan`/`cached` above.
mod once_cell_like_static {
    use super::*;
    use std::sync::OnceLock;

    pub(super) struct TemplateCache {
        map: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    }

    static CACHE: OnceLock<TemplateCache> = OnceLock::new();

    impl TemplateCache {
        pub(super) fn global() -> &'static TemplateCache {
            CACHE.get_or_init(|| TemplateCache {
                map: DashMap::new(),
            })
        }

        pub(super) fn insert<T: 'static>(&self, template: Arc<BindingTemplate<T>>) {
            // Last writer wins: readers always observe a fully-constructed
            // template, never a half-built one, because the Arc is only
            // published after construction completes.
            self.map.insert(TypeId::of::<T>(), template);
        }

        pub(super) fn get<T: 'static>(&self) -> Option<Arc<BindingTemplate<T>>> {
            self.map
                .get(&TypeId::of::<T>())
                .and_then(|entry| entry.value().clone().downcast::<BindingTemplate<T>>().ok())
        }
    }
}
