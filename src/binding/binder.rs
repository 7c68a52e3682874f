// Record binder. Applies a resolved binding template to
// one row view, filling an externally-owned instance. No allocation on
// the success path beyond what string-typed members require on decode.

use crate::error::{ConversionFailure, Error};
use crate::row_view::RowView;

use super::descriptor::ScalarValue;
use super::template::ResolvedBinding;

/// Outcome of binding one row.
#[derive(Debug)]
pub enum BindResult {
    /// Every resolved member converted and was set successfully.
    Ok,
    /// Strict mode: stopped at the first conversion failure.
    Aborted(ConversionFailure),
    /// Lenient mode: one or more members failed to convert and were left
    /// at their prior/default value; binding continued regardless.
    PartialFailure(Vec<ConversionFailure>),
}

#[allow(clippy::too_many_arguments)]
fn decode(
    view: &crate::row_view::ColumnView<'_>,
    quote: u8,
    scalar_type: &super::descriptor::ScalarType,
    member: &str,
    row: usize,
    column: usize,
) -> Result<ScalarValue, Error> {
    use super::descriptor::ScalarType as S;
    match scalar_type {
        S::Text => Ok(ScalarValue::Text(view.decode_string(quote))),
        S::Integer => view.decode_i64(quote).map(ScalarValue::Integer).map_err(|text| {
            Error::InvalidInteger {
                row,
                column,
                text: format!("{member}={text}"),
            }
        }),
        S::Unsigned => view.decode_u64(quote).map(ScalarValue::Unsigned).map_err(|text| {
            Error::InvalidInteger {
                row,
                column,
                text: format!("{member}={text}"),
            }
        }),
        S::Float => view.decode_f64(quote).map(ScalarValue::Float).map_err(|text| {
            Error::InvalidFloat {
                row,
                column,
                text: format!("{member}={text}"),
            }
        }),
        S::Boolean => view.decode_bool(quote).map(ScalarValue::Boolean).map_err(|text| {
            Error::InvalidBoolean {
                row,
                column,
                text: format!("{member}={text}"),
            }
        }),
        S::DateTime => view.decode_datetime(quote).map(ScalarValue::DateTime).map_err(|text| {
            Error::InvalidDateTime {
                row,
                column,
                text: format!("{member}={text}"),
            }
        }),
        S::Nullable(inner) => {
            if view.is_empty() {
                Ok(ScalarValue::Null)
            } else {
                decode(view, quote, inner, member, row, column)
            }
        }
    }
}

/// Apply `resolved` bindings to `row`, mutating `instance` through each
/// member's setter. `quote` is the dialect's quote character (needed by
/// the decoders). `strict` controls whether the first conversion failure
/// aborts the row or is recorded and skipped. `row_number` is the 1-based
/// row this call is binding, used only to attribute errors.
pub fn bind_row<T>(
    resolved: &[ResolvedBinding<'_, T>],
    row: &RowView<'_>,
    quote: u8,
    strict: bool,
    row_number: usize,
    instance: &mut T,
) -> BindResult {
    let mut failures = Vec::new();

    for binding in resolved {
        let Some(column) = binding.column else {
            // Unresolved in lenient mode (strict already errored during
            // resolve_header); nothing to set, move on.
            continue;
        };

        let Some(view) = row.try_column(column) else {
            // Resolved ordinal doesn't exist in this particular row
            // (short row). Lenient: skip. Strict: treat as a failure so
            // the caller can see which member/row was short.
            if strict {
                let failure = ConversionFailure {
                    member: binding.member.name.clone(),
                    kind: Error::ColumnOutOfRange {
                        row: row_number,
                        column: column + 1,
                    },
                };
                return BindResult::Aborted(failure);
            }
            continue;
        };

        match decode(
            &view,
            quote,
            &binding.member.scalar_type,
            &binding.member.name,
            row_number,
            column + 1,
        ) {
            Ok(value) => (binding.member.setter)(instance, value),
            Err(kind) => {
                let failure = ConversionFailure {
                    member: binding.member.name.clone(),
                    kind,
                };
                if strict {
                    return BindResult::Aborted(failure);
                }
                failures.push(failure);
            }
        }
    }

    if failures.is_empty() {
        BindResult::Ok
    } else {
        BindResult::PartialFailure(failures)
    }
}
