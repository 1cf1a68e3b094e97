use tracing::{debug, trace};

use crate::value::{FlattenMode, flatten, header_values};
use crate::{
    CallerParameter, Error, Next, ParameterMapping, RequestBuildContext, Result, Stage,
    StageFuture, UrlValueOrigin,
};

/// Binds added and transformed parameters from their caller-side mapping.
///
/// The mapping overrides whatever the endpoint declares. A body mapping
/// replaces any earlier body, null included. Header and query mappings skip
/// null values. Query values of added parameters take part in the
/// route/query collision check; a transformed parameter replaces its own
/// endpoint binding and is merged last-write-wins.
///
/// An added parameter without a mapping fails with
/// [`Error::UnmappedParameter`](crate::Error::UnmappedParameter).
#[derive(Debug, Clone, Copy, Default)]
pub struct AddedOrTransformedStage;

impl Stage for AddedOrTransformedStage {
    fn name(&self) -> &'static str {
        "added-or-transformed"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run_after(ctx, bind_transformed)
    }
}

fn bind_transformed(ctx: &mut RequestBuildContext) -> Result<()> {
    let callers = ctx
        .parameters()
        .iter()
        .filter(|linked| linked.is_added_or_transformed())
        .filter_map(|linked| {
            let added = linked.endpoint().is_none();
            linked.caller().cloned().map(|caller| (caller, added))
        })
        .collect::<Vec<(CallerParameter, bool)>>();
    let max_depth = ctx.max_depth();

    for (caller, added) in callers {
        let name = caller.name();
        let Some(mapping) = caller.mapping() else {
            return Err(Error::unmapped(name));
        };
        if caller.value().is_null() && mapping != ParameterMapping::Body {
            trace!(parameter = name, "no value, skipped");
            continue;
        }
        match mapping {
            ParameterMapping::None => {
                trace!(parameter = name, "mapped to nothing, ignored");
            }
            ParameterMapping::Body => {
                debug!(parameter = name, "mapped to body");
                ctx.set_body(caller.value().clone());
            }
            ParameterMapping::Header => {
                debug!(parameter = name, "mapped to header");
                for value in header_values(name, caller.ty(), caller.value())? {
                    ctx.append_header(name, &value)?;
                }
            }
            ParameterMapping::Query => {
                debug!(parameter = name, added, "mapped to query");
                let pairs =
                    flatten(name, caller.ty(), caller.value(), FlattenMode::Implicit, max_depth)?;
                for (key, value) in pairs {
                    if added {
                        ctx.bind_url_value(key, value, UrlValueOrigin::Query)?;
                    } else {
                        ctx.insert_url_value(key, value);
                    }
                }
            }
        }
    }
    Ok(())
}
