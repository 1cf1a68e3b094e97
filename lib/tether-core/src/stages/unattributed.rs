use serde_json::Value;
use tracing::{debug, trace};

use super::bound_with;
use crate::context::UrlValueOrigin;
use crate::value::{FlattenMode, ValueShape, flatten};
use crate::{BindingSource, Next, RequestBuildContext, Result, Stage, StageFuture, TypeRef};

/// Binds parameters declaring no attribute the way the host framework infers
/// them.
///
/// The first complex value becomes the body, unless the endpoint declares an
/// explicit body or form parameter. Everything else is treated as a query
/// value. Complex route values therefore need an explicit route binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnattributedStage;

impl Stage for UnattributedStage {
    fn name(&self) -> &'static str {
        "unattributed"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run_after(ctx, bind_unattributed)
    }
}

fn bind_unattributed(ctx: &mut RequestBuildContext) -> Result<()> {
    for linked in ctx.endpoint_bound() {
        if let Some(endpoint) = linked.endpoint()
            && endpoint.binding().is_skipped()
        {
            trace!(
                parameter = endpoint.name(),
                binding = %endpoint.binding(),
                "parameter is not sent"
            );
        }
    }

    let mut body_taken = ctx.endpoint().body_parameters().next().is_some();
    let max_depth = ctx.max_depth();

    for (endpoint, caller) in bound_with(ctx, BindingSource::None) {
        let name = endpoint.resolved_name();
        if !body_taken && is_complex(endpoint.declared_type(), caller.value()) {
            debug!(parameter = name, "unattributed complex value bound to body");
            ctx.set_body(caller.value().clone());
            body_taken = true;
            continue;
        }

        let pairs = flatten(name, caller.ty(), caller.value(), FlattenMode::Implicit, max_depth)?;
        for (key, value) in pairs {
            trace!(parameter = name, key = %key, "unattributed value bound to query");
            ctx.bind_url_value(key, value, UrlValueOrigin::Query)?;
        }
    }
    Ok(())
}

/// A `null` value counts as complex when its declared type is an object.
fn is_complex(declared: &TypeRef, value: &Value) -> bool {
    match ValueShape::classify(declared, value) {
        ValueShape::Complex => true,
        ValueShape::Null => matches!(declared.non_nullable(), TypeRef::Object(_)),
        ValueShape::Simple | ValueShape::Sequence { .. } => false,
    }
}
