use tracing::debug;

use super::bound_with;
use crate::context::UrlValueOrigin;
use crate::value::ValueShape;
use crate::{BindingSource, Error, Next, RequestBuildContext, Result, Stage, StageFuture};

/// Binds route parameters. Only simple, non-null values are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromRouteStage;

impl Stage for FromRouteStage {
    fn name(&self) -> &'static str {
        "from-route"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run_after(ctx, bind_route)
    }
}

fn bind_route(ctx: &mut RequestBuildContext) -> Result<()> {
    for (endpoint, caller) in bound_with(ctx, BindingSource::Route) {
        let name = endpoint.resolved_name();
        match ValueShape::classify(caller.ty(), caller.value()) {
            ValueShape::Null => return Err(Error::null_route(name)),
            ValueShape::Complex | ValueShape::Sequence { .. } => {
                return Err(Error::unsupported_route(name));
            }
            ValueShape::Simple => {
                debug!(parameter = name, "bound to route");
                ctx.bind_url_value(name, caller.value().clone(), UrlValueOrigin::Route)?;
            }
        }
    }
    Ok(())
}
