use tracing::{debug, trace};

use crate::value::{FlattenMode, flatten, header_values};
use crate::{CustomParameter, Next, RequestBuildContext, Result, Stage, StageFuture, TypeRef};

/// Applies the built-in custom parameters: headers, body, and route-or-query
/// values. Named values and typed markers are left to caller stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomParameterStage;

impl Stage for CustomParameterStage {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run_after(ctx, apply_custom)
    }
}

fn apply_custom(ctx: &mut RequestBuildContext) -> Result<()> {
    let parameters = ctx.custom().iter().cloned().collect::<Vec<_>>();
    let max_depth = ctx.max_depth();

    for parameter in parameters {
        match parameter {
            CustomParameter::Header { name, value } => {
                debug!(header = %name, "custom header");
                for value in header_values(&name, &TypeRef::Dynamic, &value)? {
                    ctx.append_header(&name, &value)?;
                }
            }
            CustomParameter::Body(value) => {
                debug!("custom body");
                ctx.set_body(value);
            }
            CustomParameter::RouteOrQuery { name, value } => {
                debug!(key = %name, "custom url value");
                let pairs =
                    flatten(&name, &TypeRef::Dynamic, &value, FlattenMode::Implicit, max_depth)?;
                for (key, value) in pairs {
                    ctx.insert_url_value(key, value);
                }
            }
            CustomParameter::Named { name, .. } => {
                trace!(key = %name, "named custom parameter left to caller stages");
            }
        }
    }
    Ok(())
}
