use tracing::debug;

use crate::{Error, Next, RequestBuildContext, Result, Stage, StageFuture};

/// Binds the parameter declaring a body or form binding.
///
/// An endpoint declaring more than one such parameter fails with
/// [`Error::DuplicateBodyBinding`], whether or not the caller passes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromBodyStage;

impl Stage for FromBodyStage {
    fn name(&self) -> &'static str {
        "from-body"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run_after(ctx, bind_body)
    }
}

fn bind_body(ctx: &mut RequestBuildContext) -> Result<()> {
    let endpoint = ctx.endpoint();
    if endpoint.body_parameters().nth(1).is_some() {
        return Err(Error::duplicate_body(
            endpoint.id(),
            endpoint.body_parameters().map(|parameter| parameter.name()),
        ));
    }

    let body = ctx.endpoint_bound().find_map(|linked| {
        let endpoint = linked.endpoint()?;
        let caller = linked.caller()?;
        endpoint
            .binding()
            .is_body()
            .then(|| (endpoint.name().to_string(), caller.value().clone()))
    });

    if let Some((name, value)) = body {
        debug!(parameter = %name, "bound to body");
        ctx.set_body(value);
    }
    Ok(())
}
