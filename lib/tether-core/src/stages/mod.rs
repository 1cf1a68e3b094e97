//! Built-in pipeline stages, in execution order.
//!
//! Binding-source stages only look at linked parameters bound through the
//! endpoint's declared source; added and transformed parameters are handled
//! by [`AddedOrTransformedStage`] from their caller-side mapping.

mod body;
mod custom;
mod finalize;
mod header;
mod method;
mod query;
mod route;
mod transformed;
mod unattributed;

pub use body::FromBodyStage;
pub use custom::CustomParameterStage;
pub use finalize::FinalizeStage;
pub use header::FromHeaderStage;
pub use method::MethodStage;
pub use query::FromQueryStage;
pub use route::FromRouteStage;
pub use transformed::AddedOrTransformedStage;
pub use unattributed::UnattributedStage;

use crate::{BindingSource, CallerParameter, EndpointParameter, RequestBuildContext};

/// Endpoint-bound parameters declaring `binding`, with their caller side.
fn bound_with(
    ctx: &RequestBuildContext,
    binding: BindingSource,
) -> Vec<(EndpointParameter, CallerParameter)> {
    ctx.endpoint_bound()
        .filter_map(|linked| Some((linked.endpoint()?, linked.caller()?)))
        .filter(|(endpoint, _)| endpoint.binding() == binding)
        .map(|(endpoint, caller)| (endpoint.clone(), caller.clone()))
        .collect()
}
