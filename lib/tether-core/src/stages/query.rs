use tracing::{debug, trace};

use super::bound_with;
use crate::context::UrlValueOrigin;
use crate::value::{FlattenMode, flatten};
use crate::{BindingSource, Next, RequestBuildContext, Result, Stage, StageFuture};

/// Binds query parameters; complex values are flattened to `parent.child`
/// keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromQueryStage;

impl Stage for FromQueryStage {
    fn name(&self) -> &'static str {
        "from-query"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run_after(ctx, bind_query)
    }
}

fn bind_query(ctx: &mut RequestBuildContext) -> Result<()> {
    let max_depth = ctx.max_depth();
    for (endpoint, caller) in bound_with(ctx, BindingSource::Query) {
        let name = endpoint.resolved_name();
        let pairs = flatten(name, caller.ty(), caller.value(), FlattenMode::Explicit, max_depth)?;
        debug!(parameter = name, count = pairs.len(), "bound to query");
        for (key, value) in pairs {
            trace!(key = %key, "query value");
            ctx.bind_url_value(key, value, UrlValueOrigin::Query)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use crate::stages::testing::{arg, endpoint, param, run};
    use crate::{BindingSource, CustomParameters, Error, Method, PipelineBuilder, TypeRef};

    #[tokio::test]
    async fn complex_query_value_is_flattened() {
        let endpoint = endpoint(Method::Get, "/items", vec![param(
            "filter",
            TypeRef::object("ComplexObject"),
            BindingSource::Query,
        )]);

        let (result, capture) = run(
            endpoint,
            vec![arg("filter", TypeRef::object("ComplexObject"), json!({ "A": "x", "B": 2 }))],
            CustomParameters::new(),
        )
        .await;

        let_assert!(Ok(request) = result);
        let url_values = capture.snapshot().url_values;
        check!(url_values.len() == 2);
        check!(url_values.get("filter.A") == Some(&json!("x")));
        check!(url_values.get("filter.B") == Some(&json!(2)));
        check!(request.url().query() == Some("filter.A=x&filter.B=2"));
    }

    #[tokio::test]
    async fn explicit_query_reports_complex_collection() {
        let ty = TypeRef::sequence(TypeRef::object("Item"));
        let endpoint = endpoint(Method::Get, "/items", vec![param(
            "items",
            ty.clone(),
            BindingSource::Query,
        )]);

        let (result, _) = run(
            endpoint,
            vec![arg("items", ty, json!([{ "id": 1 }]))],
            CustomParameters::new(),
        )
        .await;

        let_assert!(Err(err @ Error::UnsupportedQueryCollectionElement { .. }) = result);
        check!(err.to_string().contains("complex type"));
    }

    #[tokio::test]
    async fn deep_nesting_is_rejected() {
        let endpoint = endpoint(Method::Get, "/items", vec![param(
            "filter",
            TypeRef::object("Filter"),
            BindingSource::Query,
        )]);

        let result = PipelineBuilder::new()
            .max_depth(2)
            .build()
            .synthesize(
                endpoint,
                vec![arg("filter", TypeRef::object("Filter"), json!({ "a": { "b": { "c": 1 } } }))],
                CustomParameters::new(),
                crate::CallId::new(),
            )
            .await;

        let_assert!(Err(Error::FlattenDepthExceeded { max_depth, .. }) = result);
        check!(max_depth == 2);
    }

    #[tokio::test]
    async fn null_query_value_is_not_sent() {
        let ty = TypeRef::optional(TypeRef::integer());
        let endpoint = endpoint(Method::Get, "/items", vec![param(
            "page",
            ty.clone(),
            BindingSource::Query,
        )]);

        let (result, capture) = run(
            endpoint,
            vec![arg("page", ty, json!(null))],
            CustomParameters::new(),
        )
        .await;

        let_assert!(Ok(request) = result);
        check!(capture.snapshot().url_values.get("page") == Some(&json!(null)));
        check!(request.url().query().is_none());
    }
}
