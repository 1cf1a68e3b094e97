use tracing::debug;

use super::bound_with;
use crate::value::header_values;
use crate::{BindingSource, Next, RequestBuildContext, Result, Stage, StageFuture};

/// Binds header parameters; each element of a sequence is a repeated header.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromHeaderStage;

impl Stage for FromHeaderStage {
    fn name(&self) -> &'static str {
        "from-header"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run_after(ctx, bind_headers)
    }
}

fn bind_headers(ctx: &mut RequestBuildContext) -> Result<()> {
    for (endpoint, caller) in bound_with(ctx, BindingSource::Header) {
        let name = endpoint.resolved_name();
        let values = header_values(name, caller.ty(), caller.value())?;
        debug!(parameter = name, count = values.len(), "bound to header");
        for value in values {
            ctx.append_header(name, &value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use crate::stages::testing::{arg, endpoint, param, run};
    use crate::{BindingSource, CustomParameters, EndpointParameter, Error, Method, TypeRef};

    #[tokio::test]
    async fn header_uses_attribute_name() {
        let endpoint = endpoint(Method::Get, "/items", vec![
            EndpointParameter::new("tenant", TypeRef::string())
                .bound_to(BindingSource::Header)
                .with_attribute_name("X-Tenant"),
        ]);

        let (result, _) = run(
            endpoint,
            vec![arg("X-Tenant", TypeRef::string(), json!("acme"))],
            CustomParameters::new(),
        )
        .await;

        let_assert!(Ok(request) = result);
        check!(request.header("x-tenant") == Some("acme"));
    }

    #[tokio::test]
    async fn sequence_produces_repeated_headers() {
        let ty = TypeRef::sequence(TypeRef::integer());
        let endpoint = endpoint(Method::Get, "/items", vec![param(
            "X-Id",
            ty.clone(),
            BindingSource::Header,
        )]);

        let (result, _) = run(
            endpoint,
            vec![arg("X-Id", ty, json!([1, 2]))],
            CustomParameters::new(),
        )
        .await;

        let_assert!(Ok(request) = result);
        check!(request.header_all("x-id") == vec!["1", "2"]);
    }

    #[tokio::test]
    async fn null_header_is_omitted() {
        let ty = TypeRef::optional(TypeRef::string());
        let endpoint = endpoint(Method::Get, "/items", vec![param(
            "X-Opt",
            ty.clone(),
            BindingSource::Header,
        )]);

        let (result, _) = run(
            endpoint,
            vec![arg("X-Opt", ty, json!(null))],
            CustomParameters::new(),
        )
        .await;

        let_assert!(Ok(request) = result);
        check!(request.header("x-opt").is_none());
    }

    #[tokio::test]
    async fn complex_header_is_rejected() {
        let endpoint = endpoint(Method::Get, "/items", vec![param(
            "X-Filter",
            TypeRef::object("Filter"),
            BindingSource::Header,
        )]);

        let (result, _) = run(
            endpoint,
            vec![arg("X-Filter", TypeRef::object("Filter"), json!({ "a": 1 }))],
            CustomParameters::new(),
        )
        .await;

        let_assert!(Err(err @ Error::UnsupportedHeaderType { .. }) = result);
        check!(err.to_string().contains("complex types in header are not supported"));
        check!(err.to_string().contains("X-Filter"));
    }
}
