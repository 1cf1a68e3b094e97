use serde_json::Value;
use tracing::debug;

use crate::{ContentType, Next, RequestBuildContext, Stage, StageFuture};

/// Sets the HTTP method, the endpoint's required route values and the body
/// content type.
///
/// The content type is `application/x-www-form-urlencoded` when a parameter
/// declares form binding, JSON otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodStage;

impl Stage for MethodStage {
    fn name(&self) -> &'static str {
        "method"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        next: Next<'a>,
    ) -> StageFuture<'a> {
        next.run_after(ctx, |ctx| {
            let method = ctx.endpoint().method();
            let content_type = if ctx.endpoint().consumes_form() {
                ContentType::FormUrlEncoded
            } else {
                ContentType::Json
            };
            let route_values = ctx
                .endpoint()
                .route_values()
                .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                .collect::<Vec<_>>();

            debug!(%method, %content_type, "initializing request");
            ctx.set_method(method);
            ctx.set_content_type(content_type);
            for (key, value) in route_values {
                ctx.insert_url_value(key, value);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;
    use crate::stages::testing::{CaptureStage, param, pipeline_with};
    use crate::{
        BindingSource, CallId, CustomParameters, EndpointDescriptor, Method, PipelineBuilder,
        TypeRef,
    };

    #[tokio::test]
    async fn method_and_required_route_values() {
        let endpoint =
            EndpointDescriptor::builder("Users.Delete", Method::Delete, "/{controller}/{id?}")
                .route_value("controller", "users")
                .build()
                .expect("endpoint");
        let capture = CaptureStage::default();

        let request = pipeline_with(&capture)
            .synthesize(endpoint.into(), Vec::new(), CustomParameters::new(), CallId::new())
            .await
            .expect("request");

        check!(request.method() == Method::Delete);
        check!(request.url().path() == "/users");
        check!(capture.snapshot().url_values.get("controller") == Some(&json!("users")));
    }

    #[tokio::test]
    async fn form_binding_selects_form_content_type() {
        struct AssertForm;

        impl Stage for AssertForm {
            fn create_request<'a>(
                &'a self,
                ctx: &'a mut RequestBuildContext,
                next: Next<'a>,
            ) -> StageFuture<'a> {
                assert_eq!(ctx.content_type(), Some(ContentType::FormUrlEncoded));
                next.run(ctx)
            }
        }

        let endpoint = crate::stages::testing::endpoint(Method::Post, "/login", vec![param(
            "login",
            TypeRef::object("Login"),
            BindingSource::Form,
        )]);

        let result = PipelineBuilder::new()
            .add_stage(AssertForm)
            .build()
            .synthesize(endpoint, Vec::new(), CustomParameters::new(), CallId::new())
            .await;
        check!(result.is_ok());
    }
}
