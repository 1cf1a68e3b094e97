use std::sync::Arc;

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use tracing::debug;

use crate::{
    BodySerializer, Error, Next, Request, RequestBuildContext, Result, RouteSynthesizer, Stage,
    StageFuture,
};

const DEFAULT_BASE_URL: &str = "http://localhost";

/// Terminal stage: synthesizes the URL, serializes the body and emits the
/// [`Request`].
///
/// The body is serialized only when a stage set one and the method sends a
/// body. The call id is stamped as the correlation header and stored in the
/// request extensions along with the route template.
pub struct FinalizeStage {
    base_url: Option<url::Url>,
    synthesizer: Arc<dyn RouteSynthesizer>,
    serializer: Arc<dyn BodySerializer>,
    correlation_header: HeaderName,
}

impl FinalizeStage {
    /// Create the finalize stage.
    #[must_use]
    pub fn new(
        base_url: Option<url::Url>,
        synthesizer: Arc<dyn RouteSynthesizer>,
        serializer: Arc<dyn BodySerializer>,
        correlation_header: HeaderName,
    ) -> Self {
        Self {
            base_url,
            synthesizer,
            serializer,
            correlation_header,
        }
    }

    fn finalize(&self, ctx: &mut RequestBuildContext) -> Result<Request> {
        let method = ctx
            .method()
            .ok_or_else(|| Error::invalid_request("request method was not set"))?;
        let content_type = ctx
            .content_type()
            .ok_or_else(|| Error::invalid_request("request content type was not set"))?;

        let endpoint = ctx.endpoint();
        let path = self
            .synthesizer
            .synthesize(endpoint, ctx.url_values())
            .ok_or_else(|| Error::RouteSynthesisFailure {
                endpoint: endpoint.id().to_string(),
                template: endpoint.route().to_string(),
            })?;
        let url = self.join(&path)?;
        let route = endpoint.route().clone();

        let body = match ctx.body() {
            Some(body) if method.sends_body() => {
                Some(self.serializer.serialize(body, content_type)?)
            }
            Some(_) => {
                debug!(%method, "method sends no body, body dropped");
                None
            }
            None => None,
        };

        let mut headers = std::mem::take(ctx.headers_mut());
        if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()));
        }
        let call_id = ctx.call_id();
        let call_id_value = HeaderValue::from_str(&call_id.to_string()).map_err(|err| {
            Error::invalid_header(self.correlation_header.as_str(), err.to_string())
        })?;
        headers.insert(self.correlation_header.clone(), call_id_value);

        let mut builder = Request::builder(method, url)
            .headers(headers)
            .extension(call_id)
            .extension(route);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let request = builder.build();

        debug!(%method, url = %request.url(), %call_id, "request synthesized");
        Ok(request)
    }

    fn join(&self, path: &str) -> Result<url::Url> {
        let base = self
            .base_url
            .as_ref()
            .map_or(DEFAULT_BASE_URL, url::Url::as_str)
            .trim_end_matches('/');
        url::Url::parse(&format!("{base}{path}")).map_err(Into::into)
    }
}

impl Stage for FinalizeStage {
    fn name(&self) -> &'static str {
        "finalize"
    }

    fn create_request<'a>(
        &'a self,
        ctx: &'a mut RequestBuildContext,
        _next: Next<'a>,
    ) -> StageFuture<'a> {
        Box::pin(std::future::ready(self.finalize(ctx)))
    }
}

impl std::fmt::Debug for FinalizeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalizeStage")
            .field("base_url", &self.base_url.as_ref().map(url::Url::as_str))
            .field("correlation_header", &self.correlation_header)
            .finish_non_exhaustive()
    }
}
