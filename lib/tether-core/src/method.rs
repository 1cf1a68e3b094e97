//! HTTP verbs an endpoint can be reached with.

use std::str::FromStr;

use derive_more::Display;

use crate::Error;

/// HTTP request method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET
    #[display("GET")]
    Get,
    /// POST
    #[display("POST")]
    Post,
    /// PUT
    #[display("PUT")]
    Put,
    /// DELETE
    #[display("DELETE")]
    Delete,
    /// PATCH
    #[display("PATCH")]
    Patch,
    /// HEAD
    #[display("HEAD")]
    Head,
    /// OPTIONS
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// Returns `true` if a synthesized body is transmitted with this method.
    ///
    /// `GET` and `DELETE` are included: the host framework binds bodies on
    /// them, so a body bound by the caller is sent as-is.
    #[must_use]
    pub const fn sends_body(&self) -> bool {
        matches!(
            self,
            Self::Post | Self::Get | Self::Delete | Self::Put | Self::Patch
        )
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(Error::invalid_request(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::Options.to_string(), "OPTIONS");
    }

    #[test]
    fn method_sends_body() {
        assert!(Method::Post.sends_body());
        assert!(Method::Get.sends_body());
        assert!(Method::Delete.sends_body());
        assert!(Method::Put.sends_body());
        assert!(Method::Patch.sends_body());
        assert!(!Method::Head.sends_body());
        assert!(!Method::Options.sends_body());
    }

    #[test]
    fn method_from_str_is_case_insensitive() {
        assert_eq!("post".parse::<Method>().expect("post"), Method::Post);
        assert_eq!("Delete".parse::<Method>().expect("delete"), Method::Delete);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn method_http_conversions() {
        assert_eq!(http::Method::from(Method::Put), http::Method::PUT);
        assert_eq!(
            Method::try_from(http::Method::HEAD).expect("HEAD"),
            Method::Head
        );
    }
}
