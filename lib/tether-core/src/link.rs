//! Parameter linking.
//!
//! Joins the endpoint and caller namespaces by name. Absence on either side
//! is a legal state: unmatched caller parameters are *added*, unmatched
//! endpoint parameters are *deleted* and never bound.

use crate::{CallerParameter, EndpointParameter};

/// One logical parameter seen from both signatures.
///
/// At least one side is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedParameter {
    endpoint: Option<EndpointParameter>,
    caller: Option<CallerParameter>,
    added_or_transformed: bool,
}

impl LinkedParameter {
    /// Endpoint side, absent for added parameters.
    #[must_use]
    pub const fn endpoint(&self) -> Option<&EndpointParameter> {
        self.endpoint.as_ref()
    }

    /// Caller side, absent for deleted parameters.
    #[must_use]
    pub const fn caller(&self) -> Option<&CallerParameter> {
        self.caller.as_ref()
    }

    /// Added by the caller or transformed (renamed, retyped) relative to
    /// the endpoint. Such parameters bind through their own mapping.
    #[must_use]
    pub const fn is_added_or_transformed(&self) -> bool {
        self.added_or_transformed
    }

    /// Declared by the endpoint but not passed by the caller.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.caller.is_none()
    }

    /// Both sides present and bound through the endpoint's binding source.
    #[must_use]
    pub const fn is_endpoint_bound(&self) -> bool {
        self.endpoint.is_some() && self.caller.is_some() && !self.added_or_transformed
    }

    /// Name used on the wire.
    ///
    /// Endpoint-bound parameters use the endpoint's resolved name, added and
    /// transformed parameters the caller's name.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        match (&self.endpoint, &self.caller) {
            (Some(endpoint), _) if !self.added_or_transformed => endpoint.resolved_name(),
            (_, Some(caller)) => caller.name(),
            (Some(endpoint), None) => endpoint.resolved_name(),
            (None, None) => "",
        }
    }
}

/// Link endpoint parameters with caller parameters.
///
/// Endpoint parameters come first, in declaration order, each joined with the
/// first caller parameter named after its resolved name, or failing that
/// after its declared name; added caller parameters follow in caller order.
/// A matched caller parameter carrying a mapping is a transformed parameter.
#[must_use]
pub fn link(
    endpoint_params: &[EndpointParameter],
    caller_params: &[CallerParameter],
) -> Vec<LinkedParameter> {
    let mut claimed = vec![false; caller_params.len()];
    let mut linked = Vec::with_capacity(endpoint_params.len() + caller_params.len());

    for endpoint in endpoint_params {
        let matched = find_unclaimed(caller_params, &claimed, endpoint.resolved_name())
            .or_else(|| find_unclaimed(caller_params, &claimed, endpoint.name()));

        if let Some(taken) = matched.and_then(|index| claimed.get_mut(index)) {
            *taken = true;
        }
        let caller = matched.and_then(|index| caller_params.get(index));

        let entry = LinkedParameter {
            endpoint: Some(endpoint.clone()),
            caller: caller.cloned(),
            added_or_transformed: caller.is_some_and(|caller| caller.mapping().is_some()),
        };
        linked.push(entry);
    }

    for (caller, taken) in caller_params.iter().zip(claimed) {
        if !taken {
            linked.push(LinkedParameter {
                endpoint: None,
                caller: Some(caller.clone()),
                added_or_transformed: true,
            });
        }
    }

    linked
}

fn find_unclaimed(
    caller_params: &[CallerParameter],
    claimed: &[bool],
    name: &str,
) -> Option<usize> {
    caller_params
        .iter()
        .zip(claimed)
        .position(|(caller, taken)| !*taken && caller.name() == name)
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::{BindingSource, ParameterMapping, TypeRef};

    fn endpoint(name: &str, binding: BindingSource) -> EndpointParameter {
        EndpointParameter::new(name, TypeRef::Dynamic).bound_to(binding)
    }

    fn caller(name: &str) -> CallerParameter {
        CallerParameter::new(name, TypeRef::Dynamic, json!(1))
    }

    #[test]
    fn link_matches_by_resolved_name() {
        let endpoints = vec![
            endpoint("userId", BindingSource::Route).with_attribute_name("id"),
            endpoint("page", BindingSource::Query),
        ];
        let callers = vec![caller("page"), caller("id")];

        let linked = link(&endpoints, &callers);

        check!(linked.len() == 2);
        let_assert!([first, second] = linked.as_slice());
        check!(first.is_endpoint_bound());
        check!(first.wire_name() == "id");
        check!(first.caller().map(CallerParameter::name) == Some("id"));
        check!(second.wire_name() == "page");
    }

    #[test]
    fn link_falls_back_to_declared_name() {
        let endpoints = vec![
            endpoint("version", BindingSource::Header).with_attribute_name("X-Api-Version"),
            endpoint("tenant", BindingSource::Header).with_attribute_name("X-Tenant"),
        ];
        let callers = vec![caller("version"), caller("tenant"), caller("X-Tenant")];

        let linked = link(&endpoints, &callers);

        let_assert!([version, tenant, added] = linked.as_slice());
        check!(version.is_endpoint_bound());
        check!(version.wire_name() == "X-Api-Version");
        // the resolved name wins over the declared name
        check!(tenant.caller().map(CallerParameter::name) == Some("X-Tenant"));
        check!(added.caller().map(CallerParameter::name) == Some("tenant"));
        check!(added.is_added_or_transformed());
    }

    #[test]
    fn link_marks_added_and_deleted() {
        let endpoints = vec![endpoint("removed", BindingSource::Query)];
        let callers = vec![caller("extra").mapped(ParameterMapping::Header)];

        let linked = link(&endpoints, &callers);

        let_assert!([deleted, added] = linked.as_slice());
        check!(deleted.is_deleted());
        check!(!deleted.is_added_or_transformed());
        check!(!deleted.is_endpoint_bound());
        check!(added.endpoint().is_none());
        check!(added.is_added_or_transformed());
        check!(added.wire_name() == "extra");
    }

    #[test]
    fn link_matched_with_mapping_is_transformed() {
        let endpoints = vec![endpoint("filter", BindingSource::Query)];
        let callers = vec![caller("filter").mapped(ParameterMapping::Body)];

        let linked = link(&endpoints, &callers);

        let_assert!([transformed] = linked.as_slice());
        check!(transformed.endpoint().is_some());
        check!(transformed.is_added_or_transformed());
        check!(!transformed.is_endpoint_bound());
    }

    #[test]
    fn link_is_total() {
        let endpoints = vec![
            endpoint("a", BindingSource::Query),
            endpoint("b", BindingSource::Route),
            endpoint("c", BindingSource::None),
        ];
        let callers = vec![caller("c"), caller("x"), caller("a"), caller("a")];

        let linked = link(&endpoints, &callers);

        check!(linked
            .iter()
            .all(|entry| entry.endpoint().is_some() || entry.caller().is_some()));
        for param in &endpoints {
            let count = linked
                .iter()
                .filter(|entry| entry.endpoint().map(EndpointParameter::name) == Some(param.name()))
                .count();
            check!(count == 1);
        }
        // the duplicated "a" caller parameter is linked once to the endpoint
        // and once as an added parameter
        check!(linked.iter().filter(|entry| entry.caller().is_some()).count() == callers.len());
    }

    #[test]
    fn link_empty_inputs() {
        check!(link(&[], &[]).is_empty());
    }
}
