//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, matching the
//! path against the server's route table and dispatching to a handler.

use std::time::Instant;

use hyper::body::Body as _;
use hyper::header::{HeaderName, CONTENT_LENGTH, IF_MODIFIED_SINCE, IF_NONE_MATCH, RANGE};
use hyper::{Method, Request};

use crate::handler::{endpoints, static_files};
use crate::http::{self, cache::Validators, path, HttpResponse};
use crate::logger;
use crate::registry::Namespace;
use crate::server::Server;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
    pub range: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            path: req.uri().path(),
            is_head: req.method() == Method::HEAD,
            if_none_match: header_str(req, &IF_NONE_MATCH),
            if_modified_since: header_str(req, &IF_MODIFIED_SINCE),
            range: header_str(req, &RANGE),
        }
    }

    pub const fn validators(&self) -> Validators<'a> {
        Validators {
            if_none_match: self.if_none_match,
            if_modified_since: self.if_modified_since,
        }
    }
}

fn header_str<'a, B>(req: &'a Request<B>, name: &HeaderName) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// How a route's path is compared against the request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Exact(String),
    Prefix(String),
}

impl RouteMatch {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact.as_str(),
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// What a matched route does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    AllChains,
    Health,
    Registry(Namespace),
}

#[derive(Debug, Clone)]
pub struct Route {
    pub match_rule: RouteMatch,
    pub action: RouteAction,
}

/// Route table owned by a [`Server`].
///
/// Every endpoint answers both with and without a trailing slash, and the
/// slash form also matches everything below it. Routes are kept most
/// specific first, so `/v1/chains/all` wins over the `/v1/chains/` tree.
#[derive(Debug, Clone)]
pub struct Router {
    api_version: String,
    routes: Vec<Route>,
}

impl Router {
    pub fn new(api_version: &str) -> Self {
        let mut router = Self {
            api_version: api_version.to_string(),
            routes: Vec::new(),
        };

        let all_chains = format!("{}/all", router.namespace_prefix(Namespace::Chains));
        router.add(&all_chains, RouteAction::AllChains, "all chains helper");

        let health = format!("/{api_version}/health");
        router.add(&health, RouteAction::Health, "health helper");

        for namespace in Namespace::ALL {
            let prefix = router.namespace_prefix(namespace);
            router.add(&prefix, RouteAction::Registry(namespace), "registry content");
        }
        router
    }

    fn add(&mut self, endpoint: &str, action: RouteAction, description: &str) {
        self.routes.push(Route {
            match_rule: RouteMatch::Exact(endpoint.to_string()),
            action,
        });
        self.routes.push(Route {
            match_rule: RouteMatch::Prefix(format!("{endpoint}/")),
            action,
        });
        logger::log_endpoint(endpoint, description);
    }

    /// First route matching `path`
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.match_rule.matches(path))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Path prefix stripped before a registry lookup, e.g. `/v1/chains`
    pub fn namespace_prefix(&self, namespace: Namespace) -> String {
        format!("/{}/{}", self.api_version, namespace)
    }

    /// Part of `path` below the namespace prefix, without leading slashes.
    ///
    /// A trailing slash is kept since it marks a directory request.
    pub fn relative_path<'p>(&self, namespace: Namespace, path: &'p str) -> &'p str {
        path.strip_prefix(self.namespace_prefix(namespace).as_str())
            .unwrap_or_default()
            .trim_start_matches('/')
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(req: Request<B>, server: &Server) -> HttpResponse {
    let started = Instant::now();
    let ctx = RequestContext::from_request(&req);

    let response = match check_http_method(req.method()) {
        Some(resp) => resp,
        None => route_request(&ctx, server).await,
    };
    let response = if ctx.is_head {
        http::without_body(response)
    } else {
        response
    };

    if server.access_log() {
        let bytes = response_bytes(&response);
        logger::log_access(req.method(), ctx.path, response.status(), bytes, started.elapsed());
    }
    response
}

/// Body size for the access log; streamed file bodies only announce it
/// through `Content-Length`
fn response_bytes(response: &HttpResponse) -> u64 {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or_else(|| response.body().size_hint().exact())
        .unwrap_or(0)
}

/// Only GET and HEAD are served; registries are read-only
fn check_http_method(method: &Method) -> Option<HttpResponse> {
    match method {
        &Method::GET | &Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Routes are matched on the decoded path, so `/v1/chains/%61ll` is the
/// chain listing
async fn route_request(ctx: &RequestContext<'_>, server: &Server) -> HttpResponse {
    let Some(decoded) = path::percent_decode(ctx.path) else {
        return http::build_400_response();
    };
    let router = server.router();
    let Some(route) = router.resolve(&decoded) else {
        return http::build_404_response();
    };

    match route.action {
        RouteAction::AllChains => endpoints::all_chains(server.registries().chains()).await,
        RouteAction::Health => endpoints::health(server.commits(), server.registries()).await,
        RouteAction::Registry(namespace) => {
            let relative = router.relative_path(namespace, &decoded);
            static_files::serve(ctx, server.registries().root(namespace), relative).await
        }
    }
}
