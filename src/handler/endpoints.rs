// Convenience endpoints
// `/v1/chains/all` and `/v1/health`, both answering with JSON

use hyper::StatusCode;

use crate::git::CommitSource;
use crate::health;
use crate::http::{self, HttpResponse};
use crate::logger;
use crate::registry::{self, Registries, RegistryRoot};

/// Sorted JSON array of the chain names in the chain registry
pub async fn all_chains(root: &RegistryRoot) -> HttpResponse {
    const METHOD: &str = "all_chains";
    logger::log_handling(METHOD);

    let chains = match registry::list_chains(root.path()).await {
        Ok(chains) => chains,
        Err(err) => {
            logger::log_handler_error(METHOD, &err, "error traversing directories");
            return http::build_500_response(&err.to_string());
        }
    };

    match http::build_json_response(StatusCode::OK, &chains) {
        Ok(response) => {
            logger::log_handled(METHOD);
            response
        }
        Err(err) => {
            logger::log_handler_error(METHOD, &err, "error serializing json");
            http::build_500_response(&err.to_string())
        }
    }
}

/// Health record of both registries; 500 unless every query succeeded
pub async fn health(commits: &dyn CommitSource, registries: &Registries) -> HttpResponse {
    const METHOD: &str = "health";
    logger::log_handling(METHOD);

    let record = health::check_registries(commits, registries).await;
    let status = if record.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    match http::build_json_response(status, &record) {
        Ok(response) => {
            logger::log_handled(METHOD);
            response
        }
        Err(err) => {
            logger::log_handler_error(METHOD, &err, "error serializing json");
            http::build_500_response(&err.to_string())
        }
    }
}
