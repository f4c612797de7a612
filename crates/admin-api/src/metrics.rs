//! Client-side metrics
//!
//! Emitted through the `metrics` facade; the embedding binary decides whether
//! a recorder is installed.
//!
//! - `admin_api_requests_total` (counter): labels `status`, `method`
//! - `admin_api_request_duration_seconds` (histogram): label `status`
//! - `admin_api_transport_errors_total` (counter): label `error_type`
//! - `admin_api_token_refresh_total` (counter): label `outcome`

/// Record a request that received a response.
pub fn record_request(status: u16, method: &str, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!("admin_api_requests_total", "status" => status_str.clone(), "method" => method.to_string())
        .increment(1);
    metrics::histogram!("admin_api_request_duration_seconds", "status" => status_str)
        .record(duration_secs);
}

/// Record a request that never got a response ("timeout" or "network").
pub fn record_transport_error(error_type: &str) {
    metrics::counter!("admin_api_transport_errors_total", "error_type" => error_type.to_string())
        .increment(1);
}

/// Record how a refresh cycle settled.
///
/// Outcomes: `success`, `failure`, `no_refresh_token`, `already_rotated`,
/// `interrupted` (leader dropped before settling).
pub fn record_refresh(outcome: &str) {
    metrics::counter!("admin_api_token_refresh_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// Record a token endpoint call (login, refresh, logout).
///
/// These go straight through `admin_auth` rather than the dispatcher, so the
/// exact 2xx code is not visible here; any 2xx is recorded as `200`.
pub fn record_auth_call<T>(result: &admin_auth::Result<T>, duration_secs: f64) {
    match result {
        Ok(_) | Err(admin_auth::Error::InvalidResponse(_)) => {
            record_request(200, "POST", duration_secs)
        }
        Err(admin_auth::Error::Rejected { status, .. }) => {
            record_request(*status, "POST", duration_secs)
        }
        Err(admin_auth::Error::Timeout(_)) => record_transport_error("timeout"),
        Err(admin_auth::Error::Http(_)) => record_transport_error("network"),
        Err(admin_auth::Error::SessionParse(_) | admin_auth::Error::Io(_)) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_request(200, "GET", 0.05);
        record_transport_error("timeout");
        record_refresh("success");
    }

    #[test]
    fn record_request_carries_status_and_method() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request(200, "GET", 0.042);
        record_request(401, "POST", 0.01);

        let output = handle.render();
        assert!(output.contains("admin_api_requests_total"));
        assert!(output.contains("status=\"200\""));
        assert!(output.contains("method=\"GET\""));
        assert!(output.contains("status=\"401\""));
        assert!(output.contains("admin_api_request_duration_seconds"));
    }

    #[test]
    fn refresh_outcomes_are_labelled() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_refresh("success");
        record_refresh("failure");
        record_transport_error("network");

        let output = handle.render();
        assert!(output.contains("admin_api_token_refresh_total"));
        assert!(output.contains("outcome=\"success\""));
        assert!(output.contains("outcome=\"failure\""));
        assert!(output.contains("error_type=\"network\""));
    }

    #[test]
    fn auth_calls_count_as_requests_or_transport_errors() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_auth_call(&Ok(()), 0.02);
        record_auth_call::<()>(
            &Err(admin_auth::Error::Rejected {
                status: 403,
                body: String::new(),
            }),
            0.01,
        );
        record_auth_call::<()>(&Err(admin_auth::Error::Timeout("slow".into())), 30.0);

        let output = handle.render();
        assert!(output.contains("status=\"200\""));
        assert!(output.contains("status=\"403\""));
        assert!(output.contains("method=\"POST\""));
        assert!(output.contains("error_type=\"timeout\""));
    }

    #[test]
    fn dropped_refresh_leader_is_counted() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let coordinator = crate::refresh::RefreshCoordinator::new();
        match coordinator.join() {
            crate::refresh::Ticket::Leader(guard) => drop(guard),
            crate::refresh::Ticket::Follower(_) => panic!("expected to lead"),
        }

        assert!(handle.render().contains("outcome=\"interrupted\""));
    }
}
