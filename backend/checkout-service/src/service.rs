//! Outbound request execution: a shared reqwest client plus the generic
//! processing step that drives a connector flow end to end.

use std::time::Duration;

use common_utils::{
    errors::CustomResult,
    request::{Method, Request, RequestContent},
    types::Response,
    Maskable,
};
use domain_types::{
    errors::{ApiClientError, ConnectorError},
    router_data_v2::RouterDataV2,
    types::Proxy,
};
use error_stack::{report, ResultExt};
use interfaces::connector_integration_v2::BoxedConnectorIntegrationV2;

pub fn create_client(
    proxy: &Proxy,
    timeout: Duration,
) -> CustomResult<reqwest::Client, ApiClientError> {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout);

    if let Some(url) = proxy.http_url.as_deref() {
        builder = builder.proxy(
            reqwest::Proxy::http(url).change_context(ApiClientError::ClientConstructionFailed)?,
        );
    }
    if let Some(url) = proxy.https_url.as_deref() {
        builder = builder.proxy(
            reqwest::Proxy::https(url).change_context(ApiClientError::ClientConstructionFailed)?,
        );
    }

    builder
        .build()
        .change_context(ApiClientError::ClientConstructionFailed)
}

fn construct_header_map(
    headers: common_utils::request::Headers,
) -> CustomResult<reqwest::header::HeaderMap, ApiClientError> {
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

    headers.into_iter().try_fold(
        HeaderMap::new(),
        |mut header_map, (header_name, header_value)| {
            let header_name = HeaderName::from_bytes(header_name.as_bytes())
                .change_context(ApiClientError::HeaderMapConstructionFailed)?;
            let masked = matches!(header_value, Maskable::Masked(_));
            let mut header_value = HeaderValue::from_str(&header_value.into_inner())
                .change_context(ApiClientError::HeaderMapConstructionFailed)?;
            header_value.set_sensitive(masked);
            header_map.append(header_name, header_value);
            Ok(header_map)
        },
    )
}

/// Send one request to the gateway. `Ok(Ok)` is a 2xx response, `Ok(Err)`
/// carries the error response body for the connector to interpret. No
/// retries; cancellation propagates by dropping the returned future.
pub async fn call_connector_api(
    client: &reqwest::Client,
    request: Request,
) -> CustomResult<Result<Response, Response>, ApiClientError> {
    let url =
        reqwest::Url::parse(&request.url).change_context(ApiClientError::UrlEncodingFailed)?;

    let headers = construct_header_map(request.headers)?;

    let request_builder = match request.method {
        Method::Get => client.get(url),
        Method::Post => client.post(url),
        Method::Put => client.put(url),
        Method::Delete => client.delete(url),
        Method::Patch => client.patch(url),
    };
    let request_builder = match request.body {
        Some(RequestContent::Json(payload)) => request_builder.json(&payload),
        Some(RequestContent::RawBytes(bytes)) => request_builder.body(bytes),
        None => request_builder,
    };

    let response = request_builder
        .headers(headers)
        .send()
        .await
        .map_err(|error| {
            if error.is_timeout() {
                report!(ApiClientError::RequestTimeoutReceived)
            } else {
                report!(ApiClientError::RequestNotSent(error.to_string()))
            }
        })?;

    let status_code = response.status().as_u16();
    let headers = Some(response.headers().to_owned());
    let body = response
        .bytes()
        .await
        .change_context(ApiClientError::ResponseDecodingFailed)?;

    let response = Response {
        headers,
        response: body,
        status_code,
    };
    if (200..300).contains(&status_code) {
        Ok(Ok(response))
    } else {
        Ok(Err(response))
    }
}

/// Drive one connector flow: build the request, send it, and hand the
/// response (success or error body) back to the connector for
/// interpretation.
#[tracing::instrument(
    skip_all,
    fields(
        connector = connector_name,
        request.url = tracing::field::Empty,
        request.method = tracing::field::Empty,
        response.status_code = tracing::field::Empty,
        latency = tracing::field::Empty,
    )
)]
pub async fn execute_connector_processing_step<F, ResourceCommonData, Req, Resp>(
    client: &reqwest::Client,
    connector: BoxedConnectorIntegrationV2<'_, F, ResourceCommonData, Req, Resp>,
    router_data: RouterDataV2<F, ResourceCommonData, Req, Resp>,
    connector_name: &str,
) -> CustomResult<RouterDataV2<F, ResourceCommonData, Req, Resp>, ConnectorError>
where
    F: Clone,
    ResourceCommonData: Clone,
    Req: Clone + std::fmt::Debug,
    Resp: Clone + std::fmt::Debug,
{
    let start = tokio::time::Instant::now();
    let connector_request = connector.build_request_v2(&router_data)?;

    let result = match connector_request {
        Some(request) => {
            tracing::Span::current().record("request.url", tracing::field::display(&request.url));
            tracing::Span::current()
                .record("request.method", tracing::field::display(request.method));

            let response = call_connector_api(client, request)
                .await
                .change_context(ConnectorError::RequestEncodingFailed)?;

            match response {
                Ok(body) => {
                    tracing::Span::current()
                        .record("response.status_code", u64::from(body.status_code));
                    connector.handle_response_v2(&router_data, body)?
                }
                Err(body) => {
                    tracing::Span::current()
                        .record("response.status_code", u64::from(body.status_code));
                    let error = if body.status_code >= 500 {
                        connector.get_5xx_error_response(body)?
                    } else {
                        connector.get_error_response_v2(body)?
                    };
                    router_data.set_response(Err(error))
                }
            }
        }
        None => router_data,
    };

    tracing::Span::current().record("latency", start.elapsed().as_millis() as u64);
    Ok(result)
}
