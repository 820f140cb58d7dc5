//! JSON API over hyper.
//!
//! - `GET /health`
//! - `POST /charts` casts and stores a natal chart
//! - `POST /transits` returns transits, plus an interpretation when a
//!   question is given

use chrono::{DateTime, NaiveDateTime, Utc};
use hermes::{
    local_to_utc, Dialect, Locale, LocationError, LocationResolver, Oracle, OracleError, Reading,
    StoreError, Voice,
};
use hyper::service::{make_service_fn, service_fn};
use hyper::{header, Body, Method, Request, Response, Server, StatusCode};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use urania::{BirthData, EphemerisProvider, GeoLocation};

const MAX_BODY_BYTES: usize = 64 * 1024;

pub struct ApiState<P> {
    pub oracle: Arc<Oracle<P>>,
    pub resolver: Arc<dyn LocationResolver>,
}

/// Birth data either as an exact UTC instant and coordinates, or as local
/// wall-clock time and a place name to look up.
#[derive(Debug, Deserialize)]
struct ChartRequest {
    user_id: String,
    #[serde(default)]
    instant: Option<DateTime<Utc>>,
    #[serde(default)]
    location: Option<GeoLocation>,
    #[serde(default)]
    local_time: Option<NaiveDateTime>,
    #[serde(default)]
    place: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransitRequest {
    user_id: String,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    locale: Option<Locale>,
    #[serde(default)]
    dialect: Option<Dialect>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<OracleError> for ApiError {
    fn from(e: OracleError) -> Self {
        let status = match &e {
            OracleError::ChartNotFound(_) => StatusCode::NOT_FOUND,
            OracleError::Transit(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OracleError::Store(StoreError::InvalidUserId(_)) => StatusCode::BAD_REQUEST,
            OracleError::Store(_) | OracleError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OracleError::Ephemeris(_) | OracleError::Narrative(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

impl From<LocationError> for ApiError {
    fn from(e: LocationError) -> Self {
        let status = match &e {
            LocationError::NotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LocationError::Http(_) | LocationError::Malformed(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

pub async fn serve<P, F>(addr: SocketAddr, state: Arc<ApiState<P>>, shutdown: F) -> anyhow::Result<()>
where
    P: EphemerisProvider + 'static,
    F: Future<Output = ()>,
{
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(route(&state, req).await) }
            }))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    log::info!("http: listening on {}", server.local_addr());
    server.with_graceful_shutdown(shutdown).await?;
    log::info!("http: stopped");
    Ok(())
}

pub async fn route<P: EphemerisProvider + 'static>(state: &ApiState<P>, req: Request<Body>) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result = match (&method, path.as_str()) {
        (&Method::GET, "/health") => Ok(json_response(
            StatusCode::OK,
            &serde_json::json!({ "status": "ok" }),
        )),
        (&Method::POST, "/charts") => create_chart(state, req).await,
        (&Method::POST, "/transits") => transits(state, req).await,
        (_, "/health" | "/charts" | "/transits") => Err(ApiError::new(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("{method} not allowed on {path}"),
        )),
        _ => Err(ApiError::new(StatusCode::NOT_FOUND, format!("no route for {path}"))),
    };

    match result {
        Ok(rsp) => {
            log::debug!("{method} {path} -> {}", rsp.status());
            rsp
        }
        Err(e) => {
            if e.status.is_server_error() {
                log::error!("{method} {path} -> {}: {}", e.status, e.message);
            } else {
                log::info!("{method} {path} -> {}: {}", e.status, e.message);
            }
            json_response(e.status, &ErrorBody { error: e.message })
        }
    }
}

async fn create_chart<P: EphemerisProvider + 'static>(
    state: &ApiState<P>,
    req: Request<Body>,
) -> Result<Response<Body>, ApiError> {
    let body: ChartRequest = read_json(req).await?;

    let birth = match (body.instant, body.location, body.local_time, body.place) {
        (Some(instant), Some(location), _, place) => BirthData {
            instant,
            location,
            place_name: place,
        },
        (_, _, Some(local), Some(place)) => {
            let resolved = state.resolver.resolve(&place).await?;
            let instant = local_to_utc(local, resolved.utc_offset_minutes).ok_or_else(|| {
                ApiError::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "local_time cannot be placed at the resolved UTC offset",
                )
            })?;
            BirthData {
                instant,
                location: resolved.location,
                place_name: Some(resolved.name),
            }
        }
        _ => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "provide either instant and location, or local_time and place",
            ))
        }
    };

    let chart = state.oracle.create_chart(&body.user_id, &birth).await?;
    Ok(json_response(StatusCode::CREATED, &chart))
}

async fn transits<P: EphemerisProvider + 'static>(
    state: &ApiState<P>,
    req: Request<Body>,
) -> Result<Response<Body>, ApiError> {
    let body: TransitRequest = read_json(req).await?;

    let reading = match body.question.as_deref().map(str::trim) {
        Some(question) if !question.is_empty() => {
            let voice = Voice::new(body.locale.unwrap_or_default(), body.dialect);
            state.oracle.interpret(&body.user_id, question, voice).await?
        }
        _ => Reading {
            transits: state.oracle.transits(&body.user_id).await?,
            interpretation: None,
        },
    };
    Ok(json_response(StatusCode::OK, &reading))
}

async fn read_json<T: serde::de::DeserializeOwned>(req: Request<Body>) -> Result<T, ApiError> {
    let bytes = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("could not read body: {e}")))?;
    if bytes.len() > MAX_BODY_BYTES {
        return Err(ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("body exceeds {MAX_BODY_BYTES} bytes"),
        ));
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}")))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .unwrap_or_else(|_| Response::new(Body::empty())),
        Err(e) => {
            log::error!("http: could not serialize response: {e}");
            let mut rsp = Response::new(Body::from("{\"error\":\"serialization failed\"}"));
            *rsp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            rsp
        }
    }
}
