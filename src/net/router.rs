//! Request dispatch.
//!
//! | Method & path              | Response                            |
//! |----------------------------|-------------------------------------|
//! | `GET /json`                | latest reading                      |
//! | `GET /config`              | limits and offsets                  |
//! | `POST /cfg`                | apply form update, report per field |
//! | `GET /`, `GET /index.html` | dashboard page                      |
//! | anything else              | 404                                 |

use log::{info, warn};
use serde::Serialize;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::config::{ConfigField, one_decimal};
use crate::state::{AppContext, SensorReading};

use super::config_update::{UpdateReport, apply_update};
use super::dashboard;
use super::request::{Method, Request};
use super::response::{Response, Status};

/// `GET /json` body. Field names are the ones the dashboard plots.
#[derive(Debug, Serialize)]
struct ReadingBody {
    #[serde(serialize_with = "one_decimal")]
    temp_aht20: f32,
    #[serde(serialize_with = "one_decimal")]
    hum_aht20: f32,
    #[serde(serialize_with = "one_decimal")]
    press_bmp280: f32,
}

impl From<SensorReading> for ReadingBody {
    fn from(r: SensorReading) -> Self {
        Self { temp_aht20: r.temperature, hum_aht20: r.humidity, press_bmp280: r.pressure }
    }
}

#[derive(Debug, Serialize)]
struct Unavailable {
    status: &'static str,
    message: &'static str,
}

fn unavailable() -> Response {
    Response::json(Status::ServiceUnavailable, &Unavailable { status: "error", message: "State busy, retry" })
}

pub fn route<E: EventSink>(req: &Request<'_>, ctx: &AppContext, sink: &mut E) -> Response {
    match (req.method, req.path) {
        (Method::Get, "/json") => match ctx.reading.snapshot() {
            Ok(r) => Response::json(Status::Ok, &ReadingBody::from(r)),
            Err(e) => {
                warn!("HTTP | /json: {}", e);
                unavailable()
            }
        },
        (Method::Get, "/config") => match ctx.limits.snapshot() {
            Ok(l) => Response::json(Status::Ok, &l),
            Err(e) => {
                warn!("HTTP | /config: {}", e);
                unavailable()
            }
        },
        (Method::Post, "/cfg") => update_config(req.body, ctx, sink),
        (Method::Get, "/" | "/index.html") => Response::html(dashboard::PAGE),
        _ => Response::not_found(),
    }
}

fn update_config<E: EventSink>(body: &[u8], ctx: &AppContext, sink: &mut E) -> Response {
    let Ok(body) = core::str::from_utf8(body) else {
        return UpdateReport::failed("Malformed body").into_response();
    };

    // All pairs go in under one acquisition.
    let report = match ctx.limits.lock() {
        Ok(mut limits) => {
            let report = apply_update(&mut limits, body);
            if report.applied_any() {
                let l = *limits;
                info!(
                    "CONFIG | T {:.1}..{:.1} H {:.1}..{:.1} P {:.1}..{:.1} offsets {:.1}/{:.1}/{:.1}",
                    l.temp_min,
                    l.temp_max,
                    l.hum_min,
                    l.hum_max,
                    l.press_min,
                    l.press_max,
                    l.temp_offset,
                    l.hum_offset,
                    l.press_offset
                );
            }
            report
        }
        Err(e) => {
            warn!("CONFIG | update refused: {}", e);
            return Response::json(Status::ServiceUnavailable, &UpdateReport::failed("Configuration busy, retry"));
        }
    };

    for applied in &report.updates {
        if let Some(field) = ConfigField::from_key(applied.field) {
            sink.emit(&AppEvent::ConfigApplied { field, value: applied.value });
        }
    }
    for rejected in &report.errors {
        info!("CONFIG | {} rejected: {}", rejected.field, rejected.error);
    }
    report.into_response()
}
