use crate::dashboard::Dashboard;
use crate::motors::MotorAxis;
use crate::robot_agent::AgentHandle;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Status;
use rocket::serde::{json::Json, Serialize};
use rocket::{get, routes, State};
use std::sync::Arc;
use tracing::error;

/// API Response
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct ApiResponse {
    status: String,
    message: String,
}

/// One motor readout line of the dashboard
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct MotorReadout {
    axis: &'static str,
    angle: Option<f32>,
}

/// Connection and readiness line of the dashboard
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct StatusResponse {
    connection: String,
    readiness: String,
    hardware: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
struct LogResponse {
    lines: Vec<String>,
}

/// CORS Fairing for Rocket
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        res.set_header(rocket::http::Header::new("Access-Control-Allow-Origin", "*"));
        res.set_header(rocket::http::Header::new("Access-Control-Allow-Methods", "GET"));
        res.set_header(rocket::http::Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type",
        ));
    }
}

/// Root handler
#[get("/")]
fn root_handler() -> Json<ApiResponse> {
    Json(ApiResponse {
        status: "success".to_string(),
        message: "MotorFlux dashboard".to_string(),
    })
}

/// All ten axis readouts in display order
#[get("/motors")]
async fn motor_readouts(dashboard: &State<Arc<Dashboard>>) -> Json<Vec<MotorReadout>> {
    let snapshot = dashboard.snapshot().await;
    Json(
        snapshot
            .into_iter()
            .map(|(axis, angle)| MotorReadout {
                axis: axis.name(),
                angle,
            })
            .collect(),
    )
}

/// A single axis readout; 404 for names outside the motor table
#[get("/motors/<axis>")]
async fn motor_readout(
    axis: String,
    dashboard: &State<Arc<Dashboard>>,
) -> Result<Json<MotorReadout>, Status> {
    let Some(axis) = MotorAxis::from_name(&axis) else {
        return Err(Status::NotFound);
    };
    Ok(Json(MotorReadout {
        axis: axis.name(),
        angle: dashboard.angle(axis).await,
    }))
}

/// The most recent log panel lines
#[get("/log?<limit>")]
async fn recent_log(limit: Option<usize>, dashboard: &State<Arc<Dashboard>>) -> Json<LogResponse> {
    Json(LogResponse {
        lines: dashboard.recent_log(limit.unwrap_or(50)).await,
    })
}

#[get("/status")]
async fn service_status(
    dashboard: &State<Arc<Dashboard>>,
    agent: &State<Arc<AgentHandle>>,
) -> Json<StatusResponse> {
    Json(StatusResponse {
        connection: dashboard.connection().await.to_string(),
        readiness: agent.readiness().to_string(),
        hardware: agent.hardware_live(),
    })
}

/// Run the Rocket server backing the dashboard
pub async fn run_rest_server(dashboard: Arc<Dashboard>, agent: Arc<AgentHandle>, port: u16) {
    let figment = rocket::Config::figment().merge(("port", port));
    if let Err(e) = rocket::custom(figment)
        .manage(dashboard)
        .manage(agent)
        .mount(
            "/",
            routes![root_handler, motor_readouts, motor_readout, recent_log, service_status],
        )
        .attach(Cors)
        .launch()
        .await
    {
        error!("Dashboard server terminated: {:?}", e);
    }
}
