use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::form::{
    DEFAULT_INFLATION_RATE, DEFAULT_INITIAL_VALUE, DEFAULT_MONTHLY_CONTRIBUTION,
    DEFAULT_REAL_INTEREST_RATE, DEFAULT_YEARS_TO_RETIREMENT, IntermediateRow, clamp_percentage,
};
pub use crate::core::form::MAX_HORIZON_YEARS;
use crate::core::{
    CalculatorForm, ChartRow, IntermediateContribution, ProjectionInput, ProjectionSummary,
    project,
};
use crate::error::{InputError, InputResult};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound-interest retirement projection (monthly contributions, lump sums, inflation)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculator page and JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print a projection as JSON
    Project(ProjectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[arg(long, default_value_t = DEFAULT_INITIAL_VALUE, help = "Starting balance")]
    pub initial_value: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTHLY_CONTRIBUTION,
        help = "Contribution made at the end of every month"
    )]
    pub monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_REAL_INTEREST_RATE,
        help = "Annual real interest rate in percent, clamped to 0..=100"
    )]
    pub real_interest_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_INFLATION_RATE,
        help = "Annual inflation in percent, clamped to 0..=100"
    )]
    pub inflation_rate: f64,
    #[arg(
        long = "years",
        default_value_t = DEFAULT_YEARS_TO_RETIREMENT,
        help = "Years until retirement; fractions are truncated"
    )]
    pub years_to_retirement: f64,
    #[arg(
        long = "contribution",
        value_name = "YEAR:AMOUNT",
        value_parser = parse_contribution,
        help = "One-off contribution applied at the start of YEAR; repeatable"
    )]
    pub contributions: Vec<IntermediateRow>,
    #[arg(long, help = "Indent the JSON output")]
    pub pretty: bool,
}

/// Parses `YEAR:AMOUNT`, e.g. `5:20000`.
pub fn parse_contribution(raw: &str) -> InputResult<IntermediateRow> {
    let bad = || InputError::ContributionFormat(raw.to_string());
    let (year, amount) = raw.split_once(':').ok_or_else(bad)?;
    let year = year.trim().parse::<f64>().map_err(|_| bad())?;
    let amount = amount.trim().parse::<f64>().map_err(|_| bad())?;
    Ok(IntermediateRow { year, amount })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    initial_value: Option<f64>,
    monthly_contribution: Option<f64>,
    real_interest_rate: Option<f64>,
    inflation_rate: Option<f64>,
    years_to_retirement: Option<f64>,
    intermediate_contributions: Option<Vec<ContributionPayload>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContributionPayload {
    year: f64,
    amount: f64,
}

/// Query-string form of [`ProjectPayload`]; lump sums travel as
/// `contributions=5:20000,10:5000`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectQuery {
    initial_value: Option<f64>,
    monthly_contribution: Option<f64>,
    real_interest_rate: Option<f64>,
    inflation_rate: Option<f64>,
    years_to_retirement: Option<f64>,
    contributions: Option<String>,
}

impl ProjectQuery {
    fn into_payload(self) -> InputResult<ProjectPayload> {
        let intermediate_contributions = match self.contributions.as_deref() {
            None => None,
            Some(list) => Some(
                list.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| {
                        parse_contribution(item).map(|row| ContributionPayload {
                            year: row.year,
                            amount: row.amount,
                        })
                    })
                    .collect::<InputResult<Vec<_>>>()?,
            ),
        };
        Ok(ProjectPayload {
            initial_value: self.initial_value,
            monthly_contribution: self.monthly_contribution,
            real_interest_rate: self.real_interest_rate,
            inflation_rate: self.inflation_rate,
            years_to_retirement: self.years_to_retirement,
            intermediate_contributions,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub input: ProjectionInput,
    pub summary: ProjectionSummary,
    pub years: Vec<ChartRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultsResponse {
    initial_value: f64,
    monthly_contribution: f64,
    real_interest_rate: f64,
    inflation_rate: f64,
    years_to_retirement: f64,
    intermediate_contributions: Vec<IntermediateContribution>,
}

/// Validates flag values and turns them into a form. Percentages are clamped,
/// everything else passes through untouched.
fn build_form(args: ProjectArgs) -> InputResult<CalculatorForm> {
    let scalars = [
        ("initialValue", args.initial_value),
        ("monthlyContribution", args.monthly_contribution),
        ("realInterestRate", args.real_interest_rate),
        ("inflationRate", args.inflation_rate),
        ("yearsToRetirement", args.years_to_retirement),
    ];
    for (field, value) in scalars {
        if !value.is_finite() {
            return Err(InputError::NonFinite { field });
        }
    }
    for row in &args.contributions {
        if !row.year.is_finite() || !row.amount.is_finite() {
            return Err(InputError::NonFinite {
                field: "intermediateContributions",
            });
        }
    }

    if args.years_to_retirement > f64::from(MAX_HORIZON_YEARS) {
        return Err(InputError::HorizonTooLong {
            field: "yearsToRetirement",
            value: args.years_to_retirement,
            max: MAX_HORIZON_YEARS,
        });
    }

    Ok(CalculatorForm {
        initial_value: args.initial_value,
        monthly_contribution: args.monthly_contribution,
        real_interest_rate: clamp_percentage(args.real_interest_rate),
        inflation_rate: clamp_percentage(args.inflation_rate),
        years_to_retirement: args.years_to_retirement,
        intermediate_contributions: args.contributions,
    })
}

fn default_args_for_api() -> ProjectArgs {
    ProjectArgs {
        initial_value: DEFAULT_INITIAL_VALUE,
        monthly_contribution: DEFAULT_MONTHLY_CONTRIBUTION,
        real_interest_rate: DEFAULT_REAL_INTEREST_RATE,
        inflation_rate: DEFAULT_INFLATION_RATE,
        years_to_retirement: DEFAULT_YEARS_TO_RETIREMENT,
        contributions: Vec::new(),
        pretty: false,
    }
}

fn form_from_payload(payload: ProjectPayload) -> InputResult<CalculatorForm> {
    let mut args = default_args_for_api();

    if let Some(v) = payload.initial_value {
        args.initial_value = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.real_interest_rate {
        args.real_interest_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.years_to_retirement {
        args.years_to_retirement = v;
    }
    if let Some(rows) = payload.intermediate_contributions {
        args.contributions = rows
            .into_iter()
            .map(|row| IntermediateRow {
                year: row.year,
                amount: row.amount,
            })
            .collect();
    }

    build_form(args)
}

fn build_project_response(form: &CalculatorForm) -> ProjectResponse {
    let input = form.to_input();
    let projection = project(&input);
    ProjectResponse {
        years: projection.chart_rows(),
        summary: projection.summary,
        input,
    }
}

/// Runs a projection from command-line flags and renders it as JSON.
pub fn project_to_json(args: ProjectArgs) -> InputResult<String> {
    let pretty = args.pretty;
    let form = build_form(args)?;
    let response = build_project_response(&form);
    let json = if pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    };
    json.map_err(|e| InputError::Render(e.to_string()))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    log::info!("projection HTTP API listening on http://{addr}");
    log::info!("local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/api/defaults", get(defaults_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn defaults_handler() -> Response {
    let form = CalculatorForm::default();
    json_response(
        StatusCode::OK,
        DefaultsResponse {
            initial_value: form.initial_value,
            monthly_contribution: form.monthly_contribution,
            real_interest_rate: form.real_interest_rate,
            inflation_rate: form.inflation_rate,
            years_to_retirement: form.years_to_retirement,
            intermediate_contributions: Vec::new(),
        },
    )
}

async fn project_get_handler(query: Result<Query<ProjectQuery>, QueryRejection>) -> Response {
    let payload = query
        .map_err(|rejection| InputError::Payload(rejection.body_text()))
        .and_then(|Query(query)| query.into_payload());
    match payload {
        Ok(payload) => project_handler_impl(payload),
        Err(err) => with_cache_control(err),
    }
}

async fn project_post_handler(payload: Result<Json<ProjectPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(payload),
        Err(rejection) => with_cache_control(InputError::Payload(rejection.body_text())),
    }
}

fn project_handler_impl(payload: ProjectPayload) -> Response {
    log::debug!("projection request: {payload:?}");
    let form = match form_from_payload(payload) {
        Ok(form) => form,
        Err(err) => return with_cache_control(err),
    };

    let response = build_project_response(&form);
    log::debug!(
        "projected {} years, final nominal {:.2}",
        response.years.len(),
        response.summary.final_nominal_value
    );
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(status, serde_json::json!({ "error": msg }))
}

#[cfg(test)]
fn form_from_json(json: &str) -> InputResult<CalculatorForm> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| InputError::Payload(e.to_string()))?;
    form_from_payload(payload)
}
