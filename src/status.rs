//! HTTP status server
//!
//! Read-only view of the shared map plus the credential form handler:
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | HTML page with an SVG plot around the robot |
//! | `GET /snapshot` | [`MapSnapshot`] as JSON |
//! | `GET\|POST /wifi?ssid=..&password=..` | plain-text outcome of the join attempt |
//!
//! Served with axum on a single-threaded runtime owned by the `status-server`
//! thread. The navigation cycle is never blocked by a slow client: the only
//! shared state touched is [`SharedMap::snapshot`]. Credential submissions
//! poll the radio for seconds, so they run on tokio's blocking pool while the
//! page and snapshot keep being served.

use std::fmt::Write as _;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::error::Result;
use crate::network::NetworkManager;
use crate::shared::{MapSnapshot, SharedMap};
use crate::types::RangeReading;

/// Plot size (px)
const CANVAS_PX: f32 = 400.0;
/// Distance shown at the plot edge (mm)
const PLOT_RADIUS_MM: f32 = 2000.0;

/// How often the server checks `running` for shutdown
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Shared handle for credential submissions
pub type SharedNetwork = Arc<Mutex<NetworkManager>>;

#[derive(Clone)]
struct AppState {
    map: Arc<SharedMap>,
    network: Option<SharedNetwork>,
}

/// `/wifi` parameters, from the query string or a urlencoded form body
#[derive(Debug, Default, Deserialize)]
struct WifiForm {
    ssid: Option<String>,
    password: Option<String>,
}

impl WifiForm {
    /// Form body fields win over query fields
    fn merge(self, body: &[u8]) -> Self {
        let mut form = self;
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "ssid" => form.ssid = Some(value.into_owned()),
                "password" => form.password = Some(value.into_owned()),
                _ => {}
            }
        }
        form
    }
}

/// Running status server
pub struct StatusServer {
    local_addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl StatusServer {
    /// Bind `bind_address` and serve on a dedicated thread until `running`
    /// is cleared.
    pub fn start(
        bind_address: &str,
        map: Arc<SharedMap>,
        network: Option<SharedNetwork>,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(bind_address)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let app = router(map, network);

        let handle = thread::Builder::new()
            .name("status-server".to_string())
            .spawn(move || runtime.block_on(serve(listener, app, running)))?;

        log::info!("Status page at http://{}/", local_addr);
        Ok(Self {
            local_addr,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the server thread to exit (after `running` was cleared)
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Status server thread panicked");
            }
        }
    }
}

/// Routes of the status server
pub fn router(map: Arc<SharedMap>, network: Option<SharedNetwork>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/snapshot", get(snapshot))
        .route("/wifi", get(wifi_query).post(wifi_form))
        .fallback(not_found)
        .with_state(AppState { map, network })
}

async fn serve(listener: TcpListener, app: Router, running: Arc<AtomicBool>) {
    let listener = match tokio::net::TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Status server could not register its listener: {}", e);
            return;
        }
    };

    let shutdown = async move {
        while running.load(Ordering::Relaxed) {
            tokio::time::sleep(SHUTDOWN_POLL).await;
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        log::error!("Status server error: {}", e);
    }
    log::info!("Status server stopped");
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.map.snapshot()))
}

async fn snapshot(State(state): State<AppState>) -> Json<MapSnapshot> {
    Json(state.map.snapshot())
}

async fn wifi_query(State(state): State<AppState>, Query(form): Query<WifiForm>) -> Response {
    submit(state.network, form).await
}

async fn wifi_form(
    State(state): State<AppState>,
    Query(query): Query<WifiForm>,
    body: Bytes,
) -> Response {
    submit(state.network, query.merge(&body)).await
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

async fn submit(network: Option<SharedNetwork>, form: WifiForm) -> Response {
    let Some(ssid) = form.ssid.filter(|s| !s.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing ssid").into_response();
    };
    let Some(network) = network else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Networking unavailable").into_response();
    };
    let password = form.password.unwrap_or_default();

    // Holds the network lock for the whole join attempt
    let outcome =
        tokio::task::spawn_blocking(move || network.lock().submit_credentials(&ssid, &password))
            .await;

    match outcome {
        Ok(Ok(true)) => (StatusCode::OK, "Connection established").into_response(),
        Ok(Ok(false)) => (StatusCode::OK, "Connection not established").into_response(),
        Ok(Err(e)) => {
            log::warn!("Credential submission failed: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
        Err(e) => {
            log::error!("Credential submission task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Submission failed").into_response()
        }
    }
}

/// Map a world point to plot pixels, centred on the robot, +Y up
fn to_canvas(snapshot: &MapSnapshot, x: f32, y: f32) -> (f32, f32) {
    let center = CANVAS_PX / 2.0;
    let scale = center / PLOT_RADIUS_MM;
    (
        center + (x - snapshot.pose.x) * scale,
        center - (y - snapshot.pose.y) * scale,
    )
}

/// Render the status page
pub fn render_page(snapshot: &MapSnapshot) -> String {
    let center = CANVAS_PX / 2.0;
    let mut svg = String::new();

    // Range rings every 500 mm and the heading marker
    let _ = write!(
        svg,
        "<svg width='{0}' height='{0}' viewBox='0 0 {0} {0}' style='background:#000;border-radius:50%'>",
        CANVAS_PX
    );
    for ring in 1..=4 {
        let r = center * ring as f32 / 4.0;
        let _ = write!(
            svg,
            "<circle cx='{c}' cy='{c}' r='{r:.1}' fill='none' stroke='#333'/>",
            c = center
        );
    }
    let heading = snapshot.pose.heading_deg.to_radians();
    let _ = write!(
        svg,
        "<line x1='{c}' y1='{c}' x2='{:.1}' y2='{:.1}' stroke='#0077cc' stroke-width='2'/>",
        center + 20.0 * heading.cos(),
        center - 20.0 * heading.sin(),
        c = center
    );
    let _ = write!(
        svg,
        "<circle cx='{c}' cy='{c}' r='6' fill='#0f0'/>",
        c = center
    );

    for point in &snapshot.obstacles {
        let (px, py) = to_canvas(snapshot, point.world_x, point.world_y);
        let _ = write!(svg, "<circle cx='{:.1}' cy='{:.1}' r='3' fill='#f00'/>", px, py);
    }
    svg.push_str("</svg>");

    let last = match snapshot.last_reading {
        Some(last) => match last.reading {
            RangeReading::Distance(mm) => format!("{:.0}° at {} mm", last.angle_deg, mm),
            RangeReading::Timeout => format!("{:.0}°, sensor timeout", last.angle_deg),
        },
        None => "none yet".to_string(),
    };

    format!(
        "<!DOCTYPE html><html><head><meta charset='UTF-8'><title>Disha robot</title>\
<style>body{{font-family:Arial,sans-serif;background:#f0f0f0;text-align:center;padding:40px}}\
.card{{background:#fff;border-radius:10px;display:inline-block;padding:30px 50px}}</style></head>\
<body><div class='card'><h1>Surroundings</h1>{svg}\
<p><b>{count}</b> obstacles ({evicted} dropped, capacity {capacity})</p>\
<p>Last reading: {last}</p>\
<p>Pose: X={x:.1} Y={y:.1} heading={h:.1}°</p>\
<p>Phase: {phase:?}, cycle {cycle}</p>\
<form action='/wifi' method='post'><input name='ssid' placeholder='SSID'> \
<input name='password' type='password' placeholder='Password'> <button>Join</button></form>\
</div></body></html>",
        svg = svg,
        count = snapshot.obstacle_count,
        evicted = snapshot.evicted,
        capacity = snapshot.capacity,
        last = last,
        x = snapshot.pose.x,
        y = snapshot.pose.y,
        h = snapshot.pose.heading_deg,
        phase = snapshot.phase,
        cycle = snapshot.cycle,
    )
}
