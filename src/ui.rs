// src/ui.rs
use crate::config::SimConfig; // JSON request body, validated into a Simulation
use crate::export::write_log; // Text log writer for the export route
use crate::logic::Trajectory; // Recorded run
use crate::math::total_energy; // Energy diagnostic
use actix_web::{error, web, HttpResponse, Result}; // Actix-web types for request handling and HTTP responses
use base64::{engine::general_purpose, Engine as _}; // Base64 encoder for embedding image data
use image::ImageFormat; // Image encoding utilities for PNG output
use plotters::prelude::*; // Plotters plotting library prelude
use serde::Serialize; // JSON serialization of responses
use std::io::{self, Cursor}; // IO utilities and Cursor for in-memory byte writing
use tracing::{info, warn};

/// Image width in pixels
const W: u32 = 500;

/// Image height in pixels
const H: u32 = 500;

#[derive(Serialize)]
pub struct SimResponse {
    pub success: bool,              // Whether the simulation ran
    pub error: Option<String>,      // Validation message when it did not
    pub trajectory_image: String,   // Base64-encoded PNG image of trajectories
    pub animation_data: AnimationData, // Raw position data for frontend animation
    pub energy_drift: Option<f64>,  // Relative energy change over the run; None if it diverged
}

#[derive(Serialize, Default)]
pub struct AnimationData {
    pub positions: Vec<[f64; 4]>, // Positions over time: [x1, y1, x2, y2]
    pub limit: f64,               // Plot boundary limit for consistent scaling
    pub diverged_at: Option<usize>, // Step where the state went non-finite
}

impl SimResponse {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
            trajectory_image: String::new(),
            animation_data: AnimationData::default(),
            energy_drift: None,
        }
    }
}

/// Registers the simulation routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/simulate", web::post().to(simulate_handler))
        .route("/export", web::post().to(export_handler));
}

/// Runs the simulation on the blocking pool so async workers stay responsive.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(error::ErrorInternalServerError)
}

pub async fn simulate_handler(config: web::Json<SimConfig>) -> Result<HttpResponse> {
    let config = config.into_inner();
    let response = run_blocking(move || simulate(&config)).await??;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn export_handler(config: web::Json<SimConfig>) -> Result<HttpResponse> {
    let config = config.into_inner();
    let mut sim = match config.build() {
        Ok(sim) => sim,
        Err(e) => {
            warn!(error = %e, "Rejected export request");
            return Ok(HttpResponse::BadRequest().body(e.to_string()));
        }
    };
    let steps = config.steps;
    let log = run_blocking(move || {
        let trajectory = sim.run(steps);
        let mut buffer = Vec::new();
        write_log(&mut buffer, &trajectory).map(|_| buffer)
    })
    .await?
    .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(log))
}

/// Builds, runs and renders one simulation. Invalid configurations become a failed response,
/// rendering problems an I/O error.
fn simulate(config: &SimConfig) -> io::Result<SimResponse> {
    let mut sim = match config.build() {
        Ok(sim) => sim,
        Err(e) => {
            warn!(error = %e, "Rejected simulation request");
            return Ok(SimResponse::failure(e.to_string()));
        }
    };

    let initial_energy = total_energy(sim.params(), sim.state());
    let trajectory = sim.run(config.steps);

    // Drift is only meaningful while the state is still finite
    let energy_drift = trajectory.diverged_at.is_none().then(|| {
        let change = (total_energy(sim.params(), sim.state()) - initial_energy).abs();
        if initial_energy.abs() > 1e-12 {
            change / initial_energy.abs()
        } else {
            change
        }
    });

    // Define plot limits with padding
    let limit = sim.params().total_length() * 1.05;

    let positions: Vec<[f64; 4]> = trajectory
        .snapshots
        .iter()
        .map(|s| [s.x1, s.y1, s.x2, s.y2])
        .collect();

    let plot_url = render_plot(&trajectory, limit)?;

    info!(
        recorded = trajectory.len(),
        diverged_at = ?trajectory.diverged_at,
        "Simulation request served"
    );

    Ok(SimResponse {
        success: true,
        error: None,
        trajectory_image: plot_url,
        animation_data: AnimationData {
            positions,
            limit,
            diverged_at: trajectory.diverged_at,
        },
        energy_drift,
    })
}

/// Draws both mass paths and returns them as a PNG data URL.
/// No text is drawn, so rendering does not depend on system fonts.
fn render_plot(trajectory: &Trajectory, limit: f64) -> io::Result<String> {
    // W x H canvas, RGB8
    let mut pixel_buffer = vec![0u8; (W * H * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut pixel_buffer, (W, H)).into_drawing_area();

        root.fill(&WHITE).map_err(io::Error::other)?;

        // Centred on the pivot; the pendulum's reach plus padding in every direction
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(-limit..limit, -limit..limit)
            .map_err(io::Error::other)?;

        // y grows downward in pendulum coordinates; flip it so the pendulum hangs down
        let inner = trajectory.snapshots.iter().map(|s| (s.x1, -s.y1));
        let outer = trajectory.snapshots.iter().map(|s| (s.x2, -s.y2));

        chart
            .draw_series(LineSeries::new(inner, BLUE.mix(0.75).stroke_width(1)))
            .map_err(io::Error::other)?;
        chart
            .draw_series(LineSeries::new(outer, RED.mix(0.75).stroke_width(1)))
            .map_err(io::Error::other)?;

        // Pivot marker at the origin
        chart
            .draw_series(std::iter::once(Circle::new((0.0, 0.0), 3, BLACK.filled())))
            .map_err(io::Error::other)?;

        root.present().map_err(io::Error::other)?;
    }

    let img_buffer = image::ImageBuffer::from_raw(W, H, pixel_buffer)
        .ok_or_else(|| io::Error::other("Failed to create image buffer"))?;

    let mut png_buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img_buffer)
        .write_to(&mut png_buffer, ImageFormat::Png)
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png_buffer.into_inner())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::Method;

    #[test]
    fn test_simulate_success() {
        let config = SimConfig {
            steps: 50,
            ..SimConfig::default()
        };
        let response = simulate(&config).unwrap();
        assert!(response.success);
        assert!(response.error.is_none());
        assert!(response.trajectory_image.starts_with("data:image/png;base64,"));
        assert_eq!(response.animation_data.positions.len(), 51);
        assert!(response.animation_data.limit > 250.0);
        assert!(response.energy_drift.unwrap() < 1e-3);
    }

    #[test]
    fn test_render_plot_produces_png_of_canvas_size() {
        let mut sim = SimConfig {
            steps: 10,
            ..SimConfig::default()
        }
        .build()
        .unwrap();
        let trajectory = sim.run(10);
        let url = render_plot(&trajectory, 300.0).unwrap();
        let bytes = general_purpose::STANDARD
            .decode(url.trim_start_matches("data:image/png;base64,"))
            .unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (W, H));
    }

    #[test]
    fn test_simulate_rejects_bad_config() {
        let config = SimConfig {
            length1: 0.0,
            ..SimConfig::default()
        };
        let response = simulate(&config).unwrap();
        assert!(!response.success);
        assert!(response.error.unwrap().contains("length1"));
        assert!(response.animation_data.positions.is_empty());
    }

    #[test]
    fn test_simulate_reports_divergence() {
        let config = SimConfig {
            method: Method::Euler,
            time_step: 5.0,
            steps: 10_000,
            ..SimConfig::default()
        };
        let response = simulate(&config).unwrap();
        assert!(response.success);
        let diverged_at = response.animation_data.diverged_at.unwrap();
        assert_eq!(response.animation_data.positions.len(), diverged_at);
        assert!(response.energy_drift.is_none());
    }
}
