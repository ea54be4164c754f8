mod viewer;

use anyhow::Result;
use nifti_label_viewer::ViewerConfig;
use viewer::LabelViewer;

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use eframe::egui;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::HtmlCanvasElement;

/// Browse the labels of a NIfTI segmentation in three orthogonal views
#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Label volume (.nii or .nii.gz) to open on startup
    path: Option<PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = ViewerConfig::default();
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_title(config.window_title.as_str()),
        ..Default::default()
    };
    let title = config.window_title.clone();
    let mut app = LabelViewer::new(config);
    if let Some(path) = args.path {
        app.load_from_path(&path);
    }
    eframe::run_native(
        &title,
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

#[cfg(target_arch = "wasm32")]
fn main() -> Result<()> {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    let app = LabelViewer::new(ViewerConfig::default());
    let web_options = eframe::WebOptions::default();
    let canvas: HtmlCanvasElement = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id("canvas_render"))
        .and_then(|element| element.dyn_into().ok())
        .ok_or_else(|| anyhow::anyhow!("canvas_render element not found"))?;
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = eframe::WebRunner::new()
            .start(canvas, web_options, Box::new(|_cc| Ok(Box::new(app))))
            .await
        {
            log::error!("failed to start eframe web app: {e:?}");
        }
    });
    Ok(())
}
