use std::path::PathBuf;

use crate::loader::LoadOptions;
use crate::render::{Palette, RenderMode};

/// Settings for the viewer window and the files it opens.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub window_title: String,
    pub window_size: [f32; 2],
    pub control_panel_width: f32,
    /// Accumulated wheel delta that advances one slice
    pub scroll_step: f32,
    pub initial_dir: PathBuf,
    pub file_filter_name: String,
    pub file_extensions: Vec<String>,
    pub palette: Palette,
    pub render_mode: RenderMode,
    pub load: LoadOptions,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_title: "NIfTI Label Viewer".to_string(),
            window_size: [1000.0, 650.0],
            control_panel_width: 200.0,
            scroll_step: 30.0,
            initial_dir: PathBuf::from("./data"),
            file_filter_name: "NIfTI".to_string(),
            file_extensions: vec!["nii".to_string(), "gz".to_string()],
            palette: Palette::default(),
            render_mode: RenderMode::default(),
            load: LoadOptions::default(),
        }
    }
}
