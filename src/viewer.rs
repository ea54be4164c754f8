use eframe::egui;
use nifti_label_viewer::render::render_slice;
use nifti_label_viewer::{
    LoadOptions, PerAxis, RenderMode, ViewAxis, ViewerConfig, VolumeLabelModel,
};
use std::path::Path;

#[cfg(target_arch = "wasm32")]
use js_sys::Uint8Array;
#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::{Event, FileReader, HtmlInputElement};

pub struct LabelViewer {
    model: VolumeLabelModel,
    config: ViewerConfig,
    file_name: Option<String>,
    render_mode: RenderMode,
    reorient_to_ras: bool,
    scroll_accum: PerAxis<f32>,
    error_msg: Option<String>,
}

impl LabelViewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            model: VolumeLabelModel::with_options(config.load),
            render_mode: config.render_mode,
            reorient_to_ras: config.load.reorient_to_ras,
            config,
            file_name: None,
            scroll_accum: PerAxis::default(),
            error_msg: None,
        }
    }

    fn sync_load_options(&mut self) {
        self.model.set_load_options(LoadOptions {
            reorient_to_ras: self.reorient_to_ras,
        });
    }

    pub fn load_from_path(&mut self, path: &Path) {
        self.sync_load_options();
        match self.model.load(path) {
            Ok(_) => {
                self.file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                self.scroll_accum = PerAxis::default();
                self.error_msg = None;
                self.focus_first_label();
            }
            Err(e) => {
                self.error_msg = Some(format!("Failed to load: {e}"));
            }
        }
    }

    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    pub fn load_from_bytes(&mut self, bytes: &[u8]) {
        self.sync_load_options();
        match self.model.load_bytes(bytes) {
            Ok(_) => {
                self.file_name = Some(format!("{} bytes", bytes.len()));
                self.scroll_accum = PerAxis::default();
                self.error_msg = None;
                self.focus_first_label();
            }
            Err(e) => {
                self.error_msg = Some(format!("Failed to load: {e}"));
            }
        }
    }

    /// Focus the lowest label of a fresh volume, or the volume centre when
    /// it holds no labels.
    fn focus_first_label(&mut self) {
        let first = self
            .model
            .label_inventory()
            .ok()
            .and_then(|labels| labels.first().copied());
        self.select_label(first.unwrap_or(0));
    }

    fn select_label(&mut self, label: i32) {
        if let Err(e) = self.model.set_current_label(label) {
            self.error_msg = Some(format!("Failed to update: {e}"));
        }
    }

    fn set_slice(&mut self, axis: ViewAxis, index: isize) {
        if let Err(e) = self.model.set_current_slice(axis, index) {
            self.error_msg = Some(format!("Failed to update: {e}"));
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_directory(&self.config.initial_dir)
            .add_filter(
                self.config.file_filter_name.as_str(),
                self.config.file_extensions.as_slice(),
            )
            .pick_file()
        {
            self.load_from_path(&path);
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn open_web_file_dialog(&mut self, ctx: &egui::Context) {
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            self.error_msg = Some("No document available".to_string());
            return;
        };
        let Some(input) = document
            .create_element("input")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        else {
            self.error_msg = Some("Could not create file input".to_string());
            return;
        };
        let Ok(reader) = FileReader::new() else {
            self.error_msg = Some("Could not create file reader".to_string());
            return;
        };
        input.set_type("file");
        input.set_accept(".nii,.nii.gz");

        let ctx_clone = ctx.clone();
        let onload = Closure::wrap(Box::new(move |event: Event| {
            let Some(reader) = event
                .target()
                .and_then(|target| target.dyn_into::<FileReader>().ok())
            else {
                return;
            };
            if let Ok(result) = reader.result() {
                let array = Uint8Array::new(&result);
                let mut bytes = vec![0u8; array.length() as usize];
                array.copy_to(&mut bytes);
                set_pending_bytes(bytes);
                ctx_clone.request_repaint();
            }
        }) as Box<dyn FnMut(_)>);
        reader.set_onloadend(Some(onload.as_ref().unchecked_ref()));
        onload.forget();

        let input_clone = input.clone();
        let onchange = Closure::wrap(Box::new(move |_event: Event| {
            if let Some(file) = input_clone.files().and_then(|files| files.get(0)) {
                let _ = reader.read_as_array_buffer(&file);
            }
        }) as Box<dyn FnMut(_)>);
        input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
        onchange.forget();

        input.click();
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn export_png(&mut self, axis: ViewAxis, image: &image::RgbImage) {
        let index = self.model.current_slice(axis);
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(format!("{}_{index}.png", axis.name().to_lowercase()))
            .save_file()
        else {
            return;
        };
        match image.save(&path) {
            Ok(()) => log::info!("saved {axis} slice {index} to {}", path.display()),
            Err(e) => self.error_msg = Some(format!("Failed to save: {e}")),
        }
    }

    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]
    fn control_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.vertical_centered_justified(|ui| {
            if ui.button("Select File").clicked() {
                #[cfg(not(target_arch = "wasm32"))]
                {
                    self.open_file_dialog();
                }
                #[cfg(target_arch = "wasm32")]
                {
                    self.open_web_file_dialog(ctx);
                }
            }
        });
        match &self.file_name {
            Some(name) => ui.label(format!("Selected: {name}")),
            None => ui.weak("Please load data"),
        };
        ui.checkbox(&mut self.reorient_to_ras, "Reorient to RAS on load");

        ui.separator();
        ui.strong("Label Selection");
        let labels = self
            .model
            .label_inventory()
            .map(<[i32]>::to_vec)
            .unwrap_or_default();
        let current = self.model.current_label();
        let mut selected = current;
        let label_text = |label: i32| {
            if label == 0 {
                "None".to_string()
            } else {
                label.to_string()
            }
        };
        ui.add_enabled_ui(!labels.is_empty(), |ui| {
            egui::ComboBox::from_id_salt("label_combo")
                .selected_text(label_text(current))
                .width(ui.available_width())
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut selected, 0, label_text(0));
                    for &label in &labels {
                        ui.selectable_value(&mut selected, label, label_text(label));
                    }
                });
        });
        if selected != current {
            self.select_label(selected);
        }
        if let Ok(shape) = self.model.shape() {
            ui.weak(format!(
                "{} labels, shape {} × {} × {}",
                labels.len(),
                shape[0],
                shape[1],
                shape[2]
            ));
        }

        ui.separator();
        ui.strong("Display");
        for mode in RenderMode::ALL {
            ui.radio_value(&mut self.render_mode, mode, mode.name());
        }

        ui.separator();
        ui.weak(
            "Shows where each label number of a NIfTI segmentation lies in the \
             axial, coronal and sagittal planes.",
        );
    }

    /// Return the physical display size for a slice, preserving aspect ratio
    /// while fitting within the given bounding box.
    fn fit_size(
        nvox_w: usize,
        nvox_h: usize,
        vox_w: f32,
        vox_h: f32,
        max_w: f32,
        max_h: f32,
    ) -> egui::Vec2 {
        let phys_w = nvox_w as f32 * vox_w;
        let phys_h = nvox_h as f32 * vox_h;
        let scale = (max_w / phys_w).min(max_h / phys_h).max(0.0);
        egui::vec2(phys_w * scale, phys_h * scale)
    }

    fn axis_view(&mut self, ui: &mut egui::Ui, axis: ViewAxis) {
        ui.strong(format!("{axis} View"));
        let index = self.model.current_slice(axis);
        let (Ok(slice), Ok(geometry), Some(volume)) = (
            self.model.get_slice(axis, index as isize),
            self.model.geometry().copied(),
            self.model.volume(),
        ) else {
            return;
        };
        let len = volume.len_along(axis);

        let image = render_slice(&slice, self.render_mode, &self.config.palette);
        let px = [image.width() as usize, image.height() as usize];
        let texture = ui.ctx().load_texture(
            axis.name(),
            egui::ColorImage::from_rgb(px, image.as_raw()),
            egui::TextureOptions::NEAREST,
        );

        let footer_h = 64.0;
        let avail = ui.available_size();
        let (d1, d2) = axis.in_plane_dims();
        let size = Self::fit_size(
            px[0],
            px[1],
            geometry.spacing[d1],
            geometry.spacing[d2],
            avail.x,
            (avail.y - footer_h).max(1.0),
        );
        let (cell_rect, _) = ui.allocate_exact_size(
            egui::vec2(avail.x, size.y),
            egui::Sense::hover(),
        );
        let img_rect = egui::Rect::from_center_size(cell_rect.center(), size);
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        ui.painter()
            .image(texture.id(), img_rect, uv, egui::Color32::WHITE);

        let mut new_index = index;
        ui.label(format!(
            "Slice: {index}   {} = {:.1} mm",
            geometry.coordinate(axis.dim()),
            geometry.voxel_to_mm(axis.dim(), index)
        ));
        ui.spacing_mut().slider_width = (avail.x - 60.0).max(40.0);
        ui.add(egui::Slider::new(&mut new_index, 0..=len - 1).show_value(false));
        if new_index != index {
            self.set_slice(axis, new_index as isize);
        }

        #[cfg(not(target_arch = "wasm32"))]
        if ui.small_button("Save PNG").clicked() {
            self.export_png(axis, &image);
        }

        if ui.rect_contains_pointer(cell_rect) {
            self.scroll_accum[axis] += ui.input(|i| i.raw_scroll_delta.y);
            let step = self.config.scroll_step;
            let mut target = self.model.current_slice(axis) as isize;
            while self.scroll_accum[axis] >= step {
                self.scroll_accum[axis] -= step;
                target += 1;
            }
            while self.scroll_accum[axis] <= -step {
                self.scroll_accum[axis] += step;
                target -= 1;
            }
            if target != self.model.current_slice(axis) as isize {
                self.set_slice(axis, target);
            }
        }
    }
}

impl eframe::App for LabelViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(self.config.window_title.as_str());
                if let Some(ref msg) = self.error_msg {
                    ui.colored_label(egui::Color32::RED, msg);
                }
            });
        });

        #[cfg(target_arch = "wasm32")]
        if let Some(bytes) = take_pending_bytes() {
            self.load_from_bytes(&bytes);
        }

        egui::SidePanel::left("control_panel")
            .exact_width(self.config.control_panel_width)
            .show(ctx, |ui| self.control_panel(ui, ctx));

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.model.is_loaded() {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("No volume loaded.\nUse Select File to open a label volume.")
                            .color(egui::Color32::GRAY)
                            .size(20.0),
                    );
                });
                return;
            }
            ui.columns(3, |columns| {
                for (column, axis) in columns.iter_mut().zip(ViewAxis::ALL) {
                    self.axis_view(column, axis);
                }
            });
        });
    }
}

#[cfg(target_arch = "wasm32")]
thread_local! {
    static PENDING_BYTES: RefCell<Option<Vec<u8>>> = RefCell::new(None);
}

#[cfg(target_arch = "wasm32")]
fn set_pending_bytes(bytes: Vec<u8>) {
    PENDING_BYTES.with(|cell| {
        *cell.borrow_mut() = Some(bytes);
    });
}

#[cfg(target_arch = "wasm32")]
fn take_pending_bytes() -> Option<Vec<u8>> {
    PENDING_BYTES.with(|cell| cell.borrow_mut().take())
}
